//! The repair pass
//!
//! Phase A moves communities whose district id was stored in the
//! `sub_district_id` column. Phase B folds same-name siblings into the oldest
//! one. Every relocation or merge is a single store transaction, so a failed
//! record leaves nothing half-done and the pass can simply be re-run.

use crate::adapters::database::{HierarchyStore, MergeOutcome, MoveOutcome};
use crate::config::RepairConfig;
use crate::core::repair::report::{RepairAction, RepairDetail, RepairPhase, RepairReport};
use crate::domain::hierarchy::name_key;
use crate::domain::ids::{CommunityId, DistrictId, SubDistrictId};
use crate::domain::{Community, CommunityParent, Result};
use crate::{log_error_with_context, log_repair_action};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// How a run behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairOptions {
    /// Report what would change without writing
    pub dry_run: bool,
    /// Build the community unique index after applying
    pub ensure_unique_index: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            ensure_unique_index: true,
        }
    }
}

impl From<&RepairConfig> for RepairOptions {
    fn from(config: &RepairConfig) -> Self {
        Self {
            dry_run: config.dry_run,
            ensure_unique_index: config.ensure_unique_index,
        }
    }
}

/// Outcome of one Phase A candidate before it is written to the report
enum Placement {
    /// The reference is a real sub-district
    Valid,
    Unresolved,
    /// Another writer repaired the row after it was listed
    Stale,
    Relocated(DistrictId),
    Merged {
        survivor: CommunityId,
        dependents: MergeOutcome,
    },
}

type SiblingKey = (String, Option<DistrictId>, Option<SubDistrictId>);

/// What a dry run has already moved or merged
///
/// Later candidates and Phase B read through it, so the preview reports the
/// same actions an applied run would take. Stays empty when applying.
#[derive(Debug, Default)]
struct Preview {
    relocated: HashMap<CommunityId, DistrictId>,
    under_district: HashMap<(String, DistrictId), CommunityId>,
    merged: HashSet<CommunityId>,
}

/// Offline repair of the community table
pub struct RepairPass {
    store: Arc<dyn HierarchyStore + Send + Sync>,
    options: RepairOptions,
}

impl RepairPass {
    pub fn new(store: Arc<dyn HierarchyStore + Send + Sync>, options: RepairOptions) -> Self {
        Self { store, options }
    }

    /// Run both phases, then optionally build the unique index
    ///
    /// # Errors
    ///
    /// Fails only when the community lists cannot be read. Per-record
    /// failures are counted in the report and the pass continues.
    pub async fn run(&self) -> Result<RepairReport> {
        let start = Instant::now();
        let mut report = RepairReport::new(self.options.dry_run);

        tracing::info!(
            backend = self.store.backend_name(),
            dry_run = self.options.dry_run,
            "Starting community repair"
        );

        let mut preview = Preview::default();
        self.repair_misplaced_parents(&mut report, &mut preview).await?;
        self.merge_duplicates(&mut report, &preview).await?;

        if !self.options.dry_run && self.options.ensure_unique_index {
            match self.store.ensure_community_unique_index().await {
                Ok(()) => report.index_built = true,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Community unique index could not be built; duplicates can reappear"
                    );
                    report.index_warning = Some(e.to_string());
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            migrated = report.migrated,
            merged = report.merged,
            skipped = report.skipped,
            failed = report.failed,
            duration_ms = report.duration_ms,
            "Community repair finished"
        );
        Ok(report)
    }

    async fn repair_misplaced_parents(
        &self,
        report: &mut RepairReport,
        preview: &mut Preview,
    ) -> Result<()> {
        let candidates = self.store.list_repair_candidates().await?;
        tracing::debug!(candidates = candidates.len(), "Misplaced-parent candidates");

        for community in candidates {
            let detail = match self.place(&community, preview).await {
                Ok(Placement::Valid) => {
                    report.record_untouched();
                    continue;
                }
                Ok(Placement::Unresolved) => RepairDetail {
                    phase: RepairPhase::MisplacedParent,
                    action: RepairAction::Skipped,
                    community_id: community.id,
                    name: community.name.clone(),
                    message: format!(
                        "sub_district_id {} is neither a sub-district nor a district",
                        reference_of(&community)
                    ),
                },
                Ok(Placement::Stale) => RepairDetail {
                    phase: RepairPhase::MisplacedParent,
                    action: RepairAction::Skipped,
                    community_id: community.id,
                    name: community.name.clone(),
                    message: "no longer misplaced, changed by another writer".to_string(),
                },
                Ok(Placement::Relocated(district_id)) => RepairDetail {
                    phase: RepairPhase::MisplacedParent,
                    action: RepairAction::Relocated,
                    community_id: community.id,
                    name: community.name.clone(),
                    message: format!(
                        "{} district_id = {district_id}, sub_district_id cleared",
                        self.verb("moved to", "would move to")
                    ),
                },
                Ok(Placement::Merged {
                    survivor,
                    dependents,
                }) => {
                    report.facilities_repointed += dependents.facilities_repointed;
                    report.cases_repointed += dependents.cases_repointed;
                    RepairDetail {
                        phase: RepairPhase::MisplacedParent,
                        action: RepairAction::Merged,
                        community_id: community.id,
                        name: community.name.clone(),
                        message: format!(
                            "{} existing community {survivor} under the district",
                            self.verb("merged into", "would merge into")
                        ),
                    }
                }
                Err(e) => {
                    log_error_with_context!(e, "Failed to repair misplaced community parent");
                    failure(RepairPhase::MisplacedParent, &community, &e.to_string())
                }
            };

            log_repair_action!(
                detail.action.as_str(),
                detail.community_id,
                detail.name,
                detail.message
            );
            report.record(detail);
        }

        Ok(())
    }

    async fn place(&self, community: &Community, preview: &mut Preview) -> Result<Placement> {
        let Some(reference) = community.sub_district_id else {
            return Ok(Placement::Valid);
        };

        if self.store.get_sub_district(&reference).await?.is_some() {
            return Ok(Placement::Valid);
        }

        let district_id = DistrictId::from_uuid(*reference.as_uuid());
        if self.store.get_district(&district_id).await?.is_none() {
            return Ok(Placement::Unresolved);
        }

        if self.options.dry_run {
            return self.preview_placement(community, district_id, preview).await;
        }

        let placement = match self
            .store
            .move_community_to_district(&community.id, &district_id)
            .await?
        {
            MoveOutcome::Unchanged => Placement::Stale,
            MoveOutcome::Relocated => Placement::Relocated(district_id),
            MoveOutcome::Merged {
                survivor,
                dependents,
            } => Placement::Merged {
                survivor,
                dependents,
            },
        };
        Ok(placement)
    }

    /// Read-only counterpart of a move, answering from the preview first
    async fn preview_placement(
        &self,
        community: &Community,
        district_id: DistrictId,
        preview: &mut Preview,
    ) -> Result<Placement> {
        let key = (name_key(&community.name), district_id);

        let survivor = match preview.under_district.get(&key) {
            Some(relocated) => Some(*relocated),
            None => {
                let parent = CommunityParent::District(district_id);
                self.store
                    .find_community_by_name(&community.name, Some(&parent))
                    .await?
                    .map(|existing| existing.id)
            }
        };

        Ok(match survivor {
            Some(survivor) => {
                preview.merged.insert(community.id);
                Placement::Merged {
                    survivor,
                    dependents: MergeOutcome::default(),
                }
            }
            None => {
                preview.under_district.insert(key, community.id);
                preview.relocated.insert(community.id, district_id);
                Placement::Relocated(district_id)
            }
        })
    }

    async fn merge_duplicates(&self, report: &mut RepairReport, preview: &Preview) -> Result<()> {
        let communities = self.store.list_communities().await?;
        let mut survivors: HashMap<SiblingKey, CommunityId> = HashMap::new();

        for mut community in communities {
            if preview.merged.contains(&community.id) {
                continue;
            }
            if let Some(district_id) = preview.relocated.get(&community.id) {
                community.district_id = Some(*district_id);
                community.sub_district_id = None;
            }
            let key = (
                name_key(&community.name),
                community.district_id,
                community.sub_district_id,
            );
            let Some(survivor) = survivors.get(&key).copied() else {
                survivors.insert(key, community.id);
                continue;
            };

            let detail = if self.options.dry_run {
                RepairDetail {
                    phase: RepairPhase::Duplicate,
                    action: RepairAction::Merged,
                    community_id: community.id,
                    name: community.name.clone(),
                    message: format!("would merge into {survivor}"),
                }
            } else {
                match self.store.merge_communities(&community.id, &survivor).await {
                    Ok(None) => RepairDetail {
                        phase: RepairPhase::Duplicate,
                        action: RepairAction::Skipped,
                        community_id: community.id,
                        name: community.name.clone(),
                        message: format!("no longer a duplicate of {survivor}"),
                    },
                    Ok(Some(dependents)) => {
                        report.facilities_repointed += dependents.facilities_repointed;
                        report.cases_repointed += dependents.cases_repointed;
                        RepairDetail {
                            phase: RepairPhase::Duplicate,
                            action: RepairAction::Merged,
                            community_id: community.id,
                            name: community.name.clone(),
                            message: format!(
                                "merged into {survivor}, re-pointed {} facilities and {} cases",
                                dependents.facilities_repointed, dependents.cases_repointed
                            ),
                        }
                    }
                    Err(e) => {
                        log_error_with_context!(e, "Failed to merge duplicate community");
                        failure(RepairPhase::Duplicate, &community, &e.to_string())
                    }
                }
            };

            log_repair_action!(
                detail.action.as_str(),
                detail.community_id,
                detail.name,
                detail.message
            );
            report.record(detail);
        }

        Ok(())
    }

    fn verb(&self, applied: &'static str, preview: &'static str) -> &'static str {
        if self.options.dry_run {
            preview
        } else {
            applied
        }
    }
}

fn reference_of(community: &Community) -> String {
    community
        .sub_district_id
        .map(|id| id.to_string())
        .unwrap_or_default()
}

fn failure(phase: RepairPhase, community: &Community, reason: &str) -> RepairDetail {
    RepairDetail {
        phase,
        action: RepairAction::Failed,
        community_id: community.id,
        name: community.name.clone(),
        message: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::{District, Region, SubDistrict};

    async fn district_with_region(store: &MemoryStore) -> District {
        let region = Region::new("Ashanti");
        let district = District::new("Kumasi Metro", region.id);
        store.insert_region(&region).await.unwrap();
        store.insert_district(&district).await.unwrap();
        district
    }

    fn misplaced(name: &str, district: &District) -> Community {
        let mut community = Community::new(name, CommunityParent::District(district.id));
        community.district_id = None;
        community.sub_district_id = Some(SubDistrictId::from_uuid(*district.id.as_uuid()));
        community
    }

    #[tokio::test]
    async fn test_genuine_sub_district_reference_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        let district = district_with_region(&store).await;
        let sub_district = SubDistrict::new("Bantama", district.id);
        store.insert_sub_district(&sub_district).await.unwrap();
        let community = Community::new("Asokwa", CommunityParent::SubDistrict(sub_district.id));
        store.insert_community(&community).await.unwrap();

        let report = RepairPass::new(store.clone(), RepairOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.untouched, 1);
        assert!(report.is_clean());
        let stored = store.get_community(&community.id).await.unwrap().unwrap();
        assert_eq!(stored, community);
    }

    #[tokio::test]
    async fn test_unresolvable_reference_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let mut community =
            Community::new("Asokwa", CommunityParent::SubDistrict(SubDistrictId::new()));
        community.district_id = None;
        store.put_community_row(community.clone()).await;

        let report = RepairPass::new(store.clone(), RepairOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.details[0].action, RepairAction::Skipped);
        assert!(store.get_community(&community.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dry_run_previews_without_writing() {
        let store = Arc::new(MemoryStore::new());
        let district = district_with_region(&store).await;
        let existing = Community::new("Asokwa", CommunityParent::District(district.id));
        store.insert_community(&existing).await.unwrap();
        store.put_community_row(misplaced("asokwa", &district)).await;
        store.put_community_row(misplaced("Bantama", &district)).await;

        let options = RepairOptions {
            dry_run: true,
            ensure_unique_index: true,
        };
        let report = RepairPass::new(store.clone(), options).run().await.unwrap();

        assert_eq!(report.migrated, 1);
        assert_eq!(report.merged, 1);
        assert!(!report.index_built);
        assert_eq!(store.node_counts().await.3, 3);
        assert_eq!(store.list_repair_candidates().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_record_is_counted_and_pass_continues() {
        let store = Arc::new(MemoryStore::new());
        let district = district_with_region(&store).await;
        let broken = misplaced("Asokwa", &district);
        let fine = misplaced("Bantama", &district);
        store.put_community_row(broken.clone()).await;
        store.put_community_row(fine.clone()).await;
        store.reject_writes_for(broken.id).await;

        let report = RepairPass::new(store.clone(), RepairOptions::default())
            .run()
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.migrated, 1);
        assert!(!report.is_successful());
        let moved = store.get_community(&fine.id).await.unwrap().unwrap();
        assert_eq!(moved.district_id, Some(district.id));
        let untouched = store.get_community(&broken.id).await.unwrap().unwrap();
        assert!(untouched.is_repair_candidate());
    }
}
