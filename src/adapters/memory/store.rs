//! In-memory store
//!
//! Holds every collection behind one `tokio::sync::RwLock`. Multi-step
//! operations (moves, merges) run under a single write guard, which gives
//! them the same all-or-nothing behaviour as a database transaction.

use crate::adapters::database::traits::{
    CaseCount, CaseFilter, CaseStore, HierarchyStore, MergeOutcome, MoveOutcome,
};
use crate::domain::hierarchy::name_key;
use crate::domain::ids::{
    CaseId, CaseTypeId, CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId,
};
use crate::domain::{
    Case, CaseStatus, CaseType, Community, CommunityParent, District, Facility, FacilityGeoFilter,
    Region, Result, SubDistrict, VigilError,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    regions: HashMap<RegionId, Region>,
    districts: HashMap<DistrictId, District>,
    sub_districts: HashMap<SubDistrictId, SubDistrict>,
    communities: HashMap<CommunityId, Community>,
    facilities: HashMap<FacilityId, Facility>,
    case_types: HashMap<CaseTypeId, CaseType>,
    cases: HashMap<CaseId, Case>,
    community_unique_index: bool,
    rejected_writes: HashSet<CommunityId>,
}

type CommunityKey = (String, Option<DistrictId>, Option<SubDistrictId>);

fn community_key(community: &Community) -> CommunityKey {
    (
        name_key(&community.name),
        community.district_id,
        community.sub_district_id,
    )
}

impl MemoryState {
    fn check_writable(&self, id: &CommunityId) -> Result<()> {
        if self.rejected_writes.contains(id) {
            return Err(VigilError::Persistence(format!(
                "Write to community {id} rejected"
            )));
        }
        Ok(())
    }

    fn oldest_community<'a>(
        &'a self,
        mut predicate: impl FnMut(&Community) -> bool,
    ) -> Option<&'a Community> {
        self.communities
            .values()
            .filter(|c| predicate(*c))
            .min_by_key(|c| (c.created_at, c.id))
    }

    /// Repoints dependents and removes the duplicate; caller holds the write guard
    fn merge_locked(
        &mut self,
        duplicate: &CommunityId,
        survivor: &CommunityId,
    ) -> Result<MergeOutcome> {
        if duplicate == survivor {
            return Err(VigilError::InvalidInput(format!(
                "Cannot merge community {duplicate} into itself"
            )));
        }
        if !self.communities.contains_key(survivor) {
            return Err(VigilError::Persistence(format!(
                "Merge survivor {survivor} no longer exists"
            )));
        }
        if !self.communities.contains_key(duplicate) {
            return Err(VigilError::Persistence(format!(
                "Merge duplicate {duplicate} no longer exists"
            )));
        }

        let mut outcome = MergeOutcome::default();
        for facility in self.facilities.values_mut() {
            if facility.community_id == *duplicate {
                facility.community_id = *survivor;
                outcome.facilities_repointed += 1;
            }
        }
        for case in self.cases.values_mut() {
            if case.community_id == Some(*duplicate) {
                case.community_id = Some(*survivor);
                outcome.cases_repointed += 1;
            }
            if let Some(location) = case.location.as_mut() {
                if location.community_id == Some(*duplicate) {
                    location.community_id = Some(*survivor);
                }
            }
        }
        self.communities.remove(duplicate);
        Ok(outcome)
    }
}

/// Process-local implementation of both store traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of hierarchy rows per level: (regions, districts, sub-districts, communities)
    pub async fn node_counts(&self) -> (usize, usize, usize, usize) {
        let state = self.state.read().await;
        (
            state.regions.len(),
            state.districts.len(),
            state.sub_districts.len(),
            state.communities.len(),
        )
    }

    /// Raw community write that bypasses the single-parent constructor
    ///
    /// Used to seed legacy rows for repair.
    pub async fn put_community_row(&self, community: Community) {
        let mut state = self.state.write().await;
        state.communities.insert(community.id, community);
    }

    /// Make moves and merges of `id` fail with a persistence error
    ///
    /// Lets callers exercise per-record failure handling.
    pub async fn reject_writes_for(&self, id: CommunityId) {
        let mut state = self.state.write().await;
        state.rejected_writes.insert(id);
    }
}

#[async_trait]
impl HierarchyStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }

    async fn get_region(&self, id: &RegionId) -> Result<Option<Region>> {
        Ok(self.state.read().await.regions.get(id).cloned())
    }

    async fn get_district(&self, id: &DistrictId) -> Result<Option<District>> {
        Ok(self.state.read().await.districts.get(id).cloned())
    }

    async fn get_sub_district(&self, id: &SubDistrictId) -> Result<Option<SubDistrict>> {
        Ok(self.state.read().await.sub_districts.get(id).cloned())
    }

    async fn get_community(&self, id: &CommunityId) -> Result<Option<Community>> {
        Ok(self.state.read().await.communities.get(id).cloned())
    }

    async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>> {
        let key = name_key(name);
        let state = self.state.read().await;
        Ok(state
            .regions
            .values()
            .filter(|r| name_key(&r.name) == key)
            .min_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn find_district_by_name(
        &self,
        name: &str,
        region_id: Option<&RegionId>,
    ) -> Result<Option<District>> {
        let key = name_key(name);
        let state = self.state.read().await;
        Ok(state
            .districts
            .values()
            .filter(|d| name_key(&d.name) == key)
            .filter(|d| region_id.map_or(true, |r| d.region_id == *r))
            .min_by_key(|d| (d.created_at, d.id))
            .cloned())
    }

    async fn find_sub_district_by_name(
        &self,
        name: &str,
        district_id: Option<&DistrictId>,
    ) -> Result<Option<SubDistrict>> {
        let key = name_key(name);
        let state = self.state.read().await;
        Ok(state
            .sub_districts
            .values()
            .filter(|s| name_key(&s.name) == key)
            .filter(|s| district_id.map_or(true, |d| s.district_id == *d))
            .min_by_key(|s| (s.created_at, s.id))
            .cloned())
    }

    async fn find_community_by_name(
        &self,
        name: &str,
        parent: Option<&CommunityParent>,
    ) -> Result<Option<Community>> {
        let key = name_key(name);
        let state = self.state.read().await;
        Ok(state
            .oldest_community(|c| {
                name_key(&c.name) == key
                    && match parent {
                        None => true,
                        Some(CommunityParent::District(d)) => c.district_id == Some(*d),
                        Some(CommunityParent::SubDistrict(s)) => c.sub_district_id == Some(*s),
                    }
            })
            .cloned())
    }

    async fn insert_region(&self, region: &Region) -> Result<()> {
        let mut state = self.state.write().await;
        let key = name_key(&region.name);
        if state.regions.values().any(|r| name_key(&r.name) == key) {
            return Err(VigilError::Conflict(format!(
                "region '{}' already exists",
                region.name
            )));
        }
        state.regions.insert(region.id, region.clone());
        Ok(())
    }

    async fn insert_district(&self, district: &District) -> Result<()> {
        let mut state = self.state.write().await;
        let key = name_key(&district.name);
        if state
            .districts
            .values()
            .any(|d| d.region_id == district.region_id && name_key(&d.name) == key)
        {
            return Err(VigilError::Conflict(format!(
                "district '{}' already exists in region {}",
                district.name, district.region_id
            )));
        }
        state.districts.insert(district.id, district.clone());
        Ok(())
    }

    async fn insert_sub_district(&self, sub_district: &SubDistrict) -> Result<()> {
        let mut state = self.state.write().await;
        let key = name_key(&sub_district.name);
        if state
            .sub_districts
            .values()
            .any(|s| s.district_id == sub_district.district_id && name_key(&s.name) == key)
        {
            return Err(VigilError::Conflict(format!(
                "sub-district '{}' already exists in district {}",
                sub_district.name, sub_district.district_id
            )));
        }
        state.sub_districts.insert(sub_district.id, sub_district.clone());
        Ok(())
    }

    async fn insert_community(&self, community: &Community) -> Result<()> {
        let mut state = self.state.write().await;
        if state.community_unique_index {
            let key = community_key(community);
            if state.communities.values().any(|c| community_key(c) == key) {
                return Err(VigilError::Conflict(format!(
                    "community '{}' already exists under the same parent",
                    community.name
                )));
            }
        }
        state.communities.insert(community.id, community.clone());
        Ok(())
    }

    async fn list_communities(&self) -> Result<Vec<Community>> {
        let state = self.state.read().await;
        let mut communities: Vec<Community> = state.communities.values().cloned().collect();
        communities.sort_by(|a, b| {
            (name_key(&a.name), a.created_at, a.id).cmp(&(name_key(&b.name), b.created_at, b.id))
        });
        Ok(communities)
    }

    async fn list_repair_candidates(&self) -> Result<Vec<Community>> {
        let state = self.state.read().await;
        let mut candidates: Vec<Community> = state
            .communities
            .values()
            .filter(|c| c.is_repair_candidate())
            .cloned()
            .collect();
        candidates.sort_by_key(|c| (c.created_at, c.id));
        Ok(candidates)
    }

    async fn move_community_to_district(
        &self,
        community_id: &CommunityId,
        district_id: &DistrictId,
    ) -> Result<MoveOutcome> {
        let mut state = self.state.write().await;
        state.check_writable(community_id)?;
        let current = state.communities.get(community_id).ok_or_else(|| {
            VigilError::Persistence(format!("Community {community_id} no longer exists"))
        })?;
        let misplaced = current.district_id.is_none()
            && current.sub_district_id.map(|s| *s.as_uuid()) == Some(*district_id.as_uuid());
        if !misplaced {
            return Ok(MoveOutcome::Unchanged);
        }
        let name = name_key(&current.name);

        let existing = state
            .oldest_community(|c| {
                c.id != *community_id
                    && c.district_id == Some(*district_id)
                    && name_key(&c.name) == name
            })
            .map(|c| c.id);

        match existing {
            Some(survivor) => {
                let dependents = state.merge_locked(community_id, &survivor)?;
                Ok(MoveOutcome::Merged {
                    survivor,
                    dependents,
                })
            }
            None => {
                if let Some(community) = state.communities.get_mut(community_id) {
                    community.district_id = Some(*district_id);
                    community.sub_district_id = None;
                }
                Ok(MoveOutcome::Relocated)
            }
        }
    }

    async fn merge_communities(
        &self,
        duplicate: &CommunityId,
        survivor: &CommunityId,
    ) -> Result<Option<MergeOutcome>> {
        let mut state = self.state.write().await;
        state.check_writable(duplicate)?;
        let keys = (
            state.communities.get(duplicate).map(community_key),
            state.communities.get(survivor).map(community_key),
        );
        if let (Some(duplicate_key), Some(survivor_key)) = keys {
            if duplicate_key != survivor_key {
                return Ok(None);
            }
        }
        state.merge_locked(duplicate, survivor).map(Some)
    }

    async fn ensure_community_unique_index(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let mut seen: HashSet<CommunityKey> = HashSet::new();
        for community in state.communities.values() {
            if !seen.insert(community_key(community)) {
                return Err(VigilError::Conflict(format!(
                    "duplicate community '{}' prevents unique index",
                    community.name
                )));
            }
        }
        state.community_unique_index = true;
        Ok(())
    }
}

#[async_trait]
impl CaseStore for MemoryStore {
    async fn get_facility(&self, id: &FacilityId) -> Result<Option<Facility>> {
        Ok(self.state.read().await.facilities.get(id).cloned())
    }

    async fn find_facility_by_name(&self, name: &str) -> Result<Option<Facility>> {
        let key = name_key(name);
        let state = self.state.read().await;
        let mut matches: Vec<&Facility> = state
            .facilities
            .values()
            .filter(|f| name_key(&f.name) == key)
            .collect();
        matches.sort_by_key(|f| f.id);
        Ok(matches.first().map(|f| (*f).clone()))
    }

    async fn find_facility_ids(&self, filter: &FacilityGeoFilter) -> Result<Vec<FacilityId>> {
        let state = self.state.read().await;
        let mut ids: Vec<FacilityId> = state
            .facilities
            .values()
            .filter(|f| filter.matches(f))
            .map(|f| f.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn get_case_type(&self, id: &CaseTypeId) -> Result<Option<CaseType>> {
        Ok(self.state.read().await.case_types.get(id).cloned())
    }

    async fn find_case_type_by_name(&self, name: &str) -> Result<Option<CaseType>> {
        let key = name_key(name);
        let state = self.state.read().await;
        let mut matches: Vec<&CaseType> = state
            .case_types
            .values()
            .filter(|t| name_key(&t.name) == key)
            .collect();
        matches.sort_by_key(|t| t.id);
        Ok(matches.first().map(|t| (*t).clone()))
    }

    async fn count_active_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseCount>> {
        let state = self.state.read().await;
        let facility_set: Option<HashSet<FacilityId>> = filter
            .facility_ids
            .as_ref()
            .map(|ids| ids.iter().copied().collect());

        let mut groups: BTreeMap<(CaseTypeId, CaseStatus, Option<String>), u64> = BTreeMap::new();
        for case in state.cases.values() {
            if !case.is_countable() {
                continue;
            }
            if filter.case_type_id.is_some_and(|id| case.case_type_id != id) {
                continue;
            }
            if let Some(ref set) = facility_set {
                if !set.contains(&case.facility_id) {
                    continue;
                }
            }
            if filter.community_id.is_some() && case.community_id != filter.community_id {
                continue;
            }
            // Cases whose type row is missing drop out, like an inner join
            if !state.case_types.contains_key(&case.case_type_id) {
                continue;
            }
            *groups
                .entry((case.case_type_id, case.status, case.patient_status.clone()))
                .or_default() += 1;
        }

        Ok(groups
            .into_iter()
            .filter_map(|((case_type_id, status, patient_status), count)| {
                state.case_types.get(&case_type_id).map(|t| CaseCount {
                    case_type_id,
                    case_type_name: t.name.clone(),
                    status,
                    patient_status,
                    count,
                })
            })
            .collect())
    }

    async fn insert_facility(&self, facility: &Facility) -> Result<()> {
        let mut state = self.state.write().await;
        state.facilities.insert(facility.id, facility.clone());
        Ok(())
    }

    async fn insert_case_type(&self, case_type: &CaseType) -> Result<()> {
        let mut state = self.state.write().await;
        state.case_types.insert(case_type.id, case_type.clone());
        Ok(())
    }

    async fn insert_case(&self, case: &Case) -> Result<()> {
        let mut state = self.state.write().await;
        state.cases.insert(case.id, case.clone());
        Ok(())
    }
}
