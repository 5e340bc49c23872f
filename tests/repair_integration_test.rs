//! Integration tests for the community repair pass

use chrono::{Duration, Utc};
use std::sync::Arc;
use vigil::adapters::database::{CaseStore, HierarchyStore};
use vigil::adapters::memory::MemoryStore;
use vigil::core::geography::Geography;
use vigil::core::repair::{RepairAction, RepairOptions, RepairPass, RepairPhase};
use vigil::domain::{
    Case, CaseStatus, CaseType, Community, CommunityParent, District, Facility, LocationSnapshot,
    Region, SubDistrictId, VigilError,
};

struct Seed {
    store: Arc<MemoryStore>,
    region: Region,
    district: District,
}

async fn seed() -> Seed {
    let store = Arc::new(MemoryStore::new());
    let region = Region::new("Ashanti");
    let district = District::new("Kumasi Metro", region.id);
    store.insert_region(&region).await.unwrap();
    store.insert_district(&district).await.unwrap();
    Seed {
        store,
        region,
        district,
    }
}

/// A legacy row holding its district id in the sub-district slot
fn misplaced(name: &str, district: &District, age_minutes: i64) -> Community {
    let mut community = Community::new(name, CommunityParent::District(district.id));
    community.district_id = None;
    community.sub_district_id = Some(SubDistrictId::from_uuid(*district.id.as_uuid()));
    community.created_at = Utc::now() - Duration::minutes(age_minutes);
    community
}

fn under_district(name: &str, district: &District, age_minutes: i64) -> Community {
    let mut community = Community::new(name, CommunityParent::District(district.id));
    community.created_at = Utc::now() - Duration::minutes(age_minutes);
    community
}

async fn apply(store: &Arc<MemoryStore>) -> vigil::core::repair::RepairReport {
    RepairPass::new(store.clone(), RepairOptions::default())
        .run()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_misplaced_reference_is_relocated() {
    let s = seed().await;
    let legacy = misplaced("Asokwa", &s.district, 10);
    s.store.put_community_row(legacy.clone()).await;

    let report = apply(&s.store).await;

    assert_eq!(report.migrated, 1);
    assert_eq!(report.details[0].phase, RepairPhase::MisplacedParent);
    assert_eq!(report.details[0].action, RepairAction::Relocated);
    let moved = s.store.get_community(&legacy.id).await.unwrap().unwrap();
    assert_eq!(moved.district_id, Some(s.district.id));
    assert_eq!(moved.sub_district_id, None);
    assert!(report.index_built);
    assert!(report.is_successful());
}

#[tokio::test]
async fn test_misplaced_duplicate_merges_and_repoints_dependents() {
    let s = seed().await;
    let survivor = under_district("Asokwa", &s.district, 60);
    let legacy = misplaced("ASOKWA", &s.district, 10);
    s.store.put_community_row(survivor.clone()).await;
    s.store.put_community_row(legacy.clone()).await;

    let facility = Facility::new("Komfo Anokye", s.region.id, s.district.id, legacy.id);
    let cholera = CaseType::new("Cholera");
    let case = Case::new(cholera.id, facility.id, CaseStatus::Confirmed)
        .with_community(legacy.id)
        .with_location(LocationSnapshot {
            region_id: Some(s.region.id),
            district_id: Some(s.district.id),
            sub_district_id: None,
            community_id: Some(legacy.id),
        });
    s.store.insert_facility(&facility).await.unwrap();
    s.store.insert_case_type(&cholera).await.unwrap();
    s.store.insert_case(&case).await.unwrap();

    let report = apply(&s.store).await;

    assert_eq!(report.merged, 1);
    assert_eq!(report.facilities_repointed, 1);
    assert_eq!(report.cases_repointed, 1);
    assert!(s.store.get_community(&legacy.id).await.unwrap().is_none());
    let facility = s.store.get_facility(&facility.id).await.unwrap().unwrap();
    assert_eq!(facility.community_id, survivor.id);

    let geo = Geography::new(s.store.clone(), s.store.clone());
    let names = geo.locator().describe_community(&survivor.id).await.unwrap();
    assert_eq!(names.district.as_deref(), Some("Kumasi Metro"));
}

#[tokio::test]
async fn test_same_name_siblings_fold_into_oldest() {
    let s = seed().await;
    let oldest = under_district("Asokwa", &s.district, 90);
    let newer = under_district("asokwa", &s.district, 30);
    let newest = under_district("Asokwa ", &s.district, 5);
    for community in [&newest, &oldest, &newer] {
        s.store.put_community_row(community.clone()).await;
    }
    let facility = Facility::new("Komfo Anokye", s.region.id, s.district.id, newest.id);
    s.store.insert_facility(&facility).await.unwrap();

    let report = apply(&s.store).await;

    assert_eq!(report.merged, 2);
    assert!(report
        .details
        .iter()
        .all(|d| d.phase == RepairPhase::Duplicate));
    assert_eq!(s.store.node_counts().await.3, 1);
    assert!(s.store.get_community(&oldest.id).await.unwrap().is_some());
    let facility = s.store.get_facility(&facility.id).await.unwrap().unwrap();
    assert_eq!(facility.community_id, oldest.id);
}

#[tokio::test]
async fn test_second_run_is_clean() {
    let s = seed().await;
    s.store
        .put_community_row(under_district("Asokwa", &s.district, 60))
        .await;
    s.store
        .put_community_row(misplaced("Asokwa", &s.district, 10))
        .await;
    s.store
        .put_community_row(misplaced("Bantama", &s.district, 5))
        .await;

    let first = apply(&s.store).await;
    assert!(!first.is_clean());

    let second = apply(&s.store).await;
    assert!(second.is_clean());
    assert_eq!(second.failed, 0);
    assert_eq!(second.skipped, 0);
    assert!(second.details.is_empty());
}

#[tokio::test]
async fn test_index_blocks_later_duplicates() {
    let s = seed().await;
    let existing = under_district("Asokwa", &s.district, 60);
    s.store.put_community_row(existing).await;

    let report = apply(&s.store).await;
    assert!(report.index_built);

    let result = s
        .store
        .insert_community(&under_district("ASOKWA", &s.district, 0))
        .await;
    assert!(matches!(result, Err(VigilError::Conflict(_))));

    let geo = Geography::new(s.store.clone(), s.store.clone());
    let found = geo
        .upserter()
        .find_or_create_community("asokwa", s.district.id.into())
        .await
        .unwrap();
    assert_eq!(s.store.node_counts().await.3, 1);
    assert_eq!(found.name, "Asokwa");
}

#[tokio::test]
async fn test_index_failure_is_reported_as_warning() {
    let s = seed().await;
    let survivor = under_district("Asokwa", &s.district, 60);
    let duplicate = under_district("Asokwa", &s.district, 10);
    s.store.put_community_row(survivor).await;
    s.store.put_community_row(duplicate.clone()).await;
    s.store.reject_writes_for(duplicate.id).await;

    let report = apply(&s.store).await;

    assert_eq!(report.failed, 1);
    assert!(!report.index_built);
    assert!(report.index_warning.is_some());
    assert!(!report.is_successful());
    assert!(report.format_summary().contains("Asokwa"));
}

#[tokio::test]
async fn test_skip_index_option() {
    let s = seed().await;
    s.store
        .put_community_row(misplaced("Asokwa", &s.district, 10))
        .await;

    let options = RepairOptions {
        dry_run: false,
        ensure_unique_index: false,
    };
    let report = RepairPass::new(s.store.clone(), options)
        .run()
        .await
        .unwrap();

    assert_eq!(report.migrated, 1);
    assert!(!report.index_built);
    assert!(report.index_warning.is_none());

    // Without the index duplicate names can still be inserted
    s.store
        .insert_community(&under_district("Asokwa", &s.district, 0))
        .await
        .unwrap();
}
