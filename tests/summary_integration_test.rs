//! Integration tests for case summaries
//!
//! Two regions with one facility each, plus a sub-district facility in
//! Kumasi Metro. Cases are spread across them so every filter level has
//! something to exclude.

use std::sync::Arc;
use test_case::test_case;
use vigil::adapters::database::{CaseStore, HierarchyStore};
use vigil::adapters::memory::MemoryStore;
use vigil::core::geography::Resolver;
use vigil::core::summary::{CaseTypeSummary, SummaryAggregator, SummaryFilters};
use vigil::domain::{
    Case, CaseStatus, CaseType, Community, CommunityParent, District, Facility, Region,
    SubDistrict,
};

struct World {
    store: Arc<MemoryStore>,
    aggregator: SummaryAggregator,
    cholera: CaseType,
    measles: CaseType,
    kumasi: Facility,
    bantama: Facility,
    ho: Facility,
    asokwa: Community,
    ho_municipal: District,
    bantama_sd: SubDistrict,
}

async fn world() -> World {
    let store = Arc::new(MemoryStore::new());

    let ashanti = Region::new("Ashanti");
    let volta = Region::new("Volta");
    let kumasi_metro = District::new("Kumasi Metro", ashanti.id);
    let ho_municipal = District::new("Ho Municipal", volta.id);
    let bantama_sd = SubDistrict::new("Bantama", kumasi_metro.id);
    let asokwa = Community::new("Asokwa", CommunityParent::District(kumasi_metro.id));
    let suame = Community::new("Suame", CommunityParent::SubDistrict(bantama_sd.id));
    let dome = Community::new("Dome", CommunityParent::District(ho_municipal.id));

    store.insert_region(&ashanti).await.unwrap();
    store.insert_region(&volta).await.unwrap();
    store.insert_district(&kumasi_metro).await.unwrap();
    store.insert_district(&ho_municipal).await.unwrap();
    store.insert_sub_district(&bantama_sd).await.unwrap();
    for community in [&asokwa, &suame, &dome] {
        store.insert_community(community).await.unwrap();
    }

    let kumasi = Facility::new("Komfo Anokye", ashanti.id, kumasi_metro.id, asokwa.id);
    let bantama = Facility::new("Bantama Clinic", ashanti.id, kumasi_metro.id, suame.id)
        .with_sub_district(bantama_sd.id);
    let ho = Facility::new("Ho Teaching", volta.id, ho_municipal.id, dome.id);
    for facility in [&kumasi, &bantama, &ho] {
        store.insert_facility(facility).await.unwrap();
    }

    let cholera = CaseType::new("Cholera");
    let measles = CaseType::new("Measles");
    store.insert_case_type(&cholera).await.unwrap();
    store.insert_case_type(&measles).await.unwrap();

    let aggregator = SummaryAggregator::new(Resolver::new(store.clone()), store.clone());
    World {
        store,
        aggregator,
        cholera,
        measles,
        kumasi,
        bantama,
        ho,
        asokwa,
        ho_municipal,
        bantama_sd,
    }
}

async fn record(
    w: &World,
    case_type: &CaseType,
    facility: &Facility,
    status: CaseStatus,
    patient_status: Option<&str>,
) {
    let mut case =
        Case::new(case_type.id, facility.id, status).with_community(facility.community_id);
    if let Some(patient_status) = patient_status {
        case = case.with_patient_status(patient_status);
    }
    w.store.insert_case(&case).await.unwrap();
}

async fn populated() -> World {
    let w = world().await;
    record(&w, &w.cholera, &w.kumasi, CaseStatus::Confirmed, Some("Recovered")).await;
    record(&w, &w.cholera, &w.kumasi, CaseStatus::Confirmed, Some("Deceased")).await;
    record(&w, &w.cholera, &w.kumasi, CaseStatus::Suspected, None).await;
    record(&w, &w.cholera, &w.bantama, CaseStatus::Suspected, Some("Ongoing treatment")).await;
    record(&w, &w.measles, &w.ho, CaseStatus::Confirmed, Some("recovered")).await;
    record(&w, &w.measles, &w.kumasi, CaseStatus::NotACase, Some("Recovered")).await;

    let archived = Case::new(w.cholera.id, w.ho.id, CaseStatus::Confirmed).archived();
    w.store.insert_case(&archived).await.unwrap();
    w
}

fn totals(rows: &[CaseTypeSummary]) -> Vec<(String, u64)> {
    rows.iter().map(|r| (r.name.clone(), r.total)).collect()
}

#[tokio::test]
async fn test_unfiltered_summary_counts_active_cases_only() {
    let w = populated().await;

    let rows = w
        .aggregator
        .summarize(&SummaryFilters::default())
        .await
        .unwrap();

    assert_eq!(
        totals(&rows),
        vec![("Cholera".to_string(), 4), ("Measles".to_string(), 1)]
    );
    for row in &rows {
        assert_eq!(row.total, row.confirmed.total + row.suspected.total);
    }

    let cholera = &rows[0];
    assert_eq!(cholera.confirmed.total, 2);
    assert_eq!(cholera.confirmed.recovered, 1);
    assert_eq!(cholera.confirmed.deceased, 1);
    assert_eq!(cholera.suspected.total, 2);
    assert_eq!(cholera.suspected.ongoing_treatment, 1);
}

#[tokio::test]
async fn test_unrecognized_outcome_counts_toward_total_only() {
    let w = populated().await;

    let rows = w
        .aggregator
        .summarize(&SummaryFilters::default().with_case_type("Measles"))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].confirmed.total, 1);
    assert_eq!(rows[0].confirmed.recovered, 0);
}

#[test_case(SummaryFilters::default().with_region("Northern") ; "unknown region")]
#[test_case(SummaryFilters::default().with_district("Tamale Metro") ; "unknown district")]
#[test_case(SummaryFilters::default().with_case_type("Ebola") ; "unknown case type")]
#[test_case(SummaryFilters::default().with_facility("Nowhere Clinic") ; "unknown facility")]
#[test_case(SummaryFilters::default().with_community("Tema") ; "unknown community")]
#[tokio::test]
async fn test_unresolved_filter_yields_empty_summary(filters: SummaryFilters) {
    let w = populated().await;
    let rows = w.aggregator.summarize(&filters).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_region_filter_restricts_to_region_facilities() {
    let w = populated().await;

    let rows = w
        .aggregator
        .summarize(&SummaryFilters::default().with_region("volta"))
        .await
        .unwrap();
    assert_eq!(totals(&rows), vec![("Measles".to_string(), 1)]);
}

#[tokio::test]
async fn test_district_is_scoped_by_region() {
    let w = populated().await;

    let mismatched = SummaryFilters::default()
        .with_region("Volta")
        .with_district("Kumasi Metro");
    assert!(w.aggregator.summarize(&mismatched).await.unwrap().is_empty());

    let matched = SummaryFilters::default()
        .with_region("Ashanti")
        .with_district("Kumasi Metro");
    let rows = w.aggregator.summarize(&matched).await.unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 4)]);
}

#[tokio::test]
async fn test_sub_district_filter() {
    let w = populated().await;

    let rows = w
        .aggregator
        .summarize(
            &SummaryFilters::default()
                .with_district("Kumasi Metro")
                .with_sub_district("BANTAMA"),
        )
        .await
        .unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 1)]);
    assert_eq!(rows[0].suspected.ongoing_treatment, 1);
}

#[tokio::test]
async fn test_community_filter_by_name_and_id() {
    let w = populated().await;

    let by_name = w
        .aggregator
        .summarize(&SummaryFilters::default().with_community("asokwa"))
        .await
        .unwrap();
    assert_eq!(totals(&by_name), vec![("Cholera".to_string(), 3)]);

    let by_id = w
        .aggregator
        .summarize(&SummaryFilters::default().with_community(w.asokwa.id.to_string()))
        .await
        .unwrap();
    assert_eq!(by_id, by_name);
}

#[tokio::test]
async fn test_facility_filter_intersects_geography() {
    let w = populated().await;

    let inside = SummaryFilters::default()
        .with_region("Ashanti")
        .with_facility("Bantama Clinic");
    let rows = w.aggregator.summarize(&inside).await.unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 1)]);

    let outside = SummaryFilters::default()
        .with_region("Volta")
        .with_facility("Bantama Clinic");
    assert!(w.aggregator.summarize(&outside).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_filters_are_ignored() {
    let w = populated().await;

    let blank = SummaryFilters {
        case_type: Some("  ".to_string()),
        region: Some(String::new()),
        district: None,
        sub_district: Some(" ".to_string()),
        community: None,
        facility: Some("".to_string()),
    };
    let rows = w.aggregator.summarize(&blank).await.unwrap();
    let all = w
        .aggregator
        .summarize(&SummaryFilters::default())
        .await
        .unwrap();
    assert_eq!(rows, all);
}

#[tokio::test]
async fn test_no_cases_yields_empty_summary() {
    let w = world().await;
    let rows = w
        .aggregator
        .summarize(&SummaryFilters::default())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

/// Adds an "Asokwa" under `parent` with `count` confirmed cases at `facility`
async fn second_asokwa(
    w: &World,
    parent: CommunityParent,
    facility: &Facility,
    case_type: &CaseType,
    count: usize,
) -> Community {
    let community = Community::new("Asokwa", parent);
    w.store.insert_community(&community).await.unwrap();
    for _ in 0..count {
        let case = Case::new(case_type.id, facility.id, CaseStatus::Confirmed)
            .with_community(community.id)
            .with_patient_status("Deceased");
        w.store.insert_case(&case).await.unwrap();
    }
    community
}

#[tokio::test]
async fn test_community_filter_is_scoped_by_district() {
    let w = populated().await;
    let parent = CommunityParent::District(w.ho_municipal.id);
    second_asokwa(&w, parent, &w.ho, &w.measles, 2).await;

    let in_ho = SummaryFilters::default()
        .with_district("Ho Municipal")
        .with_community("Asokwa");
    let rows = w.aggregator.summarize(&in_ho).await.unwrap();
    assert_eq!(totals(&rows), vec![("Measles".to_string(), 2)]);
    assert_eq!(rows[0].confirmed.deceased, 2);

    let in_kumasi = SummaryFilters::default()
        .with_district("Kumasi Metro")
        .with_community("Asokwa");
    let rows = w.aggregator.summarize(&in_kumasi).await.unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 3)]);

    // Unscoped, the oldest "Asokwa" wins
    let unscoped = SummaryFilters::default().with_community("Asokwa");
    let rows = w.aggregator.summarize(&unscoped).await.unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 3)]);
}

#[tokio::test]
async fn test_sub_district_scope_takes_precedence_for_community() {
    let w = populated().await;
    let parent = CommunityParent::SubDistrict(w.bantama_sd.id);
    let nested = second_asokwa(&w, parent, &w.bantama, &w.cholera, 1).await;

    let with_sub_district = SummaryFilters::default()
        .with_district("Kumasi Metro")
        .with_sub_district("Bantama")
        .with_community("Asokwa");
    let rows = w.aggregator.summarize(&with_sub_district).await.unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 1)]);
    assert_eq!(rows[0].confirmed.deceased, 1);

    let by_id = SummaryFilters::default().with_community(nested.id.to_string());
    assert_eq!(w.aggregator.summarize(&by_id).await.unwrap(), rows);

    // District scope alone resolves the district-level "Asokwa"
    let district_only = SummaryFilters::default()
        .with_district("Kumasi Metro")
        .with_community("Asokwa");
    let rows = w.aggregator.summarize(&district_only).await.unwrap();
    assert_eq!(totals(&rows), vec![("Cholera".to_string(), 3)]);
    assert_eq!(rows[0].confirmed.deceased, 1);
}
