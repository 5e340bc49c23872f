//! Store abstraction traits
//!
//! The geography and aggregation logic talks to persistence only through
//! these traits, so PostgreSQL and the in-memory store are interchangeable.

use crate::domain::ids::{
    CaseTypeId, CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId,
};
use crate::domain::{
    Case, CaseStatus, CaseType, Community, CommunityParent, District, Facility, FacilityGeoFilter,
    Region, Result, SubDistrict,
};
use async_trait::async_trait;
use serde::Serialize;

/// Dependents moved from a deleted duplicate onto its survivor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub facilities_repointed: u64,
    pub cases_repointed: u64,
}

/// What happened to a community whose district id sat in the sub-district slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MoveOutcome {
    /// The row no longer holds the district id in its sub-district slot
    Unchanged,
    /// `district_id` now holds the value, `sub_district_id` is cleared
    Relocated,
    /// A same-name community already existed under the district and absorbed this one
    Merged {
        survivor: CommunityId,
        #[serde(flatten)]
        dependents: MergeOutcome,
    },
}

/// Restriction applied when counting cases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaseFilter {
    pub case_type_id: Option<CaseTypeId>,
    /// `Some` restricts to these facilities; an empty list matches nothing
    pub facility_ids: Option<Vec<FacilityId>>,
    pub community_id: Option<CommunityId>,
}

/// One group of active, non-archived cases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseCount {
    pub case_type_id: CaseTypeId,
    pub case_type_name: String,
    pub status: CaseStatus,
    /// Stored patient status, verbatim
    pub patient_status: Option<String>,
    pub count: u64,
}

/// Persistent administrative hierarchy
///
/// Name lookups are trimmed, case-insensitive and exact. When several rows
/// match (possible without the unique index) the oldest one wins.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Verify the store is reachable
    async fn test_connection(&self) -> Result<()>;

    /// Create tables and lookup indexes if they do not exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Short backend label for logs
    fn backend_name(&self) -> &str;

    async fn get_region(&self, id: &RegionId) -> Result<Option<Region>>;
    async fn get_district(&self, id: &DistrictId) -> Result<Option<District>>;
    async fn get_sub_district(&self, id: &SubDistrictId) -> Result<Option<SubDistrict>>;
    async fn get_community(&self, id: &CommunityId) -> Result<Option<Community>>;

    async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>>;

    /// `None` scope matches across all regions
    async fn find_district_by_name(
        &self,
        name: &str,
        region_id: Option<&RegionId>,
    ) -> Result<Option<District>>;

    /// `None` scope matches across all districts
    async fn find_sub_district_by_name(
        &self,
        name: &str,
        district_id: Option<&DistrictId>,
    ) -> Result<Option<SubDistrict>>;

    /// Scoped by the parent column matching the parent kind; `None` matches globally
    async fn find_community_by_name(
        &self,
        name: &str,
        parent: Option<&CommunityParent>,
    ) -> Result<Option<Community>>;

    /// Insert a new row
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::VigilError::Conflict`] when a uniqueness
    /// constraint rejects the row.
    async fn insert_region(&self, region: &Region) -> Result<()>;
    async fn insert_district(&self, district: &District) -> Result<()>;
    async fn insert_sub_district(&self, sub_district: &SubDistrict) -> Result<()>;
    async fn insert_community(&self, community: &Community) -> Result<()>;

    /// All communities, ordered by lowercase name, creation time, then id
    async fn list_communities(&self) -> Result<Vec<Community>>;

    /// Communities with no district and a sub-district reference set
    async fn list_repair_candidates(&self) -> Result<Vec<Community>>;

    /// Moves `community_id` under `district_id`, or merges it into a
    /// same-name community already there, as one atomic unit
    ///
    /// The row must still have no district and `district_id` in its
    /// sub-district slot when locked; otherwise nothing is written and
    /// [`MoveOutcome::Unchanged`] is returned.
    async fn move_community_to_district(
        &self,
        community_id: &CommunityId,
        district_id: &DistrictId,
    ) -> Result<MoveOutcome>;

    /// Re-points facilities and cases from `duplicate` to `survivor`, then
    /// deletes `duplicate`, as one atomic unit
    ///
    /// Returns `None` without writing when the two rows no longer share a
    /// (name, district, sub-district) key.
    async fn merge_communities(
        &self,
        duplicate: &CommunityId,
        survivor: &CommunityId,
    ) -> Result<Option<MergeOutcome>>;

    /// Build the unique index over (name, district, sub-district)
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::VigilError::Conflict`] when duplicates remain.
    async fn ensure_community_unique_index(&self) -> Result<()>;
}

/// Read access to facilities, case types and cases
#[async_trait]
pub trait CaseStore: Send + Sync {
    async fn get_facility(&self, id: &FacilityId) -> Result<Option<Facility>>;

    /// Exact, case-insensitive facility name match
    async fn find_facility_by_name(&self, name: &str) -> Result<Option<Facility>>;

    /// Ids of facilities matching every level present in `filter`
    async fn find_facility_ids(&self, filter: &FacilityGeoFilter) -> Result<Vec<FacilityId>>;

    async fn get_case_type(&self, id: &CaseTypeId) -> Result<Option<CaseType>>;

    /// Exact, case-insensitive case-type name match
    async fn find_case_type_by_name(&self, name: &str) -> Result<Option<CaseType>>;

    /// Counts non-archived suspected/confirmed cases grouped by
    /// (case type, status, patient status)
    async fn count_active_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseCount>>;

    async fn insert_facility(&self, facility: &Facility) -> Result<()>;
    async fn insert_case_type(&self, case_type: &CaseType) -> Result<()>;
    async fn insert_case(&self, case: &Case) -> Result<()>;
}
