//! Community selection for a newly recorded case
//!
//! An officer either keeps their facility's community or names one. A named
//! community is placed under an explicit location path when both region and
//! district are given, otherwise under the facility's own parent.

use crate::adapters::database::CaseStore;
use crate::core::geography::snapshot::Locator;
use crate::core::geography::upsert::Upserter;
use crate::domain::hierarchy::normalize_name;
use crate::domain::ids::{CommunityId, FacilityId};
use crate::domain::{CommunityParent, Facility, LocationSnapshot, Result, VigilError};
use serde::Deserialize;
use std::sync::Arc;

/// Names of the ancestors a new community should sit under
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPath {
    pub region: Option<String>,
    pub district: Option<String>,
    pub sub_district: Option<String>,
}

impl LocationPath {
    fn region_name(&self) -> Option<String> {
        self.region.as_deref().and_then(normalize_name)
    }

    fn district_name(&self) -> Option<String> {
        self.district.as_deref().and_then(normalize_name)
    }

    fn sub_district_name(&self) -> Option<String> {
        self.sub_district.as_deref().and_then(normalize_name)
    }
}

/// Community-related fields of a case submission
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityRequest {
    #[serde(default)]
    pub use_facility_community: bool,
    pub community_name: Option<String>,
    pub location: Option<LocationPath>,
}

impl CommunityRequest {
    /// Request that keeps the officer's facility community
    pub fn facility_community() -> Self {
        Self {
            use_facility_community: true,
            ..Default::default()
        }
    }

    /// Request naming a community under the facility's parent
    pub fn named(community_name: impl Into<String>) -> Self {
        Self {
            community_name: Some(community_name.into()),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: LocationPath) -> Self {
        self.location = Some(location);
        self
    }
}

/// Applies the community selection rules on top of find-or-create
#[derive(Clone)]
pub struct CommunityPolicy {
    upserter: Upserter,
    locator: Locator,
    cases: Arc<dyn CaseStore + Send + Sync>,
}

fn facility_required(facility: Option<&Facility>) -> Result<&Facility> {
    facility.ok_or_else(|| {
        VigilError::InvalidInput(
            "The officer's facility is required to choose a community".to_string(),
        )
    })
}

impl CommunityPolicy {
    pub fn new(
        upserter: Upserter,
        locator: Locator,
        cases: Arc<dyn CaseStore + Send + Sync>,
    ) -> Self {
        Self {
            upserter,
            locator,
            cases,
        }
    }

    /// Choose the community a case is recorded against
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidInput`] when the facility is needed but
    /// not supplied, and propagates find-or-create failures.
    pub async fn resolve_community_for_case(
        &self,
        request: &CommunityRequest,
        facility: Option<&Facility>,
    ) -> Result<CommunityId> {
        if request.use_facility_community {
            return Ok(facility_required(facility)?.community_id);
        }

        let Some(name) = request.community_name.as_deref().and_then(normalize_name) else {
            return Ok(facility_required(facility)?.community_id);
        };

        if let Some(path) = &request.location {
            if let (Some(region), Some(district)) = (path.region_name(), path.district_name()) {
                let region = self.upserter.find_or_create_region(&region).await?;
                let district = self
                    .upserter
                    .find_or_create_district(&district, &region.id)
                    .await?;
                let parent = match path.sub_district_name() {
                    Some(sub_district) => {
                        let sub_district = self
                            .upserter
                            .find_or_create_sub_district(&sub_district, &district.id)
                            .await?;
                        CommunityParent::SubDistrict(sub_district.id)
                    }
                    None => CommunityParent::District(district.id),
                };
                let community = self.upserter.find_or_create_community(&name, parent).await?;
                return Ok(community.id);
            }
        }

        let facility = facility_required(facility)?;
        let parent = match facility.sub_district_id {
            Some(sub_district) => CommunityParent::SubDistrict(sub_district),
            None => CommunityParent::District(facility.district_id),
        };
        let community = self.upserter.find_or_create_community(&name, parent).await?;
        Ok(community.id)
    }

    /// Same as [`Self::resolve_community_for_case`], loading the facility by id
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::FacilityNotFound`] when `facility_id` is given
    /// but does not resolve.
    pub async fn resolve_for_facility_id(
        &self,
        request: &CommunityRequest,
        facility_id: Option<&FacilityId>,
    ) -> Result<CommunityId> {
        let facility = match facility_id {
            Some(id) => Some(
                self.cases
                    .get_facility(id)
                    .await?
                    .ok_or_else(|| VigilError::FacilityNotFound(id.to_string()))?,
            ),
            None => None,
        };
        self.resolve_community_for_case(request, facility.as_ref())
            .await
    }

    /// Community id plus the location snapshot to store on the case
    pub async fn resolve_case_location(
        &self,
        request: &CommunityRequest,
        facility: Option<&Facility>,
    ) -> Result<(CommunityId, LocationSnapshot)> {
        let community_id = self.resolve_community_for_case(request, facility).await?;
        let snapshot = self.locator.location_snapshot(&community_id).await?;
        tracing::debug!(community_id = %community_id, "Resolved case location");
        Ok((community_id, snapshot))
    }
}
