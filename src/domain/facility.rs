//! Health facility model
//!
//! Facilities are owned by the surrounding application. The geography core
//! only reads them (for fallback communities and summary filters) and
//! re-points their `community_id` when duplicate communities are merged.

use super::ids::{CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
    pub region_id: RegionId,
    pub district_id: DistrictId,
    pub sub_district_id: Option<SubDistrictId>,
    pub community_id: CommunityId,
}

impl Facility {
    pub fn new(
        name: impl Into<String>,
        region_id: RegionId,
        district_id: DistrictId,
        community_id: CommunityId,
    ) -> Self {
        Self {
            id: FacilityId::new(),
            name: name.into(),
            region_id,
            district_id,
            sub_district_id: None,
            community_id,
        }
    }

    pub fn with_sub_district(mut self, sub_district_id: SubDistrictId) -> Self {
        self.sub_district_id = Some(sub_district_id);
        self
    }
}

/// Geographic restriction on the facility set
///
/// Every present level must match (AND semantics). An empty filter matches
/// all facilities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacilityGeoFilter {
    pub region_id: Option<RegionId>,
    pub district_id: Option<DistrictId>,
    pub sub_district_id: Option<SubDistrictId>,
}

impl FacilityGeoFilter {
    pub fn is_empty(&self) -> bool {
        self.region_id.is_none() && self.district_id.is_none() && self.sub_district_id.is_none()
    }

    pub fn matches(&self, facility: &Facility) -> bool {
        self.region_id.map_or(true, |id| facility.region_id == id)
            && self.district_id.map_or(true, |id| facility.district_id == id)
            && self
                .sub_district_id
                .map_or(true, |id| facility.sub_district_id == Some(id))
    }
}
