//! Ancestor lookups for a community
//!
//! Both the stored location snapshot and the display names are derived from
//! the community's authoritative parent references. A district id sitting in
//! the `sub_district_id` slot is recognised and treated as the district.

use crate::adapters::database::HierarchyStore;
use crate::domain::ids::{CommunityId, DistrictId};
use crate::domain::{
    Community, District, HierarchyLevel, LocationNames, LocationSnapshot, Region, Result,
    SubDistrict, VigilError,
};
use std::sync::Arc;

/// A community with every ancestor that could be found
#[derive(Debug, Clone, PartialEq)]
pub struct Lineage {
    pub community: Community,
    pub sub_district: Option<SubDistrict>,
    pub district: Option<District>,
    pub region: Option<Region>,
}

impl Lineage {
    pub fn snapshot(&self) -> LocationSnapshot {
        LocationSnapshot {
            region_id: self.region.as_ref().map(|r| r.id),
            district_id: self.district.as_ref().map(|d| d.id),
            sub_district_id: self.sub_district.as_ref().map(|s| s.id),
            community_id: Some(self.community.id),
        }
    }

    pub fn names(&self) -> LocationNames {
        LocationNames {
            region: self.region.as_ref().map(|r| r.name.clone()),
            district: self.district.as_ref().map(|d| d.name.clone()),
            sub_district: self.sub_district.as_ref().map(|s| s.name.clone()),
            community: self.community.name.clone(),
        }
    }
}

/// Walks community → sub-district → district → region
#[derive(Clone)]
pub struct Locator {
    store: Arc<dyn HierarchyStore + Send + Sync>,
}

impl Locator {
    pub fn new(store: Arc<dyn HierarchyStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns [`VigilError::NotFound`] when the community does not exist.
    pub async fn lineage(&self, community_id: &CommunityId) -> Result<Lineage> {
        let community = self.store.get_community(community_id).await?.ok_or_else(|| {
            VigilError::not_found(HierarchyLevel::Community, community_id.to_string())
        })?;

        let mut sub_district = None;
        let mut district = None;

        if let Some(sub_district_id) = community.sub_district_id {
            match self.store.get_sub_district(&sub_district_id).await? {
                Some(found) => {
                    district = self.store.get_district(&found.district_id).await?;
                    sub_district = Some(found);
                }
                None => {
                    let misplaced = DistrictId::from_uuid(*sub_district_id.as_uuid());
                    district = self.store.get_district(&misplaced).await?;
                }
            }
        }
        if district.is_none() {
            if let Some(district_id) = community.district_id {
                district = self.store.get_district(&district_id).await?;
            }
        }

        let region = match &district {
            Some(d) => self.store.get_region(&d.region_id).await?,
            None => None,
        };

        Ok(Lineage {
            community,
            sub_district,
            district,
            region,
        })
    }

    /// Recompute the location snapshot stored on a case
    pub async fn location_snapshot(&self, community_id: &CommunityId) -> Result<LocationSnapshot> {
        Ok(self.lineage(community_id).await?.snapshot())
    }

    /// Denormalized names of a community and its ancestors
    pub async fn describe_community(&self, community_id: &CommunityId) -> Result<LocationNames> {
        Ok(self.lineage(community_id).await?.names())
    }
}
