//! Find-or-create for hierarchy nodes
//!
//! A lookup under the parent runs first; only a miss inserts. When the store
//! rejects the insert with a uniqueness conflict (another writer won the race
//! and a unique index exists), the lookup is retried once and the winner is
//! returned. Without an index concurrent duplicates are possible; the repair
//! pass merges them later.

use crate::adapters::database::HierarchyStore;
use crate::domain::hierarchy::normalize_name;
use crate::domain::ids::{DistrictId, RegionId};
use crate::domain::{
    Community, CommunityParent, District, HierarchyLevel, HierarchyNode, ParentScope, Region,
    Result, SubDistrict, VigilError,
};
use crate::log_node_created;
use std::sync::Arc;

/// Idempotent node creation over the hierarchy store
#[derive(Clone)]
pub struct Upserter {
    store: Arc<dyn HierarchyStore + Send + Sync>,
}

fn required_name(level: HierarchyLevel, name: &str) -> Result<String> {
    normalize_name(name)
        .ok_or_else(|| VigilError::InvalidInput(format!("A {level} name is required")))
}

/// Turns a lost insert race into the winner's row
fn conflict_winner<T>(error: VigilError, winner: Option<T>) -> Result<T> {
    match winner {
        Some(node) => {
            tracing::debug!(error = %error, "Insert lost a uniqueness race, using existing row");
            Ok(node)
        }
        None => Err(error),
    }
}

impl Upserter {
    pub fn new(store: Arc<dyn HierarchyStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Find or create a node at any level
    ///
    /// `parent` must be given for every level below region and must name a
    /// level allowed as that node's parent.
    ///
    /// # Errors
    ///
    /// - [`VigilError::InvalidInput`] for a blank name, a missing parent or a
    ///   parent of the wrong level
    /// - [`VigilError::NotFound`] when the parent does not exist
    pub async fn find_or_create(
        &self,
        level: HierarchyLevel,
        name: &str,
        parent: Option<ParentScope>,
    ) -> Result<HierarchyNode> {
        match (level, parent) {
            (HierarchyLevel::Region, None) => {
                self.find_or_create_region(name).await.map(HierarchyNode::Region)
            }
            (HierarchyLevel::District, Some(ParentScope::Region(region))) => self
                .find_or_create_district(name, &region)
                .await
                .map(HierarchyNode::District),
            (HierarchyLevel::SubDistrict, Some(ParentScope::District(district))) => self
                .find_or_create_sub_district(name, &district)
                .await
                .map(HierarchyNode::SubDistrict),
            (HierarchyLevel::Community, Some(ParentScope::District(district))) => self
                .find_or_create_community(name, CommunityParent::District(district))
                .await
                .map(HierarchyNode::Community),
            (HierarchyLevel::Community, Some(ParentScope::SubDistrict(sub_district))) => self
                .find_or_create_community(name, CommunityParent::SubDistrict(sub_district))
                .await
                .map(HierarchyNode::Community),
            (HierarchyLevel::Region, Some(scope)) => Err(VigilError::InvalidInput(format!(
                "A region has no parent, got {scope}"
            ))),
            (level, None) => Err(VigilError::InvalidInput(format!(
                "A {level} requires a parent reference"
            ))),
            (level, Some(scope)) => Err(VigilError::InvalidInput(format!(
                "A {} cannot be the parent of a {level}",
                scope.level()
            ))),
        }
    }

    pub async fn find_or_create_region(&self, name: &str) -> Result<Region> {
        let name = required_name(HierarchyLevel::Region, name)?;

        if let Some(existing) = self.store.find_region_by_name(&name).await? {
            return Ok(existing);
        }

        let region = Region::new(name);
        match self.store.insert_region(&region).await {
            Ok(()) => {
                log_node_created!(HierarchyLevel::Region, region.id, region.name);
                Ok(region)
            }
            Err(e) if e.is_conflict() => {
                let winner = self.store.find_region_by_name(&region.name).await?;
                conflict_winner(e, winner)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_or_create_district(
        &self,
        name: &str,
        region_id: &RegionId,
    ) -> Result<District> {
        let name = required_name(HierarchyLevel::District, name)?;

        if self.store.get_region(region_id).await?.is_none() {
            return Err(VigilError::not_found(
                HierarchyLevel::Region,
                region_id.to_string(),
            ));
        }
        if let Some(existing) = self
            .store
            .find_district_by_name(&name, Some(region_id))
            .await?
        {
            return Ok(existing);
        }

        let district = District::new(name, *region_id);
        match self.store.insert_district(&district).await {
            Ok(()) => {
                log_node_created!(HierarchyLevel::District, district.id, district.name);
                Ok(district)
            }
            Err(e) if e.is_conflict() => {
                let winner = self
                    .store
                    .find_district_by_name(&district.name, Some(region_id))
                    .await?;
                conflict_winner(e, winner)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn find_or_create_sub_district(
        &self,
        name: &str,
        district_id: &DistrictId,
    ) -> Result<SubDistrict> {
        let name = required_name(HierarchyLevel::SubDistrict, name)?;

        if self.store.get_district(district_id).await?.is_none() {
            return Err(VigilError::not_found(
                HierarchyLevel::District,
                district_id.to_string(),
            ));
        }
        if let Some(existing) = self
            .store
            .find_sub_district_by_name(&name, Some(district_id))
            .await?
        {
            return Ok(existing);
        }

        let sub_district = SubDistrict::new(name, *district_id);
        match self.store.insert_sub_district(&sub_district).await {
            Ok(()) => {
                log_node_created!(
                    HierarchyLevel::SubDistrict,
                    sub_district.id,
                    sub_district.name
                );
                Ok(sub_district)
            }
            Err(e) if e.is_conflict() => {
                let winner = self
                    .store
                    .find_sub_district_by_name(&sub_district.name, Some(district_id))
                    .await?;
                conflict_winner(e, winner)
            }
            Err(e) => Err(e),
        }
    }

    /// Find or create a community under exactly one parent
    pub async fn find_or_create_community(
        &self,
        name: &str,
        parent: CommunityParent,
    ) -> Result<Community> {
        let name = required_name(HierarchyLevel::Community, name)?;
        self.ensure_parent_exists(&parent).await?;

        if let Some(existing) = self.store.find_community_by_name(&name, Some(&parent)).await? {
            return Ok(existing);
        }

        let community = Community::new(name, parent);
        match self.store.insert_community(&community).await {
            Ok(()) => {
                log_node_created!(HierarchyLevel::Community, community.id, community.name);
                Ok(community)
            }
            Err(e) if e.is_conflict() => {
                let winner = self
                    .store
                    .find_community_by_name(&community.name, Some(&parent))
                    .await?;
                conflict_winner(e, winner)
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_parent_exists(&self, parent: &CommunityParent) -> Result<()> {
        let exists = match parent {
            CommunityParent::District(id) => self.store.get_district(id).await?.is_some(),
            CommunityParent::SubDistrict(id) => self.store.get_sub_district(id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(VigilError::not_found(
                parent.level(),
                ParentScope::from(*parent).as_uuid().to_string(),
            ))
        }
    }
}
