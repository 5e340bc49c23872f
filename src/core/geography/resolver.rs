//! Name and identifier resolution
//!
//! Looks up a hierarchy node from either an identifier or a free-text name.
//! Identifiers are matched directly and ignore any scope; names are trimmed,
//! compared case-insensitively and scoped to a parent when one is given.

use crate::adapters::database::HierarchyStore;
use crate::domain::ids::{is_identifier, CommunityId, DistrictId, RegionId, SubDistrictId};
use crate::domain::{
    Community, CommunityParent, District, HierarchyLevel, HierarchyNode, ParentScope, Region,
    Result, SubDistrict, VigilError,
};
use std::sync::Arc;

/// Read-only resolver over the hierarchy store
#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn HierarchyStore + Send + Sync>,
}

impl Resolver {
    pub fn new(store: Arc<dyn HierarchyStore + Send + Sync>) -> Self {
        Self { store }
    }

    /// Resolve `value` at `level`, optionally under `scope`
    ///
    /// Returns `Ok(None)` when nothing matches, including for blank values.
    /// Without a scope, districts, sub-districts and communities match
    /// globally and the oldest of several same-name rows is returned.
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidInput`] when `scope` is not a valid
    /// parent level for `level`, and propagates store failures.
    pub async fn resolve(
        &self,
        level: HierarchyLevel,
        value: &str,
        scope: Option<&ParentScope>,
    ) -> Result<Option<HierarchyNode>> {
        check_scope(level, scope)?;

        let node = match level {
            HierarchyLevel::Region => self.region(value).await?.map(HierarchyNode::Region),
            HierarchyLevel::District => {
                let region = match scope {
                    Some(ParentScope::Region(id)) => Some(id),
                    _ => None,
                };
                self.district(value, region)
                    .await?
                    .map(HierarchyNode::District)
            }
            HierarchyLevel::SubDistrict => {
                let district = match scope {
                    Some(ParentScope::District(id)) => Some(id),
                    _ => None,
                };
                self.sub_district(value, district)
                    .await?
                    .map(HierarchyNode::SubDistrict)
            }
            HierarchyLevel::Community => {
                let parent = match scope {
                    Some(ParentScope::District(id)) => Some(CommunityParent::District(*id)),
                    Some(ParentScope::SubDistrict(id)) => Some(CommunityParent::SubDistrict(*id)),
                    _ => None,
                };
                self.community(value, parent.as_ref())
                    .await?
                    .map(HierarchyNode::Community)
            }
        };

        Ok(node)
    }

    /// Whether a node named `name` exists at `level` under `scope`
    ///
    /// # Errors
    ///
    /// Returns [`VigilError::InvalidInput`] for a blank name or a scope of
    /// the wrong level.
    pub async fn exists(
        &self,
        level: HierarchyLevel,
        name: &str,
        scope: Option<&ParentScope>,
    ) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(VigilError::InvalidInput(format!(
                "A {level} name is required"
            )));
        }
        Ok(self.resolve(level, name, scope).await?.is_some())
    }

    pub async fn region(&self, value: &str) -> Result<Option<Region>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if is_identifier(value) {
            return match RegionId::parse(value) {
                Ok(id) => self.store.get_region(&id).await,
                Err(_) => Ok(None),
            };
        }
        self.store.find_region_by_name(value).await
    }

    pub async fn district(
        &self,
        value: &str,
        region: Option<&RegionId>,
    ) -> Result<Option<District>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if is_identifier(value) {
            return match DistrictId::parse(value) {
                Ok(id) => self.store.get_district(&id).await,
                Err(_) => Ok(None),
            };
        }
        self.store.find_district_by_name(value, region).await
    }

    pub async fn sub_district(
        &self,
        value: &str,
        district: Option<&DistrictId>,
    ) -> Result<Option<SubDistrict>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if is_identifier(value) {
            return match SubDistrictId::parse(value) {
                Ok(id) => self.store.get_sub_district(&id).await,
                Err(_) => Ok(None),
            };
        }
        self.store.find_sub_district_by_name(value, district).await
    }

    pub async fn community(
        &self,
        value: &str,
        parent: Option<&CommunityParent>,
    ) -> Result<Option<Community>> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        if is_identifier(value) {
            return match CommunityId::parse(value) {
                Ok(id) => self.store.get_community(&id).await,
                Err(_) => Ok(None),
            };
        }
        self.store.find_community_by_name(value, parent).await
    }
}

fn check_scope(level: HierarchyLevel, scope: Option<&ParentScope>) -> Result<()> {
    match scope {
        Some(scope) if !level.parent_levels().contains(&scope.level()) => {
            Err(VigilError::InvalidInput(format!(
                "A {} cannot scope a {level} lookup",
                scope.level()
            )))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;

    async fn seeded() -> (Resolver, Arc<MemoryStore>, Region, District) {
        let store = Arc::new(MemoryStore::new());
        let region = Region::new("Ashanti");
        let district = District::new("Kumasi Metro", region.id);
        store.insert_region(&region).await.unwrap();
        store.insert_district(&district).await.unwrap();
        (Resolver::new(store.clone()), store, region, district)
    }

    #[tokio::test]
    async fn test_resolve_by_name_ignores_case_and_whitespace() {
        let (resolver, _, region, _) = seeded().await;

        let found = resolver.region("  aSHANTI ").await.unwrap().unwrap();
        assert_eq!(found.id, region.id);
        assert_eq!(found.name, "Ashanti");
    }

    #[tokio::test]
    async fn test_resolve_by_id_ignores_scope() {
        let (resolver, _, _, district) = seeded().await;
        let other_region = ParentScope::Region(RegionId::new());

        let node = resolver
            .resolve(
                HierarchyLevel::District,
                &district.id.to_string(),
                Some(&other_region),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(node.id(), *district.id.as_uuid());
    }

    #[tokio::test]
    async fn test_scoped_lookup_misses_other_parent() {
        let (resolver, _, _, _) = seeded().await;
        let other_region = RegionId::new();

        let found = resolver
            .district("Kumasi Metro", Some(&other_region))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_unknown_and_blank_values_resolve_to_none() {
        let (resolver, _, _, _) = seeded().await;

        assert!(resolver.region("Volta").await.unwrap().is_none());
        assert!(resolver.region("   ").await.unwrap().is_none());
        assert!(resolver
            .region(&RegionId::new().to_string())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_wrong_scope_level_is_invalid_input() {
        let (resolver, _, region, _) = seeded().await;
        let scope = ParentScope::Region(region.id);

        let result = resolver
            .resolve(HierarchyLevel::Community, "Asokwa", Some(&scope))
            .await;
        assert!(matches!(result, Err(VigilError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_exists_rejects_blank_name() {
        let (resolver, _, _, _) = seeded().await;

        let result = resolver.exists(HierarchyLevel::Region, " ", None).await;
        assert!(matches!(result, Err(VigilError::InvalidInput(_))));
        assert!(resolver
            .exists(HierarchyLevel::Region, "ashanti", None)
            .await
            .unwrap());
    }
}
