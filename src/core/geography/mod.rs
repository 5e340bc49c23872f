//! Administrative geography
//!
//! - [`resolver`] - Identifier or name lookups, optionally scoped to a parent
//! - [`upsert`] - Idempotent find-or-create per level
//! - [`community`] - Community selection for new cases
//! - [`snapshot`] - Ancestor walks for location snapshots and display names
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::adapters::memory::MemoryStore;
//! use vigil::core::geography::Geography;
//!
//! # async fn example() -> vigil::domain::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let geography = Geography::new(store.clone(), store);
//!
//! let region = geography.upserter().find_or_create_region("Ashanti").await?;
//! let district = geography
//!     .upserter()
//!     .find_or_create_district("Kumasi Metro", &region.id)
//!     .await?;
//! # let _ = district;
//! # Ok(())
//! # }
//! ```

pub mod community;
pub mod resolver;
pub mod snapshot;
pub mod upsert;

pub use community::{CommunityPolicy, CommunityRequest, LocationPath};
pub use resolver::Resolver;
pub use snapshot::{Lineage, Locator};
pub use upsert::Upserter;

use crate::adapters::database::{CaseStore, HierarchyStore};
use std::sync::Arc;

/// The geography services wired over one pair of stores
#[derive(Clone)]
pub struct Geography {
    resolver: Resolver,
    upserter: Upserter,
    locator: Locator,
    policy: CommunityPolicy,
}

impl Geography {
    pub fn new(
        hierarchy: Arc<dyn HierarchyStore + Send + Sync>,
        cases: Arc<dyn CaseStore + Send + Sync>,
    ) -> Self {
        let upserter = Upserter::new(hierarchy.clone());
        let locator = Locator::new(hierarchy.clone());
        Self {
            resolver: Resolver::new(hierarchy),
            policy: CommunityPolicy::new(upserter.clone(), locator.clone(), cases),
            upserter,
            locator,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn upserter(&self) -> &Upserter {
        &self.upserter
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn policy(&self) -> &CommunityPolicy {
        &self.policy
    }
}
