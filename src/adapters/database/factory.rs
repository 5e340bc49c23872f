//! Store factory
//!
//! Builds the hierarchy and case stores named by the configuration. Both
//! handles share one backend instance, so PostgreSQL uses a single pool.

use crate::adapters::database::traits::{CaseStore, HierarchyStore};
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{DatabaseTarget, VigilConfig};
use crate::domain::{Result, VigilError};
use std::sync::Arc;

/// Shared store handles
pub type Stores = (
    Arc<dyn HierarchyStore + Send + Sync>,
    Arc<dyn CaseStore + Send + Sync>,
);

/// Create both stores from the same underlying backend
///
/// # Errors
///
/// Returns an error if the backend cannot be created
pub async fn create_stores(config: &VigilConfig) -> Result<Stores> {
    match config.database_target {
        DatabaseTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                VigilError::Configuration(
                    "postgresql configuration is required when database_target = 'postgresql'"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL stores");
            let client = Arc::new(PostgreSQLClient::new(pg_config.clone()).await?);
            let adapter = Arc::new(PostgreSQLAdapter::new_with_arc(client));

            Ok((
                adapter.clone() as Arc<dyn HierarchyStore + Send + Sync>,
                adapter as Arc<dyn CaseStore + Send + Sync>,
            ))
        }
        DatabaseTarget::Memory => {
            tracing::info!("Creating in-memory stores");
            let store = Arc::new(MemoryStore::new());

            Ok((
                store.clone() as Arc<dyn HierarchyStore + Send + Sync>,
                store as Arc<dyn CaseStore + Send + Sync>,
            ))
        }
    }
}
