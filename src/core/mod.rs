//! Core business logic for Vigil.
//!
//! # Modules
//!
//! - [`geography`] - Resolution, find-or-create, community policy, ancestor walks
//! - [`repair`] - Offline repair of misplaced parents and duplicate communities
//! - [`summary`] - Case summaries filtered by any level of the hierarchy
//!
//! # Write path
//!
//! 1. **Choose community**: [`geography::CommunityPolicy`] picks the facility
//!    community or a named one
//! 2. **Find or create**: [`geography::Upserter`] grows the hierarchy as needed
//! 3. **Snapshot**: [`geography::Locator`] recomputes the case's location ids
//!
//! # Read path
//!
//! [`summary::SummaryAggregator`] resolves each filter through
//! [`geography::Resolver`], restricts the case set and rolls up the counts.
//!
//! # Example
//!
//! ```rust,no_run
//! use vigil::adapters::database::create_stores;
//! use vigil::config::load_config;
//! use vigil::core::geography::Geography;
//! use vigil::core::summary::{SummaryAggregator, SummaryFilters};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//! let (hierarchy, cases) = create_stores(&config).await?;
//! let geography = Geography::new(hierarchy, cases.clone());
//!
//! let aggregator = SummaryAggregator::new(geography.resolver().clone(), cases);
//! let rows = aggregator
//!     .summarize(&SummaryFilters::default().with_region("Ashanti"))
//!     .await?;
//!
//! for row in rows {
//!     println!("{}: {}", row.name, row.total);
//! }
//! # Ok(())
//! # }
//! ```

pub mod geography;
pub mod repair;
pub mod summary;
