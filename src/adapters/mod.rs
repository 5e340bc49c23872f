//! Storage integrations for Vigil.
//!
//! - [`database`] - Backend-neutral store traits and the factory
//! - [`postgresql`] - PostgreSQL implementation
//! - [`memory`] - In-process implementation for tests and previews
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern**: the core only talks to the
//! [`database::HierarchyStore`] and [`database::CaseStore`] traits, and the
//! factory picks a backend from configuration.
//!
//! ```rust,no_run
//! use vigil::adapters::database::create_stores;
//! use vigil::config::load_config;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//! let (hierarchy, cases) = create_stores(&config).await?;
//! hierarchy.test_connection().await?;
//! # let _ = cases;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
