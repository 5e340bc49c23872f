// Vigil - Administrative geography and case aggregation for disease surveillance
// Copyright (c) 2025 Vigil Contributors
// Licensed under the MIT License

//! # Vigil - administrative geography and case aggregation
//!
//! Vigil is the geography core of a disease-surveillance backend. Officers
//! record cases against a four-level hierarchy (region → district →
//! sub-district → community) and health facilities placed in it; admins ask
//! for case totals filtered by any level of that hierarchy.
//!
//! ## Overview
//!
//! This library provides:
//! - **Resolving** hierarchy nodes from identifiers or case-insensitive names
//! - **Growing** the hierarchy through idempotent find-or-create
//! - **Choosing** the community a new case is recorded against
//! - **Repairing** legacy rows with misplaced parents or duplicate names
//! - **Summarizing** active cases per case type, status and patient outcome
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (geography, repair, summary)
//! - [`adapters`] - Store traits with PostgreSQL and in-memory backends
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::adapters::memory::MemoryStore;
//! use vigil::core::geography::{CommunityRequest, Geography, LocationPath};
//!
//! # async fn example() -> vigil::domain::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let geography = Geography::new(store.clone(), store);
//!
//! let request = CommunityRequest::named("Asokwa").with_location(LocationPath {
//!     region: Some("Ashanti".to_string()),
//!     district: Some("Kumasi Metro".to_string()),
//!     sub_district: None,
//! });
//! let (community_id, snapshot) = geography
//!     .policy()
//!     .resolve_case_location(&request, None)
//!     .await?;
//!
//! println!("{community_id} in district {:?}", snapshot.district_id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Vigil uses the [`domain::VigilError`] type for all errors:
//!
//! ```rust,no_run
//! use vigil::domain::VigilError;
//!
//! fn example() -> Result<(), VigilError> {
//!     let config = vigil::config::load_config("vigil.toml")?;
//!     config.validate().map_err(VigilError::Configuration)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! Vigil uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(region = "Ashanti", "Resolving location");
//! warn!(community = "Asokwa", "Duplicate community merged");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
