//! Store abstraction layer
//!
//! Trait-based access to the hierarchy and case collections, with a factory
//! that picks the backend named by `database_target`.

pub mod factory;
pub mod traits;

pub use factory::create_stores;
pub use traits::{CaseCount, CaseFilter, CaseStore, HierarchyStore, MergeOutcome, MoveOutcome};
