//! In-memory store backend
//!
//! Implements the same traits as PostgreSQL. Used by the test suite and by
//! `database_target = "memory"` for local previews.

pub mod store;

pub use store::MemoryStore;
