//! PostgreSQL backend
//!
//! Pooled `tokio-postgres` connections, optional TLS, and transactional
//! community moves and merges.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
