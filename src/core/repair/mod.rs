//! Community repair and deduplication
//!
//! - [`pass`] - The two-phase repair run
//! - [`report`] - Counts and per-record detail lines
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vigil::adapters::memory::MemoryStore;
//! use vigil::core::repair::{RepairOptions, RepairPass};
//!
//! # async fn example() -> vigil::domain::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let report = RepairPass::new(store, RepairOptions::default()).run().await?;
//! println!("{}", report.format_summary());
//! # Ok(())
//! # }
//! ```

pub mod pass;
pub mod report;

pub use pass::{RepairOptions, RepairPass};
pub use report::{RepairAction, RepairDetail, RepairPhase, RepairReport};
