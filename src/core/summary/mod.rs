//! Case summaries
//!
//! - [`filters`] - Optional id-or-name filters
//! - [`aggregator`] - Filter resolution and counting
//! - [`report`] - Per-case-type rows

pub mod aggregator;
pub mod filters;
pub mod report;

pub use aggregator::SummaryAggregator;
pub use filters::SummaryFilters;
pub use report::{roll_up, CaseTypeSummary, StatusBreakdown};
