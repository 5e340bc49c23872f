//! Logging and observability
//!
//! Structured logging via `tracing`, plus a few macros that keep the field
//! names of recurring events consistent across the crate.
//!
//! # Example
//!
//! ```no_run
//! use vigil::logging::init_logging;
//! use vigil::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(region = "Ashanti", "Resolving location");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log one repair action against a community
///
/// # Example
///
/// ```no_run
/// use vigil::log_repair_action;
/// use vigil::domain::CommunityId;
///
/// let id = CommunityId::new();
/// log_repair_action!("relocated", &id, "Asokwa", "sub_district_id -> district_id");
/// ```
#[macro_export]
macro_rules! log_repair_action {
    ($action:expr, $community_id:expr, $name:expr, $detail:expr) => {
        tracing::info!(
            action = $action,
            community_id = %$community_id,
            community = %$name,
            detail = %$detail,
            "Repair action"
        );
    };
}

/// Log a node created by find-or-create
///
/// # Example
///
/// ```no_run
/// use vigil::log_node_created;
/// use vigil::domain::HierarchyLevel;
///
/// log_node_created!(HierarchyLevel::Region, "7d44b88c-4199-4bad-97dc-d78268e01398", "Ashanti");
/// ```
#[macro_export]
macro_rules! log_node_created {
    ($level:expr, $id:expr, $name:expr) => {
        tracing::info!(
            level = %$level,
            id = %$id,
            name = %$name,
            "Created hierarchy node"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use vigil::log_error_with_context;
/// use vigil::domain::VigilError;
///
/// let error = VigilError::Persistence("connection reset".to_string());
/// log_error_with_context!(&error, "Failed to merge community");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
