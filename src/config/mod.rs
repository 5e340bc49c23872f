//! Configuration management for Vigil.
//!
//! Vigil reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VIGIL_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vigil::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("vigil.toml")?;
//! println!("Store: {:?}", config.database_target);
//! println!("Repair dry run: {}", config.repair.dry_run);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//! database_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [postgresql]
//! connection_string = "${VIGIL_DATABASE_URL}"
//! max_connections = 10
//! ssl_mode = "require"
//!
//! [repair]
//! dry_run = false
//! ensure_unique_index = true
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/vigil"
//! local_rotation = "daily"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DatabaseTarget, Environment, LoggingConfig, PostgreSQLConfig,
    RepairConfig, VigilConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
