//! CLI command implementations
//!
//! Every command returns a process exit code: 0 success, 1 partial success,
//! 2 configuration error, 4 connection error, 5 fatal error.

pub mod exists;
pub mod init;
pub mod migrate;
pub mod repair;
pub mod summary;
pub mod validate;

use crate::adapters::database::factory::Stores;
use crate::adapters::database::create_stores;
use crate::config::{load_config, VigilConfig};
use crate::domain::VigilError;

/// Load the configuration and connect to the configured store
///
/// On failure the error has already been printed and the exit code is
/// returned as `Err`.
pub(crate) async fn connect(config_path: &str) -> Result<(VigilConfig, Stores), i32> {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            println!("❌ Failed to load configuration file");
            println!("   Error: {e}");
            return Err(2); // Configuration error exit code
        }
    };

    let stores = match create_stores(&config).await {
        Ok(s) => s,
        Err(e @ VigilError::Configuration(_)) => {
            println!("❌ Invalid store configuration");
            println!("   Error: {e}");
            return Err(2);
        }
        Err(e) => {
            println!("❌ Failed to connect to database");
            println!("   Error: {e}");
            return Err(4); // Connection error exit code
        }
    };

    if let Err(e) = stores.0.test_connection().await {
        println!("❌ Failed to connect to database");
        println!("   Error: {e}");
        return Err(4);
    }

    Ok((config, stores))
}
