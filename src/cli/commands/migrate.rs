//! Migrate command implementation
//!
//! Creates the tables and lookup indexes if they do not exist yet.

use crate::cli::commands::connect;
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (_config, (hierarchy, _cases)) = match connect(config_path).await {
            Ok(connected) => connected,
            Err(code) => return Ok(code),
        };

        println!("🗄️  Applying schema to {}", hierarchy.backend_name());

        match hierarchy.ensure_schema().await {
            Ok(()) => {
                println!("✅ Schema is up to date");
                println!("   Run 'vigil repair' to build the community unique index");
                Ok(0)
            }
            Err(e) => {
                println!("❌ Schema migration failed");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }
}
