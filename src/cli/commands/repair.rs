//! Repair command implementation
//!
//! Runs the community repair pass against the configured store.

use crate::cli::commands::connect;
use crate::core::repair::{RepairOptions, RepairPass};
use crate::log_error_with_context;
use clap::Args;

/// Arguments for the repair command
#[derive(Args, Debug, Default)]
pub struct RepairArgs {
    /// Report what would change without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Do not build the community unique index afterwards
    #[arg(long)]
    pub skip_index: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RepairArgs {
    /// Command-line flags only ever tighten the configured behaviour
    pub fn options(&self, configured: RepairOptions) -> RepairOptions {
        RepairOptions {
            dry_run: configured.dry_run || self.dry_run,
            ensure_unique_index: configured.ensure_unique_index && !self.skip_index,
        }
    }

    /// Execute the repair command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (config, (hierarchy, _cases)) = match connect(config_path).await {
            Ok(connected) => connected,
            Err(code) => return Ok(code),
        };

        let options = self.options(RepairOptions::from(&config.repair));
        tracing::info!(
            dry_run = options.dry_run,
            ensure_unique_index = options.ensure_unique_index,
            "Running community repair"
        );

        if !self.json {
            if options.dry_run {
                println!("🔍 Previewing community repair (no changes will be written)");
            } else {
                println!("🛠️  Repairing communities");
            }
            println!();
        }

        let report = match RepairPass::new(hierarchy, options).run().await {
            Ok(r) => r,
            Err(e) => {
                log_error_with_context!(e, "Repair pass aborted");
                println!("❌ Repair pass aborted");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.format_summary());
        }

        if report.is_successful() {
            if !self.json {
                println!("✅ Repair completed");
            }
            Ok(0)
        } else {
            if !self.json {
                println!("⚠️  Repair completed with problems");
            }
            Ok(1) // Partial success exit code
        }
    }
}
