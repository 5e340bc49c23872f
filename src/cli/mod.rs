//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Vigil using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Vigil - administrative geography and case summaries
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(version, about, long_about = None)]
#[command(author = "Vigil Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "vigil.toml", env = "VIGIL_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VIGIL_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Create tables and lookup indexes
    Migrate(commands::migrate::MigrateArgs),

    /// Repair misplaced community parents and merge duplicates
    Repair(commands::repair::RepairArgs),

    /// Show case totals per case type
    Summary(commands::summary::SummaryArgs),

    /// Check whether a named hierarchy node exists
    Exists(commands::exists::ExistsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::HierarchyLevel;

    #[test]
    fn test_cli_parse_repair() {
        let cli = Cli::parse_from(["vigil", "repair"]);
        assert_eq!(cli.config, "vigil.toml");
        assert!(matches!(cli.command, Commands::Repair(_)));
    }

    #[test]
    fn test_cli_parse_repair_flags() {
        let cli = Cli::parse_from(["vigil", "repair", "--dry-run", "--skip-index", "--json"]);
        match cli.command {
            Commands::Repair(args) => {
                assert!(args.dry_run);
                assert!(args.skip_index);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["vigil", "--config", "custom.toml", "migrate"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::Migrate(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["vigil", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_summary_filters() {
        let cli = Cli::parse_from([
            "vigil",
            "summary",
            "--region",
            "Ashanti",
            "--sub-district",
            "Bantama",
            "--case-type",
            "Cholera",
        ]);
        match cli.command {
            Commands::Summary(args) => {
                assert_eq!(args.region.as_deref(), Some("Ashanti"));
                assert_eq!(args.sub_district.as_deref(), Some("Bantama"));
                assert_eq!(args.case_type.as_deref(), Some("Cholera"));
                assert!(args.district.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_exists() {
        let cli = Cli::parse_from(["vigil", "exists", "sub-district", "Bantama"]);
        match cli.command {
            Commands::Exists(args) => {
                assert_eq!(args.level, HierarchyLevel::SubDistrict);
                assert_eq!(args.name, "Bantama");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["vigil", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
