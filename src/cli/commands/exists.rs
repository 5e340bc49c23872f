//! Exists command implementation
//!
//! Checks whether a named node exists at a hierarchy level. Exits 0 when it
//! does and 1 when it does not.

use crate::cli::commands::connect;
use crate::core::geography::Resolver;
use crate::domain::{HierarchyLevel, ParentScope};
use clap::Args;

/// Arguments for the exists command
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// region, district, sub-district or community
    pub level: HierarchyLevel,

    /// Name to look up (case-insensitive, exact)
    pub name: String,

    /// Identifier of the parent to scope the lookup to
    #[arg(long)]
    pub parent: Option<String>,

    /// Level of --parent; defaults to the nearest parent level
    #[arg(long)]
    pub parent_level: Option<HierarchyLevel>,
}

impl ExistsArgs {
    /// Parse `--parent` into a scope for `level`
    pub fn scope(&self) -> Result<Option<ParentScope>, String> {
        let Some(parent) = &self.parent else {
            return Ok(None);
        };
        let parent_level = match self.parent_level {
            Some(level) => level,
            None => *self
                .level
                .parent_levels()
                .first()
                .ok_or_else(|| format!("A {} has no parent", self.level))?,
        };
        ParentScope::parse(parent_level, parent).map(Some)
    }

    /// Execute the exists command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let scope = match self.scope() {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Invalid parent reference");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let (_config, (hierarchy, _cases)) = match connect(config_path).await {
            Ok(connected) => connected,
            Err(code) => return Ok(code),
        };

        let resolver = Resolver::new(hierarchy);
        match resolver.exists(self.level, &self.name, scope.as_ref()).await {
            Ok(true) => {
                println!("✅ {} '{}' exists", self.level, self.name.trim());
                Ok(0)
            }
            Ok(false) => {
                println!("❌ {} '{}' not found", self.level, self.name.trim());
                Ok(1)
            }
            Err(e) => {
                println!("❌ Lookup failed");
                println!("   Error: {e}");
                Ok(if e.is_retryable() { 4 } else { 5 })
            }
        }
    }
}
