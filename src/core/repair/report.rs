//! Repair report structures

use crate::domain::ids::CommunityId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which half of the pass produced a detail line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairPhase {
    /// District id stored in the sub-district slot
    MisplacedParent,
    /// Same name under the same parent
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairAction {
    Relocated,
    Merged,
    Skipped,
    Failed,
}

impl RepairAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairAction::Relocated => "relocated",
            RepairAction::Merged => "merged",
            RepairAction::Skipped => "skipped",
            RepairAction::Failed => "failed",
        }
    }
}

/// One community touched (or previewed) by the pass
#[derive(Debug, Clone, Serialize)]
pub struct RepairDetail {
    pub phase: RepairPhase,
    pub action: RepairAction,
    pub community_id: CommunityId,
    pub name: String,
    /// Corrected relationship or failure reason
    pub message: String,
}

/// Outcome of one repair run
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,

    /// Misplaced references moved into `district_id`
    pub migrated: usize,

    /// Duplicates folded into a survivor, from either phase
    pub merged: usize,

    /// References that resolve to neither a sub-district nor a district, and
    /// rows another writer changed before they could be repaired
    pub skipped: usize,

    /// Records whose relocation or merge failed and was rolled back
    pub failed: usize,

    /// Candidates whose reference is a genuine sub-district
    pub untouched: usize,

    pub facilities_repointed: u64,
    pub cases_repointed: u64,

    pub index_built: bool,
    pub index_warning: Option<String>,

    pub details: Vec<RepairDetail>,
}

impl RepairReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            started_at: Utc::now(),
            duration_ms: 0,
            migrated: 0,
            merged: 0,
            skipped: 0,
            failed: 0,
            untouched: 0,
            facilities_repointed: 0,
            cases_repointed: 0,
            index_built: false,
            index_warning: None,
            details: Vec::new(),
        }
    }

    /// Record a detail line and bump the matching counter
    pub fn record(&mut self, detail: RepairDetail) {
        match detail.action {
            RepairAction::Relocated => self.migrated += 1,
            RepairAction::Merged => self.merged += 1,
            RepairAction::Skipped => self.skipped += 1,
            RepairAction::Failed => self.failed += 1,
        }
        self.details.push(detail);
    }

    pub fn record_untouched(&mut self) {
        self.untouched += 1;
    }

    /// No failed records and no index warning
    pub fn is_successful(&self) -> bool {
        self.failed == 0 && self.index_warning.is_none()
    }

    /// Whether the run changed nothing, or would change nothing in dry-run
    pub fn is_clean(&self) -> bool {
        self.migrated == 0 && self.merged == 0
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        if self.dry_run {
            summary.push_str("🔍 Repair preview (dry run, nothing written)\n");
        } else {
            summary.push_str("🛠️  Repair report\n");
        }
        summary.push_str(&format!("  Started at: {}\n", self.started_at));
        summary.push_str(&format!("  Duration: {} ms\n", self.duration_ms));
        summary.push_str(&format!("  Migrated: {}\n", self.migrated));
        summary.push_str(&format!("  Merged: {}\n", self.merged));
        summary.push_str(&format!("  Skipped: {}\n", self.skipped));
        summary.push_str(&format!("  Untouched: {}\n", self.untouched));
        summary.push_str(&format!("  ❌ Failed: {}\n", self.failed));
        if !self.dry_run {
            summary.push_str(&format!(
                "  Re-pointed: {} facilities, {} cases\n",
                self.facilities_repointed, self.cases_repointed
            ));
        }
        if self.index_built {
            summary.push_str("  ✅ Community unique index in place\n");
        }
        if let Some(warning) = &self.index_warning {
            summary.push_str(&format!("  ⚠️  Unique index not built: {warning}\n"));
        }

        if !self.details.is_empty() {
            summary.push_str("\nDetails:\n");
            for (i, detail) in self.details.iter().enumerate() {
                summary.push_str(&format!(
                    "  {}. [{}] {} ({}): {}\n",
                    i + 1,
                    detail.action.as_str(),
                    detail.name,
                    detail.community_id,
                    detail.message
                ));
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(action: RepairAction) -> RepairDetail {
        RepairDetail {
            phase: RepairPhase::Duplicate,
            action,
            community_id: CommunityId::new(),
            name: "Asokwa".to_string(),
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_record_updates_counters() {
        let mut report = RepairReport::new(false);
        report.record(detail(RepairAction::Relocated));
        report.record(detail(RepairAction::Merged));
        report.record(detail(RepairAction::Merged));
        report.record(detail(RepairAction::Skipped));

        assert_eq!(report.migrated, 1);
        assert_eq!(report.merged, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.details.len(), 4);
        assert!(report.is_successful());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_index_warning_is_not_successful() {
        let mut report = RepairReport::new(false);
        report.index_warning = Some("duplicates remain".to_string());
        assert!(!report.is_successful());
        assert!(report.format_summary().contains("duplicates remain"));
    }

    #[test]
    fn test_report_serializes_counts() {
        let mut report = RepairReport::new(true);
        report.record(detail(RepairAction::Failed));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["details"][0]["action"], "failed");
        assert_eq!(json["details"][0]["phase"], "duplicate");
    }
}
