//! Summary command implementation
//!
//! Prints per-case-type totals for the given filters.

use crate::cli::commands::connect;
use crate::core::geography::Resolver;
use crate::core::summary::{CaseTypeSummary, SummaryAggregator, SummaryFilters};
use clap::Args;

/// Arguments for the summary command
///
/// Every filter accepts an identifier or a name.
#[derive(Args, Debug, Default)]
pub struct SummaryArgs {
    #[arg(long)]
    pub case_type: Option<String>,

    #[arg(long)]
    pub region: Option<String>,

    /// Scoped by --region when both are given
    #[arg(long)]
    pub district: Option<String>,

    /// Scoped by --district when both are given
    #[arg(long)]
    pub sub_district: Option<String>,

    /// Scoped by the most specific of --sub-district and --district
    #[arg(long)]
    pub community: Option<String>,

    #[arg(long)]
    pub facility: Option<String>,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,
}

impl SummaryArgs {
    pub fn filters(&self) -> SummaryFilters {
        SummaryFilters {
            case_type: self.case_type.clone(),
            region: self.region.clone(),
            district: self.district.clone(),
            sub_district: self.sub_district.clone(),
            community: self.community.clone(),
            facility: self.facility.clone(),
        }
    }

    /// Execute the summary command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (_config, (hierarchy, cases)) = match connect(config_path).await {
            Ok(connected) => connected,
            Err(code) => return Ok(code),
        };

        let aggregator = SummaryAggregator::new(Resolver::new(hierarchy), cases);
        let rows = match aggregator.summarize(&self.filters()).await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to compute summary");
                println!("   Error: {e}");
                return Ok(if e.is_retryable() { 4 } else { 5 });
            }
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            print_table(&rows);
        }
        Ok(0)
    }
}

fn print_table(rows: &[CaseTypeSummary]) {
    println!("📊 Case Summary");
    println!();

    if rows.is_empty() {
        println!("No active cases match the given filters.");
        return;
    }

    println!(
        "{:<30} {:>7} {:>10} {:>10} {:>8} {:>9} {:>10}",
        "Case Type", "Total", "Confirmed", "Suspected", "Recov.", "Ongoing", "Deceased"
    );
    println!("{}", "-".repeat(90));

    for row in rows {
        println!(
            "{:<30} {:>7} {:>10} {:>10} {:>8} {:>9} {:>10}",
            row.name,
            row.total,
            row.confirmed.total,
            row.suspected.total,
            row.confirmed.recovered + row.suspected.recovered,
            row.confirmed.ongoing_treatment + row.suspected.ongoing_treatment,
            row.confirmed.deceased + row.suspected.deceased,
        );
    }
}
