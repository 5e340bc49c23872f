//! Per-case-type summary rows

use crate::adapters::database::CaseCount;
use crate::domain::ids::CaseTypeId;
use crate::domain::{CaseStatus, PatientOutcome};
use serde::Serialize;
use std::collections::HashMap;

/// Counts for one confirmation status
///
/// `total` includes cases whose patient status is absent or unrecognized,
/// so it can exceed the sum of the three outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub total: u64,
    pub recovered: u64,
    pub ongoing_treatment: u64,
    pub deceased: u64,
}

impl StatusBreakdown {
    fn add(&mut self, patient_status: Option<&str>, count: u64) {
        self.total += count;
        match patient_status.and_then(PatientOutcome::from_stored) {
            Some(PatientOutcome::Recovered) => self.recovered += count,
            Some(PatientOutcome::OngoingTreatment) => self.ongoing_treatment += count,
            Some(PatientOutcome::Deceased) => self.deceased += count,
            None => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseTypeSummary {
    pub case_type_id: CaseTypeId,
    pub name: String,
    pub total: u64,
    pub confirmed: StatusBreakdown,
    pub suspected: StatusBreakdown,
}

impl CaseTypeSummary {
    fn new(case_type_id: CaseTypeId, name: String) -> Self {
        Self {
            case_type_id,
            name,
            total: 0,
            confirmed: StatusBreakdown::default(),
            suspected: StatusBreakdown::default(),
        }
    }
}

/// Roll grouped counts up into one row per case type, sorted by name
pub fn roll_up(counts: Vec<CaseCount>) -> Vec<CaseTypeSummary> {
    let mut rows: HashMap<CaseTypeId, CaseTypeSummary> = HashMap::new();

    for group in counts {
        let row = rows
            .entry(group.case_type_id)
            .or_insert_with(|| CaseTypeSummary::new(group.case_type_id, group.case_type_name));
        let breakdown = match group.status {
            CaseStatus::Confirmed => &mut row.confirmed,
            CaseStatus::Suspected => &mut row.suspected,
            CaseStatus::NotACase => continue,
        };
        breakdown.add(group.patient_status.as_deref(), group.count);
        row.total += group.count;
    }

    let mut rows: Vec<CaseTypeSummary> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.case_type_id.cmp(&b.case_type_id))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(
        case_type: CaseTypeId,
        name: &str,
        status: CaseStatus,
        patient_status: Option<&str>,
        count: u64,
    ) -> CaseCount {
        CaseCount {
            case_type_id: case_type,
            case_type_name: name.to_string(),
            status,
            patient_status: patient_status.map(str::to_string),
            count,
        }
    }

    #[test]
    fn test_roll_up_keeps_totals_consistent() {
        let cholera = CaseTypeId::new();
        let rows = roll_up(vec![
            group(cholera, "Cholera", CaseStatus::Confirmed, Some("Recovered"), 3),
            group(cholera, "Cholera", CaseStatus::Confirmed, Some("Deceased"), 1),
            group(cholera, "Cholera", CaseStatus::Confirmed, None, 2),
            group(cholera, "Cholera", CaseStatus::Suspected, Some("Ongoing treatment"), 4),
            group(cholera, "Cholera", CaseStatus::Suspected, Some("recovered"), 5),
        ]);

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.confirmed.total, 6);
        assert_eq!(row.confirmed.recovered, 3);
        assert_eq!(row.confirmed.deceased, 1);
        assert_eq!(row.suspected.total, 9);
        assert_eq!(row.suspected.ongoing_treatment, 4);
        assert_eq!(row.suspected.recovered, 0);
        assert_eq!(row.total, row.confirmed.total + row.suspected.total);
    }

    #[test]
    fn test_rows_sorted_by_name() {
        let rows = roll_up(vec![
            group(CaseTypeId::new(), "Measles", CaseStatus::Suspected, None, 1),
            group(CaseTypeId::new(), "Cholera", CaseStatus::Suspected, None, 1),
            group(CaseTypeId::new(), "Lassa Fever", CaseStatus::Confirmed, None, 1),
        ]);

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Cholera", "Lassa Fever", "Measles"]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let rows = roll_up(vec![group(
            CaseTypeId::new(),
            "Cholera",
            CaseStatus::Confirmed,
            Some("Ongoing treatment"),
            2,
        )]);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["confirmed"]["ongoingTreatment"], 2);
        assert!(json.get("caseTypeId").is_some());
        assert_eq!(json["suspected"]["total"], 0);
    }
}
