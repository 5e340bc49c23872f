//! Case and case-type models
//!
//! Only the fields the geography and aggregation logic needs are modelled
//! here; the full case record lives with the surrounding application.

use super::ids::{CaseId, CaseTypeId, CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confirmation status of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaseStatus {
    #[serde(rename = "suspected")]
    Suspected,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "not a case")]
    NotACase,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Suspected => "suspected",
            CaseStatus::Confirmed => "confirmed",
            CaseStatus::NotACase => "not a case",
        }
    }

    /// Suspected and confirmed cases are the only ones counted in summaries
    pub fn is_active(&self) -> bool {
        matches!(self, CaseStatus::Suspected | CaseStatus::Confirmed)
    }

    pub fn active() -> [CaseStatus; 2] {
        [CaseStatus::Suspected, CaseStatus::Confirmed]
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suspected" => Ok(CaseStatus::Suspected),
            "confirmed" => Ok(CaseStatus::Confirmed),
            "not a case" => Ok(CaseStatus::NotACase),
            other => Err(format!("Unknown case status '{other}'")),
        }
    }
}

/// Recognized patient outcomes
///
/// Stored patient statuses are free text; anything that does not parse into
/// one of these counts toward the status total only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientOutcome {
    Recovered,
    #[serde(rename = "Ongoing treatment")]
    OngoingTreatment,
    Deceased,
}

impl PatientOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientOutcome::Recovered => "Recovered",
            PatientOutcome::OngoingTreatment => "Ongoing treatment",
            PatientOutcome::Deceased => "Deceased",
        }
    }

    /// Matches a stored patient status exactly, as written by data entry
    pub fn from_stored(value: &str) -> Option<Self> {
        match value {
            "Recovered" => Some(PatientOutcome::Recovered),
            "Ongoing treatment" => Some(PatientOutcome::OngoingTreatment),
            "Deceased" => Some(PatientOutcome::Deceased),
            _ => None,
        }
    }
}

impl fmt::Display for PatientOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseType {
    pub id: CaseTypeId,
    pub name: String,
    pub archived: bool,
}

impl CaseType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CaseTypeId::new(),
            name: name.into(),
            archived: false,
        }
    }
}

/// Denormalized copy of a case's geography
///
/// Derived data; always recomputable from the community's parent references.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSnapshot {
    pub region_id: Option<RegionId>,
    pub district_id: Option<DistrictId>,
    pub sub_district_id: Option<SubDistrictId>,
    pub community_id: Option<CommunityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub case_type_id: CaseTypeId,
    pub facility_id: FacilityId,
    pub community_id: Option<CommunityId>,
    pub status: CaseStatus,
    pub patient_status: Option<String>,
    pub archived: bool,
    pub location: Option<LocationSnapshot>,
    pub reported_at: DateTime<Utc>,
}

impl Case {
    pub fn new(case_type_id: CaseTypeId, facility_id: FacilityId, status: CaseStatus) -> Self {
        Self {
            id: CaseId::new(),
            case_type_id,
            facility_id,
            community_id: None,
            status,
            patient_status: None,
            archived: false,
            location: None,
            reported_at: Utc::now(),
        }
    }

    pub fn with_community(mut self, community_id: CommunityId) -> Self {
        self.community_id = Some(community_id);
        self
    }

    pub fn with_patient_status(mut self, patient_status: impl Into<String>) -> Self {
        self.patient_status = Some(patient_status.into());
        self
    }

    pub fn with_location(mut self, location: LocationSnapshot) -> Self {
        self.location = Some(location);
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn outcome(&self) -> Option<PatientOutcome> {
        self.patient_status.as_deref().and_then(PatientOutcome::from_stored)
    }

    /// Whether this case participates in summaries
    pub fn is_countable(&self) -> bool {
        !self.archived && self.status.is_active()
    }
}
