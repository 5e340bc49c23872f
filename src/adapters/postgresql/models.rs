//! PostgreSQL row models
//!
//! Each struct mirrors one table's columns and converts to and from the
//! domain types.

use crate::adapters::database::traits::CaseCount;
use crate::domain::ids::{
    CaseTypeId, CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId,
};
use crate::domain::{
    Case, CaseType, Community, District, Facility, Region, Result, SubDistrict, VigilError,
};
use chrono::{DateTime, Utc};
use tokio_postgres::types::FromSql;
use tokio_postgres::Row;
use uuid::Uuid;

fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Result<T> {
    row.try_get(name)
        .map_err(|e| VigilError::Persistence(format!("Failed to read column '{name}': {e}")))
}

/// Row of the `regions` table
#[derive(Debug, Clone)]
pub struct PgRegion {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl PgRegion {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            created_at: column(row, "created_at")?,
        })
    }

    pub fn to_domain(self) -> Region {
        Region {
            id: RegionId::from_uuid(self.id),
            name: self.name,
            created_at: self.created_at,
        }
    }
}

/// Row of the `districts` table
#[derive(Debug, Clone)]
pub struct PgDistrict {
    pub id: Uuid,
    pub name: String,
    pub region_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PgDistrict {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            region_id: column(row, "region_id")?,
            created_at: column(row, "created_at")?,
        })
    }

    pub fn to_domain(self) -> District {
        District {
            id: DistrictId::from_uuid(self.id),
            name: self.name,
            region_id: RegionId::from_uuid(self.region_id),
            created_at: self.created_at,
        }
    }
}

/// Row of the `sub_districts` table
#[derive(Debug, Clone)]
pub struct PgSubDistrict {
    pub id: Uuid,
    pub name: String,
    pub district_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl PgSubDistrict {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            district_id: column(row, "district_id")?,
            created_at: column(row, "created_at")?,
        })
    }

    pub fn to_domain(self) -> SubDistrict {
        SubDistrict {
            id: SubDistrictId::from_uuid(self.id),
            name: self.name,
            district_id: DistrictId::from_uuid(self.district_id),
            created_at: self.created_at,
        }
    }
}

/// Row of the `communities` table
///
/// Both parent columns are nullable; legacy rows may violate the
/// single-parent rule and are passed through unchanged.
#[derive(Debug, Clone)]
pub struct PgCommunity {
    pub id: Uuid,
    pub name: String,
    pub district_id: Option<Uuid>,
    pub sub_district_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl PgCommunity {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            district_id: column(row, "district_id")?,
            sub_district_id: column(row, "sub_district_id")?,
            created_at: column(row, "created_at")?,
        })
    }

    pub fn from_domain(community: &Community) -> Self {
        Self {
            id: *community.id.as_uuid(),
            name: community.name.clone(),
            district_id: community.district_id.map(Uuid::from),
            sub_district_id: community.sub_district_id.map(Uuid::from),
            created_at: community.created_at,
        }
    }

    pub fn to_domain(self) -> Community {
        Community {
            id: CommunityId::from_uuid(self.id),
            name: self.name,
            district_id: self.district_id.map(DistrictId::from_uuid),
            sub_district_id: self.sub_district_id.map(SubDistrictId::from_uuid),
            created_at: self.created_at,
        }
    }
}

/// Row of the `health_facilities` table
#[derive(Debug, Clone)]
pub struct PgFacility {
    pub id: Uuid,
    pub name: String,
    pub region_id: Uuid,
    pub district_id: Uuid,
    pub sub_district_id: Option<Uuid>,
    pub community_id: Uuid,
}

impl PgFacility {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            region_id: column(row, "region_id")?,
            district_id: column(row, "district_id")?,
            sub_district_id: column(row, "sub_district_id")?,
            community_id: column(row, "community_id")?,
        })
    }

    pub fn to_domain(self) -> Facility {
        Facility {
            id: FacilityId::from_uuid(self.id),
            name: self.name,
            region_id: RegionId::from_uuid(self.region_id),
            district_id: DistrictId::from_uuid(self.district_id),
            sub_district_id: self.sub_district_id.map(SubDistrictId::from_uuid),
            community_id: CommunityId::from_uuid(self.community_id),
        }
    }
}

/// Row of the `case_types` table
#[derive(Debug, Clone)]
pub struct PgCaseType {
    pub id: Uuid,
    pub name: String,
    pub archived: bool,
}

impl PgCaseType {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: column(row, "id")?,
            name: column(row, "name")?,
            archived: column(row, "archived")?,
        })
    }

    pub fn to_domain(self) -> CaseType {
        CaseType {
            id: CaseTypeId::from_uuid(self.id),
            name: self.name,
            archived: self.archived,
        }
    }
}

/// Insert-side view of a case; `location` is stored as JSONB
#[derive(Debug, Clone)]
pub struct PgCase {
    pub id: Uuid,
    pub case_type_id: Uuid,
    pub facility_id: Uuid,
    pub community_id: Option<Uuid>,
    pub status: String,
    pub patient_status: Option<String>,
    pub archived: bool,
    pub location: Option<serde_json::Value>,
    pub reported_at: DateTime<Utc>,
}

impl PgCase {
    pub fn from_domain(case: &Case) -> Result<Self> {
        let location = case
            .location
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        Ok(Self {
            id: *case.id.as_uuid(),
            case_type_id: *case.case_type_id.as_uuid(),
            facility_id: *case.facility_id.as_uuid(),
            community_id: case.community_id.map(Uuid::from),
            status: case.status.as_str().to_string(),
            patient_status: case.patient_status.clone(),
            archived: case.archived,
            location,
            reported_at: case.reported_at,
        })
    }
}

/// One grouped row of the case-count query
pub fn case_count_from_row(row: &Row) -> Result<CaseCount> {
    let status: String = column(row, "status")?;
    let count: i64 = column(row, "count")?;

    Ok(CaseCount {
        case_type_id: CaseTypeId::from_uuid(column(row, "case_type_id")?),
        case_type_name: column(row, "case_type_name")?,
        status: status
            .parse()
            .map_err(|e: String| VigilError::Persistence(e))?,
        patient_status: column(row, "patient_status")?,
        count: count_value(count)?,
    })
}

fn count_value(count: i64) -> Result<u64> {
    u64::try_from(count)
        .map_err(|_| VigilError::Persistence(format!("Invalid case count {count} in row")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CaseStatus, CommunityParent, LocationSnapshot};

    #[test]
    fn test_community_round_trip_keeps_single_parent() {
        let district = DistrictId::new();
        let community = Community::new("Asokwa", CommunityParent::District(district));

        let row = PgCommunity::from_domain(&community);
        assert_eq!(row.district_id, Some(*district.as_uuid()));
        assert_eq!(row.sub_district_id, None);
        assert_eq!(row.to_domain(), community);
    }

    #[test]
    fn test_negative_count_is_a_persistence_error() {
        assert_eq!(count_value(12).unwrap(), 12);
        assert!(matches!(count_value(-1), Err(VigilError::Persistence(_))));
    }

    #[test]
    fn test_case_location_serializes_to_json() {
        let community = CommunityId::new();
        let case = Case::new(CaseTypeId::new(), FacilityId::new(), CaseStatus::Suspected)
            .with_community(community)
            .with_location(LocationSnapshot {
                community_id: Some(community),
                ..Default::default()
            });

        let row = PgCase::from_domain(&case).unwrap();
        assert_eq!(row.status, "suspected");
        let location = row.location.unwrap();
        assert_eq!(location["communityId"], community.to_string());
        assert!(location["regionId"].is_null());
    }
}
