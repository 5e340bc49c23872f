//! PostgreSQL adapter implementing the store traits

use crate::adapters::database::traits::{
    CaseCount, CaseFilter, CaseStore, HierarchyStore, MergeOutcome, MoveOutcome,
};
use crate::adapters::postgresql::client::{map_db_error, PostgreSQLClient};
use crate::adapters::postgresql::models::{
    case_count_from_row, PgCase, PgCaseType, PgCommunity, PgDistrict, PgFacility, PgRegion,
    PgSubDistrict,
};
use crate::domain::ids::{
    CaseTypeId, CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId,
};
use crate::domain::{
    Case, CaseType, Community, CommunityParent, District, Facility, FacilityGeoFilter, Region,
    Result, SubDistrict, VigilError,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_postgres::Row;
use uuid::Uuid;

const COMMUNITY_COLUMNS: &str = "id, name, district_id, sub_district_id, created_at";
const FACILITY_COLUMNS: &str =
    "id, name, region_id, district_id, sub_district_id, community_id";

/// PostgreSQL implementation of [`HierarchyStore`] and [`CaseStore`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

/// (trimmed lowercase name, district, sub-district) of a locked community row
fn dedup_key(row: &Row) -> Result<(String, Option<Uuid>, Option<Uuid>)> {
    let read = |e: tokio_postgres::Error| map_db_error("Failed to read community key", e);
    Ok((
        row.try_get("name_key").map_err(read)?,
        row.try_get("district_id").map_err(read)?,
        row.try_get("sub_district_id").map_err(read)?,
    ))
}

/// Re-points dependents of `duplicate` onto `survivor` and deletes it
///
/// Runs inside the caller's transaction; nothing is committed here.
async fn merge_in_transaction(
    tx: &deadpool_postgres::Transaction<'_>,
    duplicate: &Uuid,
    survivor: &Uuid,
) -> Result<MergeOutcome> {
    let facilities_repointed = tx
        .execute(
            "UPDATE health_facilities SET community_id = $2 WHERE community_id = $1",
            &[duplicate, survivor],
        )
        .await
        .map_err(|e| map_db_error("Failed to re-point facilities", e))?;

    let cases_repointed = tx
        .execute(
            "UPDATE cases SET community_id = $2 WHERE community_id = $1",
            &[duplicate, survivor],
        )
        .await
        .map_err(|e| map_db_error("Failed to re-point cases", e))?;

    let duplicate_text = duplicate.to_string();
    let survivor_text = survivor.to_string();
    tx.execute(
        "UPDATE cases SET location = jsonb_set(location, '{communityId}', to_jsonb($2::text)) \
         WHERE location->>'communityId' = $1",
        &[&duplicate_text, &survivor_text],
    )
    .await
    .map_err(|e| map_db_error("Failed to re-point case location snapshots", e))?;

    let deleted = tx
        .execute("DELETE FROM communities WHERE id = $1", &[duplicate])
        .await
        .map_err(|e| map_db_error("Failed to delete duplicate community", e))?;
    if deleted != 1 {
        return Err(VigilError::Persistence(format!(
            "Duplicate community {duplicate} vanished during merge"
        )));
    }

    Ok(MergeOutcome {
        facilities_repointed,
        cases_repointed,
    })
}

#[async_trait]
impl HierarchyStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn ensure_schema(&self) -> Result<()> {
        self.client.ensure_schema().await
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }

    async fn get_region(&self, id: &RegionId) -> Result<Option<Region>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, created_at FROM regions WHERE id = $1",
                &[id.as_uuid()],
            )
            .await?;
        row.map(|r| PgRegion::from_row(&r).map(PgRegion::to_domain))
            .transpose()
    }

    async fn get_district(&self, id: &DistrictId) -> Result<Option<District>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, region_id, created_at FROM districts WHERE id = $1",
                &[id.as_uuid()],
            )
            .await?;
        row.map(|r| PgDistrict::from_row(&r).map(PgDistrict::to_domain))
            .transpose()
    }

    async fn get_sub_district(&self, id: &SubDistrictId) -> Result<Option<SubDistrict>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, district_id, created_at FROM sub_districts WHERE id = $1",
                &[id.as_uuid()],
            )
            .await?;
        row.map(|r| PgSubDistrict::from_row(&r).map(PgSubDistrict::to_domain))
            .transpose()
    }

    async fn get_community(&self, id: &CommunityId) -> Result<Option<Community>> {
        let query = format!("SELECT {COMMUNITY_COLUMNS} FROM communities WHERE id = $1");
        let row = self.client.query_opt(&query, &[id.as_uuid()]).await?;
        row.map(|r| PgCommunity::from_row(&r).map(PgCommunity::to_domain))
            .transpose()
    }

    async fn find_region_by_name(&self, name: &str) -> Result<Option<Region>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, created_at FROM regions \
                 WHERE lower(name) = lower($1) ORDER BY created_at, id LIMIT 1",
                &[&name.trim()],
            )
            .await?;
        row.map(|r| PgRegion::from_row(&r).map(PgRegion::to_domain))
            .transpose()
    }

    async fn find_district_by_name(
        &self,
        name: &str,
        region_id: Option<&RegionId>,
    ) -> Result<Option<District>> {
        let region = region_id.map(|id| *id.as_uuid());
        let row = self
            .client
            .query_opt(
                "SELECT id, name, region_id, created_at FROM districts \
                 WHERE lower(name) = lower($1) AND ($2::uuid IS NULL OR region_id = $2) \
                 ORDER BY created_at, id LIMIT 1",
                &[&name.trim(), &region],
            )
            .await?;
        row.map(|r| PgDistrict::from_row(&r).map(PgDistrict::to_domain))
            .transpose()
    }

    async fn find_sub_district_by_name(
        &self,
        name: &str,
        district_id: Option<&DistrictId>,
    ) -> Result<Option<SubDistrict>> {
        let district = district_id.map(|id| *id.as_uuid());
        let row = self
            .client
            .query_opt(
                "SELECT id, name, district_id, created_at FROM sub_districts \
                 WHERE lower(name) = lower($1) AND ($2::uuid IS NULL OR district_id = $2) \
                 ORDER BY created_at, id LIMIT 1",
                &[&name.trim(), &district],
            )
            .await?;
        row.map(|r| PgSubDistrict::from_row(&r).map(PgSubDistrict::to_domain))
            .transpose()
    }

    async fn find_community_by_name(
        &self,
        name: &str,
        parent: Option<&CommunityParent>,
    ) -> Result<Option<Community>> {
        let name = name.trim();
        let row = match parent {
            None => {
                let query = format!(
                    "SELECT {COMMUNITY_COLUMNS} FROM communities \
                     WHERE lower(name) = lower($1) ORDER BY created_at, id LIMIT 1"
                );
                self.client.query_opt(&query, &[&name]).await?
            }
            Some(CommunityParent::District(district)) => {
                let query = format!(
                    "SELECT {COMMUNITY_COLUMNS} FROM communities \
                     WHERE lower(name) = lower($1) AND district_id = $2 \
                     ORDER BY created_at, id LIMIT 1"
                );
                self.client
                    .query_opt(&query, &[&name, district.as_uuid()])
                    .await?
            }
            Some(CommunityParent::SubDistrict(sub_district)) => {
                let query = format!(
                    "SELECT {COMMUNITY_COLUMNS} FROM communities \
                     WHERE lower(name) = lower($1) AND sub_district_id = $2 \
                     ORDER BY created_at, id LIMIT 1"
                );
                self.client
                    .query_opt(&query, &[&name, sub_district.as_uuid()])
                    .await?
            }
        };
        row.map(|r| PgCommunity::from_row(&r).map(PgCommunity::to_domain))
            .transpose()
    }

    async fn insert_region(&self, region: &Region) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO regions (id, name, created_at) VALUES ($1, $2, $3)",
                &[region.id.as_uuid(), &region.name, &region.created_at],
            )
            .await?;
        Ok(())
    }

    async fn insert_district(&self, district: &District) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO districts (id, name, region_id, created_at) VALUES ($1, $2, $3, $4)",
                &[
                    district.id.as_uuid(),
                    &district.name,
                    district.region_id.as_uuid(),
                    &district.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn insert_sub_district(&self, sub_district: &SubDistrict) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO sub_districts (id, name, district_id, created_at) \
                 VALUES ($1, $2, $3, $4)",
                &[
                    sub_district.id.as_uuid(),
                    &sub_district.name,
                    sub_district.district_id.as_uuid(),
                    &sub_district.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn insert_community(&self, community: &Community) -> Result<()> {
        let row = PgCommunity::from_domain(community);
        self.client
            .execute(
                "INSERT INTO communities (id, name, district_id, sub_district_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &row.id,
                    &row.name,
                    &row.district_id,
                    &row.sub_district_id,
                    &row.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_communities(&self) -> Result<Vec<Community>> {
        let query = format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities ORDER BY lower(name), created_at, id"
        );
        let rows = self.client.query(&query, &[]).await?;
        rows.iter()
            .map(|r| PgCommunity::from_row(r).map(PgCommunity::to_domain))
            .collect()
    }

    async fn list_repair_candidates(&self) -> Result<Vec<Community>> {
        let query = format!(
            "SELECT {COMMUNITY_COLUMNS} FROM communities \
             WHERE district_id IS NULL AND sub_district_id IS NOT NULL \
             ORDER BY created_at, id"
        );
        let rows = self.client.query(&query, &[]).await?;
        rows.iter()
            .map(|r| PgCommunity::from_row(r).map(PgCommunity::to_domain))
            .collect()
    }

    async fn move_community_to_district(
        &self,
        community_id: &CommunityId,
        district_id: &DistrictId,
    ) -> Result<MoveOutcome> {
        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let current = tx
            .query_opt(
                "SELECT name, (district_id IS NULL AND sub_district_id = $2) AS misplaced \
                 FROM communities WHERE id = $1 FOR UPDATE",
                &[community_id.as_uuid(), district_id.as_uuid()],
            )
            .await
            .map_err(|e| map_db_error("Failed to lock community", e))?
            .ok_or_else(|| {
                VigilError::Persistence(format!("Community {community_id} no longer exists"))
            })?;
        let misplaced: Option<bool> = current
            .try_get("misplaced")
            .map_err(|e| map_db_error("Failed to read community parents", e))?;
        if misplaced != Some(true) {
            // Dropping the transaction rolls back and releases the lock
            return Ok(MoveOutcome::Unchanged);
        }
        let name: String = current
            .try_get("name")
            .map_err(|e| map_db_error("Failed to read community name", e))?;

        let existing = tx
            .query_opt(
                "SELECT id FROM communities \
                 WHERE id <> $1 AND district_id = $2 AND lower(name) = lower($3) \
                 ORDER BY created_at, id LIMIT 1 FOR UPDATE",
                &[community_id.as_uuid(), district_id.as_uuid(), &name],
            )
            .await
            .map_err(|e| map_db_error("Failed to look up same-name community", e))?;

        let outcome = match existing {
            Some(row) => {
                let survivor: Uuid = row
                    .try_get("id")
                    .map_err(|e| map_db_error("Failed to read survivor id", e))?;
                let dependents =
                    merge_in_transaction(&tx, community_id.as_uuid(), &survivor).await?;
                MoveOutcome::Merged {
                    survivor: CommunityId::from_uuid(survivor),
                    dependents,
                }
            }
            None => {
                tx.execute(
                    "UPDATE communities SET district_id = $2, sub_district_id = NULL WHERE id = $1",
                    &[community_id.as_uuid(), district_id.as_uuid()],
                )
                .await
                .map_err(|e| map_db_error("Failed to relocate community", e))?;
                MoveOutcome::Relocated
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit community move", e))?;
        Ok(outcome)
    }

    async fn merge_communities(
        &self,
        duplicate: &CommunityId,
        survivor: &CommunityId,
    ) -> Result<Option<MergeOutcome>> {
        if duplicate == survivor {
            return Err(VigilError::InvalidInput(format!(
                "Cannot merge community {duplicate} into itself"
            )));
        }

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .transaction()
            .await
            .map_err(|e| map_db_error("Failed to begin transaction", e))?;

        let ids = vec![*duplicate.as_uuid(), *survivor.as_uuid()];
        let locked = tx
            .query(
                "SELECT lower(btrim(name)) AS name_key, district_id, sub_district_id \
                 FROM communities WHERE id = ANY($1) FOR UPDATE",
                &[&ids],
            )
            .await
            .map_err(|e| map_db_error("Failed to lock communities", e))?;
        if locked.len() != 2 {
            return Err(VigilError::Persistence(format!(
                "Community {duplicate} or {survivor} no longer exists"
            )));
        }
        let keys = locked
            .iter()
            .map(dedup_key)
            .collect::<Result<Vec<_>>>()?;
        if keys[0] != keys[1] {
            return Ok(None);
        }

        let outcome = merge_in_transaction(&tx, duplicate.as_uuid(), survivor.as_uuid()).await?;

        tx.commit()
            .await
            .map_err(|e| map_db_error("Failed to commit community merge", e))?;
        Ok(Some(outcome))
    }

    async fn ensure_community_unique_index(&self) -> Result<()> {
        self.client
            .execute(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_communities_unique_parent_name \
                 ON communities (\
                     lower(name), \
                     COALESCE(district_id, '00000000-0000-0000-0000-000000000000'::uuid), \
                     COALESCE(sub_district_id, '00000000-0000-0000-0000-000000000000'::uuid)\
                 )",
                &[],
            )
            .await?;
        tracing::info!("Community uniqueness index is in place");
        Ok(())
    }
}

#[async_trait]
impl CaseStore for PostgreSQLAdapter {
    async fn get_facility(&self, id: &FacilityId) -> Result<Option<Facility>> {
        let query = format!("SELECT {FACILITY_COLUMNS} FROM health_facilities WHERE id = $1");
        let row = self.client.query_opt(&query, &[id.as_uuid()]).await?;
        row.map(|r| PgFacility::from_row(&r).map(PgFacility::to_domain))
            .transpose()
    }

    async fn find_facility_by_name(&self, name: &str) -> Result<Option<Facility>> {
        let query = format!(
            "SELECT {FACILITY_COLUMNS} FROM health_facilities \
             WHERE lower(name) = lower($1) ORDER BY id LIMIT 1"
        );
        let row = self.client.query_opt(&query, &[&name.trim()]).await?;
        row.map(|r| PgFacility::from_row(&r).map(PgFacility::to_domain))
            .transpose()
    }

    async fn find_facility_ids(&self, filter: &FacilityGeoFilter) -> Result<Vec<FacilityId>> {
        let region = filter.region_id.map(Uuid::from);
        let district = filter.district_id.map(Uuid::from);
        let sub_district = filter.sub_district_id.map(Uuid::from);

        let rows = self
            .client
            .query(
                "SELECT id FROM health_facilities \
                 WHERE ($1::uuid IS NULL OR region_id = $1) \
                   AND ($2::uuid IS NULL OR district_id = $2) \
                   AND ($3::uuid IS NULL OR sub_district_id = $3) \
                 ORDER BY id",
                &[&region, &district, &sub_district],
            )
            .await?;

        rows.iter()
            .map(|r| {
                r.try_get::<_, Uuid>("id")
                    .map(FacilityId::from_uuid)
                    .map_err(|e| map_db_error("Failed to read facility id", e))
            })
            .collect()
    }

    async fn get_case_type(&self, id: &CaseTypeId) -> Result<Option<CaseType>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, archived FROM case_types WHERE id = $1",
                &[id.as_uuid()],
            )
            .await?;
        row.map(|r| PgCaseType::from_row(&r).map(PgCaseType::to_domain))
            .transpose()
    }

    async fn find_case_type_by_name(&self, name: &str) -> Result<Option<CaseType>> {
        let row = self
            .client
            .query_opt(
                "SELECT id, name, archived FROM case_types \
                 WHERE lower(name) = lower($1) ORDER BY id LIMIT 1",
                &[&name.trim()],
            )
            .await?;
        row.map(|r| PgCaseType::from_row(&r).map(PgCaseType::to_domain))
            .transpose()
    }

    async fn count_active_cases(&self, filter: &CaseFilter) -> Result<Vec<CaseCount>> {
        let case_type = filter.case_type_id.map(Uuid::from);
        let facilities: Option<Vec<Uuid>> = filter
            .facility_ids
            .as_ref()
            .map(|ids| ids.iter().map(|id| *id.as_uuid()).collect());
        let community = filter.community_id.map(Uuid::from);

        let rows = self
            .client
            .query(
                "SELECT c.case_type_id, ct.name AS case_type_name, c.status, c.patient_status, \
                        COUNT(*)::BIGINT AS count \
                 FROM cases c \
                 JOIN case_types ct ON ct.id = c.case_type_id \
                 WHERE c.archived = FALSE \
                   AND c.status IN ('suspected', 'confirmed') \
                   AND ($1::uuid IS NULL OR c.case_type_id = $1) \
                   AND ($2::uuid[] IS NULL OR c.facility_id = ANY($2)) \
                   AND ($3::uuid IS NULL OR c.community_id = $3) \
                 GROUP BY c.case_type_id, ct.name, c.status, c.patient_status",
                &[&case_type, &facilities, &community],
            )
            .await?;

        let counts: Vec<CaseCount> = rows
            .iter()
            .map(case_count_from_row)
            .collect::<Result<_>>()?;

        tracing::debug!(groups = counts.len(), "Counted active cases");
        Ok(counts)
    }

    async fn insert_facility(&self, facility: &Facility) -> Result<()> {
        let sub_district = facility.sub_district_id.map(Uuid::from);
        self.client
            .execute(
                "INSERT INTO health_facilities \
                 (id, name, region_id, district_id, sub_district_id, community_id) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    facility.id.as_uuid(),
                    &facility.name,
                    facility.region_id.as_uuid(),
                    facility.district_id.as_uuid(),
                    &sub_district,
                    facility.community_id.as_uuid(),
                ],
            )
            .await?;
        Ok(())
    }

    async fn insert_case_type(&self, case_type: &CaseType) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO case_types (id, name, archived) VALUES ($1, $2, $3)",
                &[case_type.id.as_uuid(), &case_type.name, &case_type.archived],
            )
            .await?;
        Ok(())
    }

    async fn insert_case(&self, case: &Case) -> Result<()> {
        let row = PgCase::from_domain(case)?;
        self.client
            .execute(
                "INSERT INTO cases \
                 (id, case_type_id, facility_id, community_id, status, patient_status, \
                  archived, location, reported_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
                &[
                    &row.id,
                    &row.case_type_id,
                    &row.facility_id,
                    &row.community_id,
                    &row.status,
                    &row.patient_status,
                    &row.archived,
                    &row.location,
                    &row.reported_at,
                ],
            )
            .await?;
        Ok(())
    }
}
