//! Case summary aggregation
//!
//! Resolves each filter to an identifier first. A filter that names nothing
//! yields an empty summary rather than an error, as does a geography filter
//! that matches no facilities.

use crate::adapters::database::{CaseFilter, CaseStore};
use crate::core::geography::Resolver;
use crate::core::summary::filters::SummaryFilters;
use crate::core::summary::report::{roll_up, CaseTypeSummary};
use crate::domain::ids::{is_identifier, CaseTypeId, FacilityId};
use crate::domain::{CaseType, CommunityParent, Facility, FacilityGeoFilter, Result};
use std::sync::Arc;

/// A filter value that named nothing
struct Unresolved(&'static str);

/// Produces per-case-type totals over active, non-archived cases
#[derive(Clone)]
pub struct SummaryAggregator {
    resolver: Resolver,
    cases: Arc<dyn CaseStore + Send + Sync>,
}

impl SummaryAggregator {
    pub fn new(resolver: Resolver, cases: Arc<dyn CaseStore + Send + Sync>) -> Self {
        Self { resolver, cases }
    }

    /// Summaries sorted by case-type name
    ///
    /// # Errors
    ///
    /// Only store failures are errors; unknown filter values produce `[]`.
    pub async fn summarize(&self, filters: &SummaryFilters) -> Result<Vec<CaseTypeSummary>> {
        let filters = filters.normalized();

        let (case_type, facility, restriction) = futures::try_join!(
            self.case_type(filters.case_type.as_deref()),
            self.facility(filters.facility.as_deref()),
            self.restriction(&filters),
        )?;

        let restriction = match (case_type, facility, restriction) {
            (Err(Unresolved(name)), _, _)
            | (_, Err(Unresolved(name)), _)
            | (_, _, Err(Unresolved(name))) => {
                tracing::debug!(filter = name, "Summary filter did not resolve");
                return Ok(Vec::new());
            }
            (Ok(case_type), Ok(facility), Ok(mut restriction)) => {
                restriction.case_type_id = case_type.map(|t| t.id);
                if let Some(facility) = facility {
                    restriction.facility_ids = Some(match restriction.facility_ids.take() {
                        Some(ids) => ids.into_iter().filter(|id| *id == facility.id).collect(),
                        None => vec![facility.id],
                    });
                }
                restriction
            }
        };

        if matches!(&restriction.facility_ids, Some(ids) if ids.is_empty()) {
            tracing::debug!("No facilities match the geography filters");
            return Ok(Vec::new());
        }

        let counts = self.cases.count_active_cases(&restriction).await?;
        let summaries = roll_up(counts);
        tracing::info!(case_types = summaries.len(), "Case summary computed");
        Ok(summaries)
    }

    async fn case_type(
        &self,
        value: Option<&str>,
    ) -> Result<std::result::Result<Option<CaseType>, Unresolved>> {
        let Some(value) = value else {
            return Ok(Ok(None));
        };
        let found = if is_identifier(value) {
            match CaseTypeId::parse(value) {
                Ok(id) => self.cases.get_case_type(&id).await?,
                Err(_) => None,
            }
        } else {
            self.cases.find_case_type_by_name(value).await?
        };
        Ok(found.map(Some).ok_or(Unresolved("case type")))
    }

    async fn facility(
        &self,
        value: Option<&str>,
    ) -> Result<std::result::Result<Option<Facility>, Unresolved>> {
        let Some(value) = value else {
            return Ok(Ok(None));
        };
        let found = if is_identifier(value) {
            match FacilityId::parse(value) {
                Ok(id) => self.cases.get_facility(&id).await?,
                Err(_) => None,
            }
        } else {
            self.cases.find_facility_by_name(value).await?
        };
        Ok(found.map(Some).ok_or(Unresolved("facility")))
    }

    /// Geography and community part of the case filter
    async fn restriction(
        &self,
        filters: &SummaryFilters,
    ) -> Result<std::result::Result<CaseFilter, Unresolved>> {
        let mut geo = FacilityGeoFilter::default();

        if let Some(value) = &filters.region {
            match self.resolver.region(value).await? {
                Some(region) => geo.region_id = Some(region.id),
                None => return Ok(Err(Unresolved("region"))),
            }
        }
        if let Some(value) = &filters.district {
            match self.resolver.district(value, geo.region_id.as_ref()).await? {
                Some(district) => geo.district_id = Some(district.id),
                None => return Ok(Err(Unresolved("district"))),
            }
        }
        if let Some(value) = &filters.sub_district {
            match self
                .resolver
                .sub_district(value, geo.district_id.as_ref())
                .await?
            {
                Some(sub_district) => geo.sub_district_id = Some(sub_district.id),
                None => return Ok(Err(Unresolved("sub-district"))),
            }
        }

        let mut restriction = CaseFilter::default();

        if let Some(value) = &filters.community {
            let scope = match (geo.sub_district_id, geo.district_id) {
                (Some(sub_district), _) => Some(CommunityParent::SubDistrict(sub_district)),
                (None, Some(district)) => Some(CommunityParent::District(district)),
                (None, None) => None,
            };
            match self.resolver.community(value, scope.as_ref()).await? {
                Some(community) => restriction.community_id = Some(community.id),
                None => return Ok(Err(Unresolved("community"))),
            }
        }

        if !geo.is_empty() {
            restriction.facility_ids = Some(self.cases.find_facility_ids(&geo).await?);
        }

        Ok(Ok(restriction))
    }
}
