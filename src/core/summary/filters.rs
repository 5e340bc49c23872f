//! Summary filter values
//!
//! Every filter is optional and may be an identifier or a name. Blank values
//! count as absent.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryFilters {
    pub case_type: Option<String>,
    pub region: Option<String>,
    pub district: Option<String>,
    pub sub_district: Option<String>,
    pub community: Option<String>,
    pub facility: Option<String>,
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl SummaryFilters {
    /// Trimmed copy with blank values dropped
    pub fn normalized(&self) -> Self {
        Self {
            case_type: clean(&self.case_type),
            region: clean(&self.region),
            district: clean(&self.district),
            sub_district: clean(&self.sub_district),
            community: clean(&self.community),
            facility: clean(&self.facility),
        }
    }

    /// Whether any region, district or sub-district filter is present
    pub fn has_geography(&self) -> bool {
        self.region.is_some() || self.district.is_some() || self.sub_district.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_geography()
            && self.case_type.is_none()
            && self.community.is_none()
            && self.facility.is_none()
    }

    pub fn with_case_type(mut self, value: impl Into<String>) -> Self {
        self.case_type = Some(value.into());
        self
    }

    pub fn with_region(mut self, value: impl Into<String>) -> Self {
        self.region = Some(value.into());
        self
    }

    pub fn with_district(mut self, value: impl Into<String>) -> Self {
        self.district = Some(value.into());
        self
    }

    pub fn with_sub_district(mut self, value: impl Into<String>) -> Self {
        self.sub_district = Some(value.into());
        self
    }

    pub fn with_community(mut self, value: impl Into<String>) -> Self {
        self.community = Some(value.into());
        self
    }

    pub fn with_facility(mut self, value: impl Into<String>) -> Self {
        self.facility = Some(value.into());
        self
    }
}
