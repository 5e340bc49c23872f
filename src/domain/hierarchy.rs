//! Administrative geography model
//!
//! The hierarchy has four fixed levels: Region → District → SubDistrict → Community.
//! SubDistrict is optional, so a Community hangs off either a District or a
//! SubDistrict, never both.

use super::ids::{CommunityId, DistrictId, RegionId, SubDistrictId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A level of the administrative hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HierarchyLevel {
    Region,
    District,
    SubDistrict,
    Community,
}

impl HierarchyLevel {
    /// Canonical lowercase label, as used in messages and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Region => "region",
            HierarchyLevel::District => "district",
            HierarchyLevel::SubDistrict => "sub-district",
            HierarchyLevel::Community => "community",
        }
    }

    /// Levels whose nodes may act as a scope for names at this level
    pub fn parent_levels(&self) -> &'static [HierarchyLevel] {
        match self {
            HierarchyLevel::Region => &[],
            HierarchyLevel::District => &[HierarchyLevel::Region],
            HierarchyLevel::SubDistrict => &[HierarchyLevel::District],
            HierarchyLevel::Community => &[HierarchyLevel::District, HierarchyLevel::SubDistrict],
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "region" => Ok(HierarchyLevel::Region),
            "district" => Ok(HierarchyLevel::District),
            "sub-district" | "subdistrict" | "sub_district" => Ok(HierarchyLevel::SubDistrict),
            "community" => Ok(HierarchyLevel::Community),
            other => Err(format!(
                "Unknown hierarchy level '{other}'. Expected region, district, sub-district or community"
            )),
        }
    }
}

/// Trims a user-supplied name, returning `None` when nothing is left
///
/// # Examples
///
/// ```
/// use vigil::domain::hierarchy::normalize_name;
///
/// assert_eq!(normalize_name("  Kumasi Metro "), Some("Kumasi Metro".to_string()));
/// assert_eq!(normalize_name("   "), None);
/// ```
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Comparison key for case-insensitive name equality
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Root of the hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RegionId::new(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: DistrictId,
    pub name: String,
    pub region_id: RegionId,
    pub created_at: DateTime<Utc>,
}

impl District {
    pub fn new(name: impl Into<String>, region_id: RegionId) -> Self {
        Self {
            id: DistrictId::new(),
            name: name.into(),
            region_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubDistrict {
    pub id: SubDistrictId,
    pub name: String,
    pub district_id: DistrictId,
    pub created_at: DateTime<Utc>,
}

impl SubDistrict {
    pub fn new(name: impl Into<String>, district_id: DistrictId) -> Self {
        Self {
            id: SubDistrictId::new(),
            name: name.into(),
            district_id,
            created_at: Utc::now(),
        }
    }
}

/// The single parent of a newly created community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "kebab-case")]
pub enum CommunityParent {
    District(DistrictId),
    SubDistrict(SubDistrictId),
}

impl CommunityParent {
    pub fn level(&self) -> HierarchyLevel {
        match self {
            CommunityParent::District(_) => HierarchyLevel::District,
            CommunityParent::SubDistrict(_) => HierarchyLevel::SubDistrict,
        }
    }

    pub fn district_id(&self) -> Option<DistrictId> {
        match self {
            CommunityParent::District(id) => Some(*id),
            CommunityParent::SubDistrict(_) => None,
        }
    }

    pub fn sub_district_id(&self) -> Option<SubDistrictId> {
        match self {
            CommunityParent::District(_) => None,
            CommunityParent::SubDistrict(id) => Some(*id),
        }
    }
}

impl From<DistrictId> for CommunityParent {
    fn from(id: DistrictId) -> Self {
        CommunityParent::District(id)
    }
}

impl From<SubDistrictId> for CommunityParent {
    fn from(id: SubDistrictId) -> Self {
        CommunityParent::SubDistrict(id)
    }
}

/// Leaf of the hierarchy
///
/// Persisted rows may carry legacy corruption: a district id stored in the
/// `sub_district_id` slot, or duplicates under the same parent. Rows are
/// therefore stored with two nullable parent columns, and new rows can only
/// be built through [`Community::new`], which takes exactly one parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub district_id: Option<DistrictId>,
    pub sub_district_id: Option<SubDistrictId>,
    pub created_at: DateTime<Utc>,
}

impl Community {
    pub fn new(name: impl Into<String>, parent: CommunityParent) -> Self {
        Self {
            id: CommunityId::new(),
            name: name.into(),
            district_id: parent.district_id(),
            sub_district_id: parent.sub_district_id(),
            created_at: Utc::now(),
        }
    }

    /// The stored parent, or `None` when the row has neither or both set
    pub fn parent(&self) -> Option<CommunityParent> {
        match (self.district_id, self.sub_district_id) {
            (Some(district), None) => Some(CommunityParent::District(district)),
            (None, Some(sub_district)) => Some(CommunityParent::SubDistrict(sub_district)),
            _ => None,
        }
    }

    /// Whether this row is a candidate for misplaced-parent repair
    pub fn is_repair_candidate(&self) -> bool {
        self.district_id.is_none() && self.sub_district_id.is_some()
    }
}

/// Parent node used to scope a name lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentScope {
    Region(RegionId),
    District(DistrictId),
    SubDistrict(SubDistrictId),
}

impl ParentScope {
    pub fn level(&self) -> HierarchyLevel {
        match self {
            ParentScope::Region(_) => HierarchyLevel::Region,
            ParentScope::District(_) => HierarchyLevel::District,
            ParentScope::SubDistrict(_) => HierarchyLevel::SubDistrict,
        }
    }

    pub fn as_uuid(&self) -> &Uuid {
        match self {
            ParentScope::Region(id) => id.as_uuid(),
            ParentScope::District(id) => id.as_uuid(),
            ParentScope::SubDistrict(id) => id.as_uuid(),
        }
    }

    /// Builds a scope of the given level from a raw identifier string
    pub fn parse(level: HierarchyLevel, value: &str) -> Result<Self, String> {
        match level {
            HierarchyLevel::Region => RegionId::parse(value).map(ParentScope::Region),
            HierarchyLevel::District => DistrictId::parse(value).map(ParentScope::District),
            HierarchyLevel::SubDistrict => {
                SubDistrictId::parse(value).map(ParentScope::SubDistrict)
            }
            HierarchyLevel::Community => {
                Err("A community cannot scope another hierarchy node".to_string())
            }
        }
    }
}

impl From<CommunityParent> for ParentScope {
    fn from(parent: CommunityParent) -> Self {
        match parent {
            CommunityParent::District(id) => ParentScope::District(id),
            CommunityParent::SubDistrict(id) => ParentScope::SubDistrict(id),
        }
    }
}

impl fmt::Display for ParentScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level(), self.as_uuid())
    }
}

/// A node at any level
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "level", rename_all = "kebab-case")]
pub enum HierarchyNode {
    Region(Region),
    District(District),
    SubDistrict(SubDistrict),
    Community(Community),
}

impl HierarchyNode {
    pub fn level(&self) -> HierarchyLevel {
        match self {
            HierarchyNode::Region(_) => HierarchyLevel::Region,
            HierarchyNode::District(_) => HierarchyLevel::District,
            HierarchyNode::SubDistrict(_) => HierarchyLevel::SubDistrict,
            HierarchyNode::Community(_) => HierarchyLevel::Community,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            HierarchyNode::Region(n) => *n.id.as_uuid(),
            HierarchyNode::District(n) => *n.id.as_uuid(),
            HierarchyNode::SubDistrict(n) => *n.id.as_uuid(),
            HierarchyNode::Community(n) => *n.id.as_uuid(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            HierarchyNode::Region(n) => &n.name,
            HierarchyNode::District(n) => &n.name,
            HierarchyNode::SubDistrict(n) => &n.name,
            HierarchyNode::Community(n) => &n.name,
        }
    }
}

/// Denormalized names of a community and its ancestors, for display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationNames {
    pub region: Option<String>,
    pub district: Option<String>,
    pub sub_district: Option<String>,
    pub community: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("region", HierarchyLevel::Region)]
    #[test_case("District", HierarchyLevel::District)]
    #[test_case("sub-district", HierarchyLevel::SubDistrict)]
    #[test_case("subdistrict", HierarchyLevel::SubDistrict)]
    #[test_case(" community ", HierarchyLevel::Community)]
    fn test_level_from_str(input: &str, expected: HierarchyLevel) {
        assert_eq!(input.parse::<HierarchyLevel>().unwrap(), expected);
    }

    #[test]
    fn test_level_from_str_rejects_unknown() {
        assert!("county".parse::<HierarchyLevel>().is_err());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Asokwa"), Some("Asokwa".to_string()));
        assert_eq!(normalize_name("\tAsokwa \n"), Some("Asokwa".to_string()));
        assert_eq!(normalize_name(""), None);
    }

    #[test]
    fn test_name_key_is_case_insensitive() {
        assert_eq!(name_key(" ASHANTI"), name_key("ashanti "));
    }

    #[test]
    fn test_community_under_sub_district_has_no_district() {
        let sub = SubDistrictId::new();
        let community = Community::new("Asokwa", CommunityParent::SubDistrict(sub));
        assert_eq!(community.district_id, None);
        assert_eq!(community.sub_district_id, Some(sub));
        assert_eq!(community.parent(), Some(CommunityParent::SubDistrict(sub)));
    }

    #[test]
    fn test_community_under_district_has_no_sub_district() {
        let district = DistrictId::new();
        let community = Community::new("Asokwa", CommunityParent::District(district));
        assert_eq!(community.district_id, Some(district));
        assert_eq!(community.sub_district_id, None);
        assert!(!community.is_repair_candidate());
    }

    #[test]
    fn test_corrupt_community_has_no_parent() {
        let mut community = Community::new("Asokwa", CommunityParent::District(DistrictId::new()));
        community.sub_district_id = Some(SubDistrictId::new());
        assert_eq!(community.parent(), None);
    }

    #[test]
    fn test_parent_scope_parse_rejects_community() {
        let id = CommunityId::new().to_string();
        assert!(ParentScope::parse(HierarchyLevel::Community, &id).is_err());
        assert!(ParentScope::parse(HierarchyLevel::District, &id).is_ok());
    }
}
