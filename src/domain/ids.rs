//! Domain identifier types
//!
//! Every record is identified by a UUID. Each entity gets its own newtype so
//! a district id cannot be passed where a sub-district id is expected. The
//! repair pass is the one place that deliberately reinterprets an id across
//! kinds, and it does so explicitly through [`DistrictId::from_uuid`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Returns true when `value` is a syntactically valid identifier
///
/// Surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use vigil::domain::ids::is_identifier;
///
/// assert!(is_identifier("7d44b88c-4199-4bad-97dc-d78268e01398"));
/// assert!(!is_identifier("Kumasi Metro"));
/// ```
pub fn is_identifier(value: &str) -> bool {
    Uuid::parse_str(value.trim()).is_ok()
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses an identifier, ignoring surrounding whitespace
            pub fn parse(value: &str) -> Result<Self, String> {
                Uuid::parse_str(value.trim())
                    .map(Self)
                    .map_err(|e| format!("Invalid {} id '{}': {}", $label, value, e))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(
    /// Region identifier
    RegionId,
    "region"
);
define_id!(
    /// District identifier
    DistrictId,
    "district"
);
define_id!(
    /// Sub-district identifier
    SubDistrictId,
    "sub-district"
);
define_id!(
    /// Community identifier
    CommunityId,
    "community"
);
define_id!(
    /// Health facility identifier
    FacilityId,
    "facility"
);
define_id!(
    /// Case type identifier
    CaseTypeId,
    "case type"
);
define_id!(
    /// Case identifier
    CaseId,
    "case"
);
