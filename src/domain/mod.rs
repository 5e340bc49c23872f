//! Domain models and types for Vigil.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RegionId`], [`DistrictId`], [`CommunityId`], ...)
//! - **Hierarchy models** ([`Region`], [`District`], [`SubDistrict`], [`Community`])
//! - **Dependents** ([`Facility`], [`Case`], [`CaseType`])
//! - **Error types** ([`VigilError`]) and the [`Result`] alias
//!
//! # Type Safety
//!
//! Each entity has its own identifier newtype, so ids cannot be mixed up:
//!
//! ```rust
//! use vigil::domain::{CommunityParent, DistrictId, Community};
//!
//! let district = DistrictId::new();
//! let community = Community::new("Asokwa", CommunityParent::District(district));
//! assert_eq!(community.district_id, Some(district));
//! assert!(community.sub_district_id.is_none());
//! ```

pub mod case;
pub mod errors;
pub mod facility;
pub mod hierarchy;
pub mod ids;
pub mod result;

pub use case::{Case, CaseStatus, CaseType, LocationSnapshot, PatientOutcome};
pub use errors::VigilError;
pub use facility::{Facility, FacilityGeoFilter};
pub use hierarchy::{
    Community, CommunityParent, District, HierarchyLevel, HierarchyNode, LocationNames,
    ParentScope, Region, SubDistrict,
};
pub use ids::{CaseId, CaseTypeId, CommunityId, DistrictId, FacilityId, RegionId, SubDistrictId};
pub use result::Result;
