//! The international surface sector restriction.
//!
//! Travel broken by a surface sector between fare components is only
//! priced through when the surface sector is no longer than the flown
//! travel before it, unless an exemption applies. Exemptions are filed per
//! city pair, or per validating carrier with request filters.

mod exemption;
mod mileage;
mod restriction;

pub use exemption::{ExemptionFilter, ExemptionMatcher};
pub use mileage::{MileageResolver, MileageSource, ResolvedMileage};
pub use restriction::{
    CarrierExemption, SurfaceBypass, SurfaceGap, SurfaceMileage, SurfaceSectorRestriction,
    SurfaceVerdict,
};
