//! Domain types for limitation-on-indirect-travel validation.
//!
//! This module contains the itinerary and pricing model the engine reads.
//! Codes are validated at construction time, so code that receives these
//! types can trust their validity.

mod carrier;
mod context;
mod error;
mod fare;
mod itinerary;
mod location;
mod nation;
mod point;
mod segment;

pub use carrier::{CarrierCode, InvalidCarrierCode};
pub use context::{ADULT, NEGOTIATED, PricingContext};
pub use error::DomainError;
pub use fare::{
    Fare, FareComponent, FareDirection, FarePath, FareUsage, GlobalDirection, PricingUnit,
    PuFareType,
};
pub use itinerary::{GeoTravelType, Itinerary};
pub use location::{Coordinates, LocKey, LocKind, Location};
pub use nation::{InvalidNationCode, NationCode};
pub use point::{InvalidPointCode, PointCode};
pub use segment::{AirService, CONFIRMED, SegmentKind, StopoverOverride, TravelSegment};
