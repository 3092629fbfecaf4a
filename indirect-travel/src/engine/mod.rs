//! Limitation-on-indirect-travel validation.
//!
//! This module answers: "may this itinerary be sold on one ticket, and may
//! each fare be applied to the travel it covers?"
//!
//! Rules are checked at three granularities. A journey failure is a hard
//! stop for the whole itinerary; pricing-unit and fare-component failures
//! only reject that combination of fares. Each check counts departures,
//! arrivals, retransits, stopovers or domestic segments over a run of
//! segments and compares the count with the rule's maximum.

mod config;
mod domestic;
mod geography;
mod prequalify;
mod retransit;
mod scope;
mod stopover;
mod validator;
mod verdict;
mod via;

pub use config::LimitationConfig;
pub use geography::Geography;
pub use prequalify::{
    all_via_carrier, applies_to_request, component_matches, fare_matches, retransits_via_carrier,
};
pub use retransit::{
    DepartureArrivalCounts, count_city_retransits, count_departures_arrivals,
    count_retransits_at, revisits_endpoint,
};
pub use scope::{CheckContext, Level, SegmentScope};
pub use stopover::{is_stopover, stopover_points};
pub use validator::LimitationValidator;
pub use verdict::{
    Bypass, Clearance, FailureReason, FarePathVerdict, HardStop, RuleFailure, RuleState, Verdict,
};
