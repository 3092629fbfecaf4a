//! Component checks on how travel is routed and booked.

use crate::domain::{FareUsage, TravelSegment};
use crate::rules::FareTerms;

use super::scope::CheckContext;
use super::verdict::FailureReason;

/// Every air segment must hold the confirmed reservation status.
pub fn check_confirmed(
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
) -> Result<(), FailureReason> {
    if !terms.confirmed_required {
        return Ok(());
    }

    let unconfirmed = segments.iter().position(|s| {
        s.air_service()
            .is_some_and(|air| air.status != cx.config.confirmed_status)
    });
    match unconfirmed {
        Some(segment) => Err(FailureReason::Unconfirmed { segment }),
        None => Ok(()),
    }
}

/// Travel must not pass through the rule's not-via location. Only interior
/// points are tested.
pub fn check_not_via_location(
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
) -> Result<(), FailureReason> {
    match &terms.not_via_location {
        Some(loc) if cx.geo.is_via(segments, loc) => Err(FailureReason::ViaLocation(loc.clone())),
        _ => Ok(()),
    }
}

/// The fare must not have been raised to a higher intermediate point.
pub fn check_not_via_hip(terms: &FareTerms, usage: &FareUsage) -> Result<(), FailureReason> {
    if terms.must_not_via_hip && usage.hip_plus_up > 0.0 {
        return Err(FailureReason::ViaHigherIntermediatePoint);
    }
    Ok(())
}
