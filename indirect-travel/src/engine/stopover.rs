//! Stopover classification and stopover limits.

use std::collections::BTreeMap;

use tracing::trace;

use crate::domain::{GeoTravelType, LocKey, NationCode, PointCode, StopoverOverride, TravelSegment};
use crate::rules::{LimitationRule, PointApplication};

use super::config::LimitationConfig;
use super::scope::{CheckContext, Level, SegmentScope};
use super::verdict::FailureReason;

/// Whether travel stops over at the end of `seg`.
///
/// Agent overrides win. With `next`, ground time longer than the threshold
/// for the itinerary's travel type is a stopover; when the ground time is
/// unknown, or without `next`, the priced stopover flag decides.
pub fn is_stopover(
    seg: &TravelSegment,
    next: Option<&TravelSegment>,
    geo_travel_type: GeoTravelType,
    config: &LimitationConfig,
) -> bool {
    match seg.forced {
        Some(StopoverOverride::ForcedStopover) => return true,
        Some(StopoverOverride::ForcedConnection) => return false,
        None => {}
    }

    let threshold = match geo_travel_type {
        GeoTravelType::Domestic | GeoTravelType::Transborder => config.domestic_stopover(),
        GeoTravelType::ForeignDomestic | GeoTravelType::International => {
            config.international_stopover()
        }
    };

    next.and_then(|next| seg.connection_time(next))
        .map_or(seg.stopover, |ground| ground > threshold)
}

/// Indices `i` of the segments after which travel stops over, excluding the
/// scope's final segment.
///
/// A surface sector inherits the classification of the point it leaves. The
/// last air segment before a closing surface sector always stops over.
pub fn stopover_points(
    segments: &[TravelSegment],
    use_connection_times: bool,
    geo_travel_type: GeoTravelType,
    config: &LimitationConfig,
) -> Vec<usize> {
    let Some(last) = segments.len().checked_sub(1) else {
        return Vec::new();
    };
    let ends_on_surface = segments[last].is_surface();

    let mut points = Vec::new();
    let mut last_was_stopover = true;
    for (i, pair) in segments.windows(2).enumerate() {
        let (seg, next) = (&pair[0], &pair[1]);
        let stops = if seg.is_surface() {
            last_was_stopover
        } else {
            is_stopover(
                seg,
                use_connection_times.then_some(next),
                geo_travel_type,
                config,
            ) || (ends_on_surface && i + 1 == last)
        };

        if stops {
            points.push(i);
        }
        last_was_stopover = stops;
    }

    points
}

fn scope_stopovers(cx: &CheckContext<'_>, scope: &SegmentScope<'_>) -> Vec<usize> {
    stopover_points(
        scope.segments,
        scope.use_connection_times,
        cx.itinerary.geo_travel_type(),
        cx.config,
    )
}

// ========== Checks ==========

/// Stopover limit within `loc`.
pub fn check_stopovers_at(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    scope: &SegmentScope<'_>,
    loc: &LocKey,
) -> Result<(), FailureReason> {
    let Some(max) = rule.max_stopovers.limit(cx.config.max_stopovers) else {
        return Ok(());
    };

    let to_from = rule.must_be_to_from();
    let segs = scope.segments;
    let count = scope_stopovers(cx, scope)
        .into_iter()
        .filter(|&i| {
            cx.geo.is_in_location(&segs[i].destination, loc)
                && cx.is_to_from_pair(&segs[i], &segs[i + 1], to_from)
        })
        .count();
    trace!(seq_no = rule.seq_no, location = %loc, count, "Stopovers");

    if count > max as usize {
        return Err(FailureReason::TooManyStopoversAt {
            location: loc.clone(),
            max,
        });
    }
    Ok(())
}

/// Overall stopover limit. Only applies when the rule names neither a
/// stopover location nor a stopover point.
pub fn check_total_stopovers(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    scope: &SegmentScope<'_>,
) -> Result<(), FailureReason> {
    let Some(max) = rule.max_stopovers.limit(cx.config.max_stopovers) else {
        return Ok(());
    };
    if rule.stopover_location.is_some() || rule.stopover_point.is_some() {
        return Ok(());
    }

    let count = scope_stopovers(cx, scope).len();
    if count > max as usize {
        return Err(FailureReason::TooManyStopovers { max });
    }
    Ok(())
}

/// Stopover limit at each intermediate city.
pub fn check_intermediate_stopovers(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    scope: &SegmentScope<'_>,
) -> Result<(), FailureReason> {
    let Some(max) = rule.max_stopovers.limit(cx.config.max_stopovers) else {
        return Ok(());
    };

    let to_from = rule.must_be_to_from();
    let segs = scope.segments;
    let mut per_city: BTreeMap<PointCode, u32> = BTreeMap::new();
    for i in scope_stopovers(cx, scope) {
        if !(cx.is_to_from(&segs[i].origin, to_from)
            || cx.is_to_from(&segs[i + 1].destination, to_from))
        {
            continue;
        }

        let city = segs[i].off_city();
        let count = per_city.entry(city).or_default();
        *count += 1;
        if *count > max {
            return Err(FailureReason::TooManyStopoversAtPoint { city, max });
        }
    }
    Ok(())
}

/// Stopover limit at the nation a rule's stopover point application names.
pub fn check_general_stopover(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    scope: &SegmentScope<'_>,
) -> Result<(), FailureReason> {
    let Some(point) = rule.stopover_point else {
        return Ok(());
    };

    let nation: NationCode = match (point, scope.level) {
        (PointApplication::JourneyOriginCountry, level) => {
            let origin = cx.itinerary.origin().nation;
            // A component returning to the journey origin country is not
            // limited there when the rule restricts travel to/from a location.
            if level == Level::Component
                && rule.must_be_to_from().is_some()
                && scope.last().destination.nation == origin
            {
                return Ok(());
            }
            origin
        }
        (PointApplication::PaymentCountry, _) => cx.pricing.point_of_sale.nation,
        (PointApplication::ComponentOriginCountry, Level::Component) => {
            scope.fare_origin().nation
        }
        (PointApplication::ComponentDestinationCountry, Level::Component) => {
            scope.fare_destination().nation
        }
        (PointApplication::IntermediatePoint, Level::Component) => {
            return check_intermediate_stopovers(rule, cx, scope);
        }
        (_, Level::Journey) => return Ok(()),
    };

    check_stopovers_at(rule, cx, scope, &LocKey::nation(nation))
}

/// Stopover limit at the rule's explicit stopover location.
pub fn check_specific_stopover(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    scope: &SegmentScope<'_>,
) -> Result<(), FailureReason> {
    match &rule.stopover_location {
        Some(loc) => check_stopovers_at(rule, cx, scope, loc),
        None => Ok(()),
    }
}
