//! Qualifiers deciding whether a rule applies at all.
//!
//! Each predicate answers one question about a rule and the request. A rule
//! whose qualifiers do not all hold is skipped, which counts as a pass.

use crate::domain::{
    CarrierCode, Fare, FareComponent, FareDirection, FareUsage, Location, PointCode,
    TravelSegment,
};
use crate::rules::{
    ComponentDirection, Directionality, FareTerms, LimitationRule, OriginScope, OriginTest,
};

use super::retransit::count_city_retransits;
use super::scope::CheckContext;

// ========== Request qualifiers ==========

/// The ticketing carrier is exempted by the rule's carrier list.
pub fn ticketing_carrier_exempt(rule: &LimitationRule, cx: &CheckContext<'_>) -> bool {
    rule.ticketing_carriers
        .as_ref()
        .is_some_and(|list| list.exempts(cx.itinerary.ticketing_carrier()))
}

/// Wholly-within qualifier, tested against every itinerary point.
pub fn wholly_within_matches(rule: &LimitationRule, cx: &CheckContext<'_>) -> bool {
    rule.wholly_within.as_ref().is_none_or(|w| {
        w.sense
            .accepts(cx.geo.all_within(cx.itinerary.segments(), &w.location))
    })
}

/// Origin qualifier of journey scope. Pricing-unit origin qualifiers are
/// deferred to [`pricing_unit_origin_matches`].
pub fn journey_origin_matches(rule: &LimitationRule, cx: &CheckContext<'_>) -> bool {
    match &rule.origin {
        Some(OriginTest {
            scope: OriginScope::Journey,
            location,
        }) => cx.geo.is_in_location(cx.itinerary.origin(), location),
        _ => true,
    }
}

/// Origin qualifier of pricing-unit scope.
pub fn pricing_unit_origin_matches(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    pu_origin: &Location,
) -> bool {
    match &rule.origin {
        Some(OriginTest {
            scope: OriginScope::PricingUnit,
            location,
        }) => cx.geo.is_in_location(pu_origin, location),
        _ => true,
    }
}

pub fn point_of_sale_matches(rule: &LimitationRule, cx: &CheckContext<'_>) -> bool {
    rule.point_of_sale
        .as_ref()
        .is_none_or(|loc| cx.geo.is_in_location(&cx.pricing.point_of_sale, loc))
}

pub fn point_of_ticketing_matches(rule: &LimitationRule, cx: &CheckContext<'_>) -> bool {
    rule.point_of_ticketing
        .as_ref()
        .is_none_or(|loc| cx.geo.is_in_location(&cx.pricing.point_of_ticketing, loc))
}

/// All request-level qualifiers hold.
pub fn applies_to_request(rule: &LimitationRule, cx: &CheckContext<'_>) -> bool {
    !ticketing_carrier_exempt(rule, cx)
        && wholly_within_matches(rule, cx)
        && journey_origin_matches(rule, cx)
        && point_of_sale_matches(rule, cx)
        && point_of_ticketing_matches(rule, cx)
}

// ========== Component qualifiers ==========

/// A component's pricing direction, preferring the fare usage when one has
/// been chosen.
fn is_inbound(component: &FareComponent, usage: Option<&FareUsage>) -> bool {
    match usage {
        Some(usage) => usage.inbound,
        None => component.direction == FareDirection::Inbound,
    }
}

pub fn governing_carrier_matches(terms: &FareTerms, component: &FareComponent) -> bool {
    terms.governing_carriers.as_ref().is_none_or(|g| {
        g.sense
            .accepts(g.carriers.contains(&component.governing_carrier))
    })
}

/// Outbound/inbound qualifier. Without a fare usage, a component whose
/// direction is unknown only matches rules with no direction.
pub fn component_direction_matches(
    terms: &FareTerms,
    component: &FareComponent,
    usage: Option<&FareUsage>,
) -> bool {
    match (terms.component_direction, usage) {
        (None, _) => true,
        (Some(ComponentDirection::Outbound), Some(usage)) => !usage.inbound,
        (Some(ComponentDirection::Outbound), None) => {
            component.direction == FareDirection::Outbound
        }
        (Some(ComponentDirection::Inbound), _) => is_inbound(component, usage),
        (Some(ComponentDirection::Both), Some(_)) => true,
        (Some(ComponentDirection::Both), None) => component.direction != FareDirection::Unknown,
    }
}

/// Geographic scope of the rule relative to the component's endpoints.
pub fn directionality_matches(
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    component: &FareComponent,
    usage: Option<&FareUsage>,
) -> bool {
    let segments = component.segments(cx.itinerary);
    let origin = component.origin(cx.itinerary);
    let destination = component.destination(cx.itinerary);

    match &terms.directionality {
        None => true,
        Some(Directionality::Between(loc1, loc2)) => {
            cx.geo.from_to(origin, destination, loc1, loc2)
                || cx.geo.from_to(origin, destination, loc2, loc1)
        }
        Some(Directionality::Within(loc)) => cx.geo.all_within(segments, loc),
        Some(Directionality::From(loc1, loc2)) => {
            let inbound = usage.is_some_and(|u| u.inbound)
                || component.direction == FareDirection::Inbound;
            if inbound {
                cx.geo.from_to(destination, origin, loc1, loc2)
            } else {
                cx.geo.from_to(origin, destination, loc1, loc2)
            }
        }
    }
}

pub fn global_direction_matches(terms: &FareTerms, component: &FareComponent) -> bool {
    terms
        .global_direction
        .is_none_or(|gd| gd == component.global_direction)
}

/// Every air segment is marketed by `carrier`.
pub fn all_via_carrier(segments: &[TravelSegment], carrier: CarrierCode) -> bool {
    segments
        .iter()
        .filter_map(TravelSegment::carrier)
        .all(|c| c == carrier)
}

pub fn via_governing_carrier_matches(
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    component: &FareComponent,
) -> bool {
    terms.via_governing_carrier.is_none_or(|sense| {
        sense.accepts(all_via_carrier(
            component.segments(cx.itinerary),
            component.governing_carrier,
        ))
    })
}

/// Travel from the first visit to `city` through its next `retransits`
/// visits is flown on `carrier`.
pub fn retransits_via_carrier(
    segments: &[TravelSegment],
    carrier: CarrierCode,
    city: PointCode,
    retransits: u32,
) -> bool {
    let mut checking = false;
    let mut checked = 0;

    for seg in segments.iter().filter(|s| s.is_air()) {
        let on_carrier = seg.carrier() == Some(carrier);
        if seg.off_city() == city {
            if !checking {
                checking = true;
                continue;
            }
            if !on_carrier {
                return false;
            }
            checked += 1;
            if checked >= retransits {
                return true;
            }
        } else if checking && !on_carrier {
            return false;
        }
    }

    true
}

pub fn retransit_via_governing_carrier_matches(
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    component: &FareComponent,
) -> bool {
    let Some(sense) = terms.retransit_via_governing_carrier else {
        return true;
    };

    let segments = component.segments(cx.itinerary);
    count_city_retransits(segments, |_| true)
        .into_iter()
        .filter(|&(_, n)| n > 0)
        .all(|(city, n)| {
            sense.accepts(retransits_via_carrier(
                segments,
                component.governing_carrier,
                city,
                n,
            ))
        })
}

/// Exact fare type, or `*X` matching any fare type with the same designator.
pub fn fare_type_matches(terms: &FareTerms, cx: &CheckContext<'_>, fare: &Fare) -> bool {
    let Some(wanted) = &terms.fare_type else {
        return true;
    };

    if wanted.starts_with('*') {
        let date = cx.pricing.travel_date;
        match (
            cx.rules.fare_type_designator(&fare.fare_type, date),
            cx.rules.fare_type_designator(wanted, date),
        ) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    } else {
        fare.fare_type == *wanted
    }
}

/// The fare is not on one of the rule's excluded routings.
pub fn routing_matches(terms: &FareTerms, fare: &Fare) -> bool {
    fare.routing
        .as_ref()
        .is_none_or(|r| !terms.excluded_routings.contains(r))
}

/// Qualifiers that need only the component.
pub fn component_matches(
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    component: &FareComponent,
    usage: Option<&FareUsage>,
) -> bool {
    governing_carrier_matches(terms, component)
        && component_direction_matches(terms, component, usage)
        && directionality_matches(terms, cx, component, usage)
        && global_direction_matches(terms, component)
        && via_governing_carrier_matches(terms, cx, component)
        && retransit_via_governing_carrier_matches(terms, cx, component)
}

/// Qualifiers that need the selected fare.
pub fn fare_matches(terms: &FareTerms, cx: &CheckContext<'_>, fare: &Fare) -> bool {
    fare_type_matches(terms, cx, fare) && routing_matches(terms, fare)
}
