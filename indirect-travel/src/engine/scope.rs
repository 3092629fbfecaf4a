//! What a single rule check sees: the request and the travel being checked.

use crate::domain::{FareComponent, Itinerary, LocKey, Location, PricingContext, TravelSegment};
use crate::sources::RuleRepository;

use super::config::LimitationConfig;
use super::geography::Geography;

/// Request-wide inputs shared by every check.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    pub geo: Geography<'a>,
    pub rules: &'a dyn RuleRepository,
    pub config: &'a LimitationConfig,
    pub itinerary: &'a Itinerary,
    pub pricing: &'a PricingContext,
}

impl CheckContext<'_> {
    /// Whether `point` satisfies the rule's must-be-to/from location. Always
    /// true when the rule has none.
    pub fn is_to_from(&self, point: &Location, to_from: Option<&LocKey>) -> bool {
        to_from.is_none_or(|loc| self.geo.is_in_location(point, loc))
    }

    /// Pair form used by the stopover checks: a segment's origin qualifies
    /// only when that segment is international, and likewise for `next`'s
    /// destination.
    pub fn is_to_from_pair(
        &self,
        seg: &TravelSegment,
        next: &TravelSegment,
        to_from: Option<&LocKey>,
    ) -> bool {
        let Some(loc) = to_from else {
            return true;
        };
        (!seg.is_domestic() && self.geo.is_in_location(&seg.origin, loc))
            || (!next.is_domestic() && self.geo.is_in_location(&next.destination, loc))
    }
}

/// Granularity a rule is checked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Journey,
    Component,
}

/// The run of segments a rule is checked against.
#[derive(Debug, Clone, Copy)]
pub struct SegmentScope<'a> {
    pub level: Level,

    /// Never empty.
    pub segments: &'a [TravelSegment],

    /// Component is priced inbound; its origin and destination swap.
    pub reverse: bool,

    /// Classify stopovers from connection times instead of the priced flag.
    pub use_connection_times: bool,
}

impl<'a> SegmentScope<'a> {
    pub fn journey(itinerary: &'a Itinerary) -> Self {
        Self {
            level: Level::Journey,
            segments: itinerary.segments(),
            reverse: false,
            use_connection_times: false,
        }
    }

    pub fn component(itinerary: &'a Itinerary, component: &FareComponent, reverse: bool) -> Self {
        Self {
            level: Level::Component,
            segments: component.segments(itinerary),
            reverse,
            use_connection_times: component.has_side_trip(),
        }
    }

    pub fn first(&self) -> &'a TravelSegment {
        &self.segments[0]
    }

    pub fn last(&self) -> &'a TravelSegment {
        &self.segments[self.segments.len() - 1]
    }

    /// Origin in the direction the fare is priced.
    pub fn fare_origin(&self) -> &'a Location {
        if self.reverse {
            &self.last().destination
        } else {
            &self.first().origin
        }
    }

    /// Destination in the direction the fare is priced.
    pub fn fare_destination(&self) -> &'a Location {
        if self.reverse {
            &self.first().origin
        } else {
            &self.last().destination
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CarrierCode, GlobalDirection, NationCode, PointCode};

    fn loc(code: &str, nation: &str) -> Location {
        Location::new(
            PointCode::parse(code).unwrap(),
            NationCode::parse(nation).unwrap(),
        )
    }

    fn cxr(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn itin() -> Itinerary {
        Itinerary::new(
            vec![
                TravelSegment::air(loc("LHR", "GB"), loc("CDG", "FR"), cxr("BA")),
                TravelSegment::air(loc("CDG", "FR"), loc("FCO", "IT"), cxr("AF")),
            ],
            cxr("BA"),
        )
        .unwrap()
    }

    #[test]
    fn journey_scope() {
        let it = itin();
        let scope = SegmentScope::journey(&it);

        assert_eq!(scope.level, Level::Journey);
        assert_eq!(scope.segments.len(), 2);
        assert_eq!(scope.fare_origin().airport.as_str(), "LHR");
        assert_eq!(scope.fare_destination().airport.as_str(), "FCO");
    }

    #[test]
    fn reversed_component_swaps_endpoints() {
        let it = itin();
        let fc = FareComponent::new(&it, 0, 1, cxr("BA"), GlobalDirection::Eh).unwrap();
        let scope = SegmentScope::component(&it, &fc, true);

        assert_eq!(scope.fare_origin().airport.as_str(), "FCO");
        assert_eq!(scope.fare_destination().airport.as_str(), "LHR");
        assert!(!scope.use_connection_times);
    }

    #[test]
    fn side_trip_uses_connection_times() {
        let it = itin();
        let fc = FareComponent::new(&it, 0, 1, cxr("BA"), GlobalDirection::Eh)
            .unwrap()
            .with_side_trip(vec![1])
            .unwrap();

        assert!(SegmentScope::component(&it, &fc, false).use_connection_times);
    }
}
