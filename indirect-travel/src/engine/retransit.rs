//! International departure, arrival and retransit limits.
//!
//! A retransit is a return to a location after leaving it. The counting
//! functions are pure so they can be inspected independently of a rule's
//! limits; the `check_*` functions compare counts against the limits and
//! report the first violation.

use std::collections::BTreeMap;

use tracing::trace;

use crate::domain::{LocKey, Location, NationCode, PointCode, TravelSegment};
use crate::rules::{LimitationRule, PointApplication};

use super::scope::{CheckContext, Level, SegmentScope};
use super::verdict::FailureReason;

/// International departures and arrivals per nation within a location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartureArrivalCounts {
    pub departures: BTreeMap<NationCode, u32>,
    pub arrivals: BTreeMap<NationCode, u32>,
}

/// Count international departures from, and arrivals into, nations within
/// `loc`.
///
/// An arrival counts when an international segment lands in `loc`. A
/// departure counts when an international segment leaves a point reached by
/// a segment that landed in `loc`; the first segment counts when its own
/// origin is in `loc`.
pub fn count_departures_arrivals(
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
    loc: &LocKey,
) -> DepartureArrivalCounts {
    let mut counts = DepartureArrivalCounts::default();
    let mut previous_in_loc = segments
        .first()
        .is_some_and(|s| cx.geo.is_in_location(&s.origin, loc));

    for seg in segments {
        let departs_from_loc = previous_in_loc;
        let arrives_in_loc = cx.geo.is_in_location(&seg.destination, loc);
        previous_in_loc = arrives_in_loc;

        if !seg.is_international() {
            continue;
        }
        if departs_from_loc {
            *counts.departures.entry(seg.origin.nation).or_default() += 1;
        }
        if arrives_in_loc {
            *counts.arrivals.entry(seg.destination.nation).or_default() += 1;
        }
    }

    counts
}

/// Count re-entries into `loc`. The first entry is not a retransit.
///
/// Points at the scope's origin or destination city are ignored. A
/// departure from `loc` counts only after a surface gap, and consecutive
/// points inside `loc` count once.
pub fn count_retransits_at(
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
    loc: &LocKey,
    to_from: Option<&LocKey>,
) -> u32 {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return 0;
    };
    let endpoints = [first.board_city(), last.off_city()];

    let mut entries = 0u32;
    let mut inside = false;
    let mut previous: Option<&TravelSegment> = None;

    for seg in segments {
        let depart_city = seg.board_city();
        let surface_gap = previous.is_some_and(|p| p.off_city() != depart_city);
        if !endpoints.contains(&depart_city) && surface_gap {
            if cx.geo.is_in_location(&seg.origin, loc) {
                if !inside && cx.is_to_from(&seg.destination, to_from) {
                    entries += 1;
                    inside = true;
                }
            } else {
                inside = false;
            }
        }

        if !endpoints.contains(&seg.off_city()) {
            if cx.geo.is_in_location(&seg.destination, loc) {
                if !inside && cx.is_to_from(&seg.origin, to_from) {
                    entries += 1;
                    inside = true;
                }
            } else {
                inside = false;
            }
        }

        previous = Some(seg);
    }

    entries.saturating_sub(1)
}

/// Retransits per intermediate city. A city's first visit is recorded as
/// zero; each later visit adds one.
///
/// `qualifies` filters by the far end of the segment: the destination for
/// a departure, the origin for an arrival.
pub fn count_city_retransits(
    segments: &[TravelSegment],
    qualifies: impl Fn(&Location) -> bool,
) -> BTreeMap<PointCode, u32> {
    let mut visits: BTreeMap<PointCode, u32> = BTreeMap::new();
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return visits;
    };
    let endpoints = [first.board_city(), last.off_city()];

    let mut visit = |city: PointCode| {
        visits
            .entry(city)
            .and_modify(|n| *n += 1)
            .or_insert(0);
    };

    let mut previous: Option<&TravelSegment> = None;
    for seg in segments {
        let depart_city = seg.board_city();
        if !endpoints.contains(&depart_city)
            && previous.is_some_and(|p| p.off_city() != depart_city)
            && qualifies(&seg.destination)
        {
            visit(depart_city);
        }

        let arrive_city = seg.off_city();
        if !endpoints.contains(&arrive_city) && arrive_city != depart_city && qualifies(&seg.origin)
        {
            visit(arrive_city);
        }

        previous = Some(seg);
    }

    visits
}

/// Whether any interior point of the segments revisits the scope's board or
/// off city.
///
/// Segments that stay within one city, such as an airport transfer, neither
/// bound the scope nor count as a visit.
pub fn revisits_endpoint(segments: &[TravelSegment]) -> bool {
    let moves = |seg: &&TravelSegment| seg.board_city() != seg.off_city();
    let (Some(first), Some(last)) = (
        segments.iter().position(|seg| moves(&seg)),
        segments.iter().rposition(|seg| moves(&seg)),
    ) else {
        return false;
    };
    let endpoints = [segments[first].board_city(), segments[last].off_city()];

    segments
        .iter()
        .enumerate()
        .filter(|(_, seg)| moves(seg))
        .any(|(i, seg)| {
            (i != first && endpoints.contains(&seg.board_city()))
                || (i != last && endpoints.contains(&seg.off_city()))
        })
}

// ========== Checks ==========

/// Departure and arrival limits for each nation within `loc`.
pub fn check_departures_arrivals(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
    loc: &LocKey,
) -> Result<(), FailureReason> {
    let max_departures = rule
        .max_international_departures
        .limit(cx.config.max_departures);
    let max_arrivals = rule.max_international_arrivals.limit(cx.config.max_arrivals);
    if max_departures.is_none() && max_arrivals.is_none() {
        return Ok(());
    }

    let counts = count_departures_arrivals(cx, segments, loc);
    trace!(seq_no = rule.seq_no, location = %loc, ?counts, "Departures and arrivals");

    if let Some(max) = max_departures
        && let Some((&nation, _)) = counts.departures.iter().find(|(_, n)| **n > max)
    {
        return Err(FailureReason::TooManyDepartures { nation, max });
    }
    if let Some(max) = max_arrivals
        && let Some((&nation, _)) = counts.arrivals.iter().find(|(_, n)| **n > max)
    {
        return Err(FailureReason::TooManyArrivals { nation, max });
    }
    Ok(())
}

/// Retransit limit at `loc`.
pub fn check_retransits_at(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
    loc: &LocKey,
) -> Result<(), FailureReason> {
    let Some(max) = rule.max_retransits.limit(cx.config.max_retransits) else {
        return Ok(());
    };

    let count = count_retransits_at(cx, segments, loc, rule.must_be_to_from());
    trace!(seq_no = rule.seq_no, location = %loc, count, "Retransits");

    if count > max {
        return Err(FailureReason::TooManyRetransits {
            location: loc.clone(),
            max,
        });
    }
    Ok(())
}

/// Retransit limit at each intermediate city.
pub fn check_intermediate_retransits(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
) -> Result<(), FailureReason> {
    let Some(max) = rule.max_retransits.limit(cx.config.max_retransits) else {
        return Ok(());
    };

    let to_from = rule.must_be_to_from();
    let visits = count_city_retransits(segments, |point| cx.is_to_from(point, to_from));

    match visits.into_iter().find(|(_, n)| *n > max) {
        Some((city, _)) => Err(FailureReason::TooManyRetransitsAtPoint { city, max }),
        None => Ok(()),
    }
}

/// Limits at the nation a rule's retransit point application names.
pub fn check_general_retransit(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    scope: &SegmentScope<'_>,
) -> Result<(), FailureReason> {
    let Some(point) = rule.retransit_point else {
        return Ok(());
    };

    let nation = match (point, scope.level) {
        (PointApplication::JourneyOriginCountry, _) => cx.itinerary.origin().nation,
        (PointApplication::PaymentCountry, _) => cx.pricing.point_of_sale.nation,
        (PointApplication::ComponentOriginCountry, Level::Component) => {
            scope.fare_origin().nation
        }
        (PointApplication::ComponentDestinationCountry, Level::Component) => {
            scope.fare_destination().nation
        }
        (PointApplication::IntermediatePoint, Level::Component) => {
            return check_intermediate_retransits(rule, cx, scope.segments);
        }
        (_, Level::Journey) => return Ok(()),
    };

    let loc = LocKey::nation(nation);
    check_departures_arrivals(rule, cx, scope.segments, &loc)?;
    check_retransits_at(rule, cx, scope.segments, &loc)
}

/// Limits at the rule's explicit retransit location.
pub fn check_specific_retransit(
    rule: &LimitationRule,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
) -> Result<(), FailureReason> {
    let Some(loc) = &rule.retransit_location else {
        return Ok(());
    };

    check_departures_arrivals(rule, cx, segments, loc)?;
    check_retransits_at(rule, cx, segments, loc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CarrierCode, Itinerary, PricingContext};
    use crate::engine::config::LimitationConfig;
    use crate::engine::geography::Geography;
    use crate::rules::MaxCount;
    use crate::sources::{InMemoryGeography, InMemoryRules};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn loc(code: &str, nation: &str) -> Location {
        Location::new(
            PointCode::parse(code).unwrap(),
            NationCode::parse(nation).unwrap(),
        )
    }

    fn nation(s: &str) -> NationCode {
        NationCode::parse(s).unwrap()
    }

    fn air(from: (&str, &str), to: (&str, &str)) -> TravelSegment {
        TravelSegment::air(
            loc(from.0, from.1),
            loc(to.0, to.1),
            CarrierCode::parse("AF").unwrap(),
        )
    }

    struct Fixture {
        geo: InMemoryGeography,
        rules: InMemoryRules,
        config: LimitationConfig,
        itinerary: Itinerary,
        pricing: PricingContext,
    }

    impl Fixture {
        fn new(segments: Vec<TravelSegment>) -> Self {
            let pricing = PricingContext::new(date(), segments[0].origin.clone());
            Self {
                geo: InMemoryGeography::new(),
                rules: InMemoryRules::new(),
                config: LimitationConfig::default(),
                itinerary: Itinerary::new(segments, CarrierCode::parse("AF").unwrap()).unwrap(),
                pricing,
            }
        }

        fn cx(&self) -> CheckContext<'_> {
            CheckContext {
                geo: Geography::new(&self.geo, date()),
                rules: &self.rules,
                config: &self.config,
                itinerary: &self.itinerary,
                pricing: &self.pricing,
            }
        }
    }

    const LHR: (&str, &str) = ("LHR", "GB");
    const CDG: (&str, &str) = ("CDG", "FR");
    const NCE: (&str, &str) = ("NCE", "FR");
    const FRA: (&str, &str) = ("FRA", "DE");
    const FCO: (&str, &str) = ("FCO", "IT");
    const MXP: (&str, &str) = ("MXP", "IT");

    #[test]
    fn counts_arrivals_and_departures() {
        // LHR-CDG-FRA-NCE-FCO: France entered twice, left twice.
        let f = Fixture::new(vec![
            air(LHR, CDG),
            air(CDG, FRA),
            air(FRA, NCE),
            air(NCE, FCO),
        ]);
        let counts = count_departures_arrivals(
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("FR")),
        );

        assert_eq!(counts.arrivals.get(&nation("FR")), Some(&2));
        assert_eq!(counts.departures.get(&nation("FR")), Some(&2));
    }

    #[test]
    fn first_departure_counts_from_origin() {
        let f = Fixture::new(vec![air(CDG, LHR), air(LHR, FRA)]);
        let counts = count_departures_arrivals(
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("FR")),
        );

        assert_eq!(counts.departures.get(&nation("FR")), Some(&1));
        assert!(counts.arrivals.is_empty());
    }

    #[test]
    fn domestic_segments_not_counted() {
        let f = Fixture::new(vec![air(LHR, CDG), air(CDG, NCE), air(NCE, FCO)]);
        let counts = count_departures_arrivals(
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("FR")),
        );

        // CDG-NCE is neither an arrival nor a departure.
        assert_eq!(counts.arrivals.get(&nation("FR")), Some(&1));
        assert_eq!(counts.departures.get(&nation("FR")), Some(&1));
    }

    #[test]
    fn arrival_limit_fails() {
        let f = Fixture::new(vec![
            air(LHR, CDG),
            air(CDG, FRA),
            air(FRA, NCE),
            air(NCE, FCO),
        ]);
        let mut rule = LimitationRule::journey(1);
        rule.max_international_arrivals = MaxCount(1);

        let err = check_departures_arrivals(
            &rule,
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("FR")),
        )
        .unwrap_err();

        assert_eq!(
            err,
            FailureReason::TooManyArrivals {
                nation: nation("FR"),
                max: 1
            }
        );
    }

    #[test]
    fn unlimited_passes() {
        let f = Fixture::new(vec![
            air(LHR, CDG),
            air(CDG, FRA),
            air(FRA, NCE),
            air(NCE, FCO),
        ]);
        let mut rule = LimitationRule::journey(1);
        rule.max_international_arrivals = MaxCount(150);
        rule.max_international_departures = MaxCount::UNLIMITED;

        assert!(
            check_departures_arrivals(
                &rule,
                &f.cx(),
                f.itinerary.segments(),
                &LocKey::nation(nation("FR")),
            )
            .is_ok()
        );
    }

    #[test]
    fn retransit_counts_reentry() {
        // LHR-CDG-FRA-NCE-FCO: second entry into France is a retransit.
        let f = Fixture::new(vec![
            air(LHR, CDG),
            air(CDG, FRA),
            air(FRA, NCE),
            air(NCE, FCO),
        ]);
        let count = count_retransits_at(
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("FR")),
            None,
        );

        assert_eq!(count, 1);
    }

    #[test]
    fn consecutive_points_count_once() {
        let f = Fixture::new(vec![air(LHR, CDG), air(CDG, NCE), air(NCE, FCO)]);
        let count = count_retransits_at(
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("FR")),
            None,
        );

        assert_eq!(count, 0);
    }

    #[test]
    fn departure_after_gap_reenters() {
        // Arrive FRA, resume from MXP: leaving Italy again counts as entry.
        let f = Fixture::new(vec![air(LHR, FCO), air(FCO, FRA), air(MXP, CDG)]);
        let count = count_retransits_at(
            &f.cx(),
            f.itinerary.segments(),
            &LocKey::nation(nation("IT")),
            None,
        );

        assert_eq!(count, 1);
    }

    #[test]
    fn retransit_limit_fails() {
        let f = Fixture::new(vec![
            air(LHR, CDG),
            air(CDG, FRA),
            air(FRA, NCE),
            air(NCE, FCO),
        ]);
        let mut rule = LimitationRule::journey(1);
        rule.max_retransits = MaxCount(0);
        let fr = LocKey::nation(nation("FR"));

        assert_eq!(
            check_retransits_at(&rule, &f.cx(), f.itinerary.segments(), &fr).unwrap_err(),
            FailureReason::TooManyRetransits {
                location: fr.clone(),
                max: 0
            }
        );

        rule.max_retransits = MaxCount(1);
        assert!(check_retransits_at(&rule, &f.cx(), f.itinerary.segments(), &fr).is_ok());
    }

    #[test]
    fn city_retransits() {
        // LHR-FRA-CDG-FRA-FCO: FRA visited twice.
        let segs = vec![air(LHR, FRA), air(FRA, CDG), air(CDG, FRA), air(FRA, FCO)];
        let visits = count_city_retransits(&segs, |_| true);

        assert_eq!(visits.get(&PointCode::parse("FRA").unwrap()), Some(&1));
        assert_eq!(visits.get(&PointCode::parse("CDG").unwrap()), Some(&0));
        assert_eq!(visits.get(&PointCode::parse("LHR").unwrap()), None);
    }

    #[test]
    fn city_retransit_filter() {
        let segs = vec![air(LHR, FRA), air(FRA, CDG), air(CDG, FRA), air(FRA, FCO)];
        let visits = count_city_retransits(&segs, |p| p.nation == nation("GB"));

        assert_eq!(visits.get(&PointCode::parse("FRA").unwrap()), Some(&0));
        assert_eq!(visits.get(&PointCode::parse("CDG").unwrap()), None);
    }

    #[test]
    fn endpoint_revisited() {
        let via_origin = vec![air(LHR, CDG), air(CDG, LHR), air(LHR, FCO)];
        let straight = vec![air(LHR, CDG), air(CDG, FCO)];

        assert!(revisits_endpoint(&via_origin));
        assert!(!revisits_endpoint(&straight));
        assert!(!revisits_endpoint(&straight[..1]));
    }

    #[test]
    fn airport_transfer_is_not_a_revisit() {
        let nyc = PointCode::parse("NYC").unwrap();
        let jfk = loc("JFK", "US").with_city(nyc);
        let ewr = loc("EWR", "US").with_city(nyc);
        let lhr = loc("LHR", "GB");
        let fly = |from: &Location, to: &Location| {
            TravelSegment::air(from.clone(), to.clone(), CarrierCode::parse("BA").unwrap())
        };

        let trailing = vec![fly(&lhr, &jfk), TravelSegment::surface(jfk.clone(), ewr.clone())];
        assert!(!revisits_endpoint(&trailing));

        let leading = vec![TravelSegment::surface(ewr.clone(), jfk.clone()), fly(&jfk, &lhr)];
        assert!(!revisits_endpoint(&leading));

        // Back in New York mid-component still counts.
        let via_origin = vec![
            fly(&jfk, &lhr),
            fly(&lhr, &ewr),
            TravelSegment::surface(ewr.clone(), jfk.clone()),
            fly(&jfk, &loc("CDG", "FR")),
        ];
        assert!(revisits_endpoint(&via_origin));
    }

    #[test]
    fn general_retransit_component_only_points() {
        let f = Fixture::new(vec![
            air(LHR, CDG),
            air(CDG, FRA),
            air(FRA, NCE),
            air(NCE, FCO),
        ]);
        let mut rule = LimitationRule::journey(1);
        rule.max_international_arrivals = MaxCount(0);
        rule.retransit_point = Some(PointApplication::ComponentDestinationCountry);

        let journey = SegmentScope::journey(&f.itinerary);
        assert!(check_general_retransit(&rule, &f.cx(), &journey).is_ok());

        rule.retransit_point = Some(PointApplication::PaymentCountry);
        // Sold in GB; no international arrival into GB.
        assert!(check_general_retransit(&rule, &f.cx(), &journey).is_ok());

        rule.retransit_location = Some(LocKey::nation(nation("IT")));
        assert!(check_specific_retransit(&rule, &f.cx(), f.itinerary.segments()).is_err());
    }
}
