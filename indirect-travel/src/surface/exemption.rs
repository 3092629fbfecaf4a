//! Matching surface sector exemption rows against a request.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::domain::{ADULT, CarrierCode, Itinerary, Location, NEGOTIATED, PricingContext};
use crate::engine::Geography;
use crate::rules::SurfaceSectorExemptionInfo;

/// The filter of an exemption row that did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptionFilter {
    Crs,
    PointOfSale,
    Location,
    MarketingCarrier,
    OperatingCarrier,
    PassengerType,
}

impl fmt::Display for ExemptionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExemptionFilter::Crs => "CRS",
            ExemptionFilter::PointOfSale => "POS",
            ExemptionFilter::Location => "LOC",
            ExemptionFilter::MarketingCarrier => "MARKETING CARRIER",
            ExemptionFilter::OperatingCarrier => "OPERATING CARRIER",
            ExemptionFilter::PassengerType => "PTC",
        };
        f.write_str(name)
    }
}

/// Carriers pass a list filter.
///
/// Without `except`, an empty list passes and otherwise every carrier must
/// be listed. With `except`, no carrier may be listed.
fn carriers_pass(
    listed: &BTreeSet<CarrierCode>,
    except: bool,
    mut carriers: impl Iterator<Item = CarrierCode>,
) -> bool {
    if except {
        !carriers.any(|c| listed.contains(&c))
    } else {
        listed.is_empty() || carriers.all(|c| listed.contains(&c))
    }
}

/// Tests surface sector exemption rows against one request.
pub struct ExemptionMatcher<'a> {
    geo: Geography<'a>,
    itinerary: &'a Itinerary,
    pricing: &'a PricingContext,
}

impl<'a> ExemptionMatcher<'a> {
    /// `geo` should be pinned to the ticketing date.
    pub fn new(
        geo: Geography<'a>,
        itinerary: &'a Itinerary,
        pricing: &'a PricingContext,
    ) -> Self {
        Self {
            geo,
            itinerary,
            pricing,
        }
    }

    /// Whether `row` exempts a surface sector between `board` and `off`.
    pub fn matches(
        &self,
        row: &SurfaceSectorExemptionInfo,
        board: &Location,
        off: &Location,
    ) -> bool {
        self.check(row, board, off).is_ok()
    }

    /// Check every filter of `row` in turn.
    ///
    /// # Errors
    ///
    /// Returns the first filter that does not match.
    pub fn check(
        &self,
        row: &SurfaceSectorExemptionInfo,
        board: &Location,
        off: &Location,
    ) -> Result<(), ExemptionFilter> {
        let require = |ok: bool, filter| if ok { Ok(()) } else { Err(filter) };

        require(self.crs_matches(row), ExemptionFilter::Crs)?;
        require(self.point_of_sale_matches(row), ExemptionFilter::PointOfSale)?;
        require(self.locations_match(row, board, off), ExemptionFilter::Location)?;
        require(self.marketing_matches(row), ExemptionFilter::MarketingCarrier)?;
        require(self.operating_matches(row), ExemptionFilter::OperatingCarrier)?;
        require(self.passengers_match(row), ExemptionFilter::PassengerType)
    }

    /// 1-based position in `rows` of the first row that matches.
    pub fn first_match(
        &self,
        rows: &[Arc<SurfaceSectorExemptionInfo>],
        board: &Location,
        off: &Location,
    ) -> Option<usize> {
        rows.iter().enumerate().find_map(|(i, row)| match self.check(row, board, off) {
            Ok(()) => Some(i + 1),
            Err(filter) => {
                trace!(seq_no = row.seq_no, %filter, "Exemption did not match");
                None
            }
        })
    }

    fn crs_matches(&self, row: &SurfaceSectorExemptionInfo) -> bool {
        row.crs
            .as_deref()
            .is_none_or(|crs| self.pricing.crs.as_deref() == Some(crs))
    }

    fn point_of_sale_matches(&self, row: &SurfaceSectorExemptionInfo) -> bool {
        row.point_of_sale.as_ref().is_none_or(|loc| {
            self.geo.is_in_location(&self.pricing.point_of_sale, loc) != row.point_of_sale_except
        })
    }

    /// `loc1` to `loc2`, in either direction.
    fn locations_match(
        &self,
        row: &SurfaceSectorExemptionInfo,
        board: &Location,
        off: &Location,
    ) -> bool {
        let within = |point: &Location, loc: &Option<_>| {
            loc.as_ref()
                .is_none_or(|loc| self.geo.is_in_location(point, loc) != row.loc_except)
        };

        (within(board, &row.loc1) && within(off, &row.loc2))
            || (within(board, &row.loc2) && within(off, &row.loc1))
    }

    fn marketing_matches(&self, row: &SurfaceSectorExemptionInfo) -> bool {
        let carriers = self.itinerary.segments().iter().filter_map(|s| s.carrier());
        carriers_pass(&row.marketing_carriers, row.marketing_except, carriers)
    }

    /// Operating carriers are unknown without a booking; open segments are
    /// not checked.
    fn operating_matches(&self, row: &SurfaceSectorExemptionInfo) -> bool {
        if self.pricing.no_pnr {
            return true;
        }
        let carriers = self
            .itinerary
            .segments()
            .iter()
            .filter(|s| !s.open)
            .filter_map(|s| s.operating_carrier());
        carriers_pass(&row.operating_carriers, row.operating_except, carriers)
    }

    fn passengers_match(&self, row: &SurfaceSectorExemptionInfo) -> bool {
        let listed = |ptc: &str| {
            row.passenger_types.contains(ptc)
                || (self.pricing.map_adult_to_negotiated
                    && ptc == ADULT
                    && row.passenger_types.contains(NEGOTIATED))
        };
        let mut types = self.pricing.passenger_types.iter();

        if row.passenger_except {
            !types.any(|ptc| listed(ptc))
        } else {
            row.passenger_types.is_empty() || types.all(|ptc| listed(ptc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LocKey, NationCode, PointCode, TravelSegment};
    use crate::sources::InMemoryGeography;
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

    fn cxr(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn city(s: &str) -> LocKey {
        LocKey::city(PointCode::parse(s).unwrap())
    }

    fn carriers(codes: &[&str]) -> BTreeSet<CarrierCode> {
        codes.iter().map(|c| cxr(c)).collect()
    }

    /// LAX-DFW on AA operated by AS, surface to ORD, ORD-YYZ on AC.
    struct Fixture {
        geo: InMemoryGeography,
        itinerary: Itinerary,
        pricing: PricingContext,
    }

    impl Fixture {
        fn new() -> Self {
            let segments = vec![
                TravelSegment::air(loc("LAX", "US"), loc("DFW", "US"), cxr("AA"))
                    .operated_by(cxr("AS")),
                TravelSegment::surface(loc("DFW", "US"), loc("ORD", "US")),
                TravelSegment::air(loc("ORD", "US"), loc("YYZ", "CA"), cxr("AC")),
            ];
            Self {
                geo: InMemoryGeography::new(),
                itinerary: Itinerary::new(segments, cxr("AA")).unwrap(),
                pricing: PricingContext::new(date(), loc("LAX", "US")),
            }
        }

        fn matcher(&self) -> ExemptionMatcher<'_> {
            ExemptionMatcher::new(
                Geography::new(&self.geo, date()),
                &self.itinerary,
                &self.pricing,
            )
        }

        fn check(&self, row: &SurfaceSectorExemptionInfo) -> Result<(), ExemptionFilter> {
            self.matcher().check(row, &loc("DFW", "US"), &loc("ORD", "US"))
        }
    }

    fn row() -> SurfaceSectorExemptionInfo {
        SurfaceSectorExemptionInfo::new(cxr("AA"), 1)
    }

    #[test]
    fn unfiltered_row_matches() {
        assert_eq!(Fixture::new().check(&row()), Ok(()));
    }

    #[test]
    fn crs_must_equal_request() {
        let mut f = Fixture::new();
        let row = SurfaceSectorExemptionInfo {
            crs: Some("1S".to_string()),
            ..row()
        };
        assert_eq!(f.check(&row), Err(ExemptionFilter::Crs));

        f.pricing = f.pricing.clone().with_crs("1S");
        assert_eq!(f.check(&row), Ok(()));
    }

    #[test]
    fn point_of_sale_except() {
        let f = Fixture::new();
        let in_us = SurfaceSectorExemptionInfo {
            point_of_sale: Some(LocKey::nation(NationCode::US)),
            ..row()
        };
        let outside_us = SurfaceSectorExemptionInfo {
            point_of_sale_except: true,
            ..in_us.clone()
        };

        assert_eq!(f.check(&in_us), Ok(()));
        assert_eq!(f.check(&outside_us), Err(ExemptionFilter::PointOfSale));
    }

    #[test]
    fn locations_either_direction() {
        let f = Fixture::new();
        let forward = row().between(city("DFW"), city("ORD"));
        let backward = row().between(city("ORD"), city("DFW"));
        let elsewhere = row().between(city("DFW"), city("IAH"));

        assert_eq!(f.check(&forward), Ok(()));
        assert_eq!(f.check(&backward), Ok(()));
        assert_eq!(f.check(&elsewhere), Err(ExemptionFilter::Location));
    }

    #[test]
    fn location_except_inverts_both_ends() {
        let f = Fixture::new();
        let row = SurfaceSectorExemptionInfo {
            loc_except: true,
            ..row().between(city("MIA"), city("ATL"))
        };
        assert_eq!(f.check(&row), Ok(()));
    }

    #[test]
    fn marketing_carriers_must_all_be_listed() {
        let f = Fixture::new();
        let aa_only = SurfaceSectorExemptionInfo {
            marketing_carriers: carriers(&["AA"]),
            ..row()
        };
        let aa_and_ac = SurfaceSectorExemptionInfo {
            marketing_carriers: carriers(&["AA", "AC"]),
            ..row()
        };

        assert_eq!(f.check(&aa_only), Err(ExemptionFilter::MarketingCarrier));
        assert_eq!(f.check(&aa_and_ac), Ok(()));
    }

    #[test]
    fn marketing_except_rejects_any_listed() {
        let f = Fixture::new();
        let row = SurfaceSectorExemptionInfo {
            marketing_carriers: carriers(&["AC"]),
            marketing_except: true,
            ..row()
        };
        assert_eq!(f.check(&row), Err(ExemptionFilter::MarketingCarrier));
    }

    #[test]
    fn operating_carriers_use_operating_code() {
        let f = Fixture::new();
        let row = SurfaceSectorExemptionInfo {
            operating_carriers: carriers(&["AA", "AC"]),
            ..row()
        };
        assert_eq!(f.check(&row), Err(ExemptionFilter::OperatingCarrier));
    }

    #[test]
    fn operating_carriers_skipped_without_booking() {
        let mut f = Fixture::new();
        f.pricing.no_pnr = true;
        let row = SurfaceSectorExemptionInfo {
            operating_carriers: carriers(&["ZZ"]),
            ..row()
        };
        assert_eq!(f.check(&row), Ok(()));
    }

    #[test]
    fn open_segments_skipped_for_operating_only() {
        let mut f = Fixture::new();
        let segments = vec![
            TravelSegment::air(loc("LAX", "US"), loc("DFW", "US"), cxr("AA")),
            TravelSegment::surface(loc("DFW", "US"), loc("ORD", "US")),
            TravelSegment::air(loc("ORD", "US"), loc("YYZ", "CA"), cxr("AC")).open(),
        ];
        f.itinerary = Itinerary::new(segments, cxr("AA")).unwrap();
        let aa = SurfaceSectorExemptionInfo {
            operating_carriers: carriers(&["AA"]),
            ..row()
        };
        let aa_marketing = SurfaceSectorExemptionInfo {
            marketing_carriers: carriers(&["AA"]),
            ..row()
        };

        assert_eq!(f.check(&aa), Ok(()));
        assert_eq!(f.check(&aa_marketing), Err(ExemptionFilter::MarketingCarrier));
    }

    #[test]
    fn adult_maps_to_negotiated() {
        let mut f = Fixture::new();
        let neg = SurfaceSectorExemptionInfo {
            passenger_types: [NEGOTIATED.to_string()].into(),
            ..row()
        };
        assert_eq!(f.check(&neg), Err(ExemptionFilter::PassengerType));

        f.pricing.map_adult_to_negotiated = true;
        assert_eq!(f.check(&neg), Ok(()));
    }

    #[test]
    fn passenger_except() {
        let mut f = Fixture::new();
        f.pricing = f
            .pricing
            .clone()
            .with_passenger_types(vec![ADULT.to_string(), "CNN".to_string()]);
        let no_children = SurfaceSectorExemptionInfo {
            passenger_types: ["CNN".to_string()].into(),
            passenger_except: true,
            ..row()
        };
        assert_eq!(f.check(&no_children), Err(ExemptionFilter::PassengerType));
    }

    #[test]
    fn first_match_is_one_based() {
        let f = Fixture::new();
        let rows = vec![
            Arc::new(row().between(city("DFW"), city("IAH"))),
            Arc::new(SurfaceSectorExemptionInfo {
                seq_no: 2,
                ..row().between(city("ORD"), city("DFW"))
            }),
            Arc::new(row()),
        ];

        let matcher = f.matcher();
        assert_eq!(
            matcher.first_match(&rows, &loc("DFW", "US"), &loc("ORD", "US")),
            Some(2)
        );
        assert_eq!(
            matcher.first_match(&rows[..1], &loc("DFW", "US"), &loc("ORD", "US")),
            None
        );
    }

    #[test]
    fn filter_display() {
        assert_eq!(ExemptionFilter::MarketingCarrier.to_string(), "MARKETING CARRIER");
        assert_eq!(ExemptionFilter::Crs.to_string(), "CRS");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        const CITIES: [&str; 4] = ["DFW", "ORD", "YYZ", "MEX"];

        fn city_key() -> impl Strategy<Value = Option<LocKey>> {
            proptest::option::of((0..CITIES.len()).prop_map(|i| city(CITIES[i])))
        }

        proptest! {
            // ========== Symmetry ==========

            #[test]
            fn matching_symmetric_in_gap_cities(
                loc1 in city_key(),
                loc2 in city_key(),
                loc_except in any::<bool>(),
                board in 0..CITIES.len(),
                off in 0..CITIES.len(),
            ) {
                let f = Fixture::new();
                let row = SurfaceSectorExemptionInfo { loc1, loc2, loc_except, ..row() };
                let board = loc(CITIES[board], "US");
                let off = loc(CITIES[off], "US");
                let matcher = f.matcher();

                prop_assert_eq!(
                    matcher.matches(&row, &board, &off),
                    matcher.matches(&row, &off, &board)
                );
            }
        }
    }
}
