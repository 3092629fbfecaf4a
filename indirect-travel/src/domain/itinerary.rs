//! Itineraries and their geographic classification.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{CarrierCode, DomainError, Location, NationCode, TravelSegment};

/// Geographic classification of a run of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoTravelType {
    /// Wholly within the United States or wholly within Canada.
    Domestic,
    /// Between the United States and Canada only.
    Transborder,
    /// Wholly within one nation other than the United States or Canada.
    ForeignDomestic,
    International,
}

impl GeoTravelType {
    /// Classify the travel touching the given points.
    ///
    /// # Examples
    ///
    /// ```
    /// use indirect_travel::domain::{GeoTravelType, Location, NationCode, PointCode};
    ///
    /// let jfk = Location::new(PointCode::parse("JFK").unwrap(), NationCode::US);
    /// let yyz = Location::new(PointCode::parse("YYZ").unwrap(), NationCode::CA);
    ///
    /// assert_eq!(GeoTravelType::classify([&jfk, &jfk]), GeoTravelType::Domestic);
    /// assert_eq!(GeoTravelType::classify([&jfk, &yyz]), GeoTravelType::Transborder);
    /// ```
    pub fn classify<'a>(points: impl IntoIterator<Item = &'a Location>) -> Self {
        let nations: BTreeSet<NationCode> = points.into_iter().map(|l| l.nation).collect();

        match nations.len() {
            0 => GeoTravelType::Domestic,
            1 if nations.iter().all(NationCode::is_us_or_canada) => GeoTravelType::Domestic,
            1 => GeoTravelType::ForeignDomestic,
            _ if nations.iter().all(NationCode::is_us_or_canada) => GeoTravelType::Transborder,
            _ => GeoTravelType::International,
        }
    }

    /// Classify the travel covered by a run of segments.
    pub fn of_segments(segments: &[TravelSegment]) -> Self {
        Self::classify(
            segments
                .iter()
                .flat_map(|s| [&s.origin, &s.destination]),
        )
    }

    /// Transborder travel counts as international for limitation purposes.
    pub fn is_international(&self) -> bool {
        matches!(
            self,
            GeoTravelType::International | GeoTravelType::Transborder
        )
    }
}

/// The full ordered travel of one ticket.
///
/// # Invariants
///
/// - At least one segment
#[derive(Debug, Clone)]
pub struct Itinerary {
    segments: Vec<TravelSegment>,
    ticketing_carrier: CarrierCode,
    validating_carrier: Option<CarrierCode>,
    geo_travel_type: GeoTravelType,
}

impl Itinerary {
    /// Create an itinerary from its segments in travel order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyItinerary` if `segments` is empty.
    pub fn new(
        segments: Vec<TravelSegment>,
        ticketing_carrier: CarrierCode,
    ) -> Result<Self, DomainError> {
        if segments.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        let geo_travel_type = GeoTravelType::of_segments(&segments);

        Ok(Self {
            segments,
            ticketing_carrier,
            validating_carrier: None,
            geo_travel_type,
        })
    }

    pub fn with_validating_carrier(mut self, carrier: CarrierCode) -> Self {
        self.validating_carrier = Some(carrier);
        self
    }

    pub fn segments(&self) -> &[TravelSegment] {
        &self.segments
    }

    pub fn segment(&self, idx: usize) -> Option<&TravelSegment> {
        self.segments.get(idx)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a constructed itinerary.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Origin of the first segment.
    pub fn origin(&self) -> &Location {
        // Non-empty by construction
        &self.segments[0].origin
    }

    /// Destination of the last segment.
    pub fn destination(&self) -> &Location {
        &self.segments[self.segments.len() - 1].destination
    }

    pub fn ticketing_carrier(&self) -> CarrierCode {
        self.ticketing_carrier
    }

    pub fn validating_carrier(&self) -> Option<CarrierCode> {
        self.validating_carrier
    }

    pub fn geo_travel_type(&self) -> GeoTravelType {
        self.geo_travel_type
    }

    pub fn is_international(&self) -> bool {
        self.geo_travel_type.is_international()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PointCode;

    fn loc(code: &str, nation: &str) -> Location {
        Location::new(
            PointCode::parse(code).unwrap(),
            NationCode::parse(nation).unwrap(),
        )
    }

    fn cxr(s: &str) -> CarrierCode {
        CarrierCode::parse(s).unwrap()
    }

    fn itin(points: &[(&str, &str)]) -> Itinerary {
        let segments = points
            .windows(2)
            .map(|w| TravelSegment::air(loc(w[0].0, w[0].1), loc(w[1].0, w[1].1), cxr("AA")))
            .collect();
        Itinerary::new(segments, cxr("AA")).unwrap()
    }

    #[test]
    fn empty_itinerary_rejected() {
        let err = Itinerary::new(vec![], cxr("AA")).unwrap_err();
        assert!(matches!(err, DomainError::EmptyItinerary));
    }

    #[test]
    fn classify_us_domestic() {
        let it = itin(&[("DFW", "US"), ("ORD", "US"), ("LAX", "US")]);
        assert_eq!(it.geo_travel_type(), GeoTravelType::Domestic);
        assert!(!it.is_international());
    }

    #[test]
    fn classify_foreign_domestic() {
        let it = itin(&[("SYD", "AU"), ("MEL", "AU")]);
        assert_eq!(it.geo_travel_type(), GeoTravelType::ForeignDomestic);
        assert!(!it.is_international());
    }

    #[test]
    fn classify_transborder_as_international() {
        let it = itin(&[("JFK", "US"), ("YYZ", "CA")]);
        assert_eq!(it.geo_travel_type(), GeoTravelType::Transborder);
        assert!(it.is_international());
    }

    #[test]
    fn classify_international() {
        let it = itin(&[("LHR", "GB"), ("JFK", "US"), ("LHR", "GB")]);
        assert_eq!(it.geo_travel_type(), GeoTravelType::International);
        assert_eq!(it.origin().airport.as_str(), "LHR");
        assert_eq!(it.destination().airport.as_str(), "LHR");
    }

    #[test]
    fn validating_carrier() {
        let it = itin(&[("LHR", "GB"), ("JFK", "US")]).with_validating_carrier(cxr("BA"));
        assert_eq!(it.validating_carrier(), Some(cxr("BA")));
        assert_eq!(it.ticketing_carrier(), cxr("AA"));
    }
}
