//! Fare components, fare usages, pricing units and fare paths.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{CarrierCode, DomainError, GeoTravelType, Itinerary, Location, TravelSegment};

/// IATA global direction of a fare component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GlobalDirection {
    /// Atlantic
    At,
    /// Pacific
    Pa,
    /// Atlantic and Pacific
    Ap,
    /// Western hemisphere
    Wh,
    /// Eastern hemisphere
    Eh,
    /// Polar
    Po,
    /// Trans-Siberian
    Ts,
    /// South Atlantic
    Sa,
    /// Far East
    Fe,
    /// Russia
    Ru,
}

/// Direction of a fare component relative to the journey origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FareDirection {
    Outbound,
    Inbound,
    #[default]
    Unknown,
}

/// The travel covered by one fare: a contiguous, inclusive range of
/// itinerary segments.
///
/// # Invariants
///
/// - `first <= last < itinerary.len()`
/// - Side-trip indices lie inside the range
#[derive(Debug, Clone, PartialEq)]
pub struct FareComponent {
    first: usize,
    last: usize,
    pub governing_carrier: CarrierCode,
    pub global_direction: GlobalDirection,
    pub direction: FareDirection,
    side_trip: Vec<usize>,
}

impl FareComponent {
    /// Create a component over `itinerary.segments()[first..=last]`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ComponentOutOfRange` if the range is empty or
    /// extends past the itinerary.
    pub fn new(
        itinerary: &Itinerary,
        first: usize,
        last: usize,
        governing_carrier: CarrierCode,
        global_direction: GlobalDirection,
    ) -> Result<Self, DomainError> {
        if first > last || last >= itinerary.len() {
            return Err(DomainError::ComponentOutOfRange {
                first,
                last,
                len: itinerary.len(),
            });
        }

        Ok(Self {
            first,
            last,
            governing_carrier,
            global_direction,
            direction: FareDirection::Unknown,
            side_trip: Vec::new(),
        })
    }

    pub fn with_direction(mut self, direction: FareDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Mark the given segments as a side trip inside this component.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SideTripOutsideComponent` if any index lies
    /// outside the component.
    pub fn with_side_trip(mut self, segments: Vec<usize>) -> Result<Self, DomainError> {
        if let Some(&idx) = segments.iter().find(|i| !self.contains(**i)) {
            return Err(DomainError::SideTripOutsideComponent(idx));
        }
        self.side_trip = segments;
        Ok(self)
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn last(&self) -> usize {
        self.last
    }

    pub fn range(&self) -> RangeInclusive<usize> {
        self.first..=self.last
    }

    pub fn contains(&self, segment: usize) -> bool {
        self.range().contains(&segment)
    }

    pub fn side_trip(&self) -> &[usize] {
        &self.side_trip
    }

    pub fn has_side_trip(&self) -> bool {
        !self.side_trip.is_empty()
    }

    /// The segments of `itinerary` covered by this component.
    pub fn segments<'i>(&self, itinerary: &'i Itinerary) -> &'i [TravelSegment] {
        &itinerary.segments()[self.range()]
    }

    pub fn origin<'i>(&self, itinerary: &'i Itinerary) -> &'i Location {
        &itinerary.segments()[self.first].origin
    }

    pub fn destination<'i>(&self, itinerary: &'i Itinerary) -> &'i Location {
        &itinerary.segments()[self.last].destination
    }

    pub fn geo_travel_type(&self, itinerary: &Itinerary) -> GeoTravelType {
        GeoTravelType::of_segments(self.segments(itinerary))
    }

    pub fn is_international(&self, itinerary: &Itinerary) -> bool {
        self.geo_travel_type(itinerary).is_international()
    }
}

/// The published fare selected for a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fare {
    pub fare_class: String,

    /// Fare type code (`ER`, `XEX`, `BR`, ...).
    pub fare_type: String,

    /// Routing number for routing fares; `None` for mileage fares.
    #[serde(default)]
    pub routing: Option<String>,
}

impl Fare {
    pub fn new(fare_class: impl Into<String>, fare_type: impl Into<String>) -> Self {
        Self {
            fare_class: fare_class.into(),
            fare_type: fare_type.into(),
            routing: None,
        }
    }

    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }
}

/// A fare applied to a component within a pricing unit.
#[derive(Debug, Clone, PartialEq)]
pub struct FareUsage {
    pub component: FareComponent,
    pub fare: Fare,

    /// Fare is priced in the inbound direction.
    pub inbound: bool,

    /// Accumulated Higher Intermediate Point plus-up.
    pub hip_plus_up: f64,
}

impl FareUsage {
    pub fn new(component: FareComponent, fare: Fare) -> Self {
        Self {
            component,
            fare,
            inbound: false,
            hip_plus_up: 0.0,
        }
    }

    pub fn inbound(mut self) -> Self {
        self.inbound = true;
        self
    }

    pub fn with_hip_plus_up(mut self, amount: f64) -> Self {
        self.hip_plus_up = amount;
        self
    }
}

/// Whether a pricing unit is built from normal or special fares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PuFareType {
    Normal,
    Special,
}

/// One or more fare usages priced together (one way, round trip, open jaw,
/// circle trip).
///
/// # Invariants
///
/// - At least one fare usage
#[derive(Debug, Clone, PartialEq)]
pub struct PricingUnit {
    fare_usages: Vec<FareUsage>,
    pub fare_type: PuFareType,
}

impl PricingUnit {
    /// # Errors
    ///
    /// Returns `DomainError::EmptyPricingUnit` if `fare_usages` is empty.
    pub fn new(fare_usages: Vec<FareUsage>, fare_type: PuFareType) -> Result<Self, DomainError> {
        if fare_usages.is_empty() {
            return Err(DomainError::EmptyPricingUnit);
        }
        Ok(Self {
            fare_usages,
            fare_type,
        })
    }

    pub fn fare_usages(&self) -> &[FareUsage] {
        &self.fare_usages
    }

    /// Origin of the unit's first travelled segment.
    pub fn origin<'i>(&self, itinerary: &'i Itinerary) -> &'i Location {
        // Non-empty by construction
        self.fare_usages[0].component.origin(itinerary)
    }
}

/// The pricing units chosen for an itinerary, plus state the surface
/// restriction writes back.
#[derive(Debug, Clone, PartialEq)]
pub struct FarePath {
    pub pricing_units: Vec<PricingUnit>,

    /// Candidate validating carriers; pruned by the surface restriction.
    pub validating_carriers: Vec<CarrierCode>,

    /// Set when a surface sector is longer than the flown sectors before it.
    pub ignore_surface_tpm: bool,
}

impl FarePath {
    pub fn new(pricing_units: Vec<PricingUnit>) -> Self {
        Self {
            pricing_units,
            validating_carriers: Vec::new(),
            ignore_surface_tpm: false,
        }
    }

    pub fn with_validating_carriers(mut self, carriers: Vec<CarrierCode>) -> Self {
        self.validating_carriers = carriers;
        self
    }

    /// Every fare usage of every pricing unit.
    pub fn fare_usages(&self) -> impl Iterator<Item = &FareUsage> {
        self.pricing_units.iter().flat_map(|pu| pu.fare_usages())
    }
}
