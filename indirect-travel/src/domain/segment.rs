//! Travel segments.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{CarrierCode, Location, PointCode};

/// Reservation status code for a confirmed air segment.
pub const CONFIRMED: &str = "OK";

/// Flight details of an air segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirService {
    /// Carrier selling the flight.
    pub marketing: CarrierCode,

    /// Carrier operating the aircraft; equals `marketing` unless codeshared.
    pub operating: CarrierCode,

    /// Reservation status (`OK`, `RQ`, `NS`, ...).
    pub status: String,
}

/// Whether a segment is flown or is a surface (ARNK) sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Air(AirService),
    Surface,
}

/// Agent override of the stopover/connection classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopoverOverride {
    ForcedStopover,
    ForcedConnection,
}

/// One unit of travel between two points.
///
/// # Examples
///
/// ```
/// use indirect_travel::domain::{CarrierCode, Location, NationCode, PointCode, TravelSegment};
///
/// let lhr = Location::new(PointCode::parse("LHR").unwrap(), NationCode::parse("GB").unwrap());
/// let jfk = Location::new(PointCode::parse("JFK").unwrap(), NationCode::US);
/// let seg = TravelSegment::air(lhr, jfk, CarrierCode::parse("BA").unwrap());
///
/// assert!(seg.is_air());
/// assert!(seg.is_international());
/// assert_eq!(seg.carrier().unwrap().as_str(), "BA");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelSegment {
    pub origin: Location,
    pub destination: Location,
    pub kind: SegmentKind,

    /// Stopover flag as priced; used when the connection time is unknown.
    #[serde(default)]
    pub stopover: bool,

    #[serde(default)]
    pub forced: Option<StopoverOverride>,

    /// Open segment: booked without a flight or date.
    #[serde(default)]
    pub open: bool,

    #[serde(default)]
    pub departure: Option<NaiveDateTime>,

    #[serde(default)]
    pub arrival: Option<NaiveDateTime>,
}

impl TravelSegment {
    /// A confirmed air segment marketed and operated by `carrier`.
    pub fn air(origin: Location, destination: Location, carrier: CarrierCode) -> Self {
        Self::new(
            origin,
            destination,
            SegmentKind::Air(AirService {
                marketing: carrier,
                operating: carrier,
                status: CONFIRMED.to_string(),
            }),
        )
    }

    /// A surface sector.
    pub fn surface(origin: Location, destination: Location) -> Self {
        Self::new(origin, destination, SegmentKind::Surface)
    }

    fn new(origin: Location, destination: Location, kind: SegmentKind) -> Self {
        Self {
            origin,
            destination,
            kind,
            stopover: false,
            forced: None,
            open: false,
            departure: None,
            arrival: None,
        }
    }

    /// Set the operating carrier. No effect on surface sectors.
    pub fn operated_by(mut self, carrier: CarrierCode) -> Self {
        if let SegmentKind::Air(service) = &mut self.kind {
            service.operating = carrier;
        }
        self
    }

    /// Set the reservation status. No effect on surface sectors.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        if let SegmentKind::Air(service) = &mut self.kind {
            service.status = status.into();
        }
        self
    }

    pub fn with_stopover(mut self, stopover: bool) -> Self {
        self.stopover = stopover;
        self
    }

    pub fn with_override(mut self, forced: StopoverOverride) -> Self {
        self.forced = Some(forced);
        self
    }

    pub fn with_times(mut self, departure: NaiveDateTime, arrival: NaiveDateTime) -> Self {
        self.departure = Some(departure);
        self.arrival = Some(arrival);
        self
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self.departure = None;
        self.arrival = None;
        self
    }

    pub fn is_air(&self) -> bool {
        matches!(self.kind, SegmentKind::Air(_))
    }

    pub fn is_surface(&self) -> bool {
        matches!(self.kind, SegmentKind::Surface)
    }

    pub fn air_service(&self) -> Option<&AirService> {
        match &self.kind {
            SegmentKind::Air(service) => Some(service),
            SegmentKind::Surface => None,
        }
    }

    /// Marketing carrier, for air segments.
    pub fn carrier(&self) -> Option<CarrierCode> {
        self.air_service().map(|s| s.marketing)
    }

    pub fn operating_carrier(&self) -> Option<CarrierCode> {
        self.air_service().map(|s| s.operating)
    }

    /// Origin and destination lie in different nations.
    pub fn is_international(&self) -> bool {
        !self.origin.same_nation(&self.destination)
    }

    /// Origin and destination lie in the same nation.
    pub fn is_domestic(&self) -> bool {
        self.origin.same_nation(&self.destination)
    }

    pub fn board_city(&self) -> PointCode {
        self.origin.city
    }

    pub fn off_city(&self) -> PointCode {
        self.destination.city
    }

    /// Ground time between arriving on this segment and departing on `next`.
    ///
    /// `None` when either segment is open or lacks the relevant time.
    pub fn connection_time(&self, next: &TravelSegment) -> Option<Duration> {
        if self.open || next.open {
            return None;
        }
        let arrival = self.arrival?;
        let departure = next.departure?;
        Some(departure - arrival)
    }
}
