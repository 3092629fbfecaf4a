//! Geographic points and location specifications.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{NationCode, PointCode};

/// Latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Mean earth radius in statute miles.
const EARTH_RADIUS_MILES: f64 = 3958.8;

impl Coordinates {
    /// Great-circle distance to `other`, rounded to whole statute miles.
    pub fn great_circle_miles(&self, other: &Coordinates) -> u32 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let central = 2.0 * h.sqrt().clamp(0.0, 1.0).asin();
        (EARTH_RADIUS_MILES * central).round() as u32
    }
}

/// A concrete point of travel: an airport together with the city and
/// nation it belongs to.
///
/// # Examples
///
/// ```
/// use indirect_travel::domain::{Location, NationCode, PointCode};
///
/// let gb = NationCode::parse("GB").unwrap();
/// let lhr = Location::new(PointCode::parse("LHR").unwrap(), gb)
///     .with_city(PointCode::parse("LON").unwrap());
///
/// assert_eq!(lhr.city.as_str(), "LON");
/// assert_eq!(lhr.airport.as_str(), "LHR");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub airport: PointCode,

    /// Multi-airport city; equals the airport when the city has one airport.
    pub city: PointCode,

    pub nation: NationCode,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Create a location whose city code is the airport code.
    pub fn new(airport: PointCode, nation: NationCode) -> Self {
        Self {
            airport,
            city: airport,
            nation,
            state: None,
            coordinates: None,
        }
    }

    pub fn with_city(mut self, city: PointCode) -> Self {
        self.city = city;
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates {
            latitude,
            longitude,
        });
        self
    }

    /// Whether both points share a nation.
    pub fn same_nation(&self, other: &Location) -> bool {
        self.nation == other.nation
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.city == self.airport {
            write!(f, "{}", self.airport)
        } else {
            write!(f, "{}/{}", self.airport, self.city)
        }
    }
}

/// Granularity of a location specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocKind {
    /// IATA traffic conference area (`1`, `2`, `3`).
    Area,
    SubArea,
    /// Carrier-defined or ATPCO zone.
    Zone,
    Nation,
    State,
    City,
    Airport,
}

impl LocKind {
    fn tag(&self) -> char {
        match self {
            LocKind::Area => 'A',
            LocKind::SubArea => '*',
            LocKind::Zone => 'Z',
            LocKind::Nation => 'N',
            LocKind::State => 'S',
            LocKind::City => 'C',
            LocKind::Airport => 'P',
        }
    }
}

/// A location specification as it appears in rule records, e.g. "nation
/// GB" or "area 2". Whether a [`Location`] lies inside one is answered by
/// the geography collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocKey {
    pub kind: LocKind,
    pub code: String,
}

impl LocKey {
    pub fn new(kind: LocKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }

    pub fn nation(nation: NationCode) -> Self {
        Self::new(LocKind::Nation, nation.as_str())
    }

    pub fn city(city: PointCode) -> Self {
        Self::new(LocKind::City, city.as_str())
    }

    pub fn airport(airport: PointCode) -> Self {
        Self::new(LocKind::Airport, airport.as_str())
    }

    pub fn area(code: impl Into<String>) -> Self {
        Self::new(LocKind::Area, code)
    }

    pub fn zone(code: impl Into<String>) -> Self {
        Self::new(LocKind::Zone, code)
    }

    /// The nation named by this key, if it is a nation-level key.
    pub fn as_nation(&self) -> Option<NationCode> {
        match self.kind {
            LocKind::Nation => NationCode::parse(&self.code).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for LocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.tag(), self.code)
    }
}
