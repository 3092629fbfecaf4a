//! Surface sector exemption records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::{CarrierCode, LocKey, PointCode};

/// A validating carrier's exemption from the international surface sector
/// restriction.
///
/// Every filter is optional: an absent location or an empty set matches
/// everything. Each `*_except` flag inverts its filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSectorExemptionInfo {
    pub validating_carrier: CarrierCode,
    pub seq_no: u32,

    /// Reservation system the row is restricted to.
    #[serde(default)]
    pub crs: Option<String>,

    #[serde(default)]
    pub point_of_sale: Option<LocKey>,
    #[serde(default)]
    pub point_of_sale_except: bool,

    #[serde(default)]
    pub loc1: Option<LocKey>,
    #[serde(default)]
    pub loc2: Option<LocKey>,
    #[serde(default)]
    pub loc_except: bool,

    #[serde(default)]
    pub marketing_carriers: BTreeSet<CarrierCode>,
    #[serde(default)]
    pub marketing_except: bool,

    #[serde(default)]
    pub operating_carriers: BTreeSet<CarrierCode>,
    #[serde(default)]
    pub operating_except: bool,

    #[serde(default)]
    pub passenger_types: BTreeSet<String>,
    #[serde(default)]
    pub passenger_except: bool,
}

impl SurfaceSectorExemptionInfo {
    /// An exemption for `validating_carrier` with no filters.
    pub fn new(validating_carrier: CarrierCode, seq_no: u32) -> Self {
        Self {
            validating_carrier,
            seq_no,
            crs: None,
            point_of_sale: None,
            point_of_sale_except: false,
            loc1: None,
            loc2: None,
            loc_except: false,
            marketing_carriers: BTreeSet::new(),
            marketing_except: false,
            operating_carriers: BTreeSet::new(),
            operating_except: false,
            passenger_types: BTreeSet::new(),
            passenger_except: false,
        }
    }

    pub fn between(mut self, loc1: LocKey, loc2: LocKey) -> Self {
        self.loc1 = Some(loc1);
        self.loc2 = Some(loc2);
        self
    }
}

/// A city pair whose surface sector is never restricted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySurfaceExemption {
    pub city1: PointCode,
    pub city2: PointCode,
}

impl CountrySurfaceExemption {
    /// Whether the pair covers travel between `a` and `b` in either order.
    pub fn covers(&self, a: PointCode, b: PointCode) -> bool {
        (self.city1 == a && self.city2 == b) || (self.city1 == b && self.city2 == a)
    }
}
