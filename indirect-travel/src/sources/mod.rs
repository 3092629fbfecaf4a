//! Collaborators the engine reads data from.
//!
//! Rule records, geography, mileage tables and exemption tables live
//! outside the engine. Each is reached through a trait so the engine can be
//! driven by a real data layer or by the in-memory tables in [`memory`].
//! All lookups are synchronous and must not mutate anything.

mod memory;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{CarrierCode, GlobalDirection, LocKey, Location, NationCode, PointCode};
use crate::rules::{CountrySurfaceExemption, LimitationRule, SurfaceSectorExemptionInfo};

pub use memory::{InMemoryExemptions, InMemoryGeography, InMemoryMileage, InMemoryRules, SourceError};

/// Dated access to limitation rule records.
pub trait RuleRepository {
    /// Journey-scope rules in effect on `date`, in sequence order.
    fn journey_limitations(&self, date: NaiveDate) -> Vec<Arc<LimitationRule>>;

    /// Fare-scope rules in effect on `date`. The same records serve both
    /// fare-component and pricing-unit validation.
    fn fare_limitations(&self, date: NaiveDate) -> Vec<Arc<LimitationRule>>;

    /// Designator of a fare type from the fare type matrix (`XEX` -> `X`).
    fn fare_type_designator(&self, fare_type: &str, date: NaiveDate) -> Option<String>;
}

/// Location containment and reference data.
pub trait GeographyService {
    /// Whether `point` lies within `loc` as of `date`.
    fn is_in_location(&self, point: &Location, loc: &LocKey, date: NaiveDate) -> bool;

    /// Nation a point belongs to.
    fn nation_of(&self, point: &Location) -> NationCode {
        point.nation
    }

    /// Display name of a nation.
    fn nation_name(&self, nation: NationCode, date: NaiveDate) -> Option<String>;

    /// Reference record of a city or airport, including coordinates.
    fn locate(&self, code: PointCode, date: NaiveDate) -> Option<Location>;
}

/// Which published mileage table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MileageKind {
    /// Ticketed point mileage.
    Tpm,
    /// Maximum permitted mileage.
    Mpm,
}

/// Published mileage tables.
pub trait MileageService {
    /// Published mileage between two cities.
    fn distance(
        &self,
        a: PointCode,
        b: PointCode,
        kind: MileageKind,
        global_direction: Option<GlobalDirection>,
        date: NaiveDate,
    ) -> Option<u32>;

    /// City whose mileage is published in place of `city`.
    fn substitution_city(&self, city: PointCode, date: NaiveDate) -> Option<PointCode>;

    /// Multi-airport city an airport belongs to for mileage purposes.
    fn multi_transport_city(&self, airport: PointCode) -> Option<PointCode>;

    /// Great-circle distance between two points; zero when either lacks
    /// coordinates.
    fn great_circle(&self, a: &Location, b: &Location) -> u32 {
        match (a.coordinates, b.coordinates) {
            (Some(x), Some(y)) => x.great_circle_miles(&y),
            _ => 0,
        }
    }

    /// Global direction of travel between two cities, if published.
    fn global_direction(
        &self,
        _a: PointCode,
        _b: PointCode,
        _date: NaiveDate,
    ) -> Option<GlobalDirection> {
        None
    }
}

/// Surface sector exemption tables.
pub trait ExemptionRepository {
    /// Exemption rows filed by `validating_carrier`, in sequence order.
    fn surface_sector_exemptions(
        &self,
        validating_carrier: CarrierCode,
        date: NaiveDate,
    ) -> Vec<Arc<SurfaceSectorExemptionInfo>>;

    /// Country-level exemption for a surface sector between two cities.
    fn country_surface_exemption(
        &self,
        a: PointCode,
        b: PointCode,
        date: NaiveDate,
    ) -> Option<CountrySurfaceExemption>;
}
