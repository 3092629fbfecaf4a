//! In-memory collaborators.
//!
//! Static tables that implement the source traits. Rule and exemption
//! tables can be loaded from JSON fixtures; everything else is built in
//! code. Useful for development and tests without a fare database.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{
    CarrierCode, GlobalDirection, LocKey, LocKind, Location, NationCode, PointCode,
};
use crate::rules::{CountrySurfaceExemption, LimitationRule, SurfaceSectorExemptionInfo};

use super::{ExemptionRepository, GeographyService, MileageKind, MileageService, RuleRepository};

/// Error loading an in-memory table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to parse fixture: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A record with an optional validity window.
#[derive(Debug, Clone, Deserialize)]
struct Dated<T> {
    #[serde(flatten)]
    record: T,
    #[serde(default)]
    effective: Option<NaiveDate>,
    #[serde(default)]
    discontinue: Option<NaiveDate>,
}

impl<T> Dated<T> {
    fn always(record: T) -> Self {
        Self {
            record,
            effective: None,
            discontinue: None,
        }
    }

    fn in_effect(&self, date: NaiveDate) -> bool {
        self.effective.is_none_or(|from| from <= date)
            && self.discontinue.is_none_or(|until| date <= until)
    }
}

#[derive(Debug, Deserialize)]
struct RuleFixture {
    #[serde(default)]
    journey: Vec<Dated<LimitationRule>>,
    #[serde(default)]
    fare: Vec<Dated<LimitationRule>>,
    #[serde(default)]
    fare_types: HashMap<String, String>,
}

/// Limitation rules held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRules {
    journey: Vec<Dated<Arc<LimitationRule>>>,
    fare: Vec<Dated<Arc<LimitationRule>>>,
    fare_types: HashMap<String, String>,
}

impl InMemoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a JSON document of the form
    /// `{"journey": [...], "fare": [...], "fare_types": {"XEX": "X"}}`.
    ///
    /// Each rule may carry `effective` and `discontinue` dates.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let fixture: RuleFixture = serde_json::from_str(json)?;
        let wrap = |d: Dated<LimitationRule>| Dated {
            record: Arc::new(d.record),
            effective: d.effective,
            discontinue: d.discontinue,
        };

        Ok(Self {
            journey: fixture.journey.into_iter().map(wrap).collect(),
            fare: fixture.fare.into_iter().map(wrap).collect(),
            fare_types: fixture.fare_types,
        })
    }

    /// Add a rule in effect on every date. Journey and fare rules are
    /// routed by their scope.
    pub fn add(&mut self, rule: LimitationRule) {
        let entry = Dated::always(Arc::new(rule));
        if entry.record.journey_terms().is_some() {
            self.journey.push(entry);
        } else {
            self.fare.push(entry);
        }
    }

    pub fn add_fare_type(&mut self, fare_type: impl Into<String>, designator: impl Into<String>) {
        self.fare_types.insert(fare_type.into(), designator.into());
    }

    fn select(rules: &[Dated<Arc<LimitationRule>>], date: NaiveDate) -> Vec<Arc<LimitationRule>> {
        let mut found: Vec<_> = rules
            .iter()
            .filter(|r| r.in_effect(date))
            .map(|r| r.record.clone())
            .collect();
        found.sort_by_key(|r| r.seq_no);
        found
    }
}

impl RuleRepository for InMemoryRules {
    fn journey_limitations(&self, date: NaiveDate) -> Vec<Arc<LimitationRule>> {
        Self::select(&self.journey, date)
    }

    fn fare_limitations(&self, date: NaiveDate) -> Vec<Arc<LimitationRule>> {
        Self::select(&self.fare, date)
    }

    fn fare_type_designator(&self, fare_type: &str, _date: NaiveDate) -> Option<String> {
        self.fare_types.get(fare_type).cloned()
    }
}

/// Static geography: nations, named regions and city records.
///
/// Region membership (areas, sub-areas, zones) is by nation. Data does not
/// vary by date.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGeography {
    regions: HashMap<(LocKind, String), HashSet<NationCode>>,
    nation_names: HashMap<NationCode, String>,
    points: HashMap<PointCode, Location>,
}

impl InMemoryGeography {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `nations` as members of an area, sub-area or zone.
    pub fn add_region(
        &mut self,
        kind: LocKind,
        code: impl Into<String>,
        nations: impl IntoIterator<Item = NationCode>,
    ) {
        self.regions
            .entry((kind, code.into()))
            .or_default()
            .extend(nations);
    }

    pub fn add_nation(&mut self, nation: NationCode, name: impl Into<String>) {
        self.nation_names.insert(nation, name.into());
    }

    /// Register a point under its airport code, and under its city code
    /// when no record for the city exists yet.
    pub fn add_point(&mut self, location: Location) {
        self.points.entry(location.city).or_insert_with(|| location.clone());
        self.points.insert(location.airport, location);
    }
}

impl GeographyService for InMemoryGeography {
    fn is_in_location(&self, point: &Location, loc: &LocKey, _date: NaiveDate) -> bool {
        match loc.kind {
            LocKind::Nation => point.nation.as_str() == loc.code,
            LocKind::City => point.city.as_str() == loc.code || point.airport.as_str() == loc.code,
            LocKind::Airport => point.airport.as_str() == loc.code,
            LocKind::State => point.state.as_deref() == Some(loc.code.as_str()),
            LocKind::Area | LocKind::SubArea | LocKind::Zone => self
                .regions
                .get(&(loc.kind, loc.code.clone()))
                .is_some_and(|nations| nations.contains(&point.nation)),
        }
    }

    fn nation_name(&self, nation: NationCode, _date: NaiveDate) -> Option<String> {
        self.nation_names.get(&nation).cloned()
    }

    fn locate(&self, code: PointCode, _date: NaiveDate) -> Option<Location> {
        self.points.get(&code).cloned()
    }
}

/// Static mileage tables. Distances are symmetric.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMileage {
    distances: HashMap<(PointCode, PointCode, MileageKind), u32>,
    substitutions: HashMap<PointCode, PointCode>,
    multi_transport: HashMap<PointCode, PointCode>,
    global_directions: HashMap<(PointCode, PointCode), GlobalDirection>,
}

impl InMemoryMileage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a mileage between two cities, stored in both directions.
    pub fn add(&mut self, a: PointCode, b: PointCode, kind: MileageKind, miles: u32) {
        self.distances.insert((a, b, kind), miles);
        self.distances.insert((b, a, kind), miles);
    }

    pub fn add_substitution(&mut self, city: PointCode, published: PointCode) {
        self.substitutions.insert(city, published);
    }

    pub fn add_multi_transport(&mut self, airport: PointCode, city: PointCode) {
        self.multi_transport.insert(airport, city);
    }

    pub fn add_global_direction(&mut self, a: PointCode, b: PointCode, gd: GlobalDirection) {
        self.global_directions.insert((a, b), gd);
        self.global_directions.insert((b, a), gd);
    }
}

impl MileageService for InMemoryMileage {
    fn distance(
        &self,
        a: PointCode,
        b: PointCode,
        kind: MileageKind,
        _global_direction: Option<GlobalDirection>,
        _date: NaiveDate,
    ) -> Option<u32> {
        self.distances.get(&(a, b, kind)).copied()
    }

    fn substitution_city(&self, city: PointCode, _date: NaiveDate) -> Option<PointCode> {
        self.substitutions.get(&city).copied()
    }

    fn multi_transport_city(&self, airport: PointCode) -> Option<PointCode> {
        self.multi_transport.get(&airport).copied()
    }

    fn global_direction(
        &self,
        a: PointCode,
        b: PointCode,
        _date: NaiveDate,
    ) -> Option<GlobalDirection> {
        self.global_directions.get(&(a, b)).copied()
    }
}

#[derive(Debug, Deserialize)]
struct ExemptionFixture {
    #[serde(default)]
    surface_sector: Vec<Dated<SurfaceSectorExemptionInfo>>,
    #[serde(default)]
    country: Vec<CountrySurfaceExemption>,
}

/// Surface sector exemption tables held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryExemptions {
    by_carrier: HashMap<CarrierCode, Vec<Dated<Arc<SurfaceSectorExemptionInfo>>>>,
    country: Vec<CountrySurfaceExemption>,
}

impl InMemoryExemptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tables from `{"surface_sector": [...], "country": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let fixture: ExemptionFixture = serde_json::from_str(json)?;
        let mut exemptions = Self {
            country: fixture.country,
            ..Self::default()
        };
        for row in fixture.surface_sector {
            exemptions
                .by_carrier
                .entry(row.record.validating_carrier)
                .or_default()
                .push(Dated {
                    record: Arc::new(row.record),
                    effective: row.effective,
                    discontinue: row.discontinue,
                });
        }
        Ok(exemptions)
    }

    pub fn add(&mut self, row: SurfaceSectorExemptionInfo) {
        self.by_carrier
            .entry(row.validating_carrier)
            .or_default()
            .push(Dated::always(Arc::new(row)));
    }

    pub fn add_country(&mut self, city1: PointCode, city2: PointCode) {
        self.country.push(CountrySurfaceExemption { city1, city2 });
    }
}

impl ExemptionRepository for InMemoryExemptions {
    fn surface_sector_exemptions(
        &self,
        validating_carrier: CarrierCode,
        date: NaiveDate,
    ) -> Vec<Arc<SurfaceSectorExemptionInfo>> {
        let mut rows: Vec<_> = self
            .by_carrier
            .get(&validating_carrier)
            .into_iter()
            .flatten()
            .filter(|r| r.in_effect(date))
            .map(|r| r.record.clone())
            .collect();
        rows.sort_by_key(|r| r.seq_no);
        rows
    }

    fn country_surface_exemption(
        &self,
        a: PointCode,
        b: PointCode,
        _date: NaiveDate,
    ) -> Option<CountrySurfaceExemption> {
        self.country.iter().find(|ex| ex.covers(a, b)).cloned()
    }
}
