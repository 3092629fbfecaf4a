//! Mileage of a city pair, with fallbacks down to great-circle distance.

use chrono::NaiveDate;
use tracing::trace;

use crate::domain::{Location, PointCode, TravelSegment};
use crate::engine::LimitationConfig;
use crate::sources::{GeographyService, MileageKind, MileageService};

/// Which table a resolved mileage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MileageSource {
    /// Published TPM for the city pair.
    Tpm,
    /// Published TPM between the mileage substitution cities.
    SubstitutionTpm,
    /// Published TPM between the multi-transport cities.
    MultiTransportTpm,
    /// TPM derived from the city pair's published MPM.
    Mpm,
    /// TPM derived from the multi-transport cities' published MPM.
    MultiTransportMpm,
    GreatCircle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedMileage {
    pub miles: u32,
    pub source: MileageSource,
}

/// Resolves the mileage between two points as of the travel date.
///
/// Published tables are tried in order: TPM, TPM between substitution
/// cities, TPM between multi-transport cities, TPM derived from MPM (city
/// pair, then multi-transport pair). Great-circle distance is the last
/// resort, so resolution never fails.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use indirect_travel::domain::{Location, NationCode, PointCode};
/// use indirect_travel::engine::LimitationConfig;
/// use indirect_travel::sources::{InMemoryGeography, InMemoryMileage, MileageKind};
/// use indirect_travel::surface::{MileageResolver, MileageSource};
///
/// let dfw = Location::new(PointCode::parse("DFW").unwrap(), NationCode::US);
/// let ord = Location::new(PointCode::parse("ORD").unwrap(), NationCode::US);
///
/// let mut mileage = InMemoryMileage::new();
/// mileage.add(dfw.city, ord.city, MileageKind::Mpm, 960);
/// let geography = InMemoryGeography::new();
/// let config = LimitationConfig::default();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
///
/// let resolver = MileageResolver::new(&mileage, &geography, &config, date);
/// let resolved = resolver.resolve(&dfw, &ord);
///
/// assert_eq!(resolved.miles, 800);
/// assert_eq!(resolved.source, MileageSource::Mpm);
/// ```
#[derive(Clone, Copy)]
pub struct MileageResolver<'a> {
    mileage: &'a dyn MileageService,
    geography: &'a dyn GeographyService,
    config: &'a LimitationConfig,
    date: NaiveDate,
}

impl<'a> MileageResolver<'a> {
    pub fn new(
        mileage: &'a dyn MileageService,
        geography: &'a dyn GeographyService,
        config: &'a LimitationConfig,
        date: NaiveDate,
    ) -> Self {
        Self {
            mileage,
            geography,
            config,
            date,
        }
    }

    /// Mileage between `from` and `to`, and where it came from.
    pub fn resolve(&self, from: &Location, to: &Location) -> ResolvedMileage {
        let (miles, source) = self.published(from, to).unwrap_or_else(|| {
            let a = self.geography.locate(from.city, self.date);
            let b = self.geography.locate(to.city, self.date);
            let miles = self
                .mileage
                .great_circle(a.as_ref().unwrap_or(from), b.as_ref().unwrap_or(to));
            (miles, MileageSource::GreatCircle)
        });

        trace!(from = %from.city, to = %to.city, miles, ?source, "Mileage resolved");
        ResolvedMileage { miles, source }
    }

    /// Sum of the mileage of the flown segments in `segments`.
    pub fn flown_miles(&self, segments: &[TravelSegment]) -> u32 {
        segments
            .iter()
            .filter(|s| s.is_air())
            .map(|s| self.resolve(&s.origin, &s.destination).miles)
            .sum()
    }

    fn published(&self, from: &Location, to: &Location) -> Option<(u32, MileageSource)> {
        let (a, b) = (from.city, to.city);
        let gd = self.mileage.global_direction(a, b, self.date);
        let tpm = |x, y| self.mileage.distance(x, y, MileageKind::Tpm, gd, self.date);
        let mpm = |x, y| self.mileage.distance(x, y, MileageKind::Mpm, gd, self.date);

        if let Some(miles) = tpm(a, b) {
            return Some((miles, MileageSource::Tpm));
        }

        if let (Some(sa), Some(sb)) = (
            self.mileage.substitution_city(a, self.date),
            self.mileage.substitution_city(b, self.date),
        ) && let Some(miles) = tpm(sa, sb)
        {
            return Some((miles, MileageSource::SubstitutionTpm));
        }

        let transport = self.multi_transport_pair(from, to);
        if let Some((ta, tb)) = transport
            && let Some(miles) = tpm(ta, tb)
        {
            return Some((miles, MileageSource::MultiTransportTpm));
        }

        if let Some(miles) = mpm(a, b) {
            return Some((self.config.tpm_from_mpm(miles), MileageSource::Mpm));
        }

        if let Some((ta, tb)) = transport
            && let Some(miles) = mpm(ta, tb)
        {
            return Some((
                self.config.tpm_from_mpm(miles),
                MileageSource::MultiTransportMpm,
            ));
        }

        None
    }

    fn multi_transport_pair(
        &self,
        from: &Location,
        to: &Location,
    ) -> Option<(PointCode, PointCode)> {
        Some((
            self.mileage.multi_transport_city(from.airport)?,
            self.mileage.multi_transport_city(to.airport)?,
        ))
    }
}
