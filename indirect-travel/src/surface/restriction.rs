//! The international surface sector restriction.

use tracing::{debug, info};

use crate::domain::{CarrierCode, FarePath, Itinerary, Location, PricingContext, PuFareType};
use crate::engine::{Geography, LimitationConfig};
use crate::sources::{ExemptionRepository, GeographyService, MileageService};

use super::exemption::ExemptionMatcher;
use super::mileage::{MileageResolver, ResolvedMileage};

/// Why the restriction was not considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceBypass {
    RoundTheWorld,
    NotInternational,
    /// Some pricing unit is built from special fares.
    SpecialFare,
}

/// A break in flown travel between two fare components that crosses a
/// national boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGap {
    /// Index of the last flown segment before the gap.
    pub last_flown: usize,

    /// Index of the flown segment that resumes travel.
    pub resumes: usize,

    /// Arrival point of the last flown segment.
    pub board: Location,

    /// Departure point of the resuming segment.
    pub off: Location,
}

/// Surface sector mileage against the flown mileage before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceMileage {
    pub surface: ResolvedMileage,

    /// Flown mileage from the journey origin to the gap.
    pub sectors: u32,
}

impl SurfaceMileage {
    pub fn exceeds_sectors(&self) -> bool {
        self.surface.miles > self.sectors
    }
}

/// A validating carrier kept because one of its exemption rows matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierExemption {
    pub carrier: CarrierCode,

    /// 1-based position of the matching row among the carrier's rows.
    pub row: usize,
}

/// Outcome of checking a fare path for a restricted surface sector.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceVerdict {
    Bypassed(SurfaceBypass),

    /// No international gap between fare components.
    NoInternationalGap,

    /// The gap's city pair is exempt for every carrier.
    CountryExempt(SurfaceGap),

    /// The gap is no longer than the flown travel before it.
    WithinFlownMileage {
        gap: SurfaceGap,
        mileage: SurfaceMileage,
    },

    /// The gap is too long, but these carriers' exemptions waive it.
    Exempted {
        gap: SurfaceGap,
        mileage: SurfaceMileage,
        carriers: Vec<CarrierExemption>,
    },

    Restricted {
        gap: SurfaceGap,
        mileage: SurfaceMileage,
    },
}

impl SurfaceVerdict {
    pub fn is_restricted(&self) -> bool {
        matches!(self, SurfaceVerdict::Restricted { .. })
    }
}

/// Checks a fare path for an international surface sector longer than the
/// flown travel that precedes it.
///
/// Exemption tables and mileage are read for the travel date; location
/// tests use the ticketing date.
pub struct SurfaceSectorRestriction<'a, M, G, E>
where
    M: MileageService,
    G: GeographyService,
    E: ExemptionRepository,
{
    mileage: &'a M,
    geography: &'a G,
    exemptions: &'a E,
    config: &'a LimitationConfig,
    itinerary: &'a Itinerary,
    pricing: &'a PricingContext,
}

impl<'a, M, G, E> SurfaceSectorRestriction<'a, M, G, E>
where
    M: MileageService,
    G: GeographyService,
    E: ExemptionRepository,
{
    pub fn new(
        mileage: &'a M,
        geography: &'a G,
        exemptions: &'a E,
        config: &'a LimitationConfig,
        itinerary: &'a Itinerary,
        pricing: &'a PricingContext,
    ) -> Self {
        Self {
            mileage,
            geography,
            exemptions,
            config,
            itinerary,
            pricing,
        }
    }

    /// Check `fare_path` for a restricted surface sector.
    ///
    /// When the surface sector is longer than the flown travel before it,
    /// the fare path is marked to ignore surface TPM and its validating
    /// carriers are narrowed to those with a matching exemption.
    pub fn validate_intl_surface_travel(&self, fare_path: &mut FarePath) -> SurfaceVerdict {
        if self.pricing.round_the_world {
            debug!("Round-the-world request, surface sectors not restricted");
            return SurfaceVerdict::Bypassed(SurfaceBypass::RoundTheWorld);
        }
        if !self.itinerary.is_international() {
            return SurfaceVerdict::Bypassed(SurfaceBypass::NotInternational);
        }
        if fare_path
            .pricing_units
            .iter()
            .any(|pu| pu.fare_type != PuFareType::Normal)
        {
            debug!("Fare path contains special fares, surface sectors not restricted");
            return SurfaceVerdict::Bypassed(SurfaceBypass::SpecialFare);
        }

        match self.find_first_intl_surface(fare_path) {
            Some(gap) => self.check_gap(fare_path, gap),
            None => SurfaceVerdict::NoInternationalGap,
        }
    }

    /// The first international surface gap between fare components.
    ///
    /// Gaps within one nation are passed over. The search ends without a
    /// gap at the first international one that lies within the US and
    /// Canada, or that a single fare component spans.
    pub fn find_first_intl_surface(&self, fare_path: &FarePath) -> Option<SurfaceGap> {
        let segments = self.itinerary.segments();
        let mut last_flown: Option<usize> = None;
        let mut previous = 0;
        let mut after_surface = false;

        for (i, seg) in segments.iter().enumerate() {
            if seg.is_surface() {
                previous = i;
                after_surface = true;
                continue;
            }

            let Some(j) = last_flown else {
                (last_flown, previous, after_surface) = (Some(i), i, false);
                continue;
            };
            let flown = &segments[j];
            if seg.board_city() == flown.off_city() || flown.destination.same_nation(&seg.origin)
            {
                (last_flown, previous, after_surface) = (Some(i), i, false);
                continue;
            }

            if flown.destination.nation.is_us_or_canada() && seg.origin.nation.is_us_or_canada() {
                debug!(
                    from = %flown.destination,
                    to = %seg.origin,
                    "First surface sector is US/Canada"
                );
                return None;
            }

            let spanned = fare_path.fare_usages().any(|fu| {
                let fc = &fu.component;
                fc.contains(previous) && (fc.contains(i) || after_surface)
            });
            if spanned {
                debug!(segment = i, "Surface sector within one fare component");
                return None;
            }

            return Some(SurfaceGap {
                last_flown: j,
                resumes: i,
                board: flown.destination.clone(),
                off: seg.origin.clone(),
            });
        }

        None
    }

    /// Decide whether `gap` restricts `fare_path`.
    pub fn check_gap(&self, fare_path: &mut FarePath, gap: SurfaceGap) -> SurfaceVerdict {
        let date = self.pricing.travel_date;

        if self
            .exemptions
            .country_surface_exemption(gap.board.city, gap.off.city, date)
            .is_some()
        {
            debug!(from = %gap.board.city, to = %gap.off.city, "Surface sector exempt");
            return SurfaceVerdict::CountryExempt(gap);
        }

        let resolver = MileageResolver::new(self.mileage, self.geography, self.config, date);
        let mileage = SurfaceMileage {
            surface: resolver.resolve(&gap.board, &gap.off),
            sectors: resolver.flown_miles(&self.itinerary.segments()[..gap.resumes]),
        };
        debug!(
            surface = mileage.surface.miles,
            sectors = mileage.sectors,
            "Surface sector mileage"
        );
        if !mileage.exceeds_sectors() {
            return SurfaceVerdict::WithinFlownMileage { gap, mileage };
        }

        fare_path.ignore_surface_tpm = true;
        let carriers = self.exempt_carriers(fare_path, &gap);
        if carriers.is_empty() {
            info!(from = %gap.board.city, to = %gap.off.city, "Surface sector restricted");
            SurfaceVerdict::Restricted { gap, mileage }
        } else {
            SurfaceVerdict::Exempted {
                gap,
                mileage,
                carriers,
            }
        }
    }

    /// Carriers whose exemption rows waive the restriction.
    ///
    /// With per-fare-path validating carriers, carriers without a matching
    /// row are removed from `fare_path`. Otherwise only the itinerary's
    /// validating carrier is consulted and the fare path is left alone.
    fn exempt_carriers(
        &self,
        fare_path: &mut FarePath,
        gap: &SurfaceGap,
    ) -> Vec<CarrierExemption> {
        let matcher = ExemptionMatcher::new(
            Geography::new(self.geography, self.pricing.ticketing_date),
            self.itinerary,
            self.pricing,
        );
        let exemption = |carrier: CarrierCode| {
            let rows = self
                .exemptions
                .surface_sector_exemptions(carrier, self.pricing.travel_date);
            let row = matcher.first_match(&rows, &gap.board, &gap.off)?;
            debug!(%carrier, row, "Surface sector exemption matched");
            Some(CarrierExemption { carrier, row })
        };

        if fare_path.validating_carriers.is_empty() || !self.pricing.validating_carrier_gsa {
            let carrier = self
                .itinerary
                .validating_carrier()
                .unwrap_or(self.itinerary.ticketing_carrier());
            return exemption(carrier).into_iter().collect();
        }

        let exempted: Vec<_> = fare_path
            .validating_carriers
            .iter()
            .filter_map(|&c| exemption(c))
            .collect();
        fare_path
            .validating_carriers
            .retain(|c| exempted.iter().any(|e| e.carrier == *c));
        exempted
    }
}

#[cfg(test)]
#[path = "restriction_tests.rs"]
mod tests;
