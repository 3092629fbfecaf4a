//! Domestic segment limits inside an international fare component.

use tracing::debug;

use crate::domain::TravelSegment;
use crate::rules::{CarrierLoc, DomesticListSense, FareTerms, LimitationRule};

use super::scope::CheckContext;
use super::verdict::{Clearance, FailureReason};

fn counts_toward_limit(cx: &CheckContext<'_>, seg: &TravelSegment, entry: &CarrierLoc) -> bool {
    entry.carrier.is_none_or(|c| seg.carrier() == Some(c))
        && entry
            .location
            .as_ref()
            .is_none_or(|loc| cx.geo.is_in_location(&seg.origin, loc))
}

/// Check the rule's domestic segment terms against a component's segments.
///
/// `fare_selected` is false when checking a component before a fare has
/// been chosen. Only then can a zero limit in a nation configured as not
/// priceable pass with [`Clearance::NotPriceable`].
pub fn check_domestic_segments(
    rule: &LimitationRule,
    terms: &FareTerms,
    cx: &CheckContext<'_>,
    segments: &[TravelSegment],
    fare_selected: bool,
) -> Result<Clearance, FailureReason> {
    let Some(list) = terms.domestic_list.as_ref().filter(|l| !l.entries.is_empty()) else {
        return Ok(Clearance::Clear);
    };
    let air = segments.iter().filter(|s| s.is_air());

    match (
        terms.max_domestic_segments.limit(cx.config.max_domestic_segments),
        list.sense,
    ) {
        (None, DomesticListSense::ExceptVia) => {
            for seg in air {
                for entry in &list.entries {
                    if let Some(cxr) = entry.carrier
                        && seg.carrier() == Some(cxr)
                    {
                        return Err(FailureReason::DomesticViaCarrier(cxr));
                    }
                    if let Some(loc) = &entry.location
                        && cx.geo.is_in_location(&seg.origin, loc)
                    {
                        return Err(FailureReason::DomesticViaLocation(loc.clone()));
                    }
                }
            }
            Ok(Clearance::Clear)
        }
        (Some(max), DomesticListSense::ApplyTo) => {
            let count = air
                .filter(|s| s.is_domestic())
                .filter(|s| list.entries.iter().any(|e| counts_toward_limit(cx, s, e)))
                .count();
            if count <= max as usize {
                return Ok(Clearance::Clear);
            }

            let carve_out = list.entries[0]
                .location
                .as_ref()
                .and_then(|loc| loc.as_nation())
                .is_some_and(|n| cx.config.not_priceable_nations.contains(&n));
            if max == 0 && !fare_selected && carve_out {
                debug!(seq_no = rule.seq_no, count, "Domestic segments not priceable");
                return Ok(Clearance::NotPriceable);
            }
            Err(FailureReason::TooManyDomesticSegments { max })
        }
        _ => Ok(Clearance::Clear),
    }
}
