//! Validation outcomes.

use std::fmt;

use tracing::trace;

use crate::domain::{CarrierCode, LocKey, NationCode, PointCode};

/// Why a rule rejected the travel it was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    TooManyDepartures { nation: NationCode, max: u32 },
    TooManyArrivals { nation: NationCode, max: u32 },
    TooManyRetransits { location: LocKey, max: u32 },
    TooManyRetransitsAtPoint { city: PointCode, max: u32 },
    TooManyStopovers { max: u32 },
    TooManyStopoversAt { location: LocKey, max: u32 },
    TooManyStopoversAtPoint { city: PointCode, max: u32 },
    TooManyDomesticSegments { max: u32 },
    DomesticViaCarrier(CarrierCode),
    DomesticViaLocation(LocKey),
    ViaLocation(LocKey),
    ViaHigherIntermediatePoint,
    Unconfirmed { segment: usize },
}

impl FailureReason {
    /// Nation the failure is about, used to fill journey message text.
    pub fn nation(&self) -> Option<NationCode> {
        match self {
            FailureReason::TooManyDepartures { nation, .. }
            | FailureReason::TooManyArrivals { nation, .. } => Some(*nation),
            FailureReason::TooManyRetransits { location, .. }
            | FailureReason::TooManyStopoversAt { location, .. } => location.as_nation(),
            _ => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::TooManyDepartures { nation, max } => {
                write!(f, "more than {max} departures from {nation}")
            }
            FailureReason::TooManyArrivals { nation, max } => {
                write!(f, "more than {max} arrivals in {nation}")
            }
            FailureReason::TooManyRetransits { location, max } => {
                write!(f, "more than {max} retransits of {location}")
            }
            FailureReason::TooManyRetransitsAtPoint { city, max } => {
                write!(f, "more than {max} retransits of {city}")
            }
            FailureReason::TooManyStopovers { max } => write!(f, "more than {max} stopovers"),
            FailureReason::TooManyStopoversAt { location, max } => {
                write!(f, "more than {max} stopovers in {location}")
            }
            FailureReason::TooManyStopoversAtPoint { city, max } => {
                write!(f, "more than {max} stopovers at {city}")
            }
            FailureReason::TooManyDomesticSegments { max } => {
                write!(f, "more than {max} domestic segments")
            }
            FailureReason::DomesticViaCarrier(cxr) => {
                write!(f, "domestic travel via carrier {cxr}")
            }
            FailureReason::DomesticViaLocation(loc) => write!(f, "domestic travel via {loc}"),
            FailureReason::ViaLocation(loc) => write!(f, "travel via {loc}"),
            FailureReason::ViaHigherIntermediatePoint => {
                write!(f, "travel via a higher intermediate point")
            }
            FailureReason::Unconfirmed { segment } => {
                write!(f, "segment {segment} is not confirmed")
            }
        }
    }
}

/// A failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    pub seq_no: u32,
    pub reason: FailureReason,
}

impl fmt::Display for RuleFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limitation {}: {}", self.seq_no, self.reason)
    }
}

/// Why validation was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bypass {
    RoundTheWorld,
    /// Travel is not international at the validated scope.
    NotInternational,
}

/// Result of validating one scope (journey, pricing unit or component).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every applicable rule passed.
    Passed,

    Bypassed(Bypass),

    /// Passed, but the component may only be priced by breaking the fare at
    /// its domestic segments.
    NotPriceable { seq_no: u32 },

    Failed(RuleFailure),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        !self.is_fail()
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Failed(_))
    }

    pub fn failure(&self) -> Option<&RuleFailure> {
        match self {
            Verdict::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// A journey rule failed; the journey must not be ticketed as priced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("limitation {seq_no}: {message}")]
pub struct HardStop {
    pub seq_no: u32,

    /// Display text: the rule's own message when it has one.
    pub message: String,

    pub reason: FailureReason,

    /// The rule asks for separate tickets.
    pub separate_ticket: bool,
}

/// Per-pricing-unit results of validating a fare path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarePathVerdict {
    pub pricing_units: Vec<Verdict>,
}

impl FarePathVerdict {
    /// Every pricing unit passed.
    pub fn is_valid(&self) -> bool {
        self.pricing_units.iter().all(Verdict::is_pass)
    }

    /// Indices and failures of the pricing units that failed.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &RuleFailure)> {
        self.pricing_units
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.failure().map(|f| (i, f)))
    }
}

/// How a rule's checks passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clearance {
    Clear,
    /// Passed, but the component must not be priced as a through fare.
    NotPriceable,
}

/// Evaluation state of one rule against one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleState {
    NotEvaluated,
    Prequalifying,
    /// Qualifiers did not match; the rule does not apply.
    Skipped,
    Checking,
    Passed(Clearance),
    Failed(FailureReason),
}

impl RuleState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RuleState::Skipped | RuleState::Passed(_) | RuleState::Failed(_)
        )
    }

    /// Drive rule `seq_no` from `NotEvaluated` to a terminal state.
    ///
    /// `checks` only runs when `applies` holds.
    pub fn evaluate(
        seq_no: u32,
        applies: impl FnOnce() -> bool,
        checks: impl FnOnce() -> Result<Clearance, FailureReason>,
    ) -> RuleState {
        let mut state = RuleState::NotEvaluated;
        let mut enter = |next: RuleState| {
            trace!(seq_no, from = ?state, to = ?next, "Rule state");
            state = next;
        };

        enter(RuleState::Prequalifying);
        if !applies() {
            enter(RuleState::Skipped);
        } else {
            enter(RuleState::Checking);
            enter(match checks() {
                Ok(clearance) => RuleState::Passed(clearance),
                Err(reason) => RuleState::Failed(reason),
            });
        }
        state
    }
}
