//! Domain error types.
//!
//! These errors represent construction-time invariant violations in the
//! domain layer. Rule failures are reported as verdicts, not errors.

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Itinerary has no segments
    #[error("itinerary must have at least one segment")]
    EmptyItinerary,

    /// Fare component range is empty or runs past the itinerary
    #[error("fare component {first}..={last} out of range for {len} segments")]
    ComponentOutOfRange {
        first: usize,
        last: usize,
        len: usize,
    },

    /// Side-trip segment not inside its fare component
    #[error("side-trip segment {0} is outside its fare component")]
    SideTripOutsideComponent(usize),

    /// Pricing unit has no fare usages
    #[error("pricing unit must have at least one fare usage")]
    EmptyPricingUnit,
}
