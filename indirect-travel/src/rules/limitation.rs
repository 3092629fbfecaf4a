//! Limitation-on-indirect-travel rule records.
//!
//! A [`LimitationRule`] carries the terms shared by every scope (who it
//! applies to, where retransits and stopovers are limited) plus a
//! [`RuleScope`] holding the journey-only or fare-only terms. Rules are
//! read-only inputs to the engine.

use serde::{Deserialize, Serialize};

use crate::domain::{CarrierCode, GlobalDirection, LocKey};

/// A count limit as published: negative means unlimited.
///
/// # Examples
///
/// ```
/// use indirect_travel::rules::MaxCount;
///
/// assert_eq!(MaxCount(2).limit(99), Some(2));
/// assert_eq!(MaxCount::UNLIMITED.limit(99), None);
/// assert_eq!(MaxCount(150).limit(99), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaxCount(pub i32);

impl MaxCount {
    pub const UNLIMITED: MaxCount = MaxCount(-1);

    /// The enforced limit, or `None` when the value is negative or above
    /// `ceiling` (malformed values are unlimited).
    pub fn limit(self, ceiling: u32) -> Option<u32> {
        u32::try_from(self.0).ok().filter(|&n| n <= ceiling)
    }
}

impl Default for MaxCount {
    fn default() -> Self {
        Self::UNLIMITED
    }
}

/// Whether a list names the only members or the excluded members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListSense {
    Only,
    Except,
}

/// Required sense of a positive test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Must,
    MustNot,
}

impl Sense {
    /// Whether an observed fact satisfies this sense.
    pub fn accepts(self, fact: bool) -> bool {
        match self {
            Sense::Must => fact,
            Sense::MustNot => !fact,
        }
    }
}

/// Ticketing carriers the rule is restricted to or excepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierList {
    pub sense: ListSense,
    pub carriers: Vec<CarrierCode>,
}

impl CarrierList {
    /// Whether `carrier` is exempted from the rule by this list.
    pub fn exempts(&self, carrier: CarrierCode) -> bool {
        let listed = self.carriers.contains(&carrier);
        match self.sense {
            ListSense::Except => listed,
            ListSense::Only => !listed,
        }
    }
}

/// Wholly-within / not-wholly-within qualifier over the itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhollyWithin {
    pub sense: Sense,
    pub location: LocKey,
}

/// Which origin an origin qualifier tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OriginScope {
    Journey,
    PricingUnit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginTest {
    pub scope: OriginScope,
    pub location: LocKey,
}

/// Reference point of a general retransit or stopover limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointApplication {
    JourneyOriginCountry,
    ComponentOriginCountry,
    ComponentDestinationCountry,
    PaymentCountry,
    IntermediatePoint,
}

/// Journey-only terms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyTerms {
    /// Message lines; `XX` is replaced with the offending nation's name.
    #[serde(default)]
    pub text: Vec<String>,

    /// Journey must be issued on separate tickets when the rule fails.
    #[serde(default)]
    pub separate_ticket: bool,
}

/// Governing carriers a fare rule must or must not be filed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoverningCarriers {
    pub sense: Sense,
    pub carriers: Vec<CarrierCode>,
}

/// Geographic scope of a fare rule relative to the component endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directionality {
    /// Component between the two locations in either direction.
    Between(LocKey, LocKey),
    /// Every component point lies within the location.
    Within(LocKey),
    /// Component from the first location to the second; inbound components
    /// are tested reversed.
    From(LocKey, LocKey),
}

/// Component direction a fare rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentDirection {
    Outbound,
    Inbound,
    Both,
}

/// How the domestic carrier/location list is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomesticListSense {
    /// Listed carriers and locations may not be travelled via at all.
    ExceptVia,
    /// The domestic segment maximum counts only listed carriers/locations.
    ApplyTo,
}

/// A (carrier, location) pair of the domestic segment list. Either part may
/// be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierLoc {
    #[serde(default)]
    pub carrier: Option<CarrierCode>,
    #[serde(default)]
    pub location: Option<LocKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomesticList {
    pub sense: DomesticListSense,
    pub entries: Vec<CarrierLoc>,
}

/// Fare-only terms, shared by component and pricing-unit validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FareTerms {
    #[serde(default)]
    pub governing_carriers: Option<GoverningCarriers>,
    #[serde(default)]
    pub directionality: Option<Directionality>,
    #[serde(default)]
    pub component_direction: Option<ComponentDirection>,

    /// `None` applies to every global direction.
    #[serde(default)]
    pub global_direction: Option<GlobalDirection>,

    /// Exact fare type, or `*X` for any fare type with designator `X`.
    #[serde(default)]
    pub fare_type: Option<String>,

    #[serde(default)]
    pub must_not_via_hip: bool,
    #[serde(default)]
    pub confirmed_required: bool,

    /// Routing fares on these routing numbers are not subject to the rule.
    #[serde(default)]
    pub excluded_routings: Vec<String>,

    #[serde(default)]
    pub not_via_location: Option<LocKey>,

    #[serde(default)]
    pub max_domestic_segments: MaxCount,
    #[serde(default)]
    pub domestic_list: Option<DomesticList>,

    /// Only travel to or from this location counts toward the limits.
    #[serde(default)]
    pub must_be_to_from: Option<LocKey>,

    #[serde(default)]
    pub retransit_via_governing_carrier: Option<Sense>,
    #[serde(default)]
    pub via_governing_carrier: Option<Sense>,
}

/// Scope-specific part of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleScope {
    Journey(JourneyTerms),
    Fare(FareTerms),
}

/// One limitation-on-indirect-travel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitationRule {
    pub seq_no: u32,

    #[serde(default)]
    pub ticketing_carriers: Option<CarrierList>,
    #[serde(default)]
    pub wholly_within: Option<WhollyWithin>,
    #[serde(default)]
    pub origin: Option<OriginTest>,
    #[serde(default)]
    pub point_of_sale: Option<LocKey>,
    #[serde(default)]
    pub point_of_ticketing: Option<LocKey>,

    #[serde(default)]
    pub max_international_departures: MaxCount,
    #[serde(default)]
    pub max_international_arrivals: MaxCount,
    #[serde(default)]
    pub max_retransits: MaxCount,
    #[serde(default)]
    pub retransit_point: Option<PointApplication>,
    #[serde(default)]
    pub retransit_location: Option<LocKey>,

    #[serde(default)]
    pub max_stopovers: MaxCount,
    #[serde(default)]
    pub stopover_point: Option<PointApplication>,
    #[serde(default)]
    pub stopover_location: Option<LocKey>,

    pub scope: RuleScope,
}

impl LimitationRule {
    /// A rule with no qualifiers and no limits.
    pub fn new(seq_no: u32, scope: RuleScope) -> Self {
        Self {
            seq_no,
            ticketing_carriers: None,
            wholly_within: None,
            origin: None,
            point_of_sale: None,
            point_of_ticketing: None,
            max_international_departures: MaxCount::UNLIMITED,
            max_international_arrivals: MaxCount::UNLIMITED,
            max_retransits: MaxCount::UNLIMITED,
            retransit_point: None,
            retransit_location: None,
            max_stopovers: MaxCount::UNLIMITED,
            stopover_point: None,
            stopover_location: None,
            scope,
        }
    }

    pub fn journey(seq_no: u32) -> Self {
        Self::new(seq_no, RuleScope::Journey(JourneyTerms::default()))
    }

    pub fn fare(seq_no: u32, terms: FareTerms) -> Self {
        Self::new(seq_no, RuleScope::Fare(terms))
    }

    pub fn journey_terms(&self) -> Option<&JourneyTerms> {
        match &self.scope {
            RuleScope::Journey(terms) => Some(terms),
            RuleScope::Fare(_) => None,
        }
    }

    pub fn fare_terms(&self) -> Option<&FareTerms> {
        match &self.scope {
            RuleScope::Fare(terms) => Some(terms),
            RuleScope::Journey(_) => None,
        }
    }

    /// The must-be-to/from location; journey rules have none.
    pub fn must_be_to_from(&self) -> Option<&LocKey> {
        self.fare_terms().and_then(|t| t.must_be_to_from.as_ref())
    }

    /// Origin qualifier tests the pricing-unit origin.
    pub fn is_pricing_unit_origin(&self) -> bool {
        matches!(
            self.origin,
            Some(OriginTest {
                scope: OriginScope::PricingUnit,
                ..
            })
        )
    }

    /// Fare rule that can only be checked once a fare has been selected.
    pub fn requires_fare(&self) -> bool {
        self.fare_terms().is_some_and(|t| {
            t.must_not_via_hip || t.fare_type.is_some() || !t.excluded_routings.is_empty()
        })
    }

    /// Journey message with the first `XX` replaced by `nation_name`.
    pub fn journey_message(&self, nation_name: Option<&str>) -> Option<String> {
        let terms = self.journey_terms()?;
        if terms.text.is_empty() {
            return None;
        }

        let mut text = terms.text.concat();
        if let (Some(name), Some(pos)) = (nation_name, text.find(NATION_TOKEN)) {
            text.replace_range(pos..pos + NATION_TOKEN.len(), name);
        }
        Some(text)
    }
}

const NATION_TOKEN: &str = "XX";
