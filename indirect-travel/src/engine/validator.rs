//! Validation of a priced itinerary against limitation rules.

use std::sync::{Arc, OnceLock};

use tracing::{debug, info, trace};

use crate::domain::{
    FareComponent, FareDirection, FarePath, FareUsage, Itinerary, PricingContext, PricingUnit,
};
use crate::rules::{FareTerms, LimitationRule};
use crate::sources::{GeographyService, RuleRepository};

use super::config::LimitationConfig;
use super::domestic::check_domestic_segments;
use super::geography::Geography;
use super::prequalify::{
    applies_to_request, component_matches, fare_matches, pricing_unit_origin_matches,
};
use super::retransit::{check_general_retransit, check_specific_retransit, revisits_endpoint};
use super::scope::{CheckContext, SegmentScope};
use super::stopover::{check_general_stopover, check_specific_stopover, check_total_stopovers};
use super::verdict::{
    Bypass, Clearance, FailureReason, FarePathVerdict, HardStop, RuleFailure, RuleState, Verdict,
};
use super::via::{check_confirmed, check_not_via_hip, check_not_via_location};

/// Which pass a fare rule is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Before a fare is selected.
    Component,
    /// With the fare usage, while validating its pricing unit.
    PricingUnit,
    /// With the fare usage, once the HIP plus-up is known.
    AfterHip,
}

/// Validates one itinerary's journey, pricing units and fare components.
///
/// A validator lives for one pricing request. The component and
/// pricing-unit rule lists are fetched on first use and reused for every
/// later call on the same validator.
pub struct LimitationValidator<'a, R: RuleRepository, G: GeographyService> {
    rules: &'a R,
    geography: &'a G,
    config: &'a LimitationConfig,
    itinerary: &'a Itinerary,
    pricing: &'a PricingContext,
    component_rules: OnceLock<Vec<Arc<LimitationRule>>>,
    pricing_unit_rules: OnceLock<Vec<Arc<LimitationRule>>>,
}

impl<'a, R: RuleRepository, G: GeographyService> LimitationValidator<'a, R, G> {
    /// Create a validator for one request.
    pub fn new(
        rules: &'a R,
        geography: &'a G,
        config: &'a LimitationConfig,
        itinerary: &'a Itinerary,
        pricing: &'a PricingContext,
    ) -> Self {
        Self {
            rules,
            geography,
            config,
            itinerary,
            pricing,
            component_rules: OnceLock::new(),
            pricing_unit_rules: OnceLock::new(),
        }
    }

    fn cx(&self) -> CheckContext<'_> {
        CheckContext {
            geo: Geography::new(self.geography, self.pricing.ticketing_date),
            rules: self.rules,
            config: self.config,
            itinerary: self.itinerary,
            pricing: self.pricing,
        }
    }

    // ========== Journey ==========

    /// Validate the whole journey.
    ///
    /// # Errors
    ///
    /// Returns [`HardStop`] for the first applicable rule the journey
    /// fails. Later rules are not evaluated.
    pub fn validate_journey(&self) -> Result<Verdict, HardStop> {
        if self.pricing.round_the_world {
            debug!("Round-the-world request, journey not validated");
            return Ok(Verdict::Bypassed(Bypass::RoundTheWorld));
        }
        if !self.itinerary.is_international() {
            debug!(geo = ?self.itinerary.geo_travel_type(), "Journey not international");
            return Ok(Verdict::Bypassed(Bypass::NotInternational));
        }

        let cx = self.cx();
        let scope = SegmentScope::journey(self.itinerary);

        for rule in self.rules.journey_limitations(self.pricing.travel_date) {
            let state = RuleState::evaluate(
                rule.seq_no,
                || applies_to_request(&rule, &cx),
                || {
                    check_general_retransit(&rule, &cx, &scope)?;
                    check_specific_retransit(&rule, &cx, scope.segments)?;
                    check_general_stopover(&rule, &cx, &scope)?;
                    check_specific_stopover(&rule, &cx, &scope)?;
                    check_total_stopovers(&rule, &cx, &scope)?;
                    Ok(Clearance::Clear)
                },
            );

            if let RuleState::Failed(reason) = state {
                let stop = self.hard_stop(&cx, &rule, reason);
                info!(seq_no = stop.seq_no, message = %stop.message, "Journey failed limitation");
                return Err(stop);
            }
        }

        debug!(segments = self.itinerary.len(), "Journey passed limitations");
        Ok(Verdict::Passed)
    }

    fn hard_stop(&self, cx: &CheckContext<'_>, rule: &LimitationRule, reason: FailureReason) -> HardStop {
        let nation_name = reason.nation().and_then(|n| cx.geo.nation_name(n));
        let message = rule
            .journey_message(nation_name.as_deref())
            .unwrap_or_else(|| reason.to_string());

        HardStop {
            seq_no: rule.seq_no,
            message,
            separate_ticket: rule.journey_terms().is_some_and(|t| t.separate_ticket),
            reason,
        }
    }

    // ========== Fare components ==========

    /// Fare rules checked per component: everything not scoped to the
    /// pricing-unit origin.
    fn component_rules(&self) -> &[Arc<LimitationRule>] {
        self.component_rules.get_or_init(|| {
            let cx = self.cx();
            let rules: Vec<_> = self
                .rules
                .fare_limitations(self.pricing.travel_date)
                .into_iter()
                .filter(|r| !r.is_pricing_unit_origin() && applies_to_request(r, &cx))
                .collect();
            debug!(count = rules.len(), "Loaded fare component limitations");
            rules
        })
    }

    /// Validate a fare component before a fare has been selected for it.
    ///
    /// Rules that can only be judged against a fare (fare type, excluded
    /// routings, not-via-HIP) are deferred to the pricing-unit and after-HIP
    /// passes.
    pub fn validate_fare_component(&self, component: &FareComponent) -> Verdict {
        if self.pricing.round_the_world {
            debug!("Round-the-world request, component not validated");
            return Verdict::Bypassed(Bypass::RoundTheWorld);
        }
        if !component.is_international(self.itinerary) {
            debug!(first = component.first(), last = component.last(), "Component not international");
            return Verdict::Bypassed(Bypass::NotInternational);
        }

        let cx = self.cx();
        let mut not_priceable = None;

        for rule in self.component_rules() {
            if rule.requires_fare() {
                trace!(seq_no = rule.seq_no, "Deferred until a fare is selected");
                continue;
            }
            match self.evaluate_fare_rule(&cx, rule, component, None, Stage::Component) {
                RuleState::Failed(reason) => return self.component_failure(component, rule, reason),
                RuleState::Passed(Clearance::NotPriceable) => {
                    not_priceable.get_or_insert(rule.seq_no);
                }
                _ => {}
            }
        }

        match not_priceable {
            Some(seq_no) => Verdict::NotPriceable { seq_no },
            None => {
                debug!(carrier = %component.governing_carrier, "Component passed limitations");
                Verdict::Passed
            }
        }
    }

    /// Re-check the not-via-HIP rules once the fare usage's HIP plus-up is
    /// known.
    pub fn validate_fare_component_after_hip(&self, usage: &FareUsage) -> Verdict {
        let component = &usage.component;
        if self.pricing.round_the_world {
            return Verdict::Bypassed(Bypass::RoundTheWorld);
        }
        if !component.is_international(self.itinerary) {
            return Verdict::Bypassed(Bypass::NotInternational);
        }

        let cx = self.cx();
        let hip_rules = self
            .component_rules()
            .iter()
            .filter(|r| r.fare_terms().is_some_and(|t| t.must_not_via_hip));

        for rule in hip_rules {
            if let RuleState::Failed(reason) =
                self.evaluate_fare_rule(&cx, rule, component, Some(usage), Stage::AfterHip)
            {
                return self.component_failure(component, rule, reason);
            }
        }
        Verdict::Passed
    }

    fn component_failure(
        &self,
        component: &FareComponent,
        rule: &LimitationRule,
        reason: FailureReason,
    ) -> Verdict {
        debug!(
            seq_no = rule.seq_no,
            carrier = %component.governing_carrier,
            reason = %reason,
            "Component failed limitation"
        );
        Verdict::Failed(RuleFailure {
            seq_no: rule.seq_no,
            reason,
        })
    }

    /// Whether the component's interior passes through its own board or
    /// off city.
    pub fn retransit_fare_component_board_off_point(&self, component: &FareComponent) -> bool {
        revisits_endpoint(component.segments(self.itinerary))
    }

    /// Prequalify and check one fare rule against one component.
    fn evaluate_fare_rule(
        &self,
        cx: &CheckContext<'_>,
        rule: &LimitationRule,
        component: &FareComponent,
        usage: Option<&FareUsage>,
        stage: Stage,
    ) -> RuleState {
        let Some(terms) = rule.fare_terms() else {
            return RuleState::Skipped;
        };
        let reverse = match usage {
            Some(usage) => usage.inbound,
            None => component.direction == FareDirection::Inbound,
        };
        let scope = SegmentScope::component(self.itinerary, component, reverse);

        RuleState::evaluate(
            rule.seq_no,
            || {
                component_matches(terms, cx, component, usage)
                    && usage.is_none_or(|u| fare_matches(terms, cx, &u.fare))
            },
            || self.check_fare_rule(cx, rule, terms, &scope, usage, stage),
        )
    }

    fn check_fare_rule(
        &self,
        cx: &CheckContext<'_>,
        rule: &LimitationRule,
        terms: &FareTerms,
        scope: &SegmentScope<'_>,
        usage: Option<&FareUsage>,
        stage: Stage,
    ) -> Result<Clearance, FailureReason> {
        check_confirmed(terms, cx, scope.segments)?;
        check_not_via_location(terms, cx, scope.segments)?;
        if stage == Stage::AfterHip
            && let Some(usage) = usage
        {
            check_not_via_hip(terms, usage)?;
        }
        let clearance = check_domestic_segments(
            rule,
            terms,
            cx,
            scope.segments,
            stage != Stage::Component,
        )?;
        check_general_retransit(rule, cx, scope)?;
        check_specific_retransit(rule, cx, scope.segments)?;
        check_general_stopover(rule, cx, scope)?;
        check_specific_stopover(rule, cx, scope)?;
        check_total_stopovers(rule, cx, scope)?;
        Ok(clearance)
    }

    // ========== Pricing units ==========

    /// Fare rules that need pricing-unit context: pricing-unit origin
    /// qualifiers, component direction qualifiers, fare types and excluded
    /// routings.
    fn pricing_unit_rules(&self) -> &[Arc<LimitationRule>] {
        self.pricing_unit_rules.get_or_init(|| {
            let cx = self.cx();
            let rules: Vec<_> = self
                .rules
                .fare_limitations(self.pricing.travel_date)
                .into_iter()
                .filter(|r| {
                    let needs_unit = r.is_pricing_unit_origin()
                        || r.fare_terms().is_some_and(|t| {
                            t.component_direction.is_some()
                                || t.fare_type.is_some()
                                || !t.excluded_routings.is_empty()
                        });
                    needs_unit && applies_to_request(r, &cx)
                })
                .collect();
            debug!(count = rules.len(), "Loaded pricing unit limitations");
            rules
        })
    }

    /// Validate a pricing unit's fare usages.
    pub fn validate_pricing_unit(&self, pricing_unit: &PricingUnit) -> Verdict {
        if self.pricing.round_the_world {
            return Verdict::Bypassed(Bypass::RoundTheWorld);
        }
        if !self.itinerary.is_international() {
            debug!("Itinerary not international, pricing unit not validated");
            return Verdict::Bypassed(Bypass::NotInternational);
        }

        let cx = self.cx();
        let origin = pricing_unit.origin(self.itinerary);

        for rule in self.pricing_unit_rules() {
            if !pricing_unit_origin_matches(rule, &cx, origin) {
                trace!(seq_no = rule.seq_no, origin = %origin, "Pricing unit origin not applicable");
                continue;
            }

            for usage in pricing_unit.fare_usages() {
                let component = &usage.component;
                if !component.is_international(self.itinerary)
                    || checked_with_component(rule, component)
                {
                    continue;
                }

                if let RuleState::Failed(reason) =
                    self.evaluate_fare_rule(&cx, rule, component, Some(usage), Stage::PricingUnit)
                {
                    debug!(
                        seq_no = rule.seq_no,
                        carrier = %component.governing_carrier,
                        inbound = usage.inbound,
                        reason = %reason,
                        "Pricing unit failed limitation"
                    );
                    return Verdict::Failed(RuleFailure {
                        seq_no: rule.seq_no,
                        reason,
                    });
                }
            }
        }

        Verdict::Passed
    }

    /// Validate every pricing unit of a fare path.
    ///
    /// Every unit is validated even after one fails, so the result lists
    /// all failing units.
    pub fn validate_fare_path(&self, fare_path: &FarePath) -> FarePathVerdict {
        let pricing_units: Vec<_> = fare_path
            .pricing_units
            .iter()
            .map(|pu| self.validate_pricing_unit(pu))
            .collect();

        let verdict = FarePathVerdict { pricing_units };
        debug!(
            units = verdict.pricing_units.len(),
            valid = verdict.is_valid(),
            "Fare path validated"
        );
        verdict
    }
}

/// A rule whose only pricing-unit concern is its component direction was
/// already checked when the component's direction was known up front.
fn checked_with_component(rule: &LimitationRule, component: &FareComponent) -> bool {
    rule.fare_terms().is_some_and(|t| {
        t.excluded_routings.is_empty()
            && t.fare_type.is_none()
            && t.component_direction.is_some()
            && component.direction != FareDirection::Unknown
            && !rule.is_pricing_unit_origin()
    })
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
