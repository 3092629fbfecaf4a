//! Request-level pricing context.

use chrono::NaiveDate;

use super::Location;

/// Adult passenger type code.
pub const ADULT: &str = "ADT";

/// Negotiated-fare passenger type code.
pub const NEGOTIATED: &str = "NEG";

/// Facts about the pricing request that rules are evaluated against.
///
/// Geography tests use `ticketing_date`; rule records are retrieved for
/// `travel_date`.
#[derive(Debug, Clone)]
pub struct PricingContext {
    pub ticketing_date: NaiveDate,

    /// Date travel commences.
    pub travel_date: NaiveDate,

    pub point_of_sale: Location,
    pub point_of_ticketing: Location,

    /// Reservation system the request came from, if known.
    pub crs: Option<String>,

    pub passenger_types: Vec<String>,

    /// Round-the-world pricing bypasses all limitation checks.
    pub round_the_world: bool,

    /// Priced without a booking; operating carriers are not known.
    pub no_pnr: bool,

    /// Validating carriers are chosen per fare path (GSA agreements).
    pub validating_carrier_gsa: bool,

    /// Treat adult passengers as negotiated when matching exemptions.
    pub map_adult_to_negotiated: bool,
}

impl PricingContext {
    /// A context sold and ticketed at `point_of_sale`, travelling on the
    /// ticketing date, for one adult.
    pub fn new(ticketing_date: NaiveDate, point_of_sale: Location) -> Self {
        Self {
            ticketing_date,
            travel_date: ticketing_date,
            point_of_ticketing: point_of_sale.clone(),
            point_of_sale,
            crs: None,
            passenger_types: vec![ADULT.to_string()],
            round_the_world: false,
            no_pnr: false,
            validating_carrier_gsa: false,
            map_adult_to_negotiated: false,
        }
    }

    pub fn travelling_on(mut self, date: NaiveDate) -> Self {
        self.travel_date = date;
        self
    }

    pub fn ticketed_at(mut self, point: Location) -> Self {
        self.point_of_ticketing = point;
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn with_passenger_types(mut self, types: Vec<String>) -> Self {
        self.passenger_types = types;
        self
    }

    pub fn round_the_world(mut self) -> Self {
        self.round_the_world = true;
        self
    }
}
