//! Location tests pinned to the ticketing date.

use chrono::NaiveDate;

use crate::domain::{LocKey, Location, NationCode, TravelSegment};
use crate::sources::GeographyService;

/// Geography lookups resolved at one date.
///
/// Every location test the engine makes goes through this wrapper, so all
/// of them see the same (ticketing) date.
#[derive(Clone, Copy)]
pub struct Geography<'a> {
    service: &'a dyn GeographyService,
    date: NaiveDate,
}

impl<'a> Geography<'a> {
    pub fn new(service: &'a dyn GeographyService, date: NaiveDate) -> Self {
        Self { service, date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Whether `point` lies within `loc`.
    pub fn is_in_location(&self, point: &Location, loc: &LocKey) -> bool {
        self.service.is_in_location(point, loc, self.date)
    }

    /// Every origin and destination of `segments` lies within `loc`.
    pub fn all_within(&self, segments: &[TravelSegment], loc: &LocKey) -> bool {
        segments.iter().all(|s| {
            self.is_in_location(&s.origin, loc) && self.is_in_location(&s.destination, loc)
        })
    }

    /// Some interior boundary of `segments` lies within `loc`. The scope's
    /// own origin and destination are not tested.
    pub fn is_via(&self, segments: &[TravelSegment], loc: &LocKey) -> bool {
        let Some(last) = segments.len().checked_sub(1) else {
            return false;
        };

        segments.iter().enumerate().any(|(i, s)| {
            (i != 0 && self.is_in_location(&s.origin, loc))
                || (i != last && self.is_in_location(&s.destination, loc))
        })
    }

    /// `from` lies in `loc1` and `to` lies in `loc2`.
    pub fn from_to(&self, from: &Location, to: &Location, loc1: &LocKey, loc2: &LocKey) -> bool {
        self.is_in_location(from, loc1) && self.is_in_location(to, loc2)
    }

    pub fn nation_name(&self, nation: NationCode) -> Option<String> {
        self.service.nation_name(nation, self.date)
    }
}
