//! Limitation on indirect travel.
//!
//! A pricing library that answers: "may this itinerary be ticketed with
//! this routing, and may each fare be applied to the travel it covers?"
//! It also decides whether an international surface sector between fare
//! components is restricted.

pub mod domain;
pub mod engine;
pub mod rules;
pub mod sources;
pub mod surface;
