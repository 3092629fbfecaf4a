//! Rule records consumed by the engine.

mod exemption;
mod limitation;

pub use exemption::{CountrySurfaceExemption, SurfaceSectorExemptionInfo};
pub use limitation::{
    CarrierList, CarrierLoc, ComponentDirection, Directionality, DomesticList, DomesticListSense,
    FareTerms, GoverningCarriers, JourneyTerms, LimitationRule, ListSense, MaxCount, OriginScope,
    OriginTest, PointApplication, RuleScope, Sense, WhollyWithin,
};
