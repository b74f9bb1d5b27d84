//! Residential valuation: fallback resolution, the adjustment engine, and its HTTP surface.

pub mod baseline;
pub mod breakdown;
pub mod domain;
pub mod engine;
pub mod orchestrator;
pub mod presentation;
pub mod request;
pub mod router;

#[cfg(test)]
mod tests;

pub use baseline::{BaselineLoadError, BaselineTable, RateLookup, RateSource, DEFAULT_RATE_PER_SQFT};
pub use breakdown::{Adjustment, BreakdownEntry};
pub use domain::{
    AttributeProvenance, AttributeSource, ComparableSale, ConditionScore, MarketTrend,
    PropertyAttributes, RenovationFlags, RenovationKind, ResolvedRegion, SchoolRating,
    SubjectSummary, ViewType,
};
pub use engine::{median, uncertainty_band, Valuation, ValuationEngine};
pub use orchestrator::{ValuationError, ValuationOrchestrator, ValuationResult};
pub use presentation::{format_currency, render_breakdown, ValuationResponse};
pub use request::{ComparableRequest, EstimateRequest, RenovationRequest, ValidationError};
pub use router::valuation_router;
