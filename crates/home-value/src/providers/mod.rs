//! Contracts for the third-party real-estate data the valuation pipeline consumes.
//!
//! Address resolution is the only lookup allowed to abort a valuation. The three
//! secondary sources report failures as [`ProviderFailure`] and the orchestrator
//! downgrades them to missing data.

pub mod attom;
pub mod census;
pub mod offline;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::valuation::domain::{ComparableSale, ResolvedRegion, SchoolRating};

pub use attom::AttomComparables;
pub use census::CensusGeocoder;
pub use offline::{StaticGeocoder, UnavailableSource};

/// Most comparable listings a source may contribute to one valuation.
pub const MAX_COMPARABLES: usize = 12;

/// Normalizes free-form addresses into a geocoded region.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<ResolvedRegion, AddressResolutionError>;
}

/// Public-record facts about the subject property.
#[async_trait]
pub trait SubjectPropertySource: Send + Sync {
    async fn lookup_subject(
        &self,
        normalized_address: &str,
    ) -> Result<Option<SubjectRecord>, ProviderFailure>;
}

#[async_trait]
pub trait SchoolRatingSource: Send + Sync {
    async fn lookup_school_rating(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<SchoolRating>, ProviderFailure>;
}

#[async_trait]
pub trait ComparableSalesSource: Send + Sync {
    /// `approximate_living_area_sqft` lets the source bound candidate sizes.
    async fn lookup_comparables(
        &self,
        latitude: f64,
        longitude: f64,
        approximate_living_area_sqft: Option<u32>,
    ) -> Result<Vec<ComparableListing>, ProviderFailure>;
}

/// The four lookups the orchestrator is wired with.
#[derive(Clone)]
pub struct ProviderGateway {
    pub geocoder: Arc<dyn Geocoder>,
    pub subject: Arc<dyn SubjectPropertySource>,
    pub schools: Arc<dyn SchoolRatingSource>,
    pub comparables: Arc<dyn ComparableSalesSource>,
}

impl ProviderGateway {
    /// Gateway with a geocoder and no licensed secondary data.
    pub fn geocoder_only(geocoder: Arc<dyn Geocoder>) -> Self {
        let unavailable = Arc::new(UnavailableSource);
        Self {
            geocoder,
            subject: unavailable.clone(),
            schools: unavailable.clone(),
            comparables: unavailable,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    pub living_area_sqft: Option<u32>,
    pub lot_area_sqft: Option<u32>,
    pub year_built: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableListing {
    pub price: f64,
    pub area_sqft: f64,
    pub sale_date: Option<NaiveDate>,
    pub distance_miles: Option<f64>,
}

impl ComparableListing {
    /// Drops listings that cannot yield a price per square foot.
    pub fn to_sale(&self) -> Option<ComparableSale> {
        let sale = ComparableSale {
            price: self.price,
            area_sqft: self.area_sqft,
        };
        sale.price_per_sqft().map(|_| sale)
    }
}

/// Geocoding failure; fatal for the valuation.
#[derive(Debug, thiserror::Error)]
pub enum AddressResolutionError {
    #[error("no match found for address '{address}'")]
    NoMatch { address: String },
    #[error("address lookup failed: {0}")]
    Unavailable(String),
    #[error("address lookup timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

/// Failure reported by a secondary data source.
#[derive(Debug, thiserror::Error)]
pub enum ProviderFailure {
    #[error("provider not configured")]
    NotConfigured,
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("provider returned malformed data: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    SubjectProperty,
    SchoolRating,
    ComparableSales,
}

impl ProviderKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::SubjectProperty => "subject property",
            Self::SchoolRating => "school rating",
            Self::ComparableSales => "comparable sales",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DegradedReason {
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error(transparent)]
    Failed(#[from] ProviderFailure),
}

/// A secondary lookup that was skipped; logged, never surfaced to callers.
#[derive(Debug, thiserror::Error)]
#[error("{provider} lookup degraded: {reason}")]
pub struct ProviderDegradedError {
    pub provider: ProviderKind,
    #[source]
    pub reason: DegradedReason,
}
