use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local};
use tracing::{debug, info, warn};

use super::baseline::BaselineTable;
use super::domain::{
    plausible_year_built, AttributeProvenance, AttributeSource, PropertyAttributes,
    SubjectSummary,
};
use super::engine::{Valuation, ValuationEngine};
use super::request::{EstimateRequest, ValidationError};
use crate::providers::{
    AddressResolutionError, DegradedReason, ProviderDegradedError, ProviderFailure,
    ProviderGateway, ProviderKind, MAX_COMPARABLES,
};

/// A finished valuation plus the region it was priced in.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationResult {
    pub valuation: Valuation,
    pub subject: SubjectSummary,
}

/// Errors that stop a valuation; everything else degrades.
#[derive(Debug, thiserror::Error)]
pub enum ValuationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    AddressResolution(#[from] AddressResolutionError),
}

/// Resolves attribute fallbacks through the provider gateway, then prices the home.
pub struct ValuationOrchestrator {
    gateway: ProviderGateway,
    engine: ValuationEngine,
    timeout: Duration,
    current_year: Option<i32>,
}

impl ValuationOrchestrator {
    pub fn new(gateway: ProviderGateway, baseline: Arc<BaselineTable>, timeout: Duration) -> Self {
        Self {
            gateway,
            engine: ValuationEngine::new(baseline),
            timeout,
            current_year: None,
        }
    }

    /// Pins the year used for age math instead of reading the clock.
    pub fn with_current_year(mut self, current_year: Option<i32>) -> Self {
        self.current_year = current_year;
        self
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
            .unwrap_or_else(|| Local::now().date_naive().year())
    }

    pub fn baseline(&self) -> &BaselineTable {
        self.engine.baseline()
    }

    /// Validates a raw request, then runs the full pipeline.
    pub async fn estimate_request(
        &self,
        request: EstimateRequest,
    ) -> Result<ValuationResult, ValuationError> {
        let current_year = self.current_year();
        let attributes = request.validate(current_year)?;
        self.estimate(attributes, current_year).await
    }

    pub async fn estimate(
        &self,
        mut attributes: PropertyAttributes,
        current_year: i32,
    ) -> Result<ValuationResult, ValuationError> {
        let region = tokio::time::timeout(
            self.timeout,
            self.gateway.geocoder.geocode(&attributes.address),
        )
        .await
        .map_err(|_| AddressResolutionError::TimedOut(self.timeout))??;

        let mut provenance = AttributeProvenance::from_input(&attributes);

        if attributes.needs_subject_backfill() {
            let lookup = self
                .gateway
                .subject
                .lookup_subject(&region.normalized_address);
            if let Some(record) = self
                .degrade(ProviderKind::SubjectProperty, lookup)
                .await
                .flatten()
            {
                backfill(
                    &mut attributes.living_area_sqft,
                    record.living_area_sqft.filter(|sqft| *sqft > 0),
                    &mut provenance.living_area_sqft,
                );
                backfill(
                    &mut attributes.lot_area_sqft,
                    record.lot_area_sqft.filter(|sqft| *sqft > 0),
                    &mut provenance.lot_area_sqft,
                );
                backfill(
                    &mut attributes.year_built,
                    record
                        .year_built
                        .filter(|year| plausible_year_built(*year, current_year)),
                    &mut provenance.year_built,
                );
            }
        } else {
            debug!("subject property lookup skipped; size and age supplied");
        }

        let wants_rating = attributes.school_rating.is_none();
        let wants_comparables = attributes.comparable_sales.is_empty();
        let (rating, comparables) = tokio::join!(
            async {
                if !wants_rating {
                    debug!("school rating lookup skipped; rating supplied");
                    return None;
                }
                let lookup = self
                    .gateway
                    .schools
                    .lookup_school_rating(region.latitude, region.longitude);
                self.degrade(ProviderKind::SchoolRating, lookup)
                    .await
                    .flatten()
            },
            async {
                if !wants_comparables {
                    debug!("comparable sales lookup skipped; comparables supplied");
                    return None;
                }
                let lookup = self.gateway.comparables.lookup_comparables(
                    region.latitude,
                    region.longitude,
                    attributes.living_area_sqft,
                );
                self.degrade(ProviderKind::ComparableSales, lookup).await
            },
        );

        if let Some(rating) = rating {
            attributes.school_rating = Some(rating);
            provenance.school_rating = AttributeSource::Provider;
        }

        if let Some(listings) = comparables {
            attributes.comparable_sales = listings
                .iter()
                .filter_map(|listing| listing.to_sale())
                .take(MAX_COMPARABLES)
                .collect();
            if !attributes.comparable_sales.is_empty() {
                provenance.comparable_sales = AttributeSource::Provider;
            }
        }

        let valuation = self.engine.estimate(&attributes, &region, current_year);

        info!(
            postal_code = region.postal_code.as_deref().unwrap_or("unknown"),
            estimate = valuation.estimate.round(),
            band = valuation.band,
            adjustments = valuation.breakdown.len(),
            "valuation complete"
        );

        Ok(ValuationResult {
            valuation,
            subject: SubjectSummary::new(region, attributes.living_area_sqft, provenance),
        })
    }

    /// Runs a secondary lookup under the timeout, logging and discarding any failure.
    async fn degrade<T, F>(&self, provider: ProviderKind, lookup: F) -> Option<T>
    where
        F: Future<Output = Result<T, ProviderFailure>>,
    {
        let reason = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(Ok(value)) => return Some(value),
            Ok(Err(failure)) => DegradedReason::Failed(failure),
            Err(_) => DegradedReason::TimedOut(self.timeout),
        };

        let degraded = ProviderDegradedError { provider, reason };
        if matches!(
            degraded.reason,
            DegradedReason::Failed(ProviderFailure::NotConfigured)
        ) {
            debug!(provider = provider.label(), "provider not configured; continuing without it");
        } else {
            warn!(provider = provider.label(), error = %degraded, "continuing without provider data");
        }
        None
    }
}

fn backfill<T>(slot: &mut Option<T>, fetched: Option<T>, source: &mut AttributeSource) {
    if slot.is_none() {
        if let Some(value) = fetched {
            *slot = Some(value);
            *source = AttributeSource::Provider;
        }
    }
}
