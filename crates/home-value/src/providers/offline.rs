use async_trait::async_trait;

use super::{
    AddressResolutionError, ComparableListing, ComparableSalesSource, Geocoder, ProviderFailure,
    SchoolRatingSource, SubjectPropertySource, SubjectRecord,
};
use crate::valuation::domain::{ResolvedRegion, SchoolRating};

/// Resolves every address into one fixed region, for offline runs.
#[derive(Debug, Clone)]
pub struct StaticGeocoder {
    region: ResolvedRegion,
}

impl StaticGeocoder {
    pub fn new(region: ResolvedRegion) -> Self {
        Self { region }
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<ResolvedRegion, AddressResolutionError> {
        let normalized = address.split_whitespace().collect::<Vec<_>>().join(" ");
        if normalized.is_empty() {
            return Err(AddressResolutionError::NoMatch {
                address: address.to_string(),
            });
        }

        Ok(ResolvedRegion {
            normalized_address: normalized.to_ascii_uppercase(),
            ..self.region.clone()
        })
    }
}

/// Secondary source used when no data vendor is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSource;

#[async_trait]
impl SubjectPropertySource for UnavailableSource {
    async fn lookup_subject(
        &self,
        _normalized_address: &str,
    ) -> Result<Option<SubjectRecord>, ProviderFailure> {
        Err(ProviderFailure::NotConfigured)
    }
}

#[async_trait]
impl SchoolRatingSource for UnavailableSource {
    async fn lookup_school_rating(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<SchoolRating>, ProviderFailure> {
        Err(ProviderFailure::NotConfigured)
    }
}

#[async_trait]
impl ComparableSalesSource for UnavailableSource {
    async fn lookup_comparables(
        &self,
        _latitude: f64,
        _longitude: f64,
        _approximate_living_area_sqft: Option<u32>,
    ) -> Result<Vec<ComparableListing>, ProviderFailure> {
        Err(ProviderFailure::NotConfigured)
    }
}
