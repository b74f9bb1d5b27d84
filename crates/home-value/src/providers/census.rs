use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{AddressResolutionError, Geocoder, ProviderFailure};
use crate::valuation::domain::ResolvedRegion;

const BENCHMARK: &str = "Public_AR_Current";
const VINTAGE: &str = "Current_Current";

/// US Census Bureau one-line address geocoder; needs no API key.
pub struct CensusGeocoder {
    client: reqwest::Client,
    endpoint: String,
}

impl CensusGeocoder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ProviderFailure> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("home-value/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Geocoder for CensusGeocoder {
    async fn geocode(&self, address: &str) -> Result<ResolvedRegion, AddressResolutionError> {
        debug!(endpoint = %self.endpoint, "geocoding address");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("address", address),
                ("benchmark", BENCHMARK),
                ("vintage", VINTAGE),
                ("layers", "Counties"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|err| AddressResolutionError::Unavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(AddressResolutionError::Unavailable(format!(
                "geocoder returned {}",
                response.status()
            )));
        }

        let envelope: CensusEnvelope = response
            .json()
            .await
            .map_err(|err| AddressResolutionError::Unavailable(err.to_string()))?;

        region_from_envelope(address, envelope)
    }
}

#[derive(Debug, Deserialize)]
struct CensusEnvelope {
    result: CensusResult,
}

#[derive(Debug, Deserialize)]
struct CensusResult {
    #[serde(rename = "addressMatches", default)]
    address_matches: Vec<CensusMatch>,
}

#[derive(Debug, Deserialize)]
struct CensusMatch {
    #[serde(rename = "matchedAddress")]
    matched_address: String,
    coordinates: CensusCoordinates,
    #[serde(rename = "addressComponents", default)]
    address_components: Option<CensusAddressComponents>,
    #[serde(default)]
    geographies: Option<CensusGeographies>,
}

/// Census coordinates are x = longitude, y = latitude.
#[derive(Debug, Deserialize)]
struct CensusCoordinates {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct CensusAddressComponents {
    #[serde(default)]
    zip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CensusGeographies {
    #[serde(rename = "Counties", default)]
    counties: Vec<CensusCounty>,
}

#[derive(Debug, Deserialize)]
struct CensusCounty {
    #[serde(rename = "NAME")]
    name: String,
}

fn region_from_envelope(
    address: &str,
    envelope: CensusEnvelope,
) -> Result<ResolvedRegion, AddressResolutionError> {
    let Some(best) = envelope.result.address_matches.into_iter().next() else {
        return Err(AddressResolutionError::NoMatch {
            address: address.to_string(),
        });
    };

    // Matched addresses end in ", ZIP" when the components block is missing.
    let zip = best
        .address_components
        .and_then(|components| components.zip)
        .or_else(|| {
            best.matched_address
                .rsplit(',')
                .next()
                .map(|tail| tail.trim().to_string())
        });
    let county = best
        .geographies
        .and_then(|geographies| geographies.counties.into_iter().next())
        .map(|county| county.name);

    Ok(ResolvedRegion::new(
        best.matched_address,
        zip.as_deref(),
        county,
        best.coordinates.y,
        best.coordinates.x,
    ))
}
