use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;

use super::{ComparableListing, ComparableSalesSource, ProviderFailure, MAX_COMPARABLES};

const SEARCH_RADIUS_MILES: &str = "1";
/// Candidate sizes are bounded to this fraction either side of the subject.
const SIZE_TOLERANCE: f64 = 0.3;

/// Recent nearby sales from the ATTOM property API sale snapshot.
pub struct AttomComparables {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AttomComparables {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderFailure> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("home-value/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl ComparableSalesSource for AttomComparables {
    async fn lookup_comparables(
        &self,
        latitude: f64,
        longitude: f64,
        approximate_living_area_sqft: Option<u32>,
    ) -> Result<Vec<ComparableListing>, ProviderFailure> {
        debug!(endpoint = %self.endpoint, "fetching comparable sales");

        let mut query = vec![
            ("latitude", latitude.to_string()),
            ("longitude", longitude.to_string()),
            ("radius", SEARCH_RADIUS_MILES.to_string()),
            ("pagesize", MAX_COMPARABLES.to_string()),
        ];
        query.extend(size_bounds(approximate_living_area_sqft));

        let response = self
            .client
            .get(&self.endpoint)
            .header("apikey", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderFailure::Unavailable(format!(
                "comparables vendor returned {}",
                response.status()
            )));
        }

        let envelope: AttomEnvelope = response.json().await?;
        Ok(listings_from_envelope(envelope))
    }
}

fn size_bounds(living_area_sqft: Option<u32>) -> Vec<(&'static str, String)> {
    let Some(sqft) = living_area_sqft.filter(|sqft| *sqft > 0) else {
        return Vec::new();
    };
    let sqft = f64::from(sqft);
    vec![
        (
            "minUniversalSize",
            format!("{:.0}", sqft * (1.0 - SIZE_TOLERANCE)),
        ),
        (
            "maxUniversalSize",
            format!("{:.0}", sqft * (1.0 + SIZE_TOLERANCE)),
        ),
    ]
}

#[derive(Debug, Deserialize)]
struct AttomEnvelope {
    #[serde(default)]
    property: Vec<AttomProperty>,
}

#[derive(Debug, Deserialize)]
struct AttomProperty {
    #[serde(default)]
    location: Option<AttomLocation>,
    #[serde(default)]
    building: Option<AttomBuilding>,
    #[serde(default)]
    sale: Option<AttomSale>,
}

#[derive(Debug, Deserialize)]
struct AttomLocation {
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AttomBuilding {
    #[serde(default)]
    size: Option<AttomSize>,
}

#[derive(Debug, Deserialize)]
struct AttomSize {
    #[serde(default)]
    universalsize: Option<f64>,
    #[serde(default)]
    livingsize: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct AttomSale {
    #[serde(rename = "saleTransDate", default)]
    sale_trans_date: Option<String>,
    #[serde(default)]
    amount: Option<AttomAmount>,
}

#[derive(Debug, Deserialize)]
struct AttomAmount {
    #[serde(default)]
    saleamt: Option<f64>,
}

/// Keeps properties carrying both a sale amount and a building size.
fn listings_from_envelope(envelope: AttomEnvelope) -> Vec<ComparableListing> {
    envelope
        .property
        .into_iter()
        .filter_map(|property| {
            let sale = property.sale?;
            let price = sale.amount.and_then(|amount| amount.saleamt)?;
            let size = property.building.and_then(|building| building.size)?;
            let area_sqft = size.livingsize.or(size.universalsize)?;
            let sale_date = sale
                .sale_trans_date
                .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok());

            Some(ComparableListing {
                price,
                area_sqft,
                sale_date,
                distance_miles: property.location.and_then(|location| location.distance),
            })
        })
        .collect()
}
