use home_value::config::{AppConfig, ProviderConfig, ValuationConfig};
use home_value::error::AppError;
use home_value::providers::{
    AttomComparables, CensusGeocoder, Geocoder, ProviderGateway, StaticGeocoder,
};
use home_value::valuation::domain::normalize_postal_code;
use home_value::valuation::{BaselineTable, ResolvedRegion, ValuationOrchestrator};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fixed region used instead of live geocoding.
#[derive(Debug, Clone)]
pub(crate) struct OfflineRegion {
    pub(crate) postal_code: String,
    pub(crate) county: Option<String>,
}

impl OfflineRegion {
    fn into_region(self) -> ResolvedRegion {
        ResolvedRegion::new("", Some(&self.postal_code), self.county, 0.0, 0.0)
    }
}

pub(crate) fn load_baseline(config: &ValuationConfig) -> Result<BaselineTable, AppError> {
    match &config.baseline_csv {
        Some(path) => {
            let table = BaselineTable::from_csv_path(path)?;
            info!(path = %path.display(), postal_codes = table.len(), "loaded baseline rates");
            Ok(table)
        }
        None => Ok(BaselineTable::washington()),
    }
}

pub(crate) fn build_gateway(
    config: &ProviderConfig,
    offline: Option<OfflineRegion>,
) -> Result<ProviderGateway, AppError> {
    let geocoder: Arc<dyn Geocoder> = match offline {
        Some(region) => Arc::new(StaticGeocoder::new(region.into_region())),
        None => Arc::new(CensusGeocoder::new(
            config.geocoder_url.clone(),
            config.timeout,
        )?),
    };

    let mut gateway = ProviderGateway::geocoder_only(geocoder);
    if let Some(api_key) = &config.attom_api_key {
        gateway.comparables = Arc::new(AttomComparables::new(
            config.comparables_url.clone(),
            api_key.clone(),
            config.timeout,
        )?);
        info!("comparable sales lookups enabled");
    }

    Ok(gateway)
}

pub(crate) fn build_orchestrator(
    config: &AppConfig,
    offline: Option<OfflineRegion>,
) -> Result<ValuationOrchestrator, AppError> {
    let baseline = load_baseline(&config.valuation)?;
    let gateway = build_gateway(&config.providers, offline)?;

    Ok(
        ValuationOrchestrator::new(gateway, Arc::new(baseline), config.providers.timeout)
            .with_current_year(config.valuation.current_year),
    )
}

pub(crate) fn parse_postal_code(raw: &str) -> Result<String, String> {
    normalize_postal_code(raw)
        .ok_or_else(|| format!("'{raw}' is not a 5-digit or ZIP+4 postal code"))
}
