use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::to_bytes;
use axum::response::Response;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use crate::providers::{
    AddressResolutionError, ComparableListing, ComparableSalesSource, Geocoder, ProviderFailure,
    ProviderGateway, SchoolRatingSource, StaticGeocoder, SubjectPropertySource, SubjectRecord,
    UnavailableSource,
};
use crate::valuation::baseline::BaselineTable;
use crate::valuation::domain::{PropertyAttributes, ResolvedRegion, SchoolRating};
use crate::valuation::orchestrator::ValuationOrchestrator;

pub(super) const YEAR: i32 = 2025;
pub(super) const TIMEOUT: Duration = Duration::from_millis(50);
pub(super) const ADDRESS: &str = "10500 NE 8th St, Bellevue, WA 98004";

pub(super) fn bellevue() -> ResolvedRegion {
    ResolvedRegion::new(
        "10500 NE 8TH ST, BELLEVUE, WA, 98004",
        Some("98004"),
        Some("King County".to_string()),
        47.6167,
        -122.2006,
    )
}

pub(super) fn static_geocoder() -> Arc<dyn Geocoder> {
    Arc::new(StaticGeocoder::new(bellevue()))
}

pub(super) fn orchestrator(gateway: ProviderGateway) -> ValuationOrchestrator {
    ValuationOrchestrator::new(gateway, Arc::new(BaselineTable::washington()), TIMEOUT)
        .with_current_year(Some(YEAR))
}

pub(super) fn offline_orchestrator() -> ValuationOrchestrator {
    orchestrator(ProviderGateway::geocoder_only(static_geocoder()))
}

pub(super) fn subject_2000_sqft() -> PropertyAttributes {
    PropertyAttributes {
        living_area_sqft: Some(2000),
        ..PropertyAttributes::new(ADDRESS)
    }
}

pub(super) fn listing(price: f64, area_sqft: f64) -> ComparableListing {
    ComparableListing {
        price,
        area_sqft,
        sale_date: None,
        distance_miles: Some(0.5),
    }
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects");
    serde_json::from_slice(&bytes).expect("body is json")
}

/// Geocoder that never finds the address.
pub(super) struct NoMatchGeocoder;

#[async_trait]
impl Geocoder for NoMatchGeocoder {
    async fn geocode(&self, address: &str) -> Result<ResolvedRegion, AddressResolutionError> {
        Err(AddressResolutionError::NoMatch {
            address: address.to_string(),
        })
    }
}

/// Geocoder that outlives any reasonable timeout.
pub(super) struct StalledGeocoder;

#[async_trait]
impl Geocoder for StalledGeocoder {
    async fn geocode(&self, _address: &str) -> Result<ResolvedRegion, AddressResolutionError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(bellevue())
    }
}

/// Secondary source whose every lookup fails outright.
pub(super) struct FailingSource;

#[async_trait]
impl SubjectPropertySource for FailingSource {
    async fn lookup_subject(
        &self,
        _normalized_address: &str,
    ) -> Result<Option<SubjectRecord>, ProviderFailure> {
        Err(ProviderFailure::Unavailable("503 from records vendor".to_string()))
    }
}

#[async_trait]
impl SchoolRatingSource for FailingSource {
    async fn lookup_school_rating(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<SchoolRating>, ProviderFailure> {
        Err(ProviderFailure::Malformed("rating out of range".to_string()))
    }
}

/// Secondary source that sleeps past the orchestrator timeout.
pub(super) struct StalledSource;

#[async_trait]
impl SchoolRatingSource for StalledSource {
    async fn lookup_school_rating(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<SchoolRating>, ProviderFailure> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(SchoolRating::new(10))
    }
}

#[async_trait]
impl ComparableSalesSource for StalledSource {
    async fn lookup_comparables(
        &self,
        _latitude: f64,
        _longitude: f64,
        _approximate_living_area_sqft: Option<u32>,
    ) -> Result<Vec<ComparableListing>, ProviderFailure> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(vec![listing(1_000_000.0, 1_000.0)])
    }
}

/// Canned public-record and market data, recording each call it receives.
#[derive(Default)]
pub(super) struct RecordingSource {
    pub(super) subject: Option<SubjectRecord>,
    pub(super) rating: Option<SchoolRating>,
    pub(super) listings: Vec<ComparableListing>,
    pub(super) calls: Mutex<Vec<&'static str>>,
    pub(super) comparable_area_hints: Mutex<Vec<Option<u32>>>,
}

impl RecordingSource {
    pub(super) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(super) fn comparable_area_hints(&self) -> Vec<Option<u32>> {
        self.comparable_area_hints
            .lock()
            .expect("hints lock")
            .clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl SubjectPropertySource for RecordingSource {
    async fn lookup_subject(
        &self,
        _normalized_address: &str,
    ) -> Result<Option<SubjectRecord>, ProviderFailure> {
        self.record("subject");
        Ok(self.subject)
    }
}

#[async_trait]
impl SchoolRatingSource for RecordingSource {
    async fn lookup_school_rating(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Option<SchoolRating>, ProviderFailure> {
        self.record("school");
        Ok(self.rating)
    }
}

#[async_trait]
impl ComparableSalesSource for RecordingSource {
    async fn lookup_comparables(
        &self,
        _latitude: f64,
        _longitude: f64,
        approximate_living_area_sqft: Option<u32>,
    ) -> Result<Vec<ComparableListing>, ProviderFailure> {
        self.record("comparables");
        self.comparable_area_hints
            .lock()
            .expect("hints lock")
            .push(approximate_living_area_sqft);
        Ok(self.listings.clone())
    }
}

pub(super) fn recording_gateway(source: Arc<RecordingSource>) -> ProviderGateway {
    ProviderGateway {
        geocoder: static_geocoder(),
        subject: source.clone(),
        schools: source.clone(),
        comparables: source,
    }
}

pub(super) fn unavailable() -> Arc<UnavailableSource> {
    Arc::new(UnavailableSource)
}

/// Collects log messages emitted while installed as the thread's default subscriber.
#[derive(Clone, Default)]
pub(super) struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    pub(super) fn install(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    pub(super) fn at(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .expect("log lock")
            .iter()
            .filter(|(logged, _)| *logged == level)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut message = MessageField::default();
        event.record(&mut message);
        self.0
            .lock()
            .expect("log lock")
            .push((*event.metadata().level(), message.0));
    }
}

#[derive(Default)]
struct MessageField(String);

impl Visit for MessageField {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
