use std::sync::Arc;

use tracing::Level;

use super::common::*;
use crate::providers::{AddressResolutionError, ProviderGateway, SubjectRecord, MAX_COMPARABLES};
use crate::valuation::breakdown::Adjustment;
use crate::valuation::domain::{AttributeSource, ComparableSale, SchoolRating};
use crate::valuation::orchestrator::{ValuationError, ValuationResult};
use crate::valuation::request::EstimateRequest;

fn has_school_entry(result: &ValuationResult) -> bool {
    result
        .valuation
        .breakdown
        .iter()
        .any(|entry| matches!(entry.adjustment, Adjustment::School { .. }))
}

#[tokio::test]
async fn failed_secondary_providers_still_produce_estimate() {
    let failing = Arc::new(FailingSource);
    let gateway = ProviderGateway {
        geocoder: static_geocoder(),
        subject: failing.clone(),
        schools: failing,
        comparables: unavailable(),
    };

    let result = orchestrator(gateway)
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("degraded valuation succeeds");

    assert_eq!(result.valuation.price_per_area_used, 950.0);
    assert_eq!(result.valuation.estimate, 1_900_000.0);
    assert!(!has_school_entry(&result));
    assert_eq!(result.subject.provenance.school_rating, AttributeSource::Absent);
    assert_eq!(result.subject.provenance.year_built, AttributeSource::Absent);
}

#[tokio::test]
async fn stalled_secondary_providers_are_abandoned_at_timeout() {
    let stalled = Arc::new(StalledSource);
    let gateway = ProviderGateway {
        geocoder: static_geocoder(),
        subject: unavailable(),
        schools: stalled.clone(),
        comparables: stalled,
    };

    let result = orchestrator(gateway)
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("timeouts degrade");

    assert_eq!(result.valuation.estimate, 1_900_000.0);
    assert_eq!(result.subject.provenance.comparable_sales, AttributeSource::Absent);
    assert!(!has_school_entry(&result));
}

#[tokio::test]
async fn geocoding_failure_aborts_valuation() {
    let gateway = ProviderGateway::geocoder_only(Arc::new(NoMatchGeocoder));

    let error = orchestrator(gateway)
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect_err("no match is fatal");

    assert!(matches!(
        error,
        ValuationError::AddressResolution(AddressResolutionError::NoMatch { .. })
    ));
}

#[tokio::test]
async fn geocoding_timeout_aborts_valuation() {
    let gateway = ProviderGateway::geocoder_only(Arc::new(StalledGeocoder));

    let error = orchestrator(gateway)
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect_err("timeout is fatal");

    assert!(matches!(
        error,
        ValuationError::AddressResolution(AddressResolutionError::TimedOut(_))
    ));
}

#[tokio::test]
async fn provider_values_fill_only_missing_attributes() {
    let source = Arc::new(RecordingSource {
        subject: Some(SubjectRecord {
            living_area_sqft: Some(2400),
            lot_area_sqft: Some(7200),
            year_built: Some(1990),
        }),
        rating: SchoolRating::new(9),
        ..RecordingSource::default()
    });

    let result = orchestrator(recording_gateway(source.clone()))
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("valuation succeeds");

    let provenance = result.subject.provenance;
    assert_eq!(result.subject.resolved_living_area_sqft, Some(2000));
    assert_eq!(provenance.living_area_sqft, AttributeSource::Input);
    assert_eq!(provenance.lot_area_sqft, AttributeSource::Provider);
    assert_eq!(provenance.year_built, AttributeSource::Provider);
    assert_eq!(provenance.school_rating, AttributeSource::Provider);
    assert!(has_school_entry(&result));
    assert!(result
        .valuation
        .breakdown
        .iter()
        .any(|entry| matches!(entry.adjustment, Adjustment::AgeModernization { age_years: 35, .. })));
}

#[tokio::test]
async fn supplied_values_skip_provider_lookups() {
    let source = Arc::new(RecordingSource {
        rating: SchoolRating::new(2),
        listings: vec![listing(100_000.0, 1_000.0)],
        ..RecordingSource::default()
    });
    let mut attributes = subject_2000_sqft();
    attributes.lot_area_sqft = Some(6000);
    attributes.year_built = Some(2000);
    attributes.school_rating = SchoolRating::new(8);
    attributes.comparable_sales = vec![ComparableSale {
        price: 1_000_000.0,
        area_sqft: 2_000.0,
    }];

    let result = orchestrator(recording_gateway(source.clone()))
        .estimate(attributes, YEAR)
        .await
        .expect("valuation succeeds");

    assert!(source.calls().is_empty(), "calls: {:?}", source.calls());
    assert_eq!(result.subject.provenance.comparable_sales, AttributeSource::Input);
    // (950 + 500) / 2
    assert_eq!(result.valuation.price_per_area_used, 725.0);
}

#[tokio::test]
async fn provider_comparables_are_filtered_and_capped() {
    let mut listings = vec![listing(900_000.0, 0.0)];
    listings.extend((0..20).map(|_| listing(1_100_000.0, 2_000.0)));
    let source = Arc::new(RecordingSource {
        listings,
        ..RecordingSource::default()
    });

    let result = orchestrator(recording_gateway(source))
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("valuation succeeds");

    let blend = result
        .valuation
        .breakdown
        .iter()
        .find_map(|entry| match entry.adjustment {
            Adjustment::ComparableBlend {
                comparable_count, ..
            } => Some(comparable_count),
            _ => None,
        })
        .expect("blend recorded");
    assert_eq!(blend, MAX_COMPARABLES);
    assert_eq!(result.subject.provenance.comparable_sales, AttributeSource::Provider);
    // (950 + 550) / 2
    assert_eq!(result.valuation.price_per_area_used, 750.0);
}

#[tokio::test]
async fn invalid_requests_never_reach_providers() {
    let source = Arc::new(RecordingSource::default());
    let mut request = EstimateRequest::new("short");
    request.condition = Some(9);

    let error = orchestrator(recording_gateway(source.clone()))
        .estimate_request(request)
        .await
        .expect_err("validation fails");

    match error {
        ValuationError::Validation(validation) => assert_eq!(validation.issues.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn implausible_public_record_year_is_discarded() {
    let source = Arc::new(RecordingSource {
        subject: Some(SubjectRecord {
            living_area_sqft: None,
            lot_area_sqft: Some(6500),
            year_built: Some(i32::MIN),
        }),
        ..RecordingSource::default()
    });

    let result = orchestrator(recording_gateway(source))
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("bad record still values the home");

    assert_eq!(result.subject.provenance.year_built, AttributeSource::Absent);
    assert_eq!(result.subject.provenance.lot_area_sqft, AttributeSource::Provider);
    assert!(!result
        .valuation
        .breakdown
        .iter()
        .any(|entry| matches!(entry.adjustment, Adjustment::AgeModernization { .. })));
}

#[tokio::test]
async fn future_public_record_year_is_discarded() {
    let source = Arc::new(RecordingSource {
        subject: Some(SubjectRecord {
            year_built: Some(YEAR + 1),
            ..SubjectRecord::default()
        }),
        ..RecordingSource::default()
    });

    let result = orchestrator(recording_gateway(source))
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("valuation succeeds");

    assert_eq!(result.subject.provenance.year_built, AttributeSource::Absent);
}

#[tokio::test]
async fn comparables_lookup_receives_supplied_living_area() {
    let source = Arc::new(RecordingSource::default());

    orchestrator(recording_gateway(source.clone()))
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("valuation succeeds");

    assert_eq!(source.comparable_area_hints(), vec![Some(2000)]);
}

#[tokio::test]
async fn comparables_lookup_receives_backfilled_living_area() {
    let source = Arc::new(RecordingSource {
        subject: Some(SubjectRecord {
            living_area_sqft: Some(2400),
            ..SubjectRecord::default()
        }),
        ..RecordingSource::default()
    });

    let result = orchestrator(recording_gateway(source.clone()))
        .estimate(crate::valuation::domain::PropertyAttributes::new(ADDRESS), YEAR)
        .await
        .expect("valuation succeeds");

    assert_eq!(result.subject.resolved_living_area_sqft, Some(2400));
    assert_eq!(source.calls(), vec!["subject", "school", "comparables"]);
    assert_eq!(source.comparable_area_hints(), vec![Some(2400)]);
}

#[tokio::test]
async fn unconfigured_providers_log_below_warn() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    offline_orchestrator()
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("valuation succeeds");

    assert!(logs.at(Level::WARN).is_empty(), "{:?}", logs.at(Level::WARN));
    let debug = logs.at(Level::DEBUG);
    assert_eq!(
        debug
            .iter()
            .filter(|message| message.contains("provider not configured"))
            .count(),
        3,
        "{debug:?}"
    );
}

#[tokio::test]
async fn provider_outages_log_at_warn() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();
    let failing = Arc::new(FailingSource);
    let gateway = ProviderGateway {
        geocoder: static_geocoder(),
        subject: failing.clone(),
        schools: failing,
        comparables: unavailable(),
    };

    orchestrator(gateway)
        .estimate(subject_2000_sqft(), YEAR)
        .await
        .expect("valuation succeeds");

    let warnings = logs.at(Level::WARN);
    assert_eq!(warnings.len(), 2, "{warnings:?}");
    assert!(warnings
        .iter()
        .all(|message| message == "continuing without provider data"));
}

#[tokio::test]
async fn skipped_lookups_are_logged() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();
    let mut attributes = subject_2000_sqft();
    attributes.lot_area_sqft = Some(6000);
    attributes.year_built = Some(2000);
    attributes.school_rating = SchoolRating::new(7);
    attributes.comparable_sales = vec![ComparableSale {
        price: 900_000.0,
        area_sqft: 1_800.0,
    }];

    offline_orchestrator()
        .estimate(attributes, YEAR)
        .await
        .expect("valuation succeeds");

    let debug = logs.at(Level::DEBUG);
    for expected in [
        "subject property lookup skipped; size and age supplied",
        "school rating lookup skipped; rating supplied",
        "comparable sales lookup skipped; comparables supplied",
    ] {
        assert!(debug.iter().any(|message| message == expected), "{debug:?}");
    }
}
