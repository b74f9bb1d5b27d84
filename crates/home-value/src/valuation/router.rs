use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;

use super::orchestrator::ValuationOrchestrator;
use super::presentation::ValuationResponse;
use super::request::{EstimateRequest, ValidationError};

/// Router exposing the estimate endpoint under its legacy and versioned paths.
pub fn valuation_router(orchestrator: Arc<ValuationOrchestrator>) -> Router {
    Router::new()
        .route("/api/estimate", post(estimate_handler))
        .route("/api/v1/valuation/estimate", post(estimate_handler))
        .with_state(orchestrator)
}

pub(crate) async fn estimate_handler(
    State(orchestrator): State<Arc<ValuationOrchestrator>>,
    payload: Result<Json<EstimateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = ValidationError::malformed(rejection.body_text());
            return client_error(error.to_string());
        }
    };

    match orchestrator.estimate_request(request).await {
        Ok(result) => (StatusCode::OK, Json(ValuationResponse::from(result))).into_response(),
        // Both failure kinds stem from the submitted address or attributes.
        Err(error) => client_error(error.to_string()),
    }
}

fn client_error(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}
