use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::domain::ChargeSubmission;
use super::evaluation::Decision;
use super::explanation::ExplanationModel;
use super::ledger::TransactionLedger;
use super::service::{ChargeScreeningService, ScreeningError};

const RECENT_CHARGES_LIMIT: usize = 50;

/// Router builder exposing the screening and cache-management endpoints.
pub fn screening_router<L, M>(service: Arc<ChargeScreeningService<L, M>>) -> Router
where
    L: TransactionLedger + 'static,
    M: ExplanationModel + 'static,
{
    Router::new()
        .route(
            "/api/v1/charges",
            post(assess_handler::<L, M>).get(recent_handler::<L, M>),
        )
        .route(
            "/api/v1/fraud/cache/stats",
            get(cache_stats_handler::<L, M>),
        )
        .route(
            "/api/v1/fraud/cache/clear",
            post(cache_clear_handler::<L, M>),
        )
        .with_state(service)
}

pub(crate) async fn assess_handler<L, M>(
    State(service): State<Arc<ChargeScreeningService<L, M>>>,
    Json(submission): Json<ChargeSubmission>,
) -> Response
where
    L: TransactionLedger + 'static,
    M: ExplanationModel + 'static,
{
    match service.assess(submission).await {
        Ok(assessment) => {
            let status = match assessment.decision {
                Decision::Accepted => StatusCode::OK,
                Decision::Declined => StatusCode::PAYMENT_REQUIRED,
            };
            (status, Json(assessment)).into_response()
        }
        Err(ScreeningError::Validation(error)) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(other) => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn recent_handler<L, M>(
    State(service): State<Arc<ChargeScreeningService<L, M>>>,
) -> Response
where
    L: TransactionLedger + 'static,
    M: ExplanationModel + 'static,
{
    match service.recent_charges(RECENT_CHARGES_LIMIT) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn cache_stats_handler<L, M>(
    State(service): State<Arc<ChargeScreeningService<L, M>>>,
) -> Response
where
    L: TransactionLedger + 'static,
    M: ExplanationModel + 'static,
{
    (StatusCode::OK, Json(service.cache_stats())).into_response()
}

pub(crate) async fn cache_clear_handler<L, M>(
    State(service): State<Arc<ChargeScreeningService<L, M>>>,
) -> Response
where
    L: TransactionLedger + 'static,
    M: ExplanationModel + 'static,
{
    (StatusCode::OK, Json(service.clear_cache())).into_response()
}
