use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::error;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (ledger reachable)", body = ApiResponse),
        (status = 503, description = "Service is unhealthy (ledger unreachable)", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.ledger.status().await {
        Ok(status) => {
            let store = state.store.health().await;
            (
                StatusCode::OK,
                Json(ApiResponse::ok(serde_json::json!({
                    "status": "ok",
                    "blockNumber": status.block_number,
                    "subjects": status.subject_count,
                    "storeDegraded": store.degraded,
                }))),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Ledger health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    success: false,
                    data: Some(serde_json::json!({ "status": "unhealthy" })),
                    message: None,
                    error: Some("Ledger unreachable".to_string()),
                }),
            )
                .into_response()
        }
    }
}
