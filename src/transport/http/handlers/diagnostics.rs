use crate::app::ServiceError;
use crate::transport::http::handlers::common::ok;
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Events returned by `/diagnostics/ledger`.
const RECENT_EVENTS: usize = 20;

#[utoipa::path(
    get,
    path = "/diagnostics/ledger",
    responses(
        (status = 200, description = "Block height, admin sets and the latest events", body = ApiResponse),
        (status = 500, description = "Ledger unavailable", body = ApiResponse)
    )
)]
pub async fn ledger_diagnostics_handler(State(state): State<AppState>) -> Response {
    let result = async {
        let status = state.ledger.status().await.map_err(ServiceError::from)?;
        let events = state
            .ledger
            .recent_events(RECENT_EVENTS)
            .await
            .map_err(ServiceError::from)?;
        Ok::<_, ServiceError>(ok(&json!({ "status": status, "recentEvents": events })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/diagnostics/ipfs",
    responses(
        (status = 200, description = "Backend availability, gateways and cache size", body = ApiResponse)
    )
)]
pub async fn ipfs_diagnostics_handler(State(state): State<AppState>) -> Response {
    ok(&state.store.health().await)
}
