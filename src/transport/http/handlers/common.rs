use crate::app::ServiceError;
use crate::domain::address::Address;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::LedgerUnavailable(_) | ServiceError::Internal(_) => {
                error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = match &self {
            ServiceError::Validation(message) => ApiResponse::invalid(message.clone()),
            other => ApiResponse::failed(other.public_message()),
        };
        (status, Json(body)).into_response()
    }
}

/// 200 with `data` set to the serialized value.
pub fn ok<T: Serialize>(data: &T) -> Response {
    match serde_json::to_value(data) {
        Ok(value) => (StatusCode::OK, Json(ApiResponse::ok(value))).into_response(),
        Err(e) => ServiceError::Internal(format!("response serialization failed: {}", e))
            .into_response(),
    }
}

pub fn required<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::missing_field(field))
}

/// Like `required`, but blank strings count as missing.
pub fn required_text(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ServiceError::missing_field(field)),
    }
}

pub fn parse_address(raw: &str) -> Result<Address, ServiceError> {
    Ok(raw.trim().parse::<Address>()?)
}

pub fn parse_index(raw: &str) -> Result<u64, ServiceError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ServiceError::Validation(format!("Invalid index: {}", raw)))
}
