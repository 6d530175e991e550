use crate::app::ServiceError;
use crate::domain::payload::PdfDocument;
use crate::transport::http::handlers::common::ok;
use crate::transport::http::types::{json_422, ApiResponse, AppState};
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine;
use serde_json::{json, Value as JsonValue};
use tracing::info;

pub const PDF_MIME: &str = "application/pdf";

#[utoipa::path(
    post,
    path = "/ipfs/upload",
    request_body(content = Object, description = "Any JSON document"),
    responses(
        (status = 200, description = "Stored; returns the content address", body = ApiResponse),
        (status = 400, description = "Empty body", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn upload_json_handler(
    State(state): State<AppState>,
    request: Result<Json<JsonValue>, JsonRejection>,
) -> Response {
    let Json(payload) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "any JSON document").into_response(),
    };
    let result = async {
        if payload.is_null() {
            return Err(ServiceError::missing_field("body"));
        }
        let stored = state.store.put_json(&payload).await?;
        Ok::<_, ServiceError>(ok(&stored))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

fn multipart_failure(err: MultipartError) -> Response {
    let status = err.status();
    let body = if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiResponse::failed("File exceeds the upload size limit")
    } else {
        ApiResponse::invalid(format!("Invalid multipart body: {}", err.body_text()))
    };
    (status, Json(body)).into_response()
}

#[utoipa::path(
    post,
    path = "/ipfs/upload-file",
    request_body(content = String, content_type = "multipart/form-data", description = "Form field `file` holding a PDF document"),
    responses(
        (status = 200, description = "Stored; returns the document descriptor", body = ApiResponse),
        (status = 400, description = "No file, or not a PDF", body = ApiResponse),
        (status = 413, description = "File too large", body = ApiResponse)
    )
)]
pub async fn upload_file_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return ServiceError::missing_field("file").into_response(),
            Err(e) => return multipart_failure(e),
        };
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("document.pdf").to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        if mime_type != PDF_MIME {
            return ServiceError::Validation(format!(
                "Only {} files are accepted, got `{}`",
                PDF_MIME, mime_type
            ))
            .into_response();
        }

        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return multipart_failure(e),
        };
        if bytes.len() > state.max_upload_bytes {
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ApiResponse::failed(format!(
                    "File is {} bytes, limit is {}",
                    bytes.len(),
                    state.max_upload_bytes
                ))),
            )
                .into_response();
        }
        if bytes.is_empty() {
            return ServiceError::Validation("Uploaded file is empty".to_string()).into_response();
        }

        let stored = state.store.put_bytes(bytes.to_vec()).await;
        info!(%filename, hash = %stored.hash, size = stored.size, "Document uploaded");
        let document = PdfDocument {
            content_hash: stored.hash,
            filename,
            filesize: stored.size as u64,
            mime_type,
        };
        return ok(&json!({ "document": document, "backend": stored.backend }));
    }
}

/// Best-effort content type for bytes fetched by address.
fn sniff_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        PDF_MIME
    } else if serde_json::from_slice::<serde::de::IgnoredAny>(bytes).is_ok() {
        "application/json"
    } else {
        "application/octet-stream"
    }
}

#[utoipa::path(
    get,
    path = "/ipfs/file/{hash}",
    params(("hash" = String, Path, description = "Content address (CIDv0 or CIDv1)")),
    responses(
        (status = 200, description = "Raw content with content headers"),
        (status = 400, description = "Malformed content address", body = ApiResponse),
        (status = 404, description = "Not found in cache, store or gateways", body = ApiResponse)
    )
)]
pub async fn file_handler(State(state): State<AppState>, Path(hash): Path<String>) -> Response {
    match state.store.get(&hash).await {
        Ok(bytes) => {
            let content_type = sniff_content_type(&bytes);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"{}\"", hash.trim()),
                    ),
                    // Content-addressed bytes never change.
                    (
                        header::CACHE_CONTROL,
                        "public, max-age=31536000, immutable".to_string(),
                    ),
                ],
                bytes.to_vec(),
            )
                .into_response()
        }
        Err(e) => ServiceError::from(e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/ipfs/retrieve/{hash}",
    params(("hash" = String, Path, description = "Content address (CIDv0 or CIDv1)")),
    responses(
        (status = 200, description = "Content as JSON, or base64 when not JSON", body = ApiResponse),
        (status = 400, description = "Malformed content address", body = ApiResponse),
        (status = 404, description = "Not found in cache, store or gateways", body = ApiResponse)
    )
)]
pub async fn retrieve_handler(State(state): State<AppState>, Path(hash): Path<String>) -> Response {
    let result = async {
        let bytes = state.store.get(&hash).await?;
        let data = match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(content) => json!({ "hash": hash.trim(), "encoding": "json", "content": content }),
            Err(_) => json!({
                "hash": hash.trim(),
                "encoding": "base64",
                "content": base64::engine::general_purpose::STANDARD.encode(bytes.as_slice()),
            }),
        };
        Ok::<_, ServiceError>(ok(&data))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_types() {
        assert_eq!(sniff_content_type(b"%PDF-1.7\n..."), PDF_MIME);
        assert_eq!(sniff_content_type(br#"{"data":"x"}"#), "application/json");
        assert_eq!(sniff_content_type(&[0xff, 0x00, 0x10]), "application/octet-stream");
    }
}
