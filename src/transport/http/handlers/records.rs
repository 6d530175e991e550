use crate::app::{RecordContent, ServiceError};
use crate::crypto::hashing::parse_h256_hex;
use crate::domain::payload::metadata_from_json;
use crate::transport::http::handlers::common::{
    ok, parse_address, parse_index, required, required_text,
};
use crate::transport::http::types::{
    json_422, AddressRequest, ApiResponse, AppState, IssueRecordRequest, RevokeRecordRequest,
    UpdateRecordRequest, VerifyRecordRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

const ISSUE_BODY: &str =
    r#"{"studentAddress": "0x...", "data": "...", "metadata": {...}, "pdfDocument": {...}, "privateKey": "..."}"#;
const REVOKE_BODY: &str = r#"{"studentAddress": "0x...", "index": 0, "privateKey": "..."}"#;
const VERIFY_BODY: &str =
    r#"{"studentAddress": "0x...", "index": 0, "recordHash": "0x..."} or {..., "data": "..."}"#;

#[utoipa::path(
    post,
    path = "/records/issue",
    request_body = IssueRecordRequest,
    responses(
        (status = 200, description = "Payload stored and credential issued", body = ApiResponse),
        (status = 400, description = "Missing or invalid field", body = ApiResponse),
        (status = 403, description = "Signer is not a registry admin", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse),
        (status = 500, description = "Ledger unavailable", body = ApiResponse)
    )
)]
pub async fn issue_handler(
    State(state): State<AppState>,
    request: Result<Json<IssueRecordRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, ISSUE_BODY).into_response(),
    };
    let result = async {
        let subject = parse_address(&required(request.student_address, "studentAddress")?)?;
        let content = RecordContent {
            data: required_text(request.data, "data")?,
            metadata: metadata_from_json(request.metadata)?,
            pdf_document: request.pdf_document,
        };
        let written = state
            .records
            .issue(subject, content, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&written))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    put,
    path = "/records/update",
    request_body = UpdateRecordRequest,
    responses(
        (status = 200, description = "Payload re-stored and credential hashes replaced", body = ApiResponse),
        (status = 400, description = "Missing or invalid field", body = ApiResponse),
        (status = 403, description = "Signer is not a registry admin", body = ApiResponse),
        (status = 404, description = "No credential at that index", body = ApiResponse)
    )
)]
pub async fn update_handler(
    State(state): State<AppState>,
    request: Result<Json<UpdateRecordRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, ISSUE_BODY).into_response(),
    };
    let result = async {
        let subject = parse_address(&required(request.student_address, "studentAddress")?)?;
        let index = required(request.index, "index")?;
        let content = RecordContent {
            data: required_text(request.data, "data")?,
            metadata: metadata_from_json(request.metadata)?,
            pdf_document: request.pdf_document,
        };
        let written = state
            .records
            .update(subject, index, content, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&written))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    put,
    path = "/records/revoke",
    request_body = RevokeRecordRequest,
    responses(
        (status = 200, description = "Credential revoked", body = ApiResponse),
        (status = 404, description = "No credential at that index", body = ApiResponse),
        (status = 409, description = "Already revoked", body = ApiResponse)
    )
)]
pub async fn revoke_handler(
    State(state): State<AppState>,
    request: Result<Json<RevokeRecordRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, REVOKE_BODY).into_response(),
    };
    let result = async {
        let subject = parse_address(&required(request.student_address, "studentAddress")?)?;
        let index = required(request.index, "index")?;
        let receipt = state
            .records
            .revoke(subject, index, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&json!({
            "studentAddress": subject,
            "index": index,
            "transaction": receipt,
        })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    post,
    path = "/records/admins",
    request_body = AddressRequest,
    responses(
        (status = 200, description = "Registry admin added", body = ApiResponse),
        (status = 403, description = "Signer is not a registry admin", body = ApiResponse),
        (status = 409, description = "Already an admin", body = ApiResponse)
    )
)]
pub async fn add_admin_handler(
    State(state): State<AppState>,
    request: Result<Json<AddressRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, r#"{"address": "0x...", "privateKey": "..."}"#).into_response(),
    };
    let result = async {
        let admin = parse_address(&required(request.address, "address")?)?;
        let receipt = state
            .records
            .add_admin(admin, request.private_key.as_ref())
            .await?;
        Ok::<_, ServiceError>(ok(&json!({ "admin": admin, "transaction": receipt })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/records/{address}/count",
    params(("address" = String, Path, description = "Student address")),
    responses(
        (status = 200, description = "Credentials ever issued, revoked included", body = ApiResponse),
        (status = 400, description = "Malformed address", body = ApiResponse)
    )
)]
pub async fn count_handler(State(state): State<AppState>, Path(address): Path<String>) -> Response {
    let result = async {
        let subject = parse_address(&address)?;
        let count = state.records.count(subject).await?;
        Ok::<_, ServiceError>(ok(&json!({ "studentAddress": subject, "count": count })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/records/{address}/{index}",
    params(
        ("address" = String, Path, description = "Student address"),
        ("index" = u64, Path, description = "Zero-based credential index")
    ),
    responses(
        (status = 200, description = "Credential, with its payload when retrievable", body = ApiResponse),
        (status = 404, description = "No credential at that index", body = ApiResponse)
    )
)]
pub async fn get_record_handler(
    State(state): State<AppState>,
    Path((address, index)): Path<(String, String)>,
) -> Response {
    let result = async {
        let view = state
            .records
            .get(parse_address(&address)?, parse_index(&index)?)
            .await?;
        Ok::<_, ServiceError>(ok(&view))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    get,
    path = "/records/{address}/{index}/integrity",
    params(
        ("address" = String, Path, description = "Student address"),
        ("index" = u64, Path, description = "Zero-based credential index")
    ),
    responses(
        (status = 200, description = "Comparison of stored payload and on-chain record hash", body = ApiResponse),
        (status = 404, description = "No credential at that index", body = ApiResponse)
    )
)]
pub async fn integrity_handler(
    State(state): State<AppState>,
    Path((address, index)): Path<(String, String)>,
) -> Response {
    let result = async {
        let report = state
            .records
            .integrity(parse_address(&address)?, parse_index(&index)?)
            .await?;
        Ok::<_, ServiceError>(ok(&report))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}

#[utoipa::path(
    post,
    path = "/records/verify",
    request_body = VerifyRecordRequest,
    responses(
        (status = 200, description = "Verification result (false for revoked, mismatched or unknown)", body = ApiResponse),
        (status = 400, description = "Missing recordHash/data or malformed field", body = ApiResponse)
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    request: Result<Json<VerifyRecordRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, VERIFY_BODY).into_response(),
    };
    let result = async {
        let subject = parse_address(&required(request.student_address, "studentAddress")?)?;
        let index = required(request.index, "index")?;
        let valid = match (request.record_hash, request.data) {
            (Some(hash), _) => {
                let candidate = parse_h256_hex(&hash)
                    .map_err(|e| ServiceError::Validation(format!("Invalid recordHash: {}", e)))?;
                state.records.verify(subject, index, candidate).await?
            }
            (None, Some(data)) => state.records.verify_data(subject, index, &data).await?,
            (None, None) => return Err(ServiceError::missing_field("recordHash or data")),
        };
        Ok::<_, ServiceError>(ok(&json!({
            "studentAddress": subject,
            "index": index,
            "valid": valid,
        })))
    }
    .await;
    result.unwrap_or_else(IntoResponse::into_response)
}
