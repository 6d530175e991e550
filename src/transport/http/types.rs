use crate::app::{RecordsService, StudentService};
use crate::domain::payload::PdfDocument;
use crate::infra::ipfs::ContentStore;
use crate::infra::ledger::Ledger;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub students: Arc<StudentService>,
    pub records: Arc<RecordsService>,
    pub store: Arc<ContentStore>,
    pub ledger: Arc<dyn Ledger>,
    /// Upper bound for `/ipfs/upload-file` documents.
    pub max_upload_bytes: usize,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    /// Set on request validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Body of `POST /students/register` and `PUT /students/update`.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRequest {
    pub address: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    #[serde(default)]
    pub second_surname: Option<String>,
    pub studies: Option<String>,
    /// Hex Ed25519 seed of an admin. Falls back to the server's configured key.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub private_key: Option<SecretString>,
}

/// Body of the deactivate/reactivate and add-admin endpoints.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub address: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub private_key: Option<SecretString>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaginationQuery {
    pub start_index: Option<i64>,
    pub count: Option<i64>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecordRequest {
    pub student_address: Option<String>,
    /// Credential statement; its SHA-256 is the on-chain record hash.
    pub data: Option<String>,
    /// Flat map of scalar values.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
    #[serde(default)]
    pub pdf_document: Option<PdfDocument>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub private_key: Option<SecretString>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecordRequest {
    pub student_address: Option<String>,
    pub index: Option<u64>,
    pub data: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<JsonValue>,
    #[serde(default)]
    pub pdf_document: Option<PdfDocument>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub private_key: Option<SecretString>,
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRecordRequest {
    pub student_address: Option<String>,
    pub index: Option<u64>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub private_key: Option<SecretString>,
}

/// Either `recordHash` or `data` must be present; `recordHash` wins when both are.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRecordRequest {
    pub student_address: Option<String>,
    pub index: Option<u64>,
    pub record_hash: Option<String>,
    pub data: Option<String>,
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::failed(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
