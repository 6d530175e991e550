//! Off-chain credential payloads, stored by content address.

use crate::crypto::hashing::{is_valid_content_address, record_hash};
use primitive_types::H256;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Scalar metadata value. Nested objects and arrays are rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    Null,
}

impl MetadataValue {
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(Self::Null),
            JsonValue::Bool(b) => Some(Self::Bool(b)),
            JsonValue::Number(n) => Some(Self::Number(n)),
            JsonValue::String(s) => Some(Self::Text(s)),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// Attached document (typically the diploma PDF), itself content-addressed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PdfDocument {
    pub content_hash: String,
    pub filename: String,
    pub filesize: u64,
    pub mime_type: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredPayload {
    /// Human-readable credential statement; the only field committed on-chain.
    pub data: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_document: Option<PdfDocument>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload `data` must not be empty")]
    EmptyData,
    #[error("metadata `{0}` must be a string, number, boolean or null")]
    NonScalarMetadata(String),
    #[error("metadata must be an object")]
    MetadataNotObject,
    #[error("pdfDocument.contentHash `{0}` is not a valid content address")]
    InvalidDocumentHash(String),
}

impl StoredPayload {
    pub fn record_hash(&self) -> H256 {
        record_hash(&self.data)
    }

    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.data.trim().is_empty() {
            return Err(PayloadError::EmptyData);
        }
        if let Some(doc) = &self.pdf_document {
            if !is_valid_content_address(&doc.content_hash) {
                return Err(PayloadError::InvalidDocumentHash(doc.content_hash.clone()));
            }
        }
        Ok(())
    }
}

/// Converts loosely typed request metadata into the scalar map.
pub fn metadata_from_json(value: Option<JsonValue>) -> Result<Metadata, PayloadError> {
    match value {
        None | Some(JsonValue::Null) => Ok(Metadata::new()),
        Some(JsonValue::Object(map)) => map
            .into_iter()
            .map(|(key, value)| {
                MetadataValue::from_json(value)
                    .map(|v| (key.clone(), v))
                    .ok_or(PayloadError::NonScalarMetadata(key))
            })
            .collect(),
        Some(_) => Err(PayloadError::MetadataNotObject),
    }
}
