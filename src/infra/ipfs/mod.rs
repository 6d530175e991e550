//! Content-addressed storage (IPFS) with graceful degradation.
//!
//! Writes go to the first remote backend that answers its health probe; when none
//! does, the local fingerprint backend computes a CIDv0 and the bytes live only in
//! the process cache. Reads try the cache, the remote backends, then public gateways.

pub mod fingerprint;
pub mod gateway;
pub mod node;
pub mod pinata;
pub mod store;

use async_trait::async_trait;
use thiserror::Error;

pub use fingerprint::LocalFingerprintBackend;
pub use gateway::GatewayFetcher;
pub use node::IpfsNodeBackend;
pub use pinata::PinataBackend;
pub use store::{BackendHealth, ContentStore, StoreHealth, StoredContent};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid content hash format: {0}")]
    InvalidFormat(String),
    #[error("content {0} not found in cache, store or gateways")]
    NotFound(String),
    #[error("{backend} request failed: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn backend(backend: &'static str, err: impl std::fmt::Display) -> Self {
        StoreError::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

/// One interchangeable storage strategy behind the store adapter.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap health probe used to pick a backend at call time.
    async fn is_available(&self) -> bool;

    /// Stores `bytes` and returns their content address.
    async fn add(&self, bytes: &[u8]) -> Result<String, StoreError>;

    /// Fetches content by address; `Ok(None)` means the backend does not have it.
    async fn cat(&self, hash: &str) -> Result<Option<Vec<u8>>, StoreError>;
}
