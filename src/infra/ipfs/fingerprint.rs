use crate::crypto::hashing::content_address;
use crate::infra::ipfs::{ContentBackend, StoreError};
use async_trait::async_trait;

/// Degraded-mode backend: derives the CIDv0 locally and keeps nothing itself.
/// The store's cache holds the bytes for the lifetime of the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFingerprintBackend;

#[async_trait]
impl ContentBackend for LocalFingerprintBackend {
    fn name(&self) -> &'static str {
        "local-fingerprint"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn add(&self, bytes: &[u8]) -> Result<String, StoreError> {
        Ok(content_address(bytes))
    }

    async fn cat(&self, _hash: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }
}
