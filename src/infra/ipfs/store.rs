//! The store adapter used by the service layer.

use crate::crypto::hashing::{canonical_json_bytes, content_address, is_valid_content_address};
use crate::infra::config::IpfsConfig;
use crate::infra::ipfs::{
    ContentBackend, GatewayFetcher, IpfsNodeBackend, LocalFingerprintBackend, PinataBackend,
    StoreError,
};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Result of a write: the content address and which backend produced it.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StoredContent {
    pub hash: String,
    pub backend: &'static str,
    pub size: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    pub name: &'static str,
    pub available: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub backends: Vec<BackendHealth>,
    pub gateways: Vec<String>,
    pub cached_entries: usize,
    /// True when every write would land in the local fingerprint fallback.
    pub degraded: bool,
}

pub struct ContentStore {
    /// Remote backends in priority order.
    backends: Vec<Arc<dyn ContentBackend>>,
    fallback: LocalFingerprintBackend,
    gateways: GatewayFetcher,
    /// Insert-if-absent; an entry is never replaced once written.
    cache: RwLock<HashMap<String, Arc<Vec<u8>>>>,
}

impl ContentStore {
    pub fn new(backends: Vec<Arc<dyn ContentBackend>>, gateways: GatewayFetcher) -> Self {
        Self {
            backends,
            fallback: LocalFingerprintBackend,
            gateways,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Node first, then the managed provider when a JWT is configured.
    pub fn from_config(config: &IpfsConfig) -> Result<Self, StoreError> {
        let mut backends: Vec<Arc<dyn ContentBackend>> = vec![Arc::new(IpfsNodeBackend::new(
            config.api_url.clone(),
            config.api_timeout,
        )?)];
        if let Some(pinata) = &config.pinata {
            backends.push(Arc::new(PinataBackend::new(pinata, config.api_timeout)?));
        }
        Ok(Self::new(
            backends,
            GatewayFetcher::new(config.gateways.clone(), config.gateway_timeout),
        ))
    }

    async fn remember(&self, hash: &str, bytes: Arc<Vec<u8>>) {
        let mut cache = self.cache.write().await;
        cache.entry(hash.to_string()).or_insert(bytes);
    }

    /// Serializes `value` canonically and stores it.
    pub async fn put_json(&self, value: &JsonValue) -> Result<StoredContent, StoreError> {
        let bytes = canonical_json_bytes(value)?;
        Ok(self.put_bytes(bytes).await)
    }

    pub async fn put<T: Serialize>(&self, payload: &T) -> Result<StoredContent, StoreError> {
        self.put_json(&serde_json::to_value(payload)?).await
    }

    /// Stores raw bytes. Never fails: when no remote backend accepts the write the
    /// local fingerprint is used and the bytes are served from the cache.
    pub async fn put_bytes(&self, bytes: Vec<u8>) -> StoredContent {
        let size = bytes.len();
        let bytes = Arc::new(bytes);

        for backend in &self.backends {
            if !backend.is_available().await {
                warn!(backend = backend.name(), "Content backend unavailable, trying next");
                continue;
            }
            match backend.add(&bytes).await {
                Ok(hash) => {
                    info!(backend = backend.name(), %hash, size, "Stored content");
                    self.remember(&hash, bytes).await;
                    return StoredContent {
                        hash,
                        backend: backend.name(),
                        size,
                    };
                }
                Err(e) => warn!(backend = backend.name(), error = %e, "Content upload failed"),
            }
        }

        let hash = self
            .fallback
            .add(&bytes)
            .await
            .unwrap_or_else(|_| content_address(&bytes));
        warn!(%hash, size, "All content backends failed, using local fingerprint");
        self.remember(&hash, bytes).await;
        StoredContent {
            hash,
            backend: self.fallback.name(),
            size,
        }
    }

    /// Fetches content by address: cache, remote backends, then public gateways.
    pub async fn get(&self, hash: &str) -> Result<Arc<Vec<u8>>, StoreError> {
        let hash = hash.trim();
        if !is_valid_content_address(hash) {
            return Err(StoreError::InvalidFormat(hash.to_string()));
        }

        if let Some(bytes) = self.cache.read().await.get(hash) {
            debug!(%hash, "Content served from cache");
            return Ok(bytes.clone());
        }

        for backend in &self.backends {
            match backend.cat(hash).await {
                Ok(Some(bytes)) => {
                    debug!(backend = backend.name(), %hash, "Content served by backend");
                    let bytes = Arc::new(bytes);
                    self.remember(hash, bytes.clone()).await;
                    return Ok(bytes);
                }
                Ok(None) => {}
                Err(e) => debug!(backend = backend.name(), error = %e, "Content lookup failed"),
            }
        }

        if let Some((bytes, gateway)) = self.gateways.fetch(hash).await {
            info!(%gateway, %hash, "Content served by public gateway");
            let bytes = Arc::new(bytes);
            // Only bytes that hash to the requested fingerprint are cached.
            // Node-built CIDs hash the DAG, so those are refetched every time.
            if content_address(&bytes) == hash {
                self.remember(hash, bytes.clone()).await;
            } else {
                debug!(%gateway, %hash, "Gateway content not verifiable, not cached");
            }
            return Ok(bytes);
        }

        Err(StoreError::NotFound(hash.to_string()))
    }

    pub async fn get_json(&self, hash: &str) -> Result<JsonValue, StoreError> {
        let bytes = self.get(hash).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn health(&self) -> StoreHealth {
        let mut backends = Vec::with_capacity(self.backends.len() + 1);
        for backend in &self.backends {
            backends.push(BackendHealth {
                name: backend.name(),
                available: backend.is_available().await,
            });
        }
        let degraded = !backends.iter().any(|b| b.available);
        backends.push(BackendHealth {
            name: self.fallback.name(),
            available: true,
        });
        StoreHealth {
            backends,
            gateways: self.gateways.gateways().to_vec(),
            cached_entries: self.cache.read().await.len(),
            degraded,
        }
    }
}
