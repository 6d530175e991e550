// Managed pinning provider, used when the local IPFS node is down.

use crate::infra::config::PinataConfig;
use crate::infra::ipfs::{ContentBackend, StoreError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const NAME: &str = "pinata";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

pub struct PinataBackend {
    client: Client,
    api_url: String,
    gateway_url: String,
    jwt: SecretString,
}

impl PinataBackend {
    pub fn new(config: &PinataConfig, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::backend(NAME, e))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            jwt: config.jwt.clone(),
        })
    }
}

#[async_trait]
impl ContentBackend for PinataBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(format!("{}/data/testAuthentication", self.api_url))
            .bearer_auth(self.jwt.expose_secret())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Pinata health probe failed");
                false
            }
        }
    }

    async fn add(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let form = Form::new().part("file", Part::bytes(bytes.to_vec()).file_name("payload"));
        let resp = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.api_url))
            .bearer_auth(self.jwt.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::backend(NAME, e))?;
        if !resp.status().is_success() {
            return Err(StoreError::backend(
                NAME,
                format!("pinFileToIPFS returned HTTP {}", resp.status()),
            ));
        }
        let pinned: PinResponse = resp.json().await.map_err(|e| StoreError::backend(NAME, e))?;
        Ok(pinned.ipfs_hash)
    }

    async fn cat(&self, hash: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let resp = self
            .client
            .get(format!("{}/ipfs/{}", self.gateway_url, hash))
            .send()
            .await
            .map_err(|e| StoreError::backend(NAME, e))?;
        match resp.status() {
            s if s.is_success() => {
                let bytes = resp.bytes().await.map_err(|e| StoreError::backend(NAME, e))?;
                Ok(Some(bytes.to_vec()))
            }
            StatusCode::NOT_FOUND => Ok(None),
            s => Err(StoreError::backend(NAME, format!("gateway returned HTTP {}", s))),
        }
    }
}
