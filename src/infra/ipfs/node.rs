// IPFS node backend speaking the Kubo HTTP API (`/api/v0`).

use crate::infra::ipfs::{ContentBackend, StoreError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const NAME: &str = "ipfs-node";
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

pub struct IpfsNodeBackend {
    client: Client,
    api_url: String,
}

impl IpfsNodeBackend {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| StoreError::backend(NAME, e))?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v0/{}", self.api_url, path)
    }
}

#[async_trait]
impl ContentBackend for IpfsNodeBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .post(self.endpoint("version"))
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(error = %e, "IPFS node health probe failed");
                false
            }
        }
    }

    async fn add(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let form = Form::new().part("file", Part::bytes(bytes.to_vec()).file_name("payload"));
        let resp = self
            .client
            .post(self.endpoint("add"))
            .query(&[("pin", "true"), ("cid-version", "0")])
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::backend(NAME, e))?;
        if !resp.status().is_success() {
            return Err(StoreError::backend(
                NAME,
                format!("add returned HTTP {}", resp.status()),
            ));
        }
        let added: AddResponse = resp.json().await.map_err(|e| StoreError::backend(NAME, e))?;
        Ok(added.hash)
    }

    async fn cat(&self, hash: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let resp = self
            .client
            .post(self.endpoint("cat"))
            .query(&[("arg", hash)])
            .send()
            .await
            .map_err(|e| StoreError::backend(NAME, e))?;
        match resp.status() {
            s if s.is_success() => {
                let bytes = resp.bytes().await.map_err(|e| StoreError::backend(NAME, e))?;
                Ok(Some(bytes.to_vec()))
            }
            StatusCode::NOT_FOUND => Ok(None),
            // Kubo answers 500 with "block was not found locally" for unknown content.
            s => Err(StoreError::backend(NAME, format!("cat returned HTTP {}", s))),
        }
    }
}
