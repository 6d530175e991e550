use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Read-only fallback over public IPFS gateways, tried in a fixed order.
/// Each gateway gets its own timeout so one slow endpoint cannot stall the read.
pub struct GatewayFetcher {
    client: Client,
    gateways: Vec<String>,
    timeout: Duration,
}

impl GatewayFetcher {
    pub fn new(gateways: Vec<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            gateways: gateways
                .into_iter()
                .map(|g| g.trim_end_matches('/').to_string())
                .collect(),
            timeout,
        }
    }

    pub fn gateways(&self) -> &[String] {
        &self.gateways
    }

    /// Returns the content and the gateway that served it.
    pub async fn fetch(&self, hash: &str) -> Option<(Vec<u8>, &str)> {
        for gateway in &self.gateways {
            let url = format!("{}/ipfs/{}", gateway, hash);
            match tokio::time::timeout(self.timeout, self.fetch_one(&url)).await {
                Ok(Ok(Some(bytes))) => return Some((bytes, gateway.as_str())),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => debug!(%gateway, error = %e, "Gateway request failed"),
                Err(_) => debug!(%gateway, "Gateway timed out"),
            }
        }
        None
    }

    /// Request and body read share one deadline, applied by the caller.
    async fn fetch_one(&self, url: &str) -> Result<Option<Vec<u8>>, reqwest::Error> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            debug!(%url, status = %resp.status(), "Gateway miss");
            return Ok(None);
        }
        Ok(Some(resp.bytes().await?.to_vec()))
    }
}
