//! JSONBin v3 client
//!
//! `GET {bin_url}/latest` reads, `PUT {bin_url}` overwrites. Both carry the
//! master key in `X-Master-Key`.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::debug;

use super::DocumentStore;
use crate::config::RemoteConfig;
use crate::error::RemoteError;
use crate::models::{LatestResponse, NinjaDocument};

/// Header carrying the access secret
const MASTER_KEY_HEADER: &str = "X-Master-Key";

/// HTTP client for a single JSONBin bin
pub struct JsonBinClient {
    client: Client,
    bin_url: String,
    master_key: String,
}

impl JsonBinClient {
    /// Create a client for the bin described by `remote`
    pub fn new(remote: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(remote.timeout)
            .user_agent(concat!("ninjabucks/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            bin_url: remote.bin_url.clone(),
            master_key: remote.master_key.clone(),
        })
    }

    /// URL of the bin
    pub fn bin_url(&self) -> &str {
        &self.bin_url
    }

    /// URL read by `fetch_latest`
    pub fn latest_url(&self) -> String {
        format!("{}/latest", self.bin_url)
    }
}

#[async_trait]
impl DocumentStore for JsonBinClient {
    async fn fetch_latest(&self) -> Result<NinjaDocument, RemoteError> {
        let url = self.latest_url();
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(MASTER_KEY_HEADER, &self.master_key)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        let latest: LatestResponse = response.json().await?;
        Ok(latest.record)
    }

    async fn overwrite(&self, document: &NinjaDocument) -> Result<(), RemoteError> {
        debug!("PUT {} ({} ninjas)", self.bin_url, document.ninjas.len());

        let response = self
            .client
            .put(&self.bin_url)
            .header(CONTENT_TYPE, "application/json")
            .header(MASTER_KEY_HEADER, &self.master_key)
            .json(document)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into `RemoteError::Status`
async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status { status, body })
}
