use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::types::LookupResponse;
use crate::error::Result;

/// One round trip to the IMEI lookup service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupTransport: Send + Sync {
    async fn fetch(&self, imei: &str, api_key: &str) -> Result<LookupResponse>;
}

/// reqwest-backed transport for `GET {api_url}?API_KEY=..&imei=..`
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_url: String,
}

impl HttpTransport {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }
}

#[async_trait]
impl LookupTransport for HttpTransport {
    async fn fetch(&self, imei: &str, api_key: &str) -> Result<LookupResponse> {
        debug!("GET {} for IMEI {}", self.api_url, imei);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[("API_KEY", api_key), ("imei", imei)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<LookupResponse>().await?)
    }
}
