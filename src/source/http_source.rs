use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::source::{HistorySource, SourceError};

const HISTORY_PATH: &str = "/get-history-by-date";
const RESET_PATH: &str = "/reset-history";

/// The fraud-detection backend reached over HTTP.
pub struct HttpHistorySource {
    base_url: String,
    client: reqwest::Client
}

impl HttpHistorySource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn fetch_history(&self, credential: &str) -> Result<Value, SourceError> {
        let response = self.client
            .get(self.url(HISTORY_PATH))
            .bearer_auth(credential)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(SourceError::Unauthorized),
            status if !status.is_success() => Err(SourceError::Status(status.as_u16())),
            _ => {
                let body = response.text().await?;
                debug!("Fetched {} bytes of history from {}", body.len(), self.base_url);
                Ok(serde_json::from_str(&body)?)
            }
        }
    }

    async fn clear_history(&self) -> Result<(), SourceError> {
        let response = self.client
            .post(self.url(RESET_PATH))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(SourceError::Unauthorized),
            status if !status.is_success() => Err(SourceError::Status(status.as_u16())),
            _ => Ok(())
        }
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
