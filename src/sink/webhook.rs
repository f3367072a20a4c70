use super::{Sink, SinkError};
use crate::config::types::WebhookConfig;
use crate::pipeline::LogFilters;
use crate::record::LogRecord;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

/// Generic HTTP ingest: POSTs each batch as a JSON array.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    url: String,
    headers: HeaderMap,
    filters: LogFilters,
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(config: &WebhookConfig, timeout: Duration) -> Result<Self, SinkError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| SinkError::Header(format!("{key}: {e}")))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| SinkError::Header(format!("{key}: {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: config.url.clone(),
            headers,
            filters: LogFilters::from(&config.filters),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
impl Sink for WebhookSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn filters(&self) -> &LogFilters {
        &self.filters
    }

    async fn deliver(&self, records: &[LogRecord]) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(records)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}
