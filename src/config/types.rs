use crate::graphql::DEFAULT_API_URL;
use crate::subscription::DEFAULT_SUBSCRIPTION_URL;
use crate::target::{ServiceSelector, Target};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub railway: RailwayConfig,
    /// Global filters, applied before any sink sees a record.
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub webhook: Option<WebhookConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RailwayConfig {
    pub api_key: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub environment_id: String,
    /// Pinned service IDs. Empty means discover them from the project.
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_subscription_url")]
    pub subscription_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_subscription_url() -> String {
    DEFAULT_SUBSCRIPTION_URL.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub levels: Vec<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Batches buffered between the supervisor and the sinks.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_report_status_every", with = "humantime_serde")]
    pub report_status_every: Duration,
    /// Timeout for GraphQL queries and sink deliveries.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

fn default_channel_capacity() -> usize {
    100
}

fn default_report_status_every() -> Duration {
    Duration::from_secs(10)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            report_status_every: default_report_status_every(),
            request_timeout: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub filters: FilterConfig,
}

impl Config {
    /// The target selector for this run. Assumes the config was validated.
    pub fn target(&self) -> Target {
        let services = if self.railway.services.is_empty() {
            ServiceSelector::Discover
        } else {
            ServiceSelector::Pinned(self.railway.services.clone())
        };

        Target {
            environment_id: self.railway.environment_id.clone(),
            project_id: self.railway.project_id.clone(),
            services,
        }
    }
}
