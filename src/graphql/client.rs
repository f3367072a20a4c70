use super::queries::{
    Environment, EnvironmentData, Project, ProjectData, ENVIRONMENT_QUERY, PROJECT_QUERY,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://backboard.railway.app/graphql/v2";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API returned error status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("response carried no data")]
    MissingData,
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Read-only queries against the platform's GraphQL API.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Look up an environment, mainly to learn its owning project.
    async fn environment(&self, id: &str) -> Result<Environment>;

    /// Fetch a project with its environments and services.
    async fn project(&self, id: &str) -> Result<Project>;
}

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorMessage {
    message: String,
}

/// HTTP client for the platform API
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    url: String,
    token: String,
    client: reqwest::Client,
}

impl GraphQlClient {
    pub fn new(url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.into(),
            token: token.into(),
            client,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T> {
        let request = GraphQlRequest { query, variables };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.bytes().await?;
        decode_response(&body)
    }
}

fn decode_response<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let response: GraphQlResponse<T> = serde_json::from_slice(body)?;

    if !response.errors.is_empty() {
        return Err(ApiError::GraphQl(
            response.errors.into_iter().map(|e| e.message).collect(),
        ));
    }

    response.data.ok_or(ApiError::MissingData)
}

#[async_trait]
impl PlatformApi for GraphQlClient {
    async fn environment(&self, id: &str) -> Result<Environment> {
        let data: EnvironmentData = self
            .execute(ENVIRONMENT_QUERY, serde_json::json!({ "id": id }))
            .await?;
        Ok(data.environment)
    }

    async fn project(&self, id: &str) -> Result<Project> {
        let data: ProjectData = self
            .execute(PROJECT_QUERY, serde_json::json!({ "id": id }))
            .await?;
        Ok(data.project)
    }
}
