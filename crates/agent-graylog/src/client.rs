//! HTTP access to the Graylog REST API.
//!
//! One authenticated GET per call, no retries. The [`Fetch`] trait is the
//! seam between the runner and the network so the pipeline can be driven
//! without a Graylog server.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::config::{AgentConfig, Credentials};
use crate::error::FetchError;

/// Source of JSON documents addressed by API path.
#[async_trait]
pub trait Fetch {
    /// GET `path` (relative to the `/api` base) and decode the JSON body.
    async fn fetch(&self, path: &str) -> Result<Value, FetchError>;
}

/// reqwest-backed client for one Graylog instance.
#[derive(Clone)]
pub struct GraylogClient {
    client: reqwest::Client,
    api_base: String,
    credentials: Credentials,
}

impl GraylogClient {
    pub fn new(config: &AgentConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("agent_graylog/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FetchError::Transport {
            url: config.api_base.clone(),
            source: e,
        })?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            credentials: config.credentials.clone(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl Fetch for GraylogClient {
    async fn fetch(&self, path: &str) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.api_base, path);
        tracing::debug!("GET {url}");

        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json");
        if let Some(user) = &self.credentials.user {
            request = request.basic_auth(user, self.credentials.password.as_deref());
        }

        let response = request.send().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;
        tracing::debug!("{url}: HTTP {} ({} bytes)", status.as_u16(), body.len());

        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}
