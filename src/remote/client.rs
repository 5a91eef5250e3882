use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::error::RemoteError;
use crate::config::RemoteConfig;

#[derive(Debug, Serialize, Deserialize)]
struct CountBody {
    value: i64,
}

/// Thin client over `GET/PUT /count/{id}`.
///
/// Never touches a store: callers apply the returned value themselves.
/// There is no retry and no idempotency key, so a retried `increase` may
/// count twice.
#[derive(Debug, Clone)]
pub struct CountClient {
    client: Client,
    base_url: String,
}

impl CountClient {
    /// Build a client without a request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        Self::build(base_url.into(), None)
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        Self::build(
            config.base_url.clone(),
            config.timeout_seconds.map(Duration::from_secs),
        )
    }

    fn build(base_url: String, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RemoteError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Read the counter.
    pub async fn get(&self, id: &str) -> Result<i64, RemoteError> {
        validate_id(id)?;
        let url = self.endpoint(id);
        tracing::debug!(url = %url, "GET counter");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| RemoteError::Network {
                url: url.clone(),
                source,
            })?;

        Self::decode(id, &url, response).await
    }

    /// Store `current + 1` and return what the server echoes back.
    pub async fn increase(&self, id: &str, current: i64) -> Result<i64, RemoteError> {
        validate_id(id)?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| RemoteError::Validation(format!("counter {} cannot increase", current)))?;
        self.put(id, next).await
    }

    /// Store 0 and return what the server echoes back.
    pub async fn reset(&self, id: &str) -> Result<i64, RemoteError> {
        validate_id(id)?;
        self.put(id, 0).await
    }

    async fn put(&self, id: &str, value: i64) -> Result<i64, RemoteError> {
        let url = self.endpoint(id);
        tracing::debug!(url = %url, value = value, "PUT counter");

        let response = self
            .client
            .put(&url)
            .json(&CountBody { value })
            .send()
            .await
            .map_err(|source| RemoteError::Network {
                url: url.clone(),
                source,
            })?;

        Self::decode(id, &url, response).await
    }

    async fn decode(id: &str, url: &str, response: reqwest::Response) -> Result<i64, RemoteError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound { id: id.to_string() });
        }
        if !status.is_success() {
            let message = match response.text().await {
                Ok(text) => text,
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "Failed to read error body");
                    String::new()
                }
            };
            tracing::warn!(url = %url, status = status.as_u16(), "Counter API error");
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: CountBody = response.json().await.map_err(|source| RemoteError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok(body.value)
    }

    fn endpoint(&self, id: &str) -> String {
        format!("{}/count/{}", self.base_url, id)
    }
}

/// Counter ids go straight into the URL path, so keep them URL-safe.
pub fn validate_id(id: &str) -> Result<(), RemoteError> {
    if id.is_empty() {
        return Err(RemoteError::Validation("counter id is empty".to_string()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RemoteError::Validation(format!(
            "counter id '{}' may only contain ASCII letters, digits, '-' and '_'",
            id
        )));
    }
    Ok(())
}
