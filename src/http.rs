//! Thin JSON-over-HTTP client

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;

const USER_AGENT: &str = concat!("weather-widget/", env!("CARGO_PKG_VERSION"));

/// Transport or decoding failure
#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("response was not valid JSON: {0}")]
    Parse(String),
}

/// GET/POST returning parsed JSON.
///
/// Non-success statuses are not errors: the weather API reports "not found"
/// inside a JSON body, so the body is returned as-is.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Option<Duration>) -> Result<Self, NetworkError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn get(&self, url: &str) -> Result<Value, NetworkError> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Value, NetworkError> {
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode(response: reqwest::Response) -> Result<Value, NetworkError> {
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(%status, "response body is not JSON");
            NetworkError::Parse(e.to_string())
        })
    }
}
