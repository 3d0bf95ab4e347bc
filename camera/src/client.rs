use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("There is no captured image.")]
    NothingCaptured,
    #[error("Server error: {body}")]
    Server { status: u16, body: String },
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Invalid server response: {0}")]
    Decode(String),
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    image: &'a str,
}

/// Where captured images go. One call per user action, no retries.
#[async_trait(?Send)]
pub trait ProxyClient {
    async fn submit(&self, image_base64: &str) -> Result<Value, SubmitError>;
}

/// Posts `{"image": "<base64>"}` as JSON to the proxy endpoint.
pub struct HttpProxyClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProxyClient {
    /// `endpoint` must be absolute; browsers resolve it against the page origin
    /// before it gets here.
    pub fn new(endpoint: impl Into<String>) -> HttpProxyClient {
        HttpProxyClient {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl ProxyClient for HttpProxyClient {
    async fn submit(&self, image_base64: &str) -> Result<Value, SubmitError> {
        tracing::debug!(endpoint = %self.endpoint, len = image_base64.len(), "submitting image");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&SubmitBody {
                image: image_base64,
            })
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| SubmitError::Transport(e.to_string()))?;
            tracing::error!(status = status.as_u16(), "server error: {}", body);

            return Err(SubmitError::Server {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| SubmitError::Decode(e.to_string()))
    }
}
