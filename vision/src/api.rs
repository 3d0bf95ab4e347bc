use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// Define the API interface for the vision proxy here.
// This is used for serializing responses and deserializing requests

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VisionRequest {
    #[serde(default)]
    pub image: Option<String>,
}

impl VisionRequest {
    /// Parse a request body. Only a body that is not JSON at all is an error;
    /// any shape of `image` that is not a non-empty string counts as missing.
    pub fn from_slice(body: &[u8]) -> Result<VisionRequest, VisionError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| VisionError::RequestDecodingError(e.to_string()))?;

        if value.is_null() {
            return Err(VisionError::RequestDecodingError(String::from(
                "request body is null",
            )));
        }

        let image = match value.get("image") {
            Some(Value::String(image)) => Some(image.clone()),
            _ => None,
        };

        Ok(VisionRequest { image })
    }

    /// The base64 image payload, if the client sent a usable one.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|image| !image.is_empty())
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("failed to decode request: {0}")]
    RequestDecodingError(String),
    #[error("No image provided")]
    MissingImage,

    #[error("{0} not set")]
    MissingCredential(String),
    #[error("invalid service account key: {0}")]
    InvalidCredential(String),
    #[error("Failed to retrieve access token: {0}")]
    TokenError(String),

    #[error("vision api returned status {status}")]
    Upstream { status: u16, body: String },
    #[error("vision api request failed: {0}")]
    UpstreamTransport(String),
    #[error("invalid vision api response: {0}")]
    UpstreamDecoding(String),
}

impl VisionError {
    pub fn status(&self) -> StatusCode {
        match self {
            VisionError::MissingImage => StatusCode::BAD_REQUEST,

            VisionError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }

            VisionError::RequestDecodingError(_)
            | VisionError::MissingCredential(_)
            | VisionError::InvalidCredential(_)
            | VisionError::TokenError(_)
            | VisionError::UpstreamTransport(_)
            | VisionError::UpstreamDecoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for VisionError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match self {
            // Upstream bodies are relayed untouched
            VisionError::Upstream { body, .. } => body,
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
