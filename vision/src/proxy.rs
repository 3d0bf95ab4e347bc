use axum::extract::State;
use axum::Json;
use bytes::Bytes;
use serde_json::Value;

use crate::{
    api::{VisionError, VisionRequest},
    router,
    search::AnnotateRequest,
};

/// POST /api/vision
///
/// Takes `{"image": "<base64>"}`, authenticates as the configured service
/// account and forwards a product search to the Vision API. Vendor errors are
/// relayed with their status and body, vendor successes are returned as-is.
pub async fn vision(state: State<router::State>, body: Bytes) -> Result<Json<Value>, VisionError> {
    tracing::debug!(len = body.len(), "new vision request");

    let request = VisionRequest::from_slice(&body).map_err(|e| {
        tracing::error!("failed to decode request: {}", e);
        e
    })?;

    let image = match request.image() {
        Some(image) => image,
        None => {
            tracing::warn!("request without image");
            return Err(VisionError::MissingImage);
        }
    };
    tracing::debug!(image_len = image.len(), "decoded request");

    let key = state.credentials.load().map_err(|e| {
        tracing::error!("failed to load credentials: {}", e);
        e
    })?;

    let token = state.tokens.access_token(&key).await.map_err(|e| {
        tracing::error!("failed to obtain access token: {}", e);
        e
    })?;

    let payload = AnnotateRequest::product_search(image, &state.search);
    let response = state.vision.annotate(&token.token, &payload).await?;

    if !response.is_success() {
        tracing::warn!(status = response.status, "vision api returned an error");
        return Err(VisionError::Upstream {
            status: response.status,
            body: response.body,
        });
    }

    let result: Value = serde_json::from_str(&response.body).map_err(|e| {
        tracing::error!("vision api returned invalid json: {}", e);
        VisionError::UpstreamDecoding(e.to_string())
    })?;

    tracing::info!("vision request completed");
    Ok(Json(result))
}
