use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::{
    credentials::CredentialSource, proxy, search::ProductSearch, search::VisionClient,
    token::TokenProvider,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct State {
    pub credentials: Arc<dyn CredentialSource + Send + Sync>,
    pub tokens: Arc<dyn TokenProvider + Send + Sync>,
    pub vision: Arc<dyn VisionClient + Send + Sync>,
    pub search: Arc<ProductSearch>,
}

async fn index() -> &'static str {
    "vision"
}

pub fn router<
    C: CredentialSource + Send + Sync + 'static,
    T: TokenProvider + Send + Sync + 'static,
    V: VisionClient + Send + Sync + 'static,
>(
    credentials: C,
    tokens: T,
    vision: V,
    search: ProductSearch,
    static_dir: Option<PathBuf>,
) -> Router {
    let state = State {
        credentials: Arc::new(credentials),
        tokens: Arc::new(tokens),
        vision: Arc::new(vision),
        search: Arc::new(search),
    };

    let router = Router::new()
        .route("/", get(index))
        .route("/api/vision", post(proxy::vision))
        .route("/api/vision/", post(proxy::vision));

    // The capture page and its wasm bundle, when built
    let router = match static_dir {
        Some(dir) => router.nest_service("/camera-capture", ServeDir::new(dir)),
        None => router,
    };

    // Layers run bottom up: the id is assigned before the trace span opens,
    // so every line logged for a request carries its request_id.
    router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
