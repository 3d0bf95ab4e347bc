use std::future::Future;
use std::net::{SocketAddr, TcpListener};

use crate::config::Config;
use vision::{
    credentials::{EnvCredentials, CREDENTIALS_VAR},
    router,
    search::{HttpVisionClient, ProductSearch, DEFAULT_ENDPOINT, DEFAULT_USER_PROJECT},
    time::SystemTime,
    token::ServiceAccountTokenProvider,
};

/// Where requests are forwarded and on whose behalf. Fixed in production,
/// swapped out by the integration tests.
#[derive(Clone, Debug)]
pub struct Upstream {
    pub credentials_var: String,
    pub vision_endpoint: String,
    pub user_project: String,
    pub search: ProductSearch,
}

impl Default for Upstream {
    fn default() -> Self {
        Upstream {
            credentials_var: CREDENTIALS_VAR.to_string(),
            vision_endpoint: DEFAULT_ENDPOINT.to_string(),
            user_project: DEFAULT_USER_PROJECT.to_string(),
            search: ProductSearch::default(),
        }
    }
}

pub async fn serve<F>(config: Config, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    serve_upstream(config, Upstream::default(), listener, shutdown).await
}

pub async fn serve_upstream<F>(
    config: Config,
    upstream: Upstream,
    listener: TcpListener,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let static_dir = if config.static_dir.is_dir() {
        Some(config.static_dir.clone())
    } else {
        tracing::warn!(
            "static dir {:?} not found, capture page disabled",
            config.static_dir
        );
        None
    };

    let app = router::router(
        EnvCredentials::new(upstream.credentials_var),
        ServiceAccountTokenProvider::new(SystemTime {}),
        HttpVisionClient::new(upstream.vision_endpoint, upstream.user_project),
        upstream.search,
        static_dir,
    );

    // run our app with hyper
    // `axum::Server` is a re-export of `hyper::Server`
    tracing::info!("listening on {:?}", listener.local_addr()?);
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
