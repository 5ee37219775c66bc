use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::Router;
use log::info;
use tokio::sync::watch;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Config;
use crate::errors::SiteError;

/// Serve the built output tree until the shutdown signal flips.
///
/// Responses carry no-cache headers so browsers always pick up the
/// freshly rebuilt output in live mode.
pub async fn serve(config: Arc<Config>, mut shutdown: watch::Receiver<bool>) -> Result<(), SiteError> {
    let app = Router::new()
        .fallback_service(ServeDir::new(&config.output))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ));

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(|source| SiteError::Server { source })?;
    info!("live server listening at {}", config.base_url());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
        .map_err(|source| SiteError::Server { source })
}
