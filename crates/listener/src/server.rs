//! Socket binding, CORS policy and the serve loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use proxy::SyncProxy;
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use crate::routes::router;

/// Errors raised while starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("Invalid CORS origin '{origin}'")]
    InvalidOrigin { origin: String },
}

/// Where and for whom the server listens.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Browser origins allowed to call the API; `"*"` allows any.
    pub allowed_origins: Vec<String>,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

/// Builds the CORS policy for `origins`.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer, ListenerError> {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ListenerError::InvalidOrigin {
                    origin: origin.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Binds `config.listen` and serves until `shutdown` resolves.
pub async fn serve<F>(
    config: ServerConfig,
    proxy: Arc<SyncProxy>,
    shutdown: F,
) -> Result<(), ListenerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(
        proxy,
        cors_layer(&config.allowed_origins)?,
        config.max_body_bytes,
    );
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .map_err(|source| ListenerError::Bind {
            addr: config.listen,
            source,
        })?;
    let local = listener.local_addr().map_err(ListenerError::Serve)?;
    info!(addr = %local, "sync proxy listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ListenerError::Serve)?;

    info!("sync proxy stopped");
    Ok(())
}
