//! HTTP transport
//!
//! Binds the configured address, serves an assembled router and shuts down
//! gracefully on Ctrl+C or SIGTERM.

use crate::utils::toml_config::ServerConfig;
use axum::{Router, ServiceExt, extract::Request};
use tokio::net::TcpListener;
use tokio::signal;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// ============= Server =============

pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(ServerConfig::default())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve `router` until a shutdown signal arrives.
    pub async fn run(self, router: Router) -> std::io::Result<()> {
        let address = self.config.address();
        let router = router.layer(TraceLayer::new_for_http());

        let listener = TcpListener::bind(&address).await?;
        info!(
            address = %address,
            trim_trailing_slash = self.config.trim_trailing_slash,
            "Server listening"
        );

        if self.config.trim_trailing_slash {
            let app = trim_trailing_slash(router);
            axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        } else {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }

        info!("Server shutdown complete");
        Ok(())
    }
}

/// Wrap `router` so `/users/1/` is routed as `/users/1`.
///
/// Must wrap the router from outside; a layer added with `Router::layer`
/// runs after routing and cannot change the matched path.
pub fn trim_trailing_slash(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

// ============= Shutdown Signal =============

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
