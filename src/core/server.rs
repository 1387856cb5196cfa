//! Server Implementation
//!
//! HTTP 服务器启动和优雅关闭

use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::core::{Config, ServerState};
use crate::error::{AppError, AppResult};

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (shared with tests or embedding)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> AppResult<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        // Background tasks stop on the same token the server shuts down with
        let shutdown = CancellationToken::new();
        let sweeper_handle = state.start_background_tasks(shutdown.clone());

        // 开发期允许跨域（前端独立起服务）
        let router = api::router(state).layer(CorsLayer::permissive());

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.server_port));
        tracing::info!("Rental server starting on http://{}", addr);
        tracing::info!("Environment: {}", self.config.environment);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        let shutdown_signal = {
            let shutdown = shutdown.clone();
            async move {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("Shutting down...");
                shutdown.cancel();
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        // 等待清扫器退出
        shutdown.cancel();
        if let Err(e) = sweeper_handle.await {
            tracing::error!(error = ?e, "Sweeper task join failed");
        }
        tracing::info!("Server stopped");

        Ok(())
    }
}
