//! HTTP API server for voxloop

pub mod health;
pub mod history;
pub mod voice;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::{Config, DEFAULT_MAX_UPLOAD_BYTES};
use crate::pipeline::TurnPipeline;

/// Models behind each stage, reported by `/api/status`
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ModelInfo {
    pub stt: String,
    pub llm: String,
    pub tts: String,
}

impl ModelInfo {
    /// Collect model identifiers from configuration
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            stt: config.voice.stt_model.clone(),
            llm: config.llm.model.clone(),
            tts: config.voice.tts_model.clone(),
        }
    }
}

/// Shared state for API handlers
pub struct ApiState {
    pub pipeline: TurnPipeline,
    pub models: ModelInfo,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    pipeline: TurnPipeline,
    host: String,
    port: u16,
    max_upload_bytes: usize,
    models: ModelInfo,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(pipeline: TurnPipeline) -> Self {
        Self {
            pipeline,
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            models: ModelInfo::default(),
        }
    }

    /// Apply server settings and model info from configuration
    #[must_use]
    pub fn config(mut self, config: &Config) -> Self {
        self.host.clone_from(&config.server.host);
        self.port = config.server.port;
        self.max_upload_bytes = config.server.max_upload_bytes;
        self.models = ModelInfo::from_config(config);
        self
    }

    /// Set the bind address
    #[must_use]
    pub fn bind(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Set the maximum request body size
    #[must_use]
    pub const fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        ApiServer {
            state: Arc::new(ApiState {
                pipeline: self.pipeline,
                models: self.models,
            }),
            host: self.host,
            port: self.port,
            max_upload_bytes: self.max_upload_bytes,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
    max_upload_bytes: usize,
}

impl ApiServer {
    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .merge(voice::turn_router(self.state.clone()))
            .nest("/api/voice", voice::router(self.state.clone()))
            .merge(history::router(self.state.clone()))
            .merge(health::router())
            .merge(health::status_router(self.state.clone()))
            .layer(DefaultBodyLimit::max(self.max_upload_bytes));

        // Browser frontends upload from other origins
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server on {addr}: {e}")))?;

        tracing::info!(
            addr = %addr,
            max_messages = self.state.pipeline.history().max_messages(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
