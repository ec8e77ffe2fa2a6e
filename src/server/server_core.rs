//! HTTP server core
//!
//! Router construction and the serve loop. All handlers share one
//! [`AppState`] holding the pipeline orchestrator.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::pipeline::PipelineOrchestrator;
use crate::server::routes;

/// State shared across handlers
pub struct AppState {
    /// The single pipeline implementation behind every transport route
    pub orchestrator: PipelineOrchestrator,
}

/// Build the router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/speak", post(routes::speak::speak))
        .route("/clone", post(routes::speak::clone_speak))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// The HTTP server
pub struct Server {
    addr: String,
    state: Arc<AppState>,
}

impl Server {
    pub fn new(addr: String, orchestrator: PipelineOrchestrator) -> Self {
        Self {
            addr,
            state: Arc::new(AppState { orchestrator }),
        }
    }

    /// Bind and serve until the process is stopped
    pub async fn run(self) -> anyhow::Result<()> {
        let router = create_router(self.state);
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!(addr = %self.addr, "listening");
        axum::serve(listener, router).await?;
        Ok(())
    }
}
