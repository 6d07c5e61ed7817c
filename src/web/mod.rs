//! Web shell: the browser UI over the analysis pipeline.
//!
//! ```text
//! GET  /               page (upload form, report, print mode)
//! POST /upload         multipart `file` → extract text into the session
//! POST /analyze        send the session text to the model
//! POST /classification form `classification`
//! POST /print          arm print mode for the next render
//! GET  /report.json    current record
//! GET  /health
//! ```
//!
//! State is per browser session ([`crate::session`]), identified by a cookie.

pub mod error;
pub mod handlers;
pub mod render;

use crate::config::{AnalysisConfig, ServerConfig};
use crate::error::DetectaError;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::llm::{self, CompletionBackend};
use crate::session::SessionStore;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use render::PageRenderer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared application state.
pub struct AppState {
    pub config: AnalysisConfig,
    /// The model backend, or the startup message explaining why analysis is
    /// unavailable.
    pub backend: Result<Arc<dyn CompletionBackend>, String>,
    pub extractor: Arc<dyn TextExtractor>,
    pub sessions: SessionStore,
    pub pages: PageRenderer,
}

impl AppState {
    /// Build the state, resolving the model backend once.
    ///
    /// A missing credential does not stop the server: it is logged, shown on
    /// every page, and the analyze action is disabled.
    pub fn new(config: AnalysisConfig, extractor: Arc<dyn TextExtractor>) -> Result<Self, DetectaError> {
        let backend = llm::resolve_backend(&config).map_err(|e| {
            error!("AI analysis disabled: {}", e);
            format!("Error: {e}")
        });
        Ok(Self {
            config,
            backend,
            extractor,
            sessions: SessionStore::default(),
            pages: PageRenderer::new()?,
        })
    }

    pub fn startup_error(&self) -> Option<&str> {
        self.backend.as_ref().err().map(String::as_str)
    }
}

/// Build the router.
pub fn router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/analyze", post(handlers::analyze))
        .route("/classification", post(handlers::set_classification))
        .route("/print", post(handlers::print))
        .route("/report.json", get(handlers::report_json))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Listen on `server.bind` until the process is stopped.
pub async fn serve(state: Arc<AppState>, server: &ServerConfig) -> Result<(), DetectaError> {
    let app = router(state, server);

    let listener = tokio::net::TcpListener::bind(server.bind)
        .await
        .map_err(|e| DetectaError::Internal(format!("cannot bind {}: {e}", server.bind)))?;
    info!("DetectaBias listening on http://{}", server.bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| DetectaError::Internal(format!("server error: {e}")))
}
