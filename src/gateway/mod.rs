//! Gateway module - HTTP surface for the agent
//!
//! ```text
//!   GET  /            embedded chat page
//!   GET  /health      liveness probe
//!   POST /api/chat    {"message"} -> {"response"}
//! ```

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{ChatRequest, ChatResponse};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::agent::AgentLoop;
use crate::config::Config;

/// State shared by all handlers.
///
/// The agent is built once at startup. When that fails the server still
/// runs, and chat requests report the recorded reason.
#[derive(Clone)]
pub struct AppState {
    agent: Option<Arc<AgentLoop>>,
    unavailable_reason: Option<String>,
}

impl AppState {
    /// State with a ready agent
    pub fn new(agent: Arc<AgentLoop>) -> Self {
        Self {
            agent: Some(agent),
            unavailable_reason: None,
        }
    }

    /// State for a server whose agent could not be built
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            agent: None,
            unavailable_reason: Some(reason.into()),
        }
    }

    /// Build the agent from configuration, recording any failure
    pub fn from_config(config: &Config) -> Self {
        match AgentLoop::from_config(config) {
            Ok(agent) => Self::new(Arc::new(agent)),
            Err(e) => {
                error!("Agent initialization failed: {}", e);
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.agent.is_some()
    }

    fn agent(&self) -> Result<&Arc<AgentLoop>, ApiError> {
        self.agent.as_ref().ok_or_else(|| {
            ApiError::Unavailable(
                self.unavailable_reason
                    .clone()
                    .unwrap_or_else(|| "agent not initialized".to_string()),
            )
        })
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let api = Router::new().route("/chat", post(handlers::chat));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
