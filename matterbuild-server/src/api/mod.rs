//! API Module
//!
//! HTTP surface of the server: the slash command webhook plus health checks.

pub mod health;
pub mod slash;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::service::Dispatcher;

/// Create the router with all endpoints
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/slash_command", post(slash::slash_command))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}
