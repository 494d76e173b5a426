//! Health and banner endpoints

use axum::{http::StatusCode, response::IntoResponse};

/// GET /
pub async fn root() -> &'static str {
    "This is the matterbuild server."
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
