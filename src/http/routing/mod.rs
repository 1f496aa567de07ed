pub use super::routes::todos;

use axum::{routing::get, Router};

use super::types::ApiError;

/// Adds the health check, and a JSON fallback for unknown paths.
pub fn app(router: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(router)
        .fallback(|| async { ApiError::NotFound("Route not found") })
}
