use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::routes::page_routes;
use crate::state::app::AppState;

/// Build the complete Axum application:
/// - GET  /          (index.html)
/// - GET  /message   (message.html)
/// - GET  /<path>    (static file, or error.html with 404)
/// - POST /<path>    (form submission, 302 to index.html)
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(page_routes::routes())
        .fallback(page_routes::fallback)
        .with_state(state)
        // Logging middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
