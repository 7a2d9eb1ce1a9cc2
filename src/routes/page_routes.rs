use std::path::Path;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::errors::FormError;
use crate::routes::form_routes;
use crate::services::static_service;
use crate::state::app::AppState;

pub const INDEX_PAGE: &str = "index.html";
pub const MESSAGE_PAGE: &str = "message.html";
pub const ERROR_PAGE: &str = "error.html";

/// `/` and `/message`. POST on either is a submission like anywhere else.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(index)
                .post(form_routes::submit)
                .fallback(not_implemented),
        )
        .route(
            "/message",
            get(message)
                .post(form_routes::submit)
                .fallback(not_implemented),
        )
}

//
// ─────────────────────────────────────────────────────────────
// GET /
// ─────────────────────────────────────────────────────────────
//
async fn index(State(state): State<AppState>) -> Result<Response, FormError> {
    send_html(&state.pages_dir, INDEX_PAGE, StatusCode::OK).await
}

//
// ─────────────────────────────────────────────────────────────
// GET /message
// ─────────────────────────────────────────────────────────────
//
async fn message(State(state): State<AppState>) -> Result<Response, FormError> {
    send_html(&state.pages_dir, MESSAGE_PAGE, StatusCode::OK).await
}

//
// ─────────────────────────────────────────────────────────────
// Every other path
// GET serves a static file or error.html with 404, POST submits
// ─────────────────────────────────────────────────────────────
//
pub async fn fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match method {
        Method::GET | Method::HEAD => serve_static(&state, uri.path())
            .await
            .unwrap_or_else(|e| e.into_response()),
        Method::POST => form_routes::submit(State(state), headers, body).await,
        _ => not_implemented().await.into_response(),
    }
}

async fn serve_static(state: &AppState, path: &str) -> Result<Response, FormError> {
    match static_service::resolve(&state.static_root, path).await {
        Ok(file) => Ok((
            StatusCode::OK,
            [(header::CONTENT_TYPE, file.content_type)],
            file.bytes,
        )
            .into_response()),
        Err(FormError::NotFound(_)) => {
            tracing::debug!("No static file for {}", path);
            send_html(&state.pages_dir, ERROR_PAGE, StatusCode::NOT_FOUND).await
        }
        Err(e) => Err(e),
    }
}

async fn send_html(pages_dir: &Path, name: &str, status: StatusCode) -> Result<Response, FormError> {
    let body = static_service::page(pages_dir, name).await?;
    Ok((status, [(header::CONTENT_TYPE, "text/html")], body).into_response())
}

async fn not_implemented() -> (StatusCode, &'static str) {
    (StatusCode::NOT_IMPLEMENTED, "Unsupported method")
}
