use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::state::app::AppState;

/// Where the browser is sent after a submission.
pub const REDIRECT_TARGET: &str = "index.html";

//
// ─────────────────────────────────────────────────────────────
// POST /<any path>
// Hand the raw body to the sink and redirect right away
// ─────────────────────────────────────────────────────────────
//
// The redirect does not mean the submission was stored: the datagram may be
// lost, or the sink may reject the body. The browser is never told.
pub async fn submit(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let expected = match content_length(&headers) {
        Ok(n) => n,
        Err(rejection) => return rejection.into_response(),
    };

    if body.len() != expected {
        return (
            StatusCode::BAD_REQUEST,
            format!("Content-Length is {expected} but body has {} bytes", body.len()),
        )
            .into_response();
    }

    state.dispatch.send(&body).await;

    (StatusCode::FOUND, [(header::LOCATION, REDIRECT_TARGET)]).into_response()
}

fn content_length(headers: &HeaderMap) -> Result<usize, (StatusCode, &'static str)> {
    let value = headers
        .get(header::CONTENT_LENGTH)
        .ok_or((StatusCode::LENGTH_REQUIRED, "Content-Length required"))?;

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .ok_or((StatusCode::BAD_REQUEST, "Invalid Content-Length"))
}
