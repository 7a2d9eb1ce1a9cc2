use std::{io, path::PathBuf};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Malformed form body: {0}")]
    Parse(String),

    #[error("Corrupt store document {path}: {reason}")]
    CorruptStore { path: PathBuf, reason: String },

    #[error("Storage I/O on {path}: {source}")]
    StorageIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl FormError {
    pub fn storage_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FormError::StorageIo {
            path: path.into(),
            source,
        }
    }
}

impl IntoResponse for FormError {
    fn into_response(self) -> Response {
        let status = match self {
            FormError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!("Request failed: {self}");
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}
