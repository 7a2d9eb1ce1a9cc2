use std::path::{Component, Path};

use tokio::fs;

use crate::errors::FormError;

/// Bytes and best-effort content type of a resolved static file.
#[derive(Debug)]
pub struct StaticFile {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Resolve a request path (leading `/` included) against `root`.
///
/// Only plain relative paths to regular files resolve; `..`, absolute paths
/// and directories are `NotFound` like any missing file.
pub async fn resolve(root: &Path, request_path: &str) -> Result<StaticFile, FormError> {
    let relative = Path::new(request_path.strip_prefix('/').unwrap_or(request_path));
    let not_found = || FormError::NotFound(request_path.to_string());

    let plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if relative.as_os_str().is_empty() || !plain {
        return Err(not_found());
    }

    let file = root.join(relative);
    match fs::metadata(&file).await {
        Ok(meta) if meta.is_file() => {}
        _ => return Err(not_found()),
    }

    let bytes = fs::read(&file)
        .await
        .map_err(|e| FormError::storage_io(&file, e))?;
    let content_type = mime_guess::from_path(&file)
        .first_raw()
        .unwrap_or("text/plain")
        .to_string();

    Ok(StaticFile {
        bytes,
        content_type,
    })
}

/// Read one of the HTML pages (`index.html`, `message.html`, `error.html`).
pub async fn page(pages_dir: &Path, name: &str) -> Result<Vec<u8>, FormError> {
    let path = pages_dir.join(name);
    fs::read(&path)
        .await
        .map_err(|e| FormError::storage_io(&path, e))
}
