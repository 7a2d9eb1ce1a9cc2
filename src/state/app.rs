use std::{path::PathBuf, sync::Arc};

use crate::config::AppConfig;
use crate::services::dispatch_service::DispatchClient;

/// Shared state of the HTTP front end.
///
/// Holds no handle on the store: the only way from a request to the JSON
/// document is the datagram sent by `dispatch`.
#[derive(Clone)]
pub struct AppState {
    pub pages_dir: Arc<PathBuf>,
    pub static_root: Arc<PathBuf>,
    pub dispatch: DispatchClient,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> Self {
        Self {
            pages_dir: Arc::new(cfg.pages_dir.clone()),
            static_root: Arc::new(cfg.static_root.clone()),
            dispatch: DispatchClient::new(cfg),
        }
    }
}
