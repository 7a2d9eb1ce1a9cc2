use serde::Deserialize;
use std::{
    fs,
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use crate::errors::FormError;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP front end listens on.
    pub http_addr: SocketAddr,

    /// Address the datagram sink binds, and where the dispatch client sends.
    pub sink_addr: SocketAddr,

    /// Receive buffer of the sink. Larger datagrams are truncated to this size.
    pub recv_buffer_size: usize,

    /// Directory holding the JSON document. Created on first write.
    pub storage_dir: PathBuf,

    /// File name of the JSON document inside `storage_dir`.
    pub data_file: String,

    /// Directory with `index.html`, `message.html` and `error.html`.
    pub pages_dir: PathBuf,

    /// Root that static GET paths are resolved against.
    pub static_root: PathBuf,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
            sink_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            recv_buffer_size: 1024,
            storage_dir: PathBuf::from("storage"),
            data_file: "data.json".to_string(),
            pages_dir: PathBuf::from("."),
            static_root: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, FormError> {
        let file = fs::read_to_string(path).map_err(|e| FormError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_json(&file).map_err(|reason| FormError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn from_json(text: &str) -> Result<Self, String> {
        let cfg = serde_json::from_str::<AppConfig>(text).map_err(|e| e.to_string())?;
        if cfg.recv_buffer_size == 0 {
            return Err("recv_buffer_size must be greater than zero".to_string());
        }
        Ok(cfg)
    }
}
