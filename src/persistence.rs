use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Value};
use tempfile::{Builder, NamedTempFile};

use crate::config::AppConfig;
use crate::errors::FormError;
use crate::state::record::SubmissionRecord;

/// The persisted document: timestamp key to submission record.
pub type StoreDocument = Map<String, Value>;

/// Owner of the JSON document on disk.
///
/// Every write is a full read-merge-write of the document. Nothing here locks
/// the file, so exactly one writer (the datagram sink) may use a given path.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
    path: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>, file_name: &str) -> Self {
        let dir = dir.into();
        let path = dir.join(file_name);
        Self { dir, path }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.storage_dir.clone(), &cfg.data_file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document.
    ///
    /// A missing or empty file is an empty document. Anything that is not a
    /// JSON object is `CorruptStore`.
    pub fn load(&self) -> Result<StoreDocument, FormError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreDocument::new()),
            Err(e) => return Err(FormError::storage_io(&self.path, e)),
        };

        if text.is_empty() {
            return Ok(StoreDocument::new());
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(self.corrupt(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
            Err(e) => Err(self.corrupt(e.to_string())),
        }
    }

    /// Insert `record` under `timestamp` and rewrite the whole document.
    ///
    /// On a corrupt document nothing is written and the new entry is lost.
    pub fn merge_write(&self, timestamp: &str, record: &SubmissionRecord) -> Result<(), FormError> {
        fs::create_dir_all(&self.dir).map_err(|e| FormError::storage_io(&self.dir, e))?;

        let mut document = self.load()?;

        let entry: Map<String, Value> = record
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        document.insert(timestamp.to_string(), Value::Object(entry));

        self.write_document(&document)?;

        tracing::debug!(
            "Stored entry {} in {} ({} entries)",
            timestamp,
            self.path.display(),
            document.len()
        );
        Ok(())
    }

    /// Write to a temp file next to the target, then rename over it.
    fn write_document(&self, document: &StoreDocument) -> Result<(), FormError> {
        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        document
            .serialize(&mut ser)
            .map_err(|e| FormError::storage_io(&self.path, e.into()))?;

        let mut tmp = self.temp_file()?;
        tmp.write_all(&buf)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| FormError::storage_io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| FormError::storage_io(&self.path, e.error))?;

        Ok(())
    }

    /// Temp file that ends up with the document's current permissions, or
    /// the umask default when there is no document yet.
    fn temp_file(&self) -> Result<NamedTempFile, FormError> {
        let existing = fs::metadata(&self.path).ok().map(|meta| meta.permissions());

        let mut builder = Builder::new();
        #[cfg(unix)]
        if existing.is_none() {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(fs::Permissions::from_mode(0o666));
        }

        let tmp = builder
            .tempfile_in(&self.dir)
            .map_err(|e| FormError::storage_io(&self.dir, e))?;
        if let Some(permissions) = existing {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(|e| FormError::storage_io(tmp.path(), e))?;
        }
        Ok(tmp)
    }

    fn corrupt(&self, reason: String) -> FormError {
        FormError::CorruptStore {
            path: self.path.clone(),
            reason,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
