//! Persistence media for the indexed store

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};

/// Key/value medium holding one array per list name
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Entries of `list`; an unknown list is empty
    async fn load(&self, list: &str) -> Result<Vec<Value>>;

    /// Replace the entries of `list`
    async fn save(&self, list: &str, entries: &[Value]) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    lists: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lists(&self) -> MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.lists.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn load(&self, list: &str) -> Result<Vec<Value>> {
        Ok(self.lists().get(list).cloned().unwrap_or_default())
    }

    async fn save(&self, list: &str, entries: &[Value]) -> Result<()> {
        self.lists().insert(list.to_string(), entries.to_vec());
        Ok(())
    }
}

/// All lists in one JSON object on disk, rewritten through a temp file
#[derive(Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
    // Lists share one file, so whole-document rewrites are serialized here.
    file_lock: tokio::sync::Mutex<()>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        match fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Map::new()),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(document) => Ok(document),
                other => Err(Error::Store(format!(
                    "{} does not hold a JSON object (found {})",
                    self.path.display(),
                    type_name(&other)
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, serde_json::to_vec_pretty(document)?).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!("Wrote store document {}", self.path.display());
        Ok(())
    }
}

#[async_trait]
impl StoreBackend for JsonFileBackend {
    async fn load(&self, list: &str) -> Result<Vec<Value>> {
        let _guard = self.file_lock.lock().await;
        let document = self.read_document().await?;

        match document.get(list) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(entries)) => Ok(entries.clone()),
            Some(other) => Err(Error::Store(format!(
                "List {} is a {} instead of an array",
                list,
                type_name(other)
            ))),
        }
    }

    async fn save(&self, list: &str, entries: &[Value]) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut document = self.read_document().await?;
        document.insert(list.to_string(), Value::Array(entries.to_vec()));
        self.write_document(&document).await
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
