use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::io::AsyncRead;

use super::{AdapterFactory, ConfigItem, Entry, StorageAdapter};
use crate::error::{StorageError, StorageResult};

/// No-op adapter for unconfigured or misconfigured schemes / 空适配器
///
/// Every read reports `NotFound`, every mutation is unsupported.
pub struct NullAdapter;

#[async_trait]
impl StorageAdapter for NullAdapter {
    fn name(&self) -> &str {
        "null"
    }

    fn is_read_only(&self) -> bool {
        true
    }

    async fn read(&self, path: &str) -> StorageResult<Box<dyn AsyncRead + Unpin + Send>> {
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn write(&self, _path: &str, _data: Bytes) -> StorageResult<()> {
        Err(StorageError::Unsupported("write"))
    }

    async fn list_contents(&self, path: &str) -> StorageResult<Vec<Entry>> {
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn get_metadata(&self, path: &str) -> StorageResult<Entry> {
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn create_dir(&self, _path: &str) -> StorageResult<()> {
        Err(StorageError::Unsupported("create_dir"))
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn rename(&self, from: &str, _to: &str) -> StorageResult<()> {
        Err(StorageError::NotFound(from.to_string()))
    }
}

pub struct NullAdapterFactory;

impl AdapterFactory for NullAdapterFactory {
    fn adapter_type(&self) -> &'static str {
        "null"
    }

    fn config_items(&self) -> Vec<ConfigItem> {
        Vec::new()
    }

    fn create_adapter(&self, _config: Value) -> Result<Box<dyn StorageAdapter>> {
        Ok(Box::new(NullAdapter))
    }
}
