use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::StorageResult;

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            item_type: item_type.to_string(),
            default: None,
            required: false,
            help: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }
}

/// Kind of a storage entry / 条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// File entry information / 文件条目信息
///
/// `path` is adapter-relative, `timestamp` is seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Entry {
    pub fn file(path: impl Into<String>, size: u64, timestamp: Option<i64>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size: Some(size),
            timestamp,
        }
    }

    pub fn dir(path: impl Into<String>, timestamp: Option<i64>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
            size: None,
            timestamp,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Storage adapter interface (provides only primitive operations) / 存储适配器接口
///
/// Paths are already stripped of the scheme and of leading/trailing separators.
/// The empty path is the adapter root.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Adapter name / 适配器名称
    fn name(&self) -> &str;

    /// Whether write operations are refused / 是否只读
    fn is_read_only(&self) -> bool {
        false
    }

    /// Open a reader over the whole object / 打开读取器
    async fn read(&self, path: &str) -> StorageResult<Box<dyn AsyncRead + Unpin + Send>>;

    /// Put complete object data, creating or replacing it / 上传完整文件
    async fn write(&self, path: &str, data: Bytes) -> StorageResult<()>;

    /// List the immediate children of a directory / 列出目录内容
    async fn list_contents(&self, path: &str) -> StorageResult<Vec<Entry>>;

    async fn get_metadata(&self, path: &str) -> StorageResult<Entry>;

    async fn create_dir(&self, path: &str) -> StorageResult<()>;

    async fn delete_dir(&self, path: &str) -> StorageResult<()>;

    /// Delete a file / 删除文件
    async fn delete(&self, path: &str) -> StorageResult<()>;

    async fn rename(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Get local filesystem path (only disk-backed adapters support it) / 获取本地路径
    fn local_path(&self, path: &str) -> Option<std::path::PathBuf> {
        let _ = path;
        None
    }
}

pub mod null;
pub mod registry;

pub use null::{NullAdapter, NullAdapterFactory};
pub use registry::{AdapterBox, AdapterFactory, AdapterRegistry};
