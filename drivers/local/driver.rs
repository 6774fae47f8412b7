use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncRead;

use crate::error::{StorageError, StorageResult};
use crate::storage::{Entry, StorageAdapter};
use crate::uri;

pub struct LocalAdapter {
    root: PathBuf,
}

impl LocalAdapter {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Normalize path to prevent directory traversal attacks / 规范化路径
    fn normalize_path(&self, path: &str) -> StorageResult<PathBuf> {
        let path = path.replace('\\', "/");

        let normalized: Vec<&str> = path.split('/').filter(|s| !s.is_empty() && *s != ".").collect();
        if normalized.iter().any(|component| *component == "..") {
            return Err(StorageError::InvalidPath(path));
        }

        Ok(self.root.join(normalized.join("/")))
    }
}

/// Seconds since the epoch of a file's modification time / 修改时间戳
fn modified_timestamp(metadata: &std::fs::Metadata) -> Option<i64> {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
}

fn to_entry(path: String, metadata: &std::fs::Metadata) -> Entry {
    if metadata.is_dir() {
        Entry::dir(path, modified_timestamp(metadata))
    } else {
        Entry::file(path, metadata.len(), modified_timestamp(metadata))
    }
}

async fn ensure_parent(full_path: &Path) -> StorageResult<()> {
    if let Some(parent) = full_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[async_trait]
impl StorageAdapter for LocalAdapter {
    fn name(&self) -> &str {
        "local"
    }

    async fn read(&self, path: &str) -> StorageResult<Box<dyn AsyncRead + Unpin + Send>> {
        let full_path = self.normalize_path(path)?;
        if full_path.is_dir() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let file = tokio::fs::File::open(full_path).await?;
        Ok(Box::new(file))
    }

    async fn write(&self, path: &str, data: Bytes) -> StorageResult<()> {
        let full_path = self.normalize_path(path)?;
        ensure_parent(&full_path).await?;
        tokio::fs::write(&full_path, &data).await?;
        tracing::debug!("Local write: {:?} ({} bytes)", full_path, data.len());
        Ok(())
    }

    async fn list_contents(&self, path: &str) -> StorageResult<Vec<Entry>> {
        let full_path = self.normalize_path(path)?;
        let mut entries = tokio::fs::read_dir(full_path).await?;
        let mut result = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            let name = entry.file_name().to_string_lossy().to_string();
            result.push(to_entry(uri::join(path, &name), &metadata));
        }

        // read_dir order is platform dependent / 按路径排序
        result.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }

    async fn get_metadata(&self, path: &str) -> StorageResult<Entry> {
        let full_path = self.normalize_path(path)?;
        let metadata = tokio::fs::metadata(&full_path).await?;
        Ok(to_entry(path.to_string(), &metadata))
    }

    async fn create_dir(&self, path: &str) -> StorageResult<()> {
        let full_path = self.normalize_path(path)?;
        tokio::fs::create_dir_all(full_path).await?;
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        let full_path = self.normalize_path(path)?;
        if full_path == self.root {
            return Err(StorageError::Unsupported("delete root directory"));
        }
        tokio::fs::remove_dir_all(full_path).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let full_path = self.normalize_path(path)?;
        if full_path.is_dir() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        tokio::fs::remove_file(full_path).await?;
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> StorageResult<()> {
        let old_full = self.normalize_path(from)?;
        let new_full = self.normalize_path(to)?;

        // Ensure target directory exists / 确保目标目录存在
        ensure_parent(&new_full).await?;

        tokio::fs::rename(old_full, new_full).await?;
        Ok(())
    }

    fn local_path(&self, path: &str) -> Option<PathBuf> {
        self.normalize_path(path).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_write_read_list() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path().to_path_buf());

        adapter.write("a/b.txt", Bytes::from_static(b"hello")).await.unwrap();
        adapter.write("a/c.txt", Bytes::from_static(b"hi")).await.unwrap();

        let mut reader = adapter.read("a/b.txt").await.unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, b"hello");

        let entries = adapter.list_contents("a").await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/b.txt", "a/c.txt"]);

        let root = adapter.list_contents("").await.unwrap();
        assert_eq!(root.len(), 1);
        assert!(root[0].is_dir());
        assert_eq!(root[0].path, "a");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path().to_path_buf());

        assert!(adapter.read("nope.txt").await.err().unwrap().is_not_found());
        assert!(adapter.get_metadata("nope.txt").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path().to_path_buf());

        let err = adapter.get_metadata("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
        assert!(err.is_expected());
        assert!(matches!(
            adapter.delete("a/../../x").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(adapter.local_path("../x").is_none());
    }

    #[tokio::test]
    async fn test_rename_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path().to_path_buf());

        adapter.write("x.txt", Bytes::from_static(b"1")).await.unwrap();
        adapter.rename("x.txt", "sub/y.txt").await.unwrap();
        assert!(adapter.get_metadata("x.txt").await.is_err());

        let meta = adapter.get_metadata("sub/y.txt").await.unwrap();
        assert_eq!(meta.size, Some(1));
        assert!(meta.timestamp.is_some());

        adapter.delete("sub/y.txt").await.unwrap();
        adapter.delete_dir("sub").await.unwrap();
        assert!(adapter.get_metadata("sub").await.unwrap_err().is_not_found());
    }
}
