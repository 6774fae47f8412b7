//! Zip 适配器核心实现
//!
//! - 只读：写操作全部返回 ReadOnly
//! - 目录可以是显式条目，也可以由文件路径推导
//! - 压缩包同步读取，放在 spawn_blocking 中执行

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::Mutex;
use zip::result::ZipError;

use crate::error::{StorageError, StorageResult};
use crate::storage::{Entry, StorageAdapter};
use crate::uri;
use super::config::ZipConfig;

/// Entries of an archive / 压缩包索引
#[derive(Debug, Default)]
struct ZipIndex {
    files: BTreeMap<String, u64>,
    dirs: BTreeSet<String>,
    timestamp: Option<i64>,
}

impl ZipIndex {
    fn add_ancestors(&mut self, name: &str) {
        let mut current = name;
        while let Some(pos) = current.rfind('/') {
            current = &current[..pos];
            self.dirs.insert(current.to_string());
        }
    }
}

pub struct ZipAdapter {
    archive: PathBuf,
    root: String,
    index: Arc<Mutex<Option<Arc<ZipIndex>>>>,
}

/// Pre-allocation cap; entry headers declare sizes we do not trust / 预分配上限
const MAX_PREALLOC: u64 = 1 << 20;

fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

fn map_zip_error(err: ZipError, path: &str) -> StorageError {
    match err {
        ZipError::FileNotFound => StorageError::NotFound(path.to_string()),
        ZipError::Io(e) => e.into(),
        other => StorageError::Backend(other.into()),
    }
}

fn join_error(err: tokio::task::JoinError) -> StorageError {
    StorageError::Backend(err.into())
}

fn open_archive(archive: &PathBuf) -> StorageResult<zip::ZipArchive<std::io::BufReader<std::fs::File>>> {
    let file = std::fs::File::open(archive)?;
    zip::ZipArchive::new(std::io::BufReader::new(file))
        .map_err(|e| map_zip_error(e, &archive.to_string_lossy()))
}

fn load_index(archive: &PathBuf) -> StorageResult<ZipIndex> {
    let mut zip = open_archive(archive)?;
    let mut index = ZipIndex {
        timestamp: std::fs::metadata(archive)
            .ok()
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64),
        ..Default::default()
    };

    for i in 0..zip.len() {
        let file = zip.by_index(i).map_err(|e| map_zip_error(e, "archive entry"))?;
        let name = file.name().trim_matches('/').to_string();
        if name.is_empty() {
            continue;
        }
        index.add_ancestors(&name);
        if file.is_dir() {
            index.dirs.insert(name);
        } else {
            index.files.insert(name, file.size());
        }
    }

    tracing::debug!(
        "Zip index loaded: {:?} ({} files, {} dirs)",
        archive,
        index.files.len(),
        index.dirs.len()
    );
    Ok(index)
}

impl ZipAdapter {
    pub fn new(config: ZipConfig) -> Self {
        Self {
            archive: PathBuf::from(config.archive),
            root: config.root.trim_matches('/').to_string(),
            index: Arc::new(Mutex::new(None)),
        }
    }

    /// Load the archive index once and reuse it / 获取索引（首次加载后缓存）
    async fn get_index(&self) -> StorageResult<Arc<ZipIndex>> {
        let mut guard = self.index.lock().await;
        if let Some(ref index) = *guard {
            return Ok(index.clone());
        }
        let archive = self.archive.clone();
        let index = Arc::new(
            tokio::task::spawn_blocking(move || load_index(&archive))
                .await
                .map_err(join_error)??,
        );
        *guard = Some(index.clone());
        Ok(index)
    }

    fn full_path(&self, path: &str) -> String {
        uri::join(&self.root, path)
    }

    fn is_dir(&self, index: &ZipIndex, full: &str) -> bool {
        full.is_empty() || full == self.root || index.dirs.contains(full)
    }

    /// Strip the configured root from an archive name / 去掉根目录前缀
    fn relative(&self, full: &str) -> String {
        if self.root.is_empty() {
            full.to_string()
        } else {
            full.strip_prefix(&self.root)
                .unwrap_or(full)
                .trim_start_matches('/')
                .to_string()
        }
    }
}

#[async_trait]
impl StorageAdapter for ZipAdapter {
    fn name(&self) -> &str {
        "zip"
    }

    fn is_read_only(&self) -> bool {
        true
    }

    async fn read(&self, path: &str) -> StorageResult<Box<dyn AsyncRead + Unpin + Send>> {
        let full = self.full_path(path);
        let archive = self.archive.clone();
        let data = tokio::task::spawn_blocking(move || {
            let mut zip = open_archive(&archive)?;
            let mut file = zip.by_name(&full).map_err(|e| map_zip_error(e, &full))?;
            let mut data = Vec::with_capacity(initial_capacity(file.size()));
            file.read_to_end(&mut data)?;
            Ok::<Vec<u8>, StorageError>(data)
        })
        .await
        .map_err(join_error)??;

        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn write(&self, _path: &str, _data: Bytes) -> StorageResult<()> {
        Err(StorageError::ReadOnly)
    }

    async fn list_contents(&self, path: &str) -> StorageResult<Vec<Entry>> {
        let index = self.get_index().await?;
        let full = self.full_path(path);
        if !self.is_dir(&index, &full) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let is_child = |name: &str| -> bool {
            let rest = if full.is_empty() {
                Some(name)
            } else {
                name.strip_prefix(full.as_str()).and_then(|r| r.strip_prefix('/'))
            };
            rest.is_some_and(|r| !r.is_empty() && !r.contains('/'))
        };

        let mut result: Vec<Entry> = index
            .dirs
            .iter()
            .filter(|name| is_child(name.as_str()))
            .map(|name| Entry::dir(self.relative(name), index.timestamp))
            .chain(
                index
                    .files
                    .iter()
                    .filter(|(name, _)| is_child(name.as_str()))
                    .map(|(name, size)| Entry::file(self.relative(name), *size, index.timestamp)),
            )
            .collect();

        result.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }

    async fn get_metadata(&self, path: &str) -> StorageResult<Entry> {
        let index = self.get_index().await?;
        let full = self.full_path(path);
        if let Some(size) = index.files.get(&full) {
            return Ok(Entry::file(path, *size, index.timestamp));
        }
        if self.is_dir(&index, &full) {
            return Ok(Entry::dir(path, index.timestamp));
        }
        Err(StorageError::NotFound(path.to_string()))
    }

    async fn create_dir(&self, _path: &str) -> StorageResult<()> {
        Err(StorageError::ReadOnly)
    }

    async fn delete_dir(&self, _path: &str) -> StorageResult<()> {
        Err(StorageError::ReadOnly)
    }

    async fn delete(&self, _path: &str) -> StorageResult<()> {
        Err(StorageError::ReadOnly)
    }

    async fn rename(&self, _from: &str, _to: &str) -> StorageResult<()> {
        Err(StorageError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::AsyncReadExt;
    use zip::write::SimpleFileOptions;

    fn build_archive(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("assets.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);

        writer.add_directory("css/", SimpleFileOptions::default()).unwrap();
        writer.start_file("css/site.css", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"body{}").unwrap();
        writer.start_file("js/deep/app.js", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"run()").unwrap();
        writer.start_file("readme.txt", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"hi").unwrap();
        writer.finish().unwrap();
        path
    }

    fn adapter(archive: &PathBuf, root: &str) -> ZipAdapter {
        ZipAdapter::new(ZipConfig {
            archive: archive.to_string_lossy().to_string(),
            root: root.to_string(),
        })
    }

    #[tokio::test]
    async fn test_read_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_archive(dir.path());
        let zip = adapter(&archive, "");

        let mut reader = zip.read("css/site.css").await.ok().unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, b"body{}");

        assert!(zip.read("missing.css").await.err().unwrap().is_not_found());
    }

    #[tokio::test]
    async fn test_list_root_includes_implied_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_archive(dir.path());
        let zip = adapter(&archive, "");

        let entries = zip.list_contents("").await.unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["css", "js", "readme.txt"]);

        let meta = zip.get_metadata("js/deep").await.unwrap();
        assert!(meta.is_dir());
        let meta = zip.get_metadata("readme.txt").await.unwrap();
        assert_eq!(meta.size, Some(2));
    }

    #[tokio::test]
    async fn test_root_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_archive(dir.path());
        let zip = adapter(&archive, "js");

        let entries = zip.list_contents("deep").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "deep/app.js");
    }

    #[tokio::test]
    async fn test_writes_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let archive = build_archive(dir.path());
        let zip = adapter(&archive, "");

        let err = zip.write("x.txt", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StorageError::ReadOnly));
        assert!(zip.is_read_only());
    }

    #[test]
    fn test_declared_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(10), 10);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOC as usize);
    }
}
