use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::error::{StorageError, StorageResult};
use crate::storage::{Entry, StorageAdapter};
use crate::uri;

/// Stored object / 存储节点
#[derive(Debug, Clone)]
pub enum Node {
    File { data: Bytes, timestamp: i64 },
    Dir { timestamp: i64 },
}

/// Shared object store / 共享存储
pub type MemoryStore = Arc<RwLock<BTreeMap<String, Node>>>;

/// Process-local adapter keeping objects in a map / 内存适配器
///
/// Directories are explicit (created with `create_dir`) or implied by the
/// paths of the files below them.
#[derive(Clone, Default)]
pub struct MemoryAdapter {
    store: MemoryStore,
    read_only: bool,
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn prefix_of(path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!("{}/", path)
    }
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: MemoryStore, read_only: bool) -> Self {
        Self { store, read_only }
    }

    /// Insert a file directly, bypassing the read-only flag / 直接写入文件
    pub fn insert(&self, path: &str, data: impl Into<Bytes>) {
        self.store.write().insert(
            path.to_string(),
            Node::File { data: data.into(), timestamp: now() },
        );
    }

    fn check_writable(&self) -> StorageResult<()> {
        if self.read_only {
            Err(StorageError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// First ancestor of `path` stored as a file / 作为文件存在的上级路径
    fn file_ancestor(store: &BTreeMap<String, Node>, path: &str) -> Option<String> {
        let mut end = 0;
        while let Some(pos) = path[end..].find('/') {
            end += pos;
            let ancestor = &path[..end];
            if let Some(Node::File { .. }) = store.get(ancestor) {
                return Some(ancestor.to_string());
            }
            end += 1;
        }
        None
    }

    /// Refuse to place an object below a file / 禁止在文件下创建对象
    fn check_parent(store: &BTreeMap<String, Node>, path: &str) -> StorageResult<()> {
        match Self::file_ancestor(store, path) {
            Some(ancestor) => Err(StorageError::AlreadyExists(ancestor)),
            None => Ok(()),
        }
    }

    fn is_dir(store: &BTreeMap<String, Node>, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        if let Some(Node::Dir { .. }) = store.get(path) {
            return true;
        }
        let prefix = prefix_of(path);
        store.range(prefix.clone()..).next().is_some_and(|(k, _)| k.starts_with(&prefix))
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    async fn read(&self, path: &str) -> StorageResult<Box<dyn AsyncRead + Unpin + Send>> {
        match self.store.read().get(path) {
            Some(Node::File { data, .. }) => Ok(Box::new(std::io::Cursor::new(data.clone()))),
            _ => Err(StorageError::NotFound(path.to_string())),
        }
    }

    async fn write(&self, path: &str, data: Bytes) -> StorageResult<()> {
        self.check_writable()?;
        let mut store = self.store.write();
        if Self::is_dir(&store, path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        Self::check_parent(&store, path)?;
        store.insert(path.to_string(), Node::File { data, timestamp: now() });
        Ok(())
    }

    async fn list_contents(&self, path: &str) -> StorageResult<Vec<Entry>> {
        let store = self.store.read();
        if !Self::is_dir(&store, path) {
            return Err(StorageError::NotFound(path.to_string()));
        }

        let prefix = prefix_of(path);
        let mut seen = BTreeSet::new();
        let mut result = Vec::new();

        for (key, node) in store.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else { break };
            if rest.is_empty() {
                continue;
            }
            match rest.split_once('/') {
                // Implied directory / 隐含目录
                Some((child, _)) => {
                    if seen.insert(child.to_string()) {
                        result.push(Entry::dir(uri::join(path, child), None));
                    }
                }
                None => {
                    if !seen.insert(rest.to_string()) {
                        continue;
                    }
                    let child = uri::join(path, rest);
                    result.push(match node {
                        Node::File { data, timestamp } => {
                            Entry::file(child, data.len() as u64, Some(*timestamp))
                        }
                        Node::Dir { timestamp } => Entry::dir(child, Some(*timestamp)),
                    });
                }
            }
        }

        result.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }

    async fn get_metadata(&self, path: &str) -> StorageResult<Entry> {
        let store = self.store.read();
        match store.get(path) {
            Some(Node::File { data, timestamp }) => {
                Ok(Entry::file(path, data.len() as u64, Some(*timestamp)))
            }
            Some(Node::Dir { timestamp }) => Ok(Entry::dir(path, Some(*timestamp))),
            None if Self::is_dir(&store, path) => Ok(Entry::dir(path, None)),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    async fn create_dir(&self, path: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut store = self.store.write();
        if let Some(Node::File { .. }) = store.get(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        Self::check_parent(&store, path)?;
        store.insert(path.to_string(), Node::Dir { timestamp: now() });
        Ok(())
    }

    async fn delete_dir(&self, path: &str) -> StorageResult<()> {
        self.check_writable()?;
        if path.is_empty() {
            return Err(StorageError::Unsupported("delete root directory"));
        }
        let mut store = self.store.write();
        if !Self::is_dir(&store, path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let prefix = prefix_of(path);
        store.retain(|key, _| key != path && !key.starts_with(&prefix));
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut store = self.store.write();
        match store.get(path) {
            Some(Node::File { .. }) => {
                store.remove(path);
                Ok(())
            }
            _ => Err(StorageError::NotFound(path.to_string())),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> StorageResult<()> {
        self.check_writable()?;
        let mut store = self.store.write();

        if to.is_empty() || Self::is_dir(&store, to) {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        Self::check_parent(&store, to)?;

        if let Some(Node::File { .. }) = store.get(from) {
            if let Some(node) = store.remove(from) {
                store.insert(to.to_string(), node);
            }
            return Ok(());
        }

        if from.is_empty() || !Self::is_dir(&store, from) {
            return Err(StorageError::NotFound(from.to_string()));
        }

        // Move the directory and everything below it / 移动整个目录
        let prefix = prefix_of(from);
        let moved: Vec<String> = store
            .keys()
            .filter(|key| key.as_str() == from || key.starts_with(&prefix))
            .cloned()
            .collect();
        for key in moved {
            if let Some(node) = store.remove(&key) {
                let new_key = format!("{}{}", to, &key[from.len()..]);
                store.insert(new_key, node);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    async fn read_all(adapter: &MemoryAdapter, path: &str) -> Vec<u8> {
        let mut reader = adapter.read(path).await.ok().unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await.unwrap();
        data
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let adapter = MemoryAdapter::new();
        adapter.write("a/b.txt", Bytes::from_static(b"hello")).await.unwrap();
        assert_eq!(read_all(&adapter, "a/b.txt").await, b"hello");
    }

    #[tokio::test]
    async fn test_implied_directories() {
        let adapter = MemoryAdapter::new();
        adapter.insert("a/b/c.txt", "c");
        adapter.insert("a/d.txt", "dd");

        let meta = adapter.get_metadata("a/b").await.unwrap();
        assert!(meta.is_dir());

        let entries = adapter.list_contents("a").await.unwrap();
        assert_eq!(
            entries,
            vec![Entry::dir("a/b", None), Entry::file("a/d.txt", 2, entries[1].timestamp)]
        );
        assert!(adapter.list_contents("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rename_directory() {
        let adapter = MemoryAdapter::new();
        adapter.insert("old/x.txt", "x");
        adapter.create_dir("old/empty").await.unwrap();

        adapter.rename("old", "new").await.unwrap();
        assert_eq!(read_all(&adapter, "new/x.txt").await, b"x");
        assert!(adapter.get_metadata("new/empty").await.unwrap().is_dir());
        assert!(adapter.get_metadata("old").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_dir_removes_children() {
        let adapter = MemoryAdapter::new();
        adapter.insert("d/x.txt", "x");
        adapter.insert("dx.txt", "keep");

        adapter.delete_dir("d").await.unwrap();
        assert!(adapter.get_metadata("d/x.txt").await.is_err());
        assert!(adapter.get_metadata("dx.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_read_only_refuses_writes() {
        let adapter = MemoryAdapter::with_store(MemoryStore::default(), true);
        adapter.insert("seed.txt", "s");

        let err = adapter.write("x.txt", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StorageError::ReadOnly));
        assert_eq!(read_all(&adapter, "seed.txt").await, b"s");
    }

    #[tokio::test]
    async fn test_nothing_nests_under_a_file() {
        let adapter = MemoryAdapter::new();
        adapter.write("a", Bytes::from_static(b"file")).await.unwrap();

        let err = adapter.write("a/b", Bytes::from_static(b"x")).await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(ref p) if p == "a"));
        assert!(matches!(
            adapter.create_dir("a/sub/deeper").await,
            Err(StorageError::AlreadyExists(_))
        ));

        assert!(!adapter.get_metadata("a").await.unwrap().is_dir());
        assert!(adapter.list_contents("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rename_refuses_bad_targets() {
        let adapter = MemoryAdapter::new();
        adapter.insert("f.txt", "f");
        adapter.insert("file", "plain");
        adapter.insert("dir/x.txt", "x");

        assert!(matches!(
            adapter.rename("f.txt", "dir").await,
            Err(StorageError::AlreadyExists(_))
        ));
        assert!(matches!(
            adapter.rename("f.txt", "file/f.txt").await,
            Err(StorageError::AlreadyExists(_))
        ));
        assert_eq!(read_all(&adapter, "f.txt").await, b"f");

        adapter.rename("f.txt", "dir/f.txt").await.unwrap();
        assert_eq!(read_all(&adapter, "dir/f.txt").await, b"f");
    }
}
