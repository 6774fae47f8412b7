//! Stream bridge over storage adapters / 存储适配器之上的流桥接
//!
//! One `StreamBridge` per stream or directory handle. Files are copied into a
//! local buffer on open, edited there, and uploaded as a whole on flush and
//! close. Adapters are created lazily per scheme and memoized on the bridge.

pub mod buffer;
pub mod listing;
pub mod options;
pub mod stat;

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::config::SchemeSettings;
use crate::download_url::UrlGenerator;
use crate::error::{BridgeError, BridgeResult, StorageResult};
use crate::storage::{AdapterBox, AdapterRegistry, NullAdapter};
use crate::uri;

pub use buffer::LocalBuffer;
pub use listing::DirectoryListing;
pub use options::{
    LockOperation, MetadataOption, OpenMode, OpenOptions, Whence, LOCK_EX, LOCK_NB, LOCK_SH,
    LOCK_UN,
};
pub use stat::{Stat, DIR_MODE, FILE_MODE};

/// State of the currently open file / 当前打开的文件
struct OpenStream {
    uri: String,
    scheme: String,
    target: String,
    opened_path: Option<String>,
    buffer: LocalBuffer,
}

/// Per-handle bridge between stream calls and storage adapters / 流桥接器
pub struct StreamBridge {
    settings: Arc<SchemeSettings>,
    registry: Arc<AdapterRegistry>,
    url_generator: Option<Arc<dyn UrlGenerator>>,
    adapters: HashMap<String, AdapterBox>,
    uri: Option<String>,
    stream: Option<OpenStream>,
    listing: Option<DirectoryListing>,
    request_time: i64,
}

/// Expected adapter failures become `false`, backend failures propagate
fn outcome(operation: &str, uri: &str, result: StorageResult<()>) -> BridgeResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_expected() => {
            debug!("{} failed for {}: {}", operation, uri, e);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

impl StreamBridge {
    pub fn new(settings: Arc<SchemeSettings>, registry: Arc<AdapterRegistry>) -> Self {
        Self {
            settings,
            registry,
            url_generator: None,
            adapters: HashMap::new(),
            uri: None,
            stream: None,
            listing: None,
            request_time: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_url_generator(mut self, generator: Arc<dyn UrlGenerator>) -> Self {
        self.url_generator = Some(generator);
        self
    }

    /// Override the time reported as `atime` / 设置请求时间
    pub fn with_request_time(mut self, request_time: i64) -> Self {
        self.request_time = request_time;
        self
    }

    /// Last URI this bridge operated on / 最近操作的 URI
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn set_uri(&mut self, uri: impl Into<String>) {
        self.uri = Some(uri.into());
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Target recorded when the stream was opened with `use_path`
    pub fn opened_path(&self) -> Option<&str> {
        self.stream.as_ref().and_then(|s| s.opened_path.as_deref())
    }

    /// Adapter for a scheme, created on first use / 获取（或创建）scheme 对应的适配器
    pub fn adapter(&mut self, scheme: &str) -> AdapterBox {
        if let Some(adapter) = self.adapters.get(scheme) {
            return adapter.clone();
        }

        let adapter: AdapterBox = match self.settings.get(scheme) {
            Some(config) => self
                .registry
                .create(&config.backend_type, config.config.clone()),
            None => {
                warn!("Scheme '{}' is not configured, using null adapter", scheme);
                Arc::new(NullAdapter)
            }
        };

        self.adapters.insert(scheme.to_string(), adapter.clone());
        adapter
    }

    /// Record the uri and resolve its adapter and target
    fn resolve(&mut self, target_uri: &str) -> (AdapterBox, String, String) {
        self.uri = Some(target_uri.to_string());
        let (scheme, target) = uri::split_uri(target_uri);
        let scheme = scheme.unwrap_or_default().to_string();
        (self.adapter(&scheme), scheme, target)
    }

    fn stream_mut(&mut self) -> BridgeResult<&mut OpenStream> {
        self.stream.as_mut().ok_or(BridgeError::NoOpenStream)
    }

    // ---- file streams / 文件流 ----

    /// Open `uri`, copying any existing content into a fresh local buffer.
    ///
    /// Returns `Ok(false)` when the buffer cannot be created or when `x`
    /// mode meets an existing object. A missing or unreadable object yields
    /// an empty buffer.
    pub async fn open(
        &mut self,
        target_uri: &str,
        mode: OpenMode,
        options: OpenOptions,
    ) -> BridgeResult<bool> {
        if let Some(stream) = &self.stream {
            return Err(BridgeError::StreamAlreadyOpen {
                uri: stream.uri.clone(),
            });
        }

        let (adapter, scheme, target) = self.resolve(target_uri);

        let mut buffer = match LocalBuffer::new() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Failed to create local buffer for {}: {}", target_uri, e);
                return Ok(false);
            }
        };

        let existed = match adapter.read(&target).await {
            Ok(mut reader) => {
                if let Err(e) = buffer.fill_from(&mut reader).await {
                    warn!("Failed to read {}: {}", target_uri, e);
                    return Ok(false);
                }
                true
            }
            Err(e) if e.is_expected() => {
                debug!("Opening {} with an empty buffer: {}", target_uri, e);
                false
            }
            Err(e) => return Err(e.into()),
        };

        if mode.exclusive && existed {
            debug!("Refusing exclusive open of existing {}", target_uri);
            return Ok(false);
        }
        if mode.truncate {
            buffer.truncate(0)?;
        }
        if mode.append {
            buffer.seek(SeekFrom::End(0))?;
        }

        let opened_path = options.use_path.then(|| target.clone());
        self.stream = Some(OpenStream {
            uri: target_uri.to_string(),
            scheme,
            target,
            opened_path,
            buffer,
        });
        Ok(true)
    }

    /// Read up to `count` bytes; empty at end of buffer / 读取数据
    pub fn read(&mut self, count: usize) -> BridgeResult<Vec<u8>> {
        Ok(self.stream_mut()?.buffer.read(count)?)
    }

    pub fn write(&mut self, data: &[u8]) -> BridgeResult<usize> {
        Ok(self.stream_mut()?.buffer.write(data)?)
    }

    /// Move the cursor; a position before the start is refused / 定位
    pub fn seek(&mut self, offset: i64, whence: Whence) -> BridgeResult<bool> {
        let stream = self.stream_mut()?;
        let pos = match whence {
            Whence::Set => match u64::try_from(offset) {
                Ok(offset) => SeekFrom::Start(offset),
                Err(_) => return Ok(false),
            },
            Whence::Current => SeekFrom::Current(offset),
            Whence::End => SeekFrom::End(offset),
        };

        match stream.buffer.seek(pos) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn tell(&mut self) -> BridgeResult<u64> {
        Ok(self.stream_mut()?.buffer.tell()?)
    }

    pub fn truncate(&mut self, size: u64) -> BridgeResult<bool> {
        self.stream_mut()?.buffer.truncate(size)?;
        Ok(true)
    }

    pub fn eof(&mut self) -> BridgeResult<bool> {
        Ok(self.stream_mut()?.buffer.eof()?)
    }

    /// Upload the whole buffer, keeping the cursor where it was / 刷新到后端
    pub async fn flush(&mut self) -> BridgeResult<bool> {
        let stream = self.stream_mut()?;
        let (scheme, target, stream_uri) =
            (stream.scheme.clone(), stream.target.clone(), stream.uri.clone());
        let adapter = self.adapter(&scheme);
        if adapter.is_read_only() {
            debug!("Skipping flush of {}: backend is read-only", stream_uri);
            return Ok(false);
        }

        let stream = self.stream_mut()?;
        let pos = stream.buffer.tell()?;
        let data = stream.buffer.contents()?;
        stream.buffer.seek(SeekFrom::Start(pos))?;
        outcome("flush", &stream_uri, adapter.write(&target, data).await)
    }

    /// Upload and release the buffer; released even when the upload fails
    pub async fn close(&mut self) -> BridgeResult<bool> {
        let mut stream = self.stream.take().ok_or(BridgeError::NoOpenStream)?;
        let adapter = self.adapter(&stream.scheme);
        if adapter.is_read_only() {
            debug!("Skipping upload of {}: backend is read-only", stream.uri);
            return Ok(false);
        }

        let data = stream.buffer.contents()?;
        let result = outcome("close", &stream.uri, adapter.write(&stream.target, data).await);
        drop(stream);
        result
    }

    /// Stat of the open buffer / 打开缓冲区的 stat
    pub fn fstat(&mut self) -> BridgeResult<Stat> {
        let request_time = self.request_time;
        let size = self.stream_mut()?.buffer.len()?;
        Ok(Stat::for_buffer(size, request_time))
    }

    /// Advisory lock on the local buffer; unrecognized codes are a no-op
    pub fn lock(&mut self, operation: i32) -> BridgeResult<bool> {
        let stream = self.stream_mut()?;
        let Some(operation) = LockOperation::from_code(operation) else {
            return Ok(true);
        };
        match stream.buffer.lock(operation) {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!("Lock {:?} failed on {}: {}", operation, stream.uri, e);
                Ok(false)
            }
        }
    }

    // ---- path operations / 路径操作 ----

    /// Reader over the stored object without opening a stream; nothing is
    /// uploaded afterwards. `None` when the object cannot be read.
    pub async fn fetch(
        &mut self,
        target_uri: &str,
    ) -> BridgeResult<Option<Box<dyn AsyncRead + Unpin + Send>>> {
        let (adapter, _, target) = self.resolve(target_uri);
        match adapter.read(&target).await {
            Ok(reader) => Ok(Some(reader)),
            Err(e) if e.is_expected() => {
                debug!("fetch failed for {}: {}", target_uri, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Metadata of `uri`, `None` when it cannot be determined / 获取元数据
    pub async fn stat(&mut self, target_uri: &str) -> BridgeResult<Option<Stat>> {
        let (adapter, _, target) = self.resolve(target_uri);
        match adapter.get_metadata(&target).await {
            Ok(entry) => Ok(Some(Stat::from_entry(&entry, self.request_time))),
            Err(e) if e.is_expected() => {
                debug!("stat failed for {}: {}", target_uri, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn mkdir(&mut self, target_uri: &str) -> BridgeResult<bool> {
        let (adapter, _, target) = self.resolve(target_uri);
        outcome("mkdir", target_uri, adapter.create_dir(&target).await)
    }

    pub async fn rmdir(&mut self, target_uri: &str) -> BridgeResult<bool> {
        let (adapter, _, target) = self.resolve(target_uri);
        outcome("rmdir", target_uri, adapter.delete_dir(&target).await)
    }

    pub async fn unlink(&mut self, target_uri: &str) -> BridgeResult<bool> {
        let (adapter, _, target) = self.resolve(target_uri);
        outcome("unlink", target_uri, adapter.delete(&target).await)
    }

    /// Rename within one scheme; moves across schemes are refused / 重命名
    pub async fn rename(&mut self, from: &str, to: &str) -> BridgeResult<bool> {
        let (from_scheme, from_target) = uri::split_uri(from);
        let (to_scheme, to_target) = uri::split_uri(to);
        if from_scheme != to_scheme {
            warn!("Cannot rename across schemes: {} -> {}", from, to);
            return Ok(false);
        }

        self.uri = Some(from.to_string());
        let adapter = self.adapter(from_scheme.unwrap_or_default());
        outcome("rename", from, adapter.rename(&from_target, &to_target).await)
    }

    /// Metadata changes are not propagated to backends; only `chmod` reports
    /// success
    pub fn set_metadata(&mut self, target_uri: &str, option: MetadataOption) -> bool {
        self.uri = Some(target_uri.to_string());
        matches!(option, MetadataOption::Access)
    }

    /// Local filesystem path behind `uri`, when the adapter has one
    pub fn realpath(&mut self, target_uri: &str) -> Option<PathBuf> {
        let (adapter, _, target) = self.resolve(target_uri);
        adapter.local_path(&target)
    }

    // ---- directory handles / 目录句柄 ----

    pub async fn opendir(&mut self, target_uri: &str) -> BridgeResult<bool> {
        self.listing = None;
        let (adapter, _, target) = self.resolve(target_uri);
        match adapter.list_contents(&target).await {
            Ok(entries) => {
                self.listing = Some(DirectoryListing::new(entries));
                Ok(true)
            }
            Err(e) if e.is_expected() => {
                debug!("opendir failed for {}: {}", target_uri, e);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Next entry path, `None` once the listing is exhausted / 读取下一项
    pub fn readdir(&mut self) -> BridgeResult<Option<String>> {
        let listing = self.listing.as_mut().ok_or(BridgeError::NoOpenDirectory)?;
        Ok(listing.advance().map(|entry| entry.path.clone()))
    }

    pub fn rewinddir(&mut self) -> BridgeResult<bool> {
        let listing = self.listing.as_mut().ok_or(BridgeError::NoOpenDirectory)?;
        listing.rewind();
        Ok(true)
    }

    pub fn closedir(&mut self) -> bool {
        self.listing = None;
        true
    }

    // ---- naming / 命名 ----

    /// Description of the backend serving the current uri / 描述
    pub fn name(&mut self) -> String {
        let scheme = self
            .uri
            .as_deref()
            .and_then(uri::scheme)
            .unwrap_or_default()
            .to_string();
        let backend = self.adapter(&scheme).name().to_string();
        format!("Storage bridge: {}://, {} backend", scheme, backend)
    }

    /// Parent of `uri`, or of the current uri when none is given / 父级 URI
    pub fn dirname(&self, target_uri: Option<&str>) -> String {
        uri::dirname(target_uri.or(self.uri.as_deref()).unwrap_or_default())
    }

    /// Externally fetchable URL for `uri` / 外部访问地址
    pub fn external_url(&self, target_uri: &str) -> BridgeResult<String> {
        let generator = self
            .url_generator
            .as_ref()
            .ok_or(BridgeError::NoUrlGenerator)?;
        let (scheme, target) = uri::split_uri(target_uri);
        let scheme = scheme.ok_or_else(|| BridgeError::MissingScheme(target_uri.to_string()))?;
        Ok(generator.download_url(scheme, &target.replace('\\', "/")))
    }
}

impl Drop for StreamBridge {
    fn drop(&mut self) {
        if let Some(stream) = &self.stream {
            warn!("Stream {} dropped without close, changes discarded", stream.uri);
        }
    }
}
