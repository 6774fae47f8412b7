//! Error types / 错误类型

use thiserror::Error;

/// Errors reported by storage adapters / 存储适配器错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// Target path does not exist / 目标路径不存在
    #[error("not found: {0}")]
    NotFound(String),

    #[error("adapter is read-only")]
    ReadOnly,

    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Path escapes the adapter root or is otherwise malformed / 非法路径
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("io error: {0}")]
    Io(std::io::Error),

    /// Unexpected backend failure, propagated to the caller / 后端异常
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StorageError {
    /// Whether the failure is an ordinary outcome (reported as `false`) rather
    /// than a hard error / 是否为可预期的失败
    pub fn is_expected(&self) -> bool {
        !matches!(self, StorageError::Backend(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
            std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(err.to_string()),
            _ => StorageError::Io(err),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors reported by the stream bridge / 流桥接错误
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("a stream is already open on this bridge: {uri}")]
    StreamAlreadyOpen { uri: String },

    #[error("no stream is open")]
    NoOpenStream,

    #[error("no directory is open")]
    NoOpenDirectory,

    #[error("no url generator configured")]
    NoUrlGenerator,

    #[error("invalid open mode: {0}")]
    InvalidMode(String),

    #[error("uri has no scheme: {0}")]
    MissingScheme(String),

    /// Local temporary buffer failure / 本地缓冲区错误
    #[error("local buffer error: {0}")]
    Buffer(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err: StorageError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(err.is_not_found());
        assert!(err.is_expected());
    }

    #[test]
    fn test_invalid_path_is_expected() {
        let err = StorageError::InvalidPath("../x".to_string());
        assert!(err.is_expected());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_backend_error_is_unexpected() {
        let err: StorageError = anyhow::anyhow!("boom").into();
        assert!(!err.is_expected());
    }
}
