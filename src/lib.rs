pub mod bridge;
pub mod config;
pub mod download_url;
pub mod error;
pub mod scheme;
pub mod storage;
pub mod uri;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

pub use bridge::{OpenMode, OpenOptions, Stat, StreamBridge, Whence};
pub use config::{AppConfig, SchemeConfig, SchemeSettings};
pub use error::{BridgeError, BridgeResult, StorageError, StorageResult};
pub use scheme::SchemeResolver;
pub use storage::{AdapterRegistry, StorageAdapter};
