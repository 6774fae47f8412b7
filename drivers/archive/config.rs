//! Zip 适配器配置

use serde::{Deserialize, Serialize};

/// Zip 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZipConfig {
    /// Path of the archive on the local disk / 压缩包路径
    pub archive: String,
    /// Directory inside the archive used as the scheme root / 压缩包内根目录
    #[serde(default)]
    pub root: String,
}
