//! Zip 适配器工厂

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::storage::{AdapterFactory, ConfigItem, StorageAdapter};
use super::config::ZipConfig;
use super::driver::ZipAdapter;

pub struct ZipAdapterFactory;

impl AdapterFactory for ZipAdapterFactory {
    fn adapter_type(&self) -> &'static str {
        "zip"
    }

    fn config_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("archive", "string")
                .required()
                .help("Path of the zip archive"),
            ConfigItem::new("root", "string")
                .default("")
                .help("Directory inside the archive used as root"),
        ]
    }

    fn create_adapter(&self, config: Value) -> Result<Box<dyn StorageAdapter>> {
        let config: ZipConfig = serde_json::from_value(config)
            .map_err(|e| anyhow!("配置解析失败: {}", e))?;
        if !std::path::Path::new(&config.archive).is_file() {
            return Err(anyhow!("Archive not found: {}", config.archive));
        }
        Ok(Box::new(ZipAdapter::new(config)))
    }
}
