use anyhow::{anyhow, Result};
use serde_json::Value;
use std::path::PathBuf;

use crate::storage::{AdapterFactory, ConfigItem, StorageAdapter};
use super::driver::LocalAdapter;

pub struct LocalAdapterFactory;

impl AdapterFactory for LocalAdapterFactory {
    fn adapter_type(&self) -> &'static str {
        "local"
    }

    fn config_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("root", "string")
                .required()
                .help("Local directory served by this scheme"),
        ]
    }

    fn create_adapter(&self, config: Value) -> Result<Box<dyn StorageAdapter>> {
        let root_path = config.get("root")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow!("缺少 root 配置"))?;

        let root = PathBuf::from(root_path.replace('\\', "/"));
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };

        // 同步初始化（工厂方法是同步的）
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        let canonical_root = root.canonicalize()?;

        tracing::info!("Local adapter initialized, root: {:?}", canonical_root);

        Ok(Box::new(LocalAdapter::new(canonical_root)))
    }
}
