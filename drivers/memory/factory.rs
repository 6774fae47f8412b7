use anyhow::Result;
use serde_json::Value;

use crate::storage::{AdapterFactory, ConfigItem, StorageAdapter};
use super::driver::{MemoryAdapter, MemoryStore};

/// Memory adapter factory / 内存适配器工厂
///
/// Without a shared store every created adapter starts empty.
#[derive(Default)]
pub struct MemoryAdapterFactory {
    shared: Option<MemoryStore>,
}

impl MemoryAdapterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// All adapters built by this factory see the same objects / 共享存储
    pub fn shared(store: MemoryStore) -> Self {
        Self { shared: Some(store) }
    }
}

impl AdapterFactory for MemoryAdapterFactory {
    fn adapter_type(&self) -> &'static str {
        "memory"
    }

    fn config_items(&self) -> Vec<ConfigItem> {
        vec![
            ConfigItem::new("read_only", "bool")
                .default("false")
                .help("Refuse every write operation"),
        ]
    }

    fn create_adapter(&self, config: Value) -> Result<Box<dyn StorageAdapter>> {
        let read_only = config.get("read_only")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let store = self.shared.clone().unwrap_or_default();
        Ok(Box::new(MemoryAdapter::with_store(store, read_only)))
    }
}
