use std::collections::HashMap;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use serde_json::Value;

use super::{ConfigItem, NullAdapter, NullAdapterFactory, StorageAdapter};

pub type AdapterBox = Arc<dyn StorageAdapter>;

/// Adapter factory trait / 适配器工厂 trait
pub trait AdapterFactory: Send + Sync {
    /// Backend type name used in scheme configs / 后端类型名称
    fn adapter_type(&self) -> &'static str;

    /// Adapter specific config items / 适配器配置项
    fn config_items(&self) -> Vec<ConfigItem>;

    /// 创建适配器实例
    fn create_adapter(&self, config: Value) -> Result<Box<dyn StorageAdapter>>;
}

/// Map from backend type to adapter factory / 后端类型到工厂的映射
///
/// Construction never fails: unknown types and broken configs degrade to the
/// null adapter so only operations on that scheme fail.
pub struct AdapterRegistry {
    factories: HashMap<String, Box<dyn AdapterFactory>>,
}

impl AdapterRegistry {
    /// Registry holding only the null adapter / 仅包含空适配器
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register_factory(Box::new(NullAdapterFactory));
        registry
    }

    /// Registry with every bundled adapter / 注册所有内置适配器
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all(&mut registry);
        registry
    }

    /// Register adapter factory, replacing any previous one of the same type / 注册适配器工厂
    pub fn register_factory(&mut self, factory: Box<dyn AdapterFactory>) {
        let adapter_type = factory.adapter_type().to_string();
        self.factories.insert(adapter_type.clone(), factory);
        tracing::debug!("Adapter factory registered: {}", adapter_type);
    }

    pub fn get_factory(&self, adapter_type: &str) -> Option<&dyn AdapterFactory> {
        self.factories.get(adapter_type).map(|f| f.as_ref())
    }

    /// List all available adapter types (sorted) / 列出所有可用的适配器类型
    pub fn list_adapter_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Create adapter instance, falling back to the null adapter / 创建适配器实例
    pub fn create(&self, adapter_type: &str, config: Value) -> AdapterBox {
        let Some(factory) = self.factories.get(adapter_type) else {
            tracing::warn!("Unknown adapter type '{}', using null adapter", adapter_type);
            return Arc::new(NullAdapter);
        };

        let created = check_required(&factory.config_items(), &config)
            .and_then(|_| factory.create_adapter(config));

        match created {
            Ok(adapter) => {
                tracing::debug!("Adapter created: {}", adapter_type);
                Arc::from(adapter)
            }
            Err(e) => {
                tracing::error!("Adapter creation failed: {} - {}", adapter_type, e);
                Arc::new(NullAdapter)
            }
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Verify required config items are present / 校验必填配置项
fn check_required(items: &[ConfigItem], config: &Value) -> Result<()> {
    for item in items.iter().filter(|i| i.required && i.default.is_none()) {
        match config.get(&item.name) {
            None | Some(Value::Null) => {
                return Err(anyhow!("Missing required config item: {}", item.name));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_registered() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(registry.list_adapter_types(), vec!["local", "memory", "null", "zip"]);
    }

    #[tokio::test]
    async fn test_unknown_type_degrades_to_null() {
        let registry = AdapterRegistry::with_defaults();
        let adapter = registry.create("bogus", json!({}));
        assert_eq!(adapter.name(), "null");
        assert!(adapter.get_metadata("a").await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_required_item_degrades_to_null() {
        let registry = AdapterRegistry::with_defaults();
        let adapter = registry.create("zip", json!({}));
        assert_eq!(adapter.name(), "null");
    }

    #[test]
    fn test_check_required() {
        let items = vec![
            ConfigItem::new("root", "string").required(),
            ConfigItem::new("mode", "string").required().default("rw"),
        ];
        assert!(check_required(&items, &json!({ "root": "/tmp" })).is_ok());
        assert!(check_required(&items, &json!({ "root": null })).is_err());
        assert!(check_required(&items, &json!({})).is_err());
    }

    #[test]
    fn test_failing_factory_degrades_to_null() {
        let registry = AdapterRegistry::with_defaults();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.zip");
        let adapter = registry.create("zip", json!({ "archive": missing.to_string_lossy() }));
        assert_eq!(adapter.name(), "null");
    }
}
