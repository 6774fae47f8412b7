//! Scheme configuration module / Scheme 配置模块
//!
//! Schemes are loaded once and stay immutable for the lifetime of the bridges
//! built from them. The binary reads them from config.json, creating a default
//! config file on first run / 首次运行时创建默认配置文件

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Per-scheme configuration / 单个 scheme 的配置
///
/// Deserialized from `{ "type": "local", "config": {...}, "serve_js": true }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSchemeConfig", into = "RawSchemeConfig")]
pub struct SchemeConfig {
    /// Backend type resolved through the adapter registry / 后端类型
    pub backend_type: String,
    /// Adapter configuration mapping / 适配器配置
    pub config: Value,
    /// Extension -> serve flag, from `serve_<ext>` keys / 扩展名服务标记
    pub extension_overrides: BTreeMap<String, bool>,
}

impl SchemeConfig {
    pub fn new(backend_type: &str, config: Value) -> Self {
        Self {
            backend_type: backend_type.to_string(),
            config,
            extension_overrides: BTreeMap::new(),
        }
    }

    pub fn serve(mut self, extension: &str, enabled: bool) -> Self {
        self.extension_overrides.insert(extension.to_lowercase(), enabled);
        self
    }

    /// Whether this scheme is marked to serve the extension / 是否服务该扩展名
    pub fn serves(&self, extension: &str) -> bool {
        self.extension_overrides
            .get(&extension.to_lowercase())
            .copied()
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawSchemeConfig {
    #[serde(rename = "type", default)]
    backend_type: String,
    #[serde(default = "empty_object")]
    config: Value,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Loose truthiness for serve flags: false, 0, "", "0", null, [] and {} are unset
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

impl From<RawSchemeConfig> for SchemeConfig {
    fn from(raw: RawSchemeConfig) -> Self {
        let mut extension_overrides = BTreeMap::new();
        for (key, value) in &raw.extra {
            match key.strip_prefix("serve_") {
                Some(ext) if !ext.is_empty() => {
                    extension_overrides.insert(ext.to_lowercase(), truthy(value));
                }
                _ => tracing::debug!("Ignoring unknown scheme config key: {}", key),
            }
        }
        Self {
            backend_type: raw.backend_type,
            config: raw.config,
            extension_overrides,
        }
    }
}

impl From<SchemeConfig> for RawSchemeConfig {
    fn from(config: SchemeConfig) -> Self {
        let extra = config
            .extension_overrides
            .into_iter()
            .map(|(ext, enabled)| (format!("serve_{}", ext), Value::Bool(enabled)))
            .collect();
        Self {
            backend_type: config.backend_type,
            config: config.config,
            extra,
        }
    }
}

/// Ordered scheme -> config mapping / 有序的 scheme 配置表
///
/// Order follows the configuration document; it decides which scheme wins
/// when several serve the same extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemeSettings {
    schemes: IndexMap<String, SchemeConfig>,
}

impl SchemeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append or replace a scheme (a replaced scheme keeps its position)
    pub fn with(mut self, scheme: &str, config: SchemeConfig) -> Self {
        self.insert(scheme, config);
        self
    }

    pub fn insert(&mut self, scheme: &str, config: SchemeConfig) {
        self.schemes.insert(scheme.to_string(), config);
    }

    pub fn get(&self, scheme: &str) -> Option<&SchemeConfig> {
        self.schemes.get(scheme)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SchemeConfig)> {
        self.schemes.iter()
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

/// Application configuration / 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL used for external download links / 外部下载链接基础地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_base_url: Option<String>,
    /// Configured schemes / 已配置的 scheme
    #[serde(default)]
    pub schemes: SchemeSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_base_url: Some("http://localhost:8180".to_string()),
            schemes: SchemeSettings::new().with(
                "public",
                SchemeConfig::new("local", serde_json::json!({ "root": "data/public" })),
            ),
        }
    }
}

/// Load configuration from file, or create default if not exists / 加载配置文件，不存在则创建默认配置
pub fn load_config(config_path: &Path) -> Result<AppConfig> {
    if config_path.exists() {
        // Load existing config / 加载现有配置
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;

        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", config_path))?;

        tracing::info!("Loaded configuration from {:?} ({} schemes)", config_path, config.schemes.len());
        Ok(config)
    } else {
        // Create default config / 创建默认配置
        let config = AppConfig::default();
        save_config(config_path, &config)?;
        tracing::info!("Created default configuration at {:?}", config_path);
        Ok(config)
    }
}

/// Save configuration to file / 保存配置到文件
pub fn save_config(config_path: &Path, config: &AppConfig) -> Result<()> {
    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config file {:?}", config_path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scheme_config_from_json() {
        let config: SchemeConfig = serde_json::from_value(json!({
            "type": "local",
            "config": { "root": "/srv" },
            "serve_js": true,
            "serve_CSS": 1,
            "serve_png": "0",
            "other": "ignored"
        }))
        .unwrap();

        assert_eq!(config.backend_type, "local");
        assert_eq!(config.config["root"], "/srv");
        assert!(config.serves("js"));
        assert!(config.serves("css"));
        assert!(!config.serves("png"));
        assert!(!config.serves("gif"));
    }

    #[test]
    fn test_missing_fields_default() {
        let config: SchemeConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.backend_type, "");
        assert_eq!(config.config, json!({}));
    }

    #[test]
    fn test_settings_keep_document_order() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "schemes": { "zeta": {"type": "memory"}, "alpha": {"type": "memory"}, "mid": {} } }"#,
        )
        .unwrap();
        let names: Vec<&String> = config.schemes.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(config.download_base_url, None);
    }

    #[test]
    fn test_load_creates_default_then_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let created = load_config(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.schemes.get("public").unwrap().backend_type, "local");

        let reloaded = load_config(&path).unwrap();
        assert_eq!(created, reloaded);
    }

    #[test]
    fn test_serve_flags_round_trip() {
        let config = SchemeConfig::new("memory", json!({})).serve("js", true);
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["serve_js"], json!(true));
        assert_eq!(value["type"], json!("memory"));
    }
}
