//! Extension -> scheme resolution / 扩展名到 scheme 的解析

use std::sync::Arc;

use crate::config::SchemeSettings;
use crate::uri;

/// Scheme used when no configured scheme serves an extension / 默认 scheme
pub const DEFAULT_SCHEME: &str = "public";

/// Decides which scheme serves assets of a given extension.
///
/// Every configured scheme is visited in configuration order and the last one
/// marking `serve_<ext>` wins. Conflicts are not errors.
#[derive(Debug, Clone)]
pub struct SchemeResolver {
    settings: Arc<SchemeSettings>,
}

impl SchemeResolver {
    pub fn new(settings: Arc<SchemeSettings>) -> Self {
        Self { settings }
    }

    pub fn scheme_for_extension(&self, extension: &str) -> &str {
        let extension = extension.trim_start_matches('.');
        let mut extension_scheme = DEFAULT_SCHEME;

        for (scheme, config) in self.settings.iter() {
            if config.serves(extension) {
                // Don't break, the last configured one wins / 不中断，最后一个生效
                extension_scheme = scheme.as_str();
            }
        }

        extension_scheme
    }

    /// Scheme serving the extension of a path / 根据路径扩展名解析
    pub fn scheme_for_path(&self, path: &str) -> &str {
        self.scheme_for_extension(&uri::get_ext(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchemeConfig;
    use serde_json::json;

    fn settings() -> Arc<SchemeSettings> {
        Arc::new(
            SchemeSettings::new()
                .with("a", SchemeConfig::new("memory", json!({})).serve("js", true))
                .with("b", SchemeConfig::new("memory", json!({})).serve("css", true))
                .with("c", SchemeConfig::new("memory", json!({})).serve("js", true)),
        )
    }

    #[test]
    fn test_last_matching_scheme_wins() {
        let resolver = SchemeResolver::new(settings());
        assert_eq!(resolver.scheme_for_extension("js"), "c");
        assert_eq!(resolver.scheme_for_extension("css"), "b");
    }

    #[test]
    fn test_default_scheme_fallback() {
        let resolver = SchemeResolver::new(settings());
        assert_eq!(resolver.scheme_for_extension("png"), DEFAULT_SCHEME);

        let empty = SchemeResolver::new(Arc::new(SchemeSettings::new()));
        assert_eq!(empty.scheme_for_extension("js"), "public");
    }

    #[test]
    fn test_disabled_flag_does_not_shadow() {
        let settings = SchemeSettings::new()
            .with("a", SchemeConfig::new("memory", json!({})).serve("js", true))
            .with("b", SchemeConfig::new("memory", json!({})).serve("js", false));
        let resolver = SchemeResolver::new(Arc::new(settings));
        assert_eq!(resolver.scheme_for_extension("js"), "a");
    }

    #[test]
    fn test_scheme_for_path() {
        let resolver = SchemeResolver::new(settings());
        assert_eq!(resolver.scheme_for_path("js/app.JS"), "c");
        assert_eq!(resolver.scheme_for_extension(".css"), "b");
        assert_eq!(resolver.scheme_for_path("README"), "public");
    }
}
