//! External download URLs / 外部下载链接

use anyhow::{Context, Result};

/// Route prefix served by the download endpoint / 下载路由前缀
pub const DOWNLOAD_ROUTE: &str = "_flysystem";

/// Builds fetchable URLs for scheme paths / 生成外部访问地址
pub trait UrlGenerator: Send + Sync {
    fn download_url(&self, scheme: &str, path: &str) -> String;
}

/// `<base>/_flysystem/<scheme>/<path>` with every segment percent-encoded
#[derive(Debug, Clone)]
pub struct DownloadRoute {
    base: url::Url,
}

impl DownloadRoute {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = url::Url::parse(base_url)
            .with_context(|| format!("Invalid download base url: {}", base_url))?;
        Ok(Self { base })
    }
}

impl UrlGenerator for DownloadRoute {
    fn download_url(&self, scheme: &str, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();

        format!(
            "{}/{}/{}/{}",
            self.base.as_str().trim_end_matches('/'),
            DOWNLOAD_ROUTE,
            urlencoding::encode(scheme),
            encoded.join("/")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url() {
        let route = DownloadRoute::new("http://example.com/site/").unwrap();
        assert_eq!(
            route.download_url("public", "css/my file.css"),
            "http://example.com/site/_flysystem/public/css/my%20file.css"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(DownloadRoute::new("not a url").is_err());
    }
}
