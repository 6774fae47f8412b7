/// URI processing utility functions / URI 处理工具函数

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Split a URI into scheme and target / 拆分 URI 为 scheme 与目标路径
/// `public://a/b.txt` -> (Some("public"), "a/b.txt")
/// `a/b.txt` -> (None, "a/b.txt")
pub fn split_uri(uri: &str) -> (Option<&str>, String) {
    match uri.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), strip_separators(rest).to_string()),
        None => (None, strip_separators(uri).to_string()),
    }
}

/// Scheme part of a URI, if any / 获取 URI 的 scheme
pub fn scheme(uri: &str) -> Option<&str> {
    uri.split_once("://").map(|(scheme, _)| scheme)
}

/// Trim leading and trailing slashes and backslashes / 去除首尾分隔符
fn strip_separators(path: &str) -> &str {
    path.trim_matches(&SEPARATORS[..])
}

/// Parent of a URI, keeping its scheme / 获取父级 URI
/// `public://a/b/c.txt` -> `public://a/b`
/// `public://c.txt` -> `public://`
pub fn dirname(uri: &str) -> String {
    let (scheme, raw) = match uri.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, uri),
    };

    let trimmed = raw.trim_end_matches(&SEPARATORS[..]);
    let parent = match trimmed.rfind(&SEPARATORS[..]) {
        Some(pos) => trimmed[..pos].trim_matches(&SEPARATORS[..]),
        // "." collapses to the root / 无父级时为根
        None => "",
    };

    match scheme {
        Some(scheme) => format!("{}://{}", scheme, parent),
        None => parent.to_string(),
    }
}

/// Get file extension (lowercase) / 获取文件扩展名
pub fn get_ext(path: &str) -> String {
    std::path::Path::new(&path.replace('\\', "/"))
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Join a directory target and a child name / 拼接路径
pub fn join(dir: &str, name: &str) -> String {
    let dir = strip_separators(dir);
    let name = strip_separators(name);
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_uri() {
        assert_eq!(split_uri("public://a/b.txt"), (Some("public"), "a/b.txt".to_string()));
        assert_eq!(split_uri("s3:///a/b/"), (Some("s3"), "a/b".to_string()));
        assert_eq!(split_uri("zip://\\a\\b\\"), (Some("zip"), "a\\b".to_string()));
        assert_eq!(split_uri("/var/tmp/x"), (None, "var/tmp/x".to_string()));
        assert_eq!(split_uri("a://b://c"), (Some("a"), "b://c".to_string()));
        assert_eq!(split_uri("public://"), (Some("public"), String::new()));
    }

    #[test]
    fn test_dirname() {
        assert_eq!(dirname("public://a/b/c.txt"), "public://a/b");
        assert_eq!(dirname("public://c.txt"), "public://");
        assert_eq!(dirname("public:///c.txt"), "public://");
        assert_eq!(dirname("public://a/b/"), "public://a");
        assert_eq!(dirname("public://a\\b.txt"), "public://a");
        assert_eq!(dirname("a/b/c"), "a/b");
        assert_eq!(dirname("c"), "");
        assert_eq!(dirname("/a"), "");
    }

    #[test]
    fn test_get_ext() {
        assert_eq!(get_ext("css/site.CSS"), "css");
        assert_eq!(get_ext("a\\b\\app.js"), "js");
        assert_eq!(get_ext("README"), "");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a.txt"), "a.txt");
        assert_eq!(join("dir/", "/a.txt"), "dir/a.txt");
    }
}
