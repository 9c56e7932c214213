//! 服务路径解析
//!
//! 根据文件名和文件选择来源给出的层级路径提示，推导出
//! 相对于虚拟根目录的服务路径以及根目录名称

use serde::Serialize;

/// 虚拟根目录名称（没有真实的上层文件夹时使用）
pub const VIRTUAL_ROOT: &str = "/";

/// 解析后的服务路径
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPath {
    /// 相对于根目录的路径，如 `css/site.css`
    pub relative_path: String,
    /// 根目录名称，虚拟根目录为 `/`
    pub root_name: String,
}

impl ResolvedPath {
    /// 虚拟根目录下的平铺文件
    fn flat(name: &str) -> Self {
        Self {
            relative_path: name.to_string(),
            root_name: VIRTUAL_ROOT.to_string(),
        }
    }

    /// 是否挂在虚拟根目录下
    pub fn is_virtual_root(&self) -> bool {
        self.root_name == VIRTUAL_ROOT
    }
}

/// 解析服务路径
///
/// 规则：
/// - 没有提示、提示为空，或提示等于 `"/" + name`（平铺选择）时，
///   相对路径就是文件名，根目录为虚拟根 `/`
/// - 否则去掉开头的 `/`，按 `/` 切分，第一段是根目录名称，
///   剩余部分拼接为相对路径
///
/// 无法解析的提示（只剩一段、包含 `..`）一律退化为虚拟根目录下的平铺文件，
/// 本函数不会失败
pub fn resolve(name: &str, hint: Option<&str>) -> ResolvedPath {
    let hint = match hint {
        Some(h) if !h.is_empty() => h,
        _ => return ResolvedPath::flat(name),
    };

    if hint.strip_prefix('/') == Some(name) {
        return ResolvedPath::flat(name);
    }

    // Windows 下的选择结果可能使用反斜杠
    let normalized = hint.replace('\\', "/");
    let trimmed = normalized.strip_prefix('/').unwrap_or(&normalized);

    let mut segments = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                tracing::debug!("Path hint contains parent segment, falling back to root: {}", hint);
                return ResolvedPath::flat(name);
            }
            s => segments.push(s),
        }
    }

    if segments.len() < 2 {
        tracing::debug!("Path hint has no folder component, falling back to root: {}", hint);
        return ResolvedPath::flat(name);
    }

    let root_name = segments.remove(0).to_string();
    ResolvedPath {
        relative_path: segments.join("/"),
        root_name,
    }
}

/// 判断路径是否隐藏
///
/// 文件名以 `.` 开头，或相对路径中任意一段以 `.` 开头（隐藏目录）
pub fn is_hidden(name: &str, relative_path: &str) -> bool {
    name.starts_with('.') || relative_path.split('/').any(|segment| segment.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_no_hint_is_virtual_root() {
        let resolved = resolve("index.html", None);
        assert_eq!(resolved.relative_path, "index.html");
        assert_eq!(resolved.root_name, "/");
        assert!(resolved.is_virtual_root());

        let resolved = resolve("index.html", Some(""));
        assert!(resolved.is_virtual_root());
    }

    #[test]
    fn test_flat_drop_hint() {
        // 拖放单个文件时提示为 "/name"
        let resolved = resolve("app.js", Some("/app.js"));
        assert_eq!(resolved.relative_path, "app.js");
        assert_eq!(resolved.root_name, "/");
    }

    #[test]
    fn test_dropped_folder_hint() {
        let resolved = resolve("c.txt", Some("/a/b/c.txt"));
        assert_eq!(resolved.root_name, "a");
        assert_eq!(resolved.relative_path, "b/c.txt");
    }

    #[test]
    fn test_selected_folder_hint() {
        // 文件夹选择的提示没有开头的 /
        let resolved = resolve("site.css", Some("site/css/site.css"));
        assert_eq!(resolved.root_name, "site");
        assert_eq!(resolved.relative_path, "css/site.css");
    }

    #[test]
    fn test_single_segment_hint_falls_back() {
        let resolved = resolve("index.html", Some("/folder"));
        assert_eq!(resolved, ResolvedPath::flat("index.html"));

        let resolved = resolve("index.html", Some("other.html"));
        assert_eq!(resolved, ResolvedPath::flat("index.html"));
    }

    #[test]
    fn test_parent_segment_falls_back() {
        let resolved = resolve("x.html", Some("/site/../x.html"));
        assert!(resolved.is_virtual_root());
        assert_eq!(resolved.relative_path, "x.html");
    }

    #[test]
    fn test_empty_and_dot_segments_are_skipped() {
        let resolved = resolve("c.txt", Some("/a//./b/c.txt"));
        assert_eq!(resolved.root_name, "a");
        assert_eq!(resolved.relative_path, "b/c.txt");
    }

    #[test]
    fn test_backslash_hint() {
        let resolved = resolve("c.txt", Some("a\\b\\c.txt"));
        assert_eq!(resolved.root_name, "a");
        assert_eq!(resolved.relative_path, "b/c.txt");
    }

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(".env", ".env"));
        assert!(is_hidden("config", ".git/config"));
        assert!(is_hidden("a.js", "lib/.cache/a.js"));
        assert!(!is_hidden("index.html", "index.html"));
        assert!(!is_hidden("a.min.js", "js/a.min.js"));
    }

    proptest! {
        #[test]
        fn prop_no_hint_keeps_name(name in "[a-zA-Z0-9_.-]{1,20}") {
            let resolved = resolve(&name, None);
            prop_assert_eq!(resolved.root_name.as_str(), VIRTUAL_ROOT);
            prop_assert_eq!(resolved.relative_path, name);
        }

        #[test]
        fn prop_folder_hint_splits_root(
            root in "[a-z][a-z0-9_-]{0,10}",
            dirs in proptest::collection::vec("[a-z][a-z0-9_-]{0,8}", 0..4),
            name in "[a-z][a-z0-9_-]{0,8}\\.html",
        ) {
            let mut parts = dirs.clone();
            parts.push(name.clone());
            let relative = parts.join("/");
            let hint = format!("/{}/{}", root, relative);

            let resolved = resolve(&name, Some(&hint));
            prop_assert_eq!(resolved.root_name, root);
            prop_assert_eq!(resolved.relative_path, relative);
        }
    }
}
