// 本地磁盘文件句柄

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

use super::handle::{system_time_millis, FileHandle};

/// 本地文件
///
/// 每次查询修改时间都会重新读取元数据，以便发现外部的保存操作
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    name: String,
    hint: Option<String>,
}

impl LocalFile {
    /// 创建本地文件句柄
    pub fn new(path: impl Into<PathBuf>, hint: Option<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, name, hint }
    }

    /// 磁盘路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileHandle for LocalFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn last_modified(&self) -> i64 {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(system_time_millis)
            .unwrap_or(0)
    }

    fn relative_path_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_local_file_reads_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        File::create(&path).unwrap().write_all(b"<h1>hi</h1>").unwrap();

        let file = LocalFile::new(&path, Some("/site/index.html".to_string()));
        assert_eq!(file.name(), "index.html");
        assert_eq!(file.relative_path_hint(), Some("/site/index.html"));
        assert!(file.last_modified() > 0);
        assert_eq!(file.read().await.unwrap(), b"<h1>hi</h1>");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempdir().unwrap();
        let file = LocalFile::new(dir.path().join("gone.txt"), None);

        assert_eq!(file.last_modified(), 0);
        assert!(file.read().await.is_err());
    }
}
