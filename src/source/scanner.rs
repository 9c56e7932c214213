// 本地目录选择
//
// 以浏览器的三种文件选择方式构建句柄批次：
// - 文件夹选择：提示形如 `root/sub/file`
// - 拖放遍历：提示形如 `/root/sub/file`
// - 平铺选择：没有提示

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use super::handle::SharedHandle;
use super::local::LocalFile;

/// 选择方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// 选择整个文件夹
    #[default]
    Folder,
    /// 拖放文件夹
    Drop,
    /// 只选择文件夹顶层的文件
    Flat,
}

/// 选择错误
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("目录不存在: {0}")]
    NotFound(PathBuf),
    #[error("指定路径不是目录: {0}")]
    NotADirectory(PathBuf),
    #[error("扫描任务失败: {0}")]
    TaskFailed(String),
}

/// 本地目录选择器
#[derive(Debug, Clone)]
pub struct Selection {
    /// 选择的根目录
    root: PathBuf,
    /// 选择方式
    mode: SelectionMode,
    /// 是否跟随符号链接
    follow_symlinks: bool,
}

impl Selection {
    /// 创建新的目录选择器
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: SelectionMode::default(),
            follow_symlinks: false,
        }
    }

    /// 设置选择方式
    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// 设置是否跟随符号链接
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// 扫描目录，返回文件句柄批次
    ///
    /// 隐藏目录不会被遍历；隐藏文件仍然返回，由监视器统一过滤
    pub fn scan(&self) -> Result<Vec<SharedHandle>, SelectionError> {
        if !self.root.exists() {
            return Err(SelectionError::NotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(SelectionError::NotADirectory(self.root.clone()));
        }

        let root = dunce::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());
        let root_name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "root".to_string());

        let mut walker = WalkDir::new(&root).follow_links(self.follow_symlinks);
        if self.mode == SelectionMode::Flat {
            walker = walker.max_depth(1);
        }

        let handles: Vec<SharedHandle> = walker
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Failed to read entry during scan: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = relative_slash_path(&root, entry.path())?;
                let hint = match self.mode {
                    SelectionMode::Folder => Some(format!("{}/{}", root_name, relative)),
                    SelectionMode::Drop => Some(format!("/{}/{}", root_name, relative)),
                    SelectionMode::Flat => None,
                };
                Some(Arc::new(LocalFile::new(entry.into_path(), hint)) as SharedHandle)
            })
            .collect();

        tracing::debug!(
            "Scanned {} files under {:?} (mode: {:?})",
            handles.len(),
            root,
            self.mode
        );
        Ok(handles)
    }

    /// 异步扫描目录
    pub async fn scan_async(&self) -> Result<Vec<SharedHandle>, SelectionError> {
        let selection = self.clone();
        tokio::task::spawn_blocking(move || selection.scan())
            .await
            .map_err(|e| SelectionError::TaskFailed(e.to_string()))?
    }
}

/// 平铺选择若干文件（没有层级提示）
pub fn select_files(paths: &[PathBuf]) -> Vec<SharedHandle> {
    paths
        .iter()
        .filter(|p| p.is_file())
        .map(|p| Arc::new(LocalFile::new(p.clone(), None)) as SharedHandle)
        .collect()
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

/// 计算以 `/` 分隔的相对路径
fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
