// 配置管理模块

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::source::SelectionMode;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/app.toml";

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 监视器配置
    #[serde(default)]
    pub watcher: WatcherConfig,
    /// 文件选择配置
    #[serde(default)]
    pub selection: SelectionConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 监视器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// 轮询间隔（毫秒，默认 100）
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 首页文件名，首次同步后通知 UI 打开预览
    #[serde(default = "default_index_file")]
    pub index_file: String,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_index_file() -> String {
    "index.html".to_string()
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            index_file: default_index_file(),
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            anyhow::bail!("轮询间隔必须大于 0 毫秒");
        }
        if self.index_file.is_empty() || self.index_file.contains('/') {
            anyhow::bail!("首页文件名无效: {:?}", self.index_file);
        }
        Ok(())
    }
}

/// 文件选择配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// 默认服务的目录（命令行参数优先）
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// 选择方式：folder / drop / flat
    #[serde(default)]
    pub mode: SelectionMode,
    /// 是否跟随符号链接
    #[serde(default)]
    pub follow_symlinks: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 是否启用日志文件持久化
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
    /// 日志文件保存目录
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 日志保留天数（默认 7 天）
    #[serde(default = "default_log_retention_days")]
    pub retention_days: u32,
    /// 日志级别（默认 info）
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 单个日志文件最大大小（字节，默认 10MB）
    #[serde(default = "default_log_max_file_size")]
    pub max_file_size: u64,
}

fn default_log_enabled() -> bool {
    false
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_retention_days() -> u32 {
    7
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
            log_dir: default_log_dir(),
            retention_days: default_log_retention_days(),
            level: default_log_level(),
            max_file_size: default_log_max_file_size(),
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: AppConfig = toml::from_str(&content).context("Failed to parse config file")?;
        config.watcher.validate().context("监视器配置无效")?;

        Ok(config)
    }

    /// 只读取日志配置
    ///
    /// 在日志系统初始化之前调用，其余配置无效时也能拿到日志配置，
    /// 文件不存在或 `[log]` 无效时返回默认值
    pub async fn load_log_config(path: impl AsRef<Path>) -> LogConfig {
        let Ok(content) = fs::read_to_string(path.as_ref()).await else {
            return LogConfig::default();
        };
        toml::from_str::<toml::Value>(&content)
            .ok()
            .and_then(|config| config.get("log").cloned())
            .and_then(|log| log.try_into::<LogConfig>().ok())
            .unwrap_or_default()
    }

    /// 加载配置，文件不存在或无效时使用默认配置
    ///
    /// 会记录加载结果，应在日志系统初始化之后调用
    pub async fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(path).await {
            Ok(config) => {
                tracing::info!("配置文件加载成功: {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("配置文件加载失败，使用默认配置: {:#}", e);
                Self::default()
            }
        }
    }
}
