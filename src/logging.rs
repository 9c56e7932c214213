//! 日志系统配置
//!
//! 控制台输出 + 可选的文件持久化。日志文件按启动时间命名、按大小滚动，
//! 启动时清理超过保留天数的旧文件

use crate::config::LogConfig;
use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// 日志文件名前缀
const LOG_PREFIX: &str = "live-preview.";
const LOG_SUFFIX: &str = ".log";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

struct RotatingState {
    dir: PathBuf,
    /// 启动时间戳（YYYY-MM-DD-HHMMSS）
    stamp: String,
    /// 当前滚动序号，0 为基础文件
    index: u32,
    file: File,
    written: u64,
    max_size: u64,
}

impl RotatingState {
    fn file_path(dir: &Path, stamp: &str, index: u32) -> PathBuf {
        if index == 0 {
            dir.join(format!("{}{}{}", LOG_PREFIX, stamp, LOG_SUFFIX))
        } else {
            dir.join(format!("{}{}_{}{}", LOG_PREFIX, stamp, index, LOG_SUFFIX))
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.index += 1;
        self.file = Self::open(&Self::file_path(&self.dir, &self.stamp, self.index))?;
        self.written = 0;
        Ok(())
    }
}

/// 按大小滚动的日志文件写入器
#[derive(Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<RotatingState>>,
}

impl RotatingFileWriter {
    pub fn new(dir: PathBuf, max_size: u64) -> io::Result<Self> {
        let stamp = Local::now().format("%Y-%m-%d-%H%M%S").to_string();
        let file = RotatingState::open(&RotatingState::file_path(&dir, &stamp, 0))?;
        Ok(Self {
            state: Arc::new(Mutex::new(RotatingState {
                dir,
                stamp,
                index: 0,
                file,
                written: 0,
                max_size,
            })),
        })
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.written > 0 && state.written + buf.len() as u64 > state.max_size {
            state.rotate()?;
        }
        let n = state.file.write(buf)?;
        state.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().file.flush()
    }
}

/// 日志系统守卫
/// 必须保持存活，否则后台写入线程会终止
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// 初始化日志系统
///
/// 环境变量 `RUST_LOG` 优先于配置中的级别
pub fn init_logging(config: &LogConfig) -> LogGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()));

    let writer = if config.enabled {
        match fs::create_dir_all(&config.log_dir)
            .and_then(|_| RotatingFileWriter::new(config.log_dir.clone(), config.max_file_size))
        {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!("创建日志文件失败: {:?}, 回退到仅控制台输出: {}", config.log_dir, e);
                None
            }
        }
    } else {
        None
    };

    let Some(writer) = writer else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();
        return LogGuard { _file_guard: None };
    };

    let (non_blocking, file_guard) = tracing_appender::non_blocking(writer);
    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(
        "日志系统初始化完成: 目录={:?}, 保留天数={}, 级别={}",
        config.log_dir, config.retention_days, config.level
    );

    let removed = cleanup_old_logs(&config.log_dir, config.retention_days);
    if removed > 0 {
        info!("已清理 {} 个过期日志文件", removed);
    }

    LogGuard {
        _file_guard: Some(file_guard),
    }
}

/// 清理超过保留天数的日志文件（按修改时间判断），返回删除数量
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u32) -> usize {
    let retention = Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);
    let now = SystemTime::now();

    let entries = match fs::read_dir(log_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("读取日志目录失败: {:?}, 错误: {}", log_dir, e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(LOG_PREFIX) && n.ends_with(LOG_SUFFIX))
            .unwrap_or(false);
        if !is_log || !path.is_file() {
            continue;
        }

        let expired = entry
            .metadata()
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .map(|age| age > retention)
            .unwrap_or(false);

        if expired {
            match fs::remove_file(&path) {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!("已删除过期日志文件: {:?}", path);
                }
                Err(e) => tracing::warn!("删除过期日志文件失败: {:?}, 错误: {}", path, e),
            }
        }
    }

    removed
}
