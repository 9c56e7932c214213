// Live Preview Library
// 本地静态站点预览核心库：脏检查轮询 + 内容存储

// 配置管理模块
pub mod config;

// 日志模块
pub mod logging;

// 服务路径解析
pub mod path;

// 文件来源（选择 / 拖放 / 平铺）
pub mod source;

// 内容存储与请求拦截
pub mod store;

// 文件监视器
pub mod watcher;

// 目录列表
pub mod listing;

// 导出常用类型
pub use config::{AppConfig, LogConfig, SelectionConfig, WatcherConfig};
pub use listing::DirectoryListing;
pub use path::{resolve, ResolvedPath};
pub use source::{FileHandle, LocalFile, MemoryFile, Selection, SelectionMode, SharedHandle};
pub use store::{lookup, ContentStore, MemoryStore, StoreError};
pub use watcher::{ActiveFileRecord, TickReport, WatchEvent, Watcher, WatcherState};
