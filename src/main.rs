use live_preview::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    logging, ContentStore, MemoryStore, Selection, WatchEvent, Watcher,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// 确定要服务的目录：命令行参数优先，其次是配置文件，最后是当前目录
fn resolve_root(config: &AppConfig) -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| config.selection.root.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_config = AppConfig::load_log_config(DEFAULT_CONFIG_PATH).await;

    // 必须保持 _log_guard 存活
    let _log_guard = logging::init_logging(&log_config);

    info!("Live Preview v{} 启动中...", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load_or_default(DEFAULT_CONFIG_PATH).await;

    let root = resolve_root(&config);
    let files = Selection::new(&root)
        .with_mode(config.selection.mode)
        .with_follow_symlinks(config.selection.follow_symlinks)
        .scan_async()
        .await?;

    let store = Arc::new(MemoryStore::new());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut watcher = Watcher::new(store.clone(), event_tx, config.watcher.clone());
    watcher.load(files);

    let listing = watcher.listing();
    info!("{} ({} 个文件)", listing.title(), listing.entries.len());
    for entry in &listing.entries {
        tracing::debug!("  {}", entry);
    }

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(WatchEvent::IndexDiscovered { path }) => {
                    let size = store.get(&path).await.map(|c| c.len()).unwrap_or(0);
                    info!("首页已就绪，可以打开预览: {} ({} 字节)", path, size);
                }
                Some(WatchEvent::Reload) => {
                    info!("内容已更新，刷新预览 (已缓存 {} 个文件)", store.len());
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("收到 Ctrl+C，停止监视...");
                break;
            }
        }
    }

    watcher.pause();
    info!("已安全退出");

    Ok(())
}
