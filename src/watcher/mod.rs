//! 文件监视器
//!
//! 持有当前的记录集合和唯一的轮询任务：
//! - `load` 替换整个记录集合并（重新）开始轮询
//! - `pause` 取消轮询，之后不会再有新的轮询开始
//! - 每次轮询把脏文件推送到存储，只要本次有脏文件就发出一次 `Reload`

mod poller;
mod record;

pub use poller::{poll_once, TickReport};
pub use record::{ActiveFileRecord, RecordSet, SerializedFile};

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::WatcherConfig;
use crate::listing::DirectoryListing;
use crate::source::SharedHandle;
use crate::store::ContentStore;

/// 监视器事件（由 UI 层消费）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// 有内容更新，刷新预览页面
    Reload,
    /// 批次中的首页首次同步完成，可以打开预览
    IndexDiscovered { path: String },
}

/// 监视器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// 没有轮询
    Idle,
    /// 正在轮询
    Polling,
}

/// 一代轮询共享的上下文
///
/// 每次 `load` 创建新的记录集合；轮询闸门在各代之间共享，保证轮询不会重叠
#[derive(Clone)]
struct PollContext {
    records: Arc<Mutex<RecordSet>>,
    store: Arc<dyn ContentStore>,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
    tick_gate: Arc<tokio::sync::Mutex<()>>,
    receiver_gone: Arc<AtomicBool>,
}

impl PollContext {
    /// 执行一次轮询并发出事件
    ///
    /// 拿到闸门后若令牌已取消则放弃本次轮询
    async fn tick(&self, cancel_token: Option<&CancellationToken>) -> Option<TickReport> {
        let _gate = self.tick_gate.lock().await;
        if cancel_token.map_or(false, |t| t.is_cancelled()) {
            return None;
        }

        let report = poll_once(&self.records, self.store.as_ref()).await;

        if let Some(path) = &report.index_discovered {
            tracing::info!("Index discovered: {}", path);
            self.emit(WatchEvent::IndexDiscovered { path: path.clone() });
        }
        if report.needs_reload() {
            tracing::debug!(
                "Reload after {} dirty files ({} synced)",
                report.dirty_count(),
                report.synced.len()
            );
            self.emit(WatchEvent::Reload);
        }

        Some(report)
    }

    fn emit(&self, event: WatchEvent) {
        if self.event_tx.send(event).is_err() && !self.receiver_gone.swap(true, Ordering::Relaxed) {
            tracing::warn!("Watch event receiver dropped, events will be discarded");
        }
    }
}

/// 文件监视器
pub struct Watcher {
    store: Arc<dyn ContentStore>,
    event_tx: mpsc::UnboundedSender<WatchEvent>,
    config: WatcherConfig,
    records: Arc<Mutex<RecordSet>>,
    tick_gate: Arc<tokio::sync::Mutex<()>>,
    receiver_gone: Arc<AtomicBool>,
    /// 当前轮询任务的取消令牌，`None` 表示空闲
    cancel_token: Option<CancellationToken>,
}

impl Watcher {
    /// 创建监视器（初始为空闲状态）
    ///
    /// 轮询间隔为 0 时回退到默认间隔
    pub fn new(
        store: Arc<dyn ContentStore>,
        event_tx: mpsc::UnboundedSender<WatchEvent>,
        mut config: WatcherConfig,
    ) -> Self {
        if config.poll_interval_ms == 0 {
            let fallback = WatcherConfig::default().poll_interval_ms;
            tracing::warn!("Poll interval must be positive, falling back to {} ms", fallback);
            config.poll_interval_ms = fallback;
        }

        Self {
            store,
            event_tx,
            config,
            records: Arc::new(Mutex::new(RecordSet::new())),
            tick_gate: Arc::new(tokio::sync::Mutex::new(())),
            receiver_gone: Arc::new(AtomicBool::new(false)),
            cancel_token: None,
        }
    }

    /// 加载一批文件，替换当前记录集合并开始轮询
    ///
    /// 必须在 tokio 运行时中调用
    pub fn load<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = SharedHandle>,
    {
        let files: Vec<SharedHandle> = files.into_iter().collect();
        tracing::info!("Watching {} files", files.len());

        self.pause();
        let set = RecordSet::from_handles(files, &self.config.index_file);
        tracing::debug!("Record set built with {} entries", set.len());
        self.records = Arc::new(Mutex::new(set));
        self.start();
    }

    /// 暂停轮询（幂等）
    ///
    /// 正在进行的轮询允许完成，但不会再开始新的轮询
    pub fn pause(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
            tracing::debug!("Polling paused");
        }
    }

    /// 在当前记录集合上恢复轮询，已在轮询时不做任何事
    pub fn resume(&mut self) {
        if self.state() == WatcherState::Idle {
            self.start();
        }
    }

    /// 当前状态
    pub fn state(&self) -> WatcherState {
        match &self.cancel_token {
            Some(token) if !token.is_cancelled() => WatcherState::Polling,
            _ => WatcherState::Idle,
        }
    }

    /// 立即执行一次轮询（与定时轮询串行）
    pub async fn tick_now(&self) -> TickReport {
        self.context().tick(None).await.unwrap_or_default()
    }

    /// 当前记录的服务路径（按加载顺序）
    pub fn paths(&self) -> Vec<String> {
        self.records.lock().paths()
    }

    /// 当前记录数
    pub fn file_count(&self) -> usize {
        self.records.lock().len()
    }

    /// 当前脏记录数
    pub fn dirty_count(&self) -> usize {
        let snapshot = self.records.lock().snapshot();
        snapshot.iter().filter(|(_, r)| r.is_dirty()).count()
    }

    /// 根目录名称
    pub fn root_name(&self) -> Option<String> {
        self.records.lock().root_name()
    }

    /// 目录列表
    pub fn listing(&self) -> DirectoryListing {
        DirectoryListing::from_records(&self.records.lock())
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }

    fn context(&self) -> PollContext {
        PollContext {
            records: self.records.clone(),
            store: self.store.clone(),
            event_tx: self.event_tx.clone(),
            tick_gate: self.tick_gate.clone(),
            receiver_gone: self.receiver_gone.clone(),
        }
    }

    /// 启动新的轮询任务（调用前必须已取消旧任务）
    fn start(&mut self) {
        let token = CancellationToken::new();
        let ctx = self.context();
        let period = self.config.poll_interval();
        let task_token = token.clone();

        tokio::spawn(async move {
            run_poll_loop(ctx, period, task_token).await;
        });

        self.cancel_token = Some(token);
        tracing::debug!("Polling started (interval: {:?})", period);
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.pause();
    }
}

/// 轮询循环
///
/// 第一次轮询在一个间隔之后发生；错过的轮询直接跳过，不会补发
async fn run_poll_loop(ctx: PollContext, period: Duration, cancel_token: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = interval.tick() => {}
        }

        if ctx.tick(Some(&cancel_token)).await.is_none() {
            break;
        }
    }

    tracing::debug!("Poll loop stopped");
}
