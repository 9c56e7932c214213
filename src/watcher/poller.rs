//! 脏检查轮询
//!
//! 单次轮询（tick）：扫描所有记录，把脏记录推送到存储，写入成功后标记为已同步。
//! 写入失败的记录保持脏状态，下一次轮询自然重试，`clean` 是"已送达"的唯一判定。
//! 只要本次有脏记录（无论写入是否成功）就需要刷新一次

use parking_lot::Mutex;

use super::record::RecordSet;
use crate::store::ContentStore;

/// 单次轮询结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 本次成功写入存储的路径
    pub synced: Vec<String>,
    /// 本次写入失败、保持脏状态的路径
    pub failed: Vec<String>,
    /// 本次首次同步完成的首页路径
    pub index_discovered: Option<String>,
}

impl TickReport {
    /// 本次是否有脏记录（需要刷新页面）
    pub fn needs_reload(&self) -> bool {
        !self.synced.is_empty() || !self.failed.is_empty()
    }

    /// 本次处理的脏记录数
    pub fn dirty_count(&self) -> usize {
        self.synced.len() + self.failed.len()
    }
}

/// 执行一次轮询
///
/// 只在取快照时持有记录集合的锁，查询修改时间和写入都在锁外进行；
/// 写入逐个顺序等待，同一路径的写入保持调用顺序
pub async fn poll_once<S>(records: &Mutex<RecordSet>, store: &S) -> TickReport
where
    S: ContentStore + ?Sized,
{
    let snapshot = records.lock().snapshot();
    let dirty: Vec<_> = snapshot
        .into_iter()
        .filter(|(_, record)| record.is_dirty())
        .collect();
    let mut report = TickReport::default();

    for (path, record) in dirty {
        let serialized = match record.serialize().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path, e);
                report.failed.push(path);
                continue;
            }
        };
        let modified = serialized.modified;

        if let Err(e) = store.put(&serialized.path, serialized.content).await {
            tracing::warn!("Failed to store {}, will retry on next tick: {}", path, e);
            report.failed.push(path);
            continue;
        }

        {
            let mut guard = records.lock();
            if let Some(current) = guard.get_mut(&path) {
                if std::sync::Arc::ptr_eq(current.handle(), record.handle()) {
                    current.clean_to(modified);
                }
            }
        }

        tracing::debug!("Synced {}", path);
        report.synced.push(path);
    }

    report.index_discovered = records.lock().take_discovered_index();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{FileHandle, LocalFile, MemoryFile, SharedHandle};
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, OnceLock};

    /// 前 N 次写入失败的存储
    struct FlakyStore {
        inner: MemoryStore,
        failures_left: AtomicUsize,
    }

    #[async_trait]
    impl ContentStore for FlakyStore {
        async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::WriteFailed {
                    path: path.to_string(),
                    message: "quota exceeded".to_string(),
                });
            }
            self.inner.put(path, content).await
        }

        async fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.inner.get(path).await
        }
    }

    fn site(files: &[(&str, &str)]) -> (Vec<MemoryFile>, Mutex<RecordSet>) {
        let files: Vec<MemoryFile> = files
            .iter()
            .map(|&(hint, body)| {
                let name = hint.rsplit('/').next().unwrap_or(hint);
                MemoryFile::new(name, body.as_bytes().to_vec()).with_hint(hint)
            })
            .collect();
        let handles: Vec<SharedHandle> = files
            .iter()
            .map(|f| Arc::new(f.clone()) as SharedHandle)
            .collect();
        let set = RecordSet::from_handles(handles, "index.html");
        (files, Mutex::new(set))
    }

    #[tokio::test]
    async fn test_first_poll_syncs_everything() {
        let (_files, records) = site(&[
            ("/site/index.html", "home"),
            ("/site/css/site.css", "body{}"),
            ("/site/js/app.js", "go()"),
        ]);
        let store = MemoryStore::new();

        let report = poll_once(&records, &store).await;

        assert_eq!(report.synced.len(), 3);
        assert!(report.failed.is_empty());
        assert!(report.needs_reload());
        assert_eq!(report.index_discovered.as_deref(), Some("index.html"));
        assert_eq!(store.get("css/site.css").await, Some(b"body{}".to_vec()));
        assert!(records.lock().dirty().is_empty());

        // 没有变化时不需要刷新
        let report = poll_once(&records, &store).await;
        assert!(report.synced.is_empty());
        assert!(!report.needs_reload());
        assert!(report.index_discovered.is_none());
    }

    #[tokio::test]
    async fn test_only_changed_file_is_synced() {
        let (files, records) = site(&[("/site/index.html", "home"), ("/site/about.html", "me")]);
        let store = MemoryStore::new();
        poll_once(&records, &store).await;

        files[1].write("us");
        let report = poll_once(&records, &store).await;

        assert_eq!(report.synced, vec!["about.html".to_string()]);
        assert!(report.index_discovered.is_none());
        assert_eq!(store.get("about.html").await, Some(b"us".to_vec()));
    }

    #[tokio::test]
    async fn test_failed_put_stays_dirty_and_retries() {
        let (_files, records) = site(&[("/site/index.html", "home")]);
        let store = FlakyStore {
            inner: MemoryStore::new(),
            failures_left: AtomicUsize::new(1),
        };

        let report = poll_once(&records, &store).await;
        assert_eq!(report.failed, vec!["index.html".to_string()]);
        assert!(report.needs_reload());
        assert_eq!(report.dirty_count(), 1);
        assert!(report.index_discovered.is_none());
        assert!(records.lock().get("index.html").unwrap().is_dirty());

        let report = poll_once(&records, &store).await;
        assert_eq!(report.synced, vec!["index.html".to_string()]);
        assert_eq!(report.index_discovered.as_deref(), Some("index.html"));
        assert_eq!(store.get("index.html").await, Some(b"home".to_vec()));
    }

    #[tokio::test]
    async fn test_deleted_local_file_is_skipped_until_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.html");
        std::fs::write(&path, "x").unwrap();
        let handle: SharedHandle = Arc::new(LocalFile::new(&path, Some("/site/gone.html".into())));
        let records = Mutex::new(RecordSet::from_handles(vec![handle], "index.html"));
        std::fs::remove_file(&path).unwrap();
        // 元数据读取失败时修改时间为 0，不再是脏记录
        let report = poll_once(&records, &MemoryStore::new()).await;
        assert_eq!(report, TickReport::default());

        std::fs::write(&path, "back").unwrap();
        let report = poll_once(&records, &MemoryStore::new()).await;
        assert_eq!(report.synced, vec!["gone.html".to_string()]);
        assert!(report.needs_reload());
    }

    /// 查询修改时间时检查记录集合的锁是否被占用
    struct LockCheckingFile {
        inner: MemoryFile,
        records: Arc<OnceLock<Arc<Mutex<RecordSet>>>>,
        lock_held: Arc<AtomicBool>,
    }

    impl std::fmt::Debug for LockCheckingFile {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("LockCheckingFile")
                .field("inner", &self.inner)
                .finish()
        }
    }

    #[async_trait]
    impl FileHandle for LockCheckingFile {
        fn name(&self) -> &str {
            self.inner.name()
        }

        fn last_modified(&self) -> i64 {
            if let Some(records) = self.records.get() {
                if records.try_lock().is_none() {
                    self.lock_held.store(true, Ordering::SeqCst);
                }
            }
            self.inner.last_modified()
        }

        fn relative_path_hint(&self) -> Option<&str> {
            self.inner.relative_path_hint()
        }

        async fn read(&self) -> std::io::Result<Vec<u8>> {
            self.inner.read().await
        }
    }

    #[tokio::test]
    async fn test_modification_times_are_read_outside_the_lock() {
        let slot = Arc::new(OnceLock::new());
        let lock_held = Arc::new(AtomicBool::new(false));
        let handles: Vec<SharedHandle> = ["a.html", "b.html"]
            .iter()
            .map(|name| {
                Arc::new(LockCheckingFile {
                    inner: MemoryFile::new(*name, b"x".to_vec()).with_hint(format!("/site/{}", name)),
                    records: slot.clone(),
                    lock_held: lock_held.clone(),
                }) as SharedHandle
            })
            .collect();
        let records = Arc::new(Mutex::new(RecordSet::from_handles(handles, "index.html")));
        slot.set(records.clone()).unwrap();

        let report = poll_once(&records, &MemoryStore::new()).await;
        assert_eq!(report.synced.len(), 2);
        assert!(!lock_held.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_empty_set_is_noop() {
        let records = Mutex::new(RecordSet::new());
        let store = MemoryStore::new();

        let report = poll_once(&records, &store).await;
        assert_eq!(report, TickReport::default());
        assert!(store.is_empty());
    }
}
