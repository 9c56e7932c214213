// 内存内容存储

use async_trait::async_trait;
use dashmap::DashMap;

use super::{ContentStore, StoreError};

/// 基于 DashMap 的内存存储
///
/// 进程退出即丢失，不做跨会话持久化
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 已存储的路径数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 所有已存储路径（已排序）
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }

    /// 清空存储
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(path.to_string(), content);
        Ok(())
    }

    async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }
}
