//! 内容存储模块
//!
//! 保存每个服务路径的最新内容，供被拦截的页面请求直接命中

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 写入失败
    #[error("写入 {path} 失败: {message}")]
    WriteFailed { path: String, message: String },
}

/// 内容存储
///
/// 同一路径重复写入会覆盖旧内容。不同路径之间不要求顺序，
/// 同一路径的写入必须按调用顺序生效
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// 写入路径的最新内容
    async fn put(&self, path: &str, content: Vec<u8>) -> Result<(), StoreError>;

    /// 读取路径的内容
    async fn get(&self, path: &str) -> Option<Vec<u8>>;
}

/// 默认文档名
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// 将请求路径规范化为存储键
///
/// 去掉查询串和片段、开头的 `/`，并做百分号解码；
/// 空路径或以 `/` 结尾的目录路径映射到该目录下的 `index.html`
pub fn request_key(request_path: &str) -> String {
    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let path = path.trim_start_matches('/');
    let decoded = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());

    if decoded.is_empty() {
        DEFAULT_DOCUMENT.to_string()
    } else if decoded.ends_with('/') {
        format!("{}{}", decoded, DEFAULT_DOCUMENT)
    } else {
        decoded
    }
}

/// 拦截请求：命中则返回存储内容，未命中返回 `None`，由调用方回退到网络
pub async fn lookup<S: ContentStore + ?Sized>(store: &S, request_path: &str) -> Option<Vec<u8>> {
    let key = request_key(request_path);
    let hit = store.get(&key).await;
    if hit.is_none() {
        tracing::debug!("Store miss for request {} (key: {})", request_path, key);
    }
    hit
}
