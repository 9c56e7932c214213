// 内存文件句柄
//
// 用于嵌入场景（内容由调用方直接提供）和测试

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

use super::handle::{now_millis, FileHandle};

#[derive(Debug)]
struct MemoryFileState {
    content: Vec<u8>,
    modified: i64,
}

/// 内存文件
///
/// 克隆出来的句柄共享同一份内容，调用 [`MemoryFile::write`] 会推进修改时间
#[derive(Debug, Clone)]
pub struct MemoryFile {
    name: String,
    hint: Option<String>,
    state: Arc<Mutex<MemoryFileState>>,
}

impl MemoryFile {
    /// 创建内存文件，修改时间为当前时间
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            hint: None,
            state: Arc::new(Mutex::new(MemoryFileState {
                content: content.into(),
                modified: now_millis(),
            })),
        }
    }

    /// 设置层级路径提示
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// 写入新内容
    ///
    /// 修改时间单调递增，即使在同一毫秒内连续写入
    pub fn write(&self, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock();
        state.content = content.into();
        state.modified = now_millis().max(state.modified + 1);
    }

    /// 直接设置修改时间
    pub fn set_modified(&self, modified: i64) {
        self.state.lock().modified = modified;
    }
}

#[async_trait]
impl FileHandle for MemoryFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn last_modified(&self) -> i64 {
        self.state.lock().modified
    }

    fn relative_path_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    async fn read(&self) -> io::Result<Vec<u8>> {
        Ok(self.state.lock().content.clone())
    }
}
