// 文件句柄抽象

use async_trait::async_trait;
use std::fmt::Debug;
use std::io;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// 文件句柄
///
/// 由外部的文件选择机制提供。句柄身份稳定，但修改时间可能在外部变化
/// （例如用户在编辑器里重新保存了文件）
#[async_trait]
pub trait FileHandle: Send + Sync + Debug {
    /// 文件名（不含目录）
    fn name(&self) -> &str;

    /// 最后修改时间（毫秒时间戳），无法获取时返回 0
    fn last_modified(&self) -> i64;

    /// 层级路径提示
    ///
    /// 文件夹选择为 `root/sub/file`，拖放遍历为 `/root/sub/file`，平铺选择为 `None`
    fn relative_path_hint(&self) -> Option<&str>;

    /// 读取当前内容
    async fn read(&self) -> io::Result<Vec<u8>>;
}

/// 共享文件句柄
pub type SharedHandle = Arc<dyn FileHandle>;

/// 当前时间戳（毫秒）
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// SystemTime 转毫秒时间戳
pub(crate) fn system_time_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
