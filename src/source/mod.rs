// 文件来源模块
//
// 对应浏览器里的文件选择 / 拖放：提供文件句柄抽象以及从本地目录构建句柄批次的能力

mod handle;
mod local;
mod memory;
mod scanner;

pub use handle::{now_millis, FileHandle, SharedHandle};
pub use local::LocalFile;
pub use memory::MemoryFile;
pub use scanner::{select_files, Selection, SelectionError, SelectionMode};
