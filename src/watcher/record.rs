// 活跃文件记录
//
// 每个记录包装一个文件句柄，并记录最近一次成功写入存储时的修改时间

use std::collections::HashMap;
use std::io;

use crate::path::{self, ResolvedPath};
use crate::source::SharedHandle;

/// 推送到存储的文件快照
#[derive(Debug, Clone)]
pub struct SerializedFile {
    /// 服务路径
    pub path: String,
    /// 文件内容
    pub content: Vec<u8>,
    /// 读取内容前观察到的修改时间
    pub modified: i64,
}

/// 活跃文件记录
#[derive(Debug, Clone)]
pub struct ActiveFileRecord {
    handle: SharedHandle,
    /// 已同步的修改时间，初始为 0，保证新加载的文件在首次轮询时一定被同步
    synced_mod_time: i64,
}

impl ActiveFileRecord {
    pub fn new(handle: SharedHandle) -> Self {
        Self {
            handle,
            synced_mod_time: 0,
        }
    }

    pub fn handle(&self) -> &SharedHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// 解析当前服务路径（每次根据句柄重新计算）
    pub fn resolved(&self) -> ResolvedPath {
        path::resolve(self.handle.name(), self.handle.relative_path_hint())
    }

    pub fn path(&self) -> String {
        self.resolved().relative_path
    }

    pub fn synced_mod_time(&self) -> i64 {
        self.synced_mod_time
    }

    /// 源文件的修改时间是否晚于已同步的修改时间
    pub fn is_dirty(&self) -> bool {
        self.handle.last_modified() > self.synced_mod_time
    }

    /// 标记为已同步（只能在存储写入成功之后调用）
    pub fn clean(&mut self) {
        self.synced_mod_time = self.handle.last_modified();
    }

    /// 标记为已同步到指定修改时间
    ///
    /// 写入期间发生的新保存会使记录继续保持脏状态
    pub fn clean_to(&mut self, modified: i64) {
        self.synced_mod_time = self.synced_mod_time.max(modified);
    }

    pub fn is_hidden(&self) -> bool {
        path::is_hidden(self.handle.name(), &self.path())
    }

    /// 读取当前内容，生成推送到存储的快照
    pub async fn serialize(&self) -> io::Result<SerializedFile> {
        let modified = self.handle.last_modified();
        let content = self.handle.read().await?;
        Ok(SerializedFile {
            path: self.path(),
            content,
            modified,
        })
    }
}

/// 记录集合
///
/// 以服务路径为键，保持批次中的插入顺序；重复路径以后出现的为准，位置不变
#[derive(Debug, Default)]
pub struct RecordSet {
    records: Vec<(String, ActiveFileRecord)>,
    index: HashMap<String, usize>,
    /// 等待首次同步后通知的首页路径
    pending_index: Option<String>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据一批文件句柄构建新集合，隐藏文件被忽略
    ///
    /// `index_file` 为首页文件名，第一个匹配的记录（优先根目录下的）会在首次同步后被通知
    pub fn from_handles<I>(handles: I, index_file: &str) -> Self
    where
        I: IntoIterator<Item = SharedHandle>,
    {
        let mut set = Self::new();
        let mut hidden = 0usize;

        for handle in handles {
            let record = ActiveFileRecord::new(handle);
            if record.is_hidden() {
                hidden += 1;
                continue;
            }
            set.insert(record);
        }

        if hidden > 0 {
            tracing::debug!("Ignored {} hidden files", hidden);
        }

        set.pending_index = set
            .records
            .iter()
            .filter(|(_, r)| r.name() == index_file)
            .map(|(path, _)| path.clone())
            .min_by_key(|path| path != index_file);

        set
    }

    /// 插入记录，键为记录当前的服务路径
    pub fn insert(&mut self, record: ActiveFileRecord) {
        let key = record.path();
        match self.index.get(&key) {
            Some(&pos) => self.records[pos].1 = record,
            None => {
                self.index.insert(key.clone(), self.records.len());
                self.records.push((key, record));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ActiveFileRecord> {
        self.index.get(path).map(|&pos| &self.records[pos].1)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut ActiveFileRecord> {
        match self.index.get(path) {
            Some(&pos) => Some(&mut self.records[pos].1),
            None => None,
        }
    }

    /// 按插入顺序遍历 (路径, 记录)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActiveFileRecord)> {
        self.records.iter().map(|(path, r)| (path.as_str(), r))
    }

    pub fn paths(&self) -> Vec<String> {
        self.records.iter().map(|(path, _)| path.clone()).collect()
    }

    /// 全部记录的 (路径, 记录快照)，不查询修改时间
    pub fn snapshot(&self) -> Vec<(String, ActiveFileRecord)> {
        self.records.clone()
    }

    /// 当前脏记录的 (路径, 记录快照)
    ///
    /// 会对每个记录查询修改时间，本地文件需要读取元数据
    pub fn dirty(&self) -> Vec<(String, ActiveFileRecord)> {
        self.records
            .iter()
            .filter(|(_, r)| r.is_dirty())
            .map(|(path, r)| (path.clone(), r.clone()))
            .collect()
    }

    /// 根目录名称（取第一个记录的根目录）
    pub fn root_name(&self) -> Option<String> {
        self.records.first().map(|(_, r)| r.resolved().root_name)
    }

    /// 首页已同步过一次时取出其路径，之后不会再返回
    pub fn take_discovered_index(&mut self) -> Option<String> {
        let path = self.pending_index.as_ref()?;
        let synced = self
            .get(path)
            .map(|r| r.synced_mod_time() > 0)
            .unwrap_or(false);
        if synced {
            self.pending_index.take()
        } else {
            None
        }
    }
}
