//! 目录列表
//!
//! 展示当前正在服务的文件：根目录为虚拟根时标题为 "Virtual Directory"，
//! 否则为 `Serving "<root>"`

use serde::Serialize;

use crate::path::VIRTUAL_ROOT;
use crate::watcher::RecordSet;

/// 预览窗口名称，列表里的链接都在同一个窗口中打开
pub const PREVIEW_TARGET: &str = "live_file";

/// 目录列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    /// 根目录名称，虚拟根为 `/`
    pub root_name: String,
    /// 服务路径（按加载顺序）
    pub entries: Vec<String>,
}

impl DirectoryListing {
    /// 从记录集合构建列表
    pub fn from_records(records: &RecordSet) -> Self {
        Self {
            root_name: records
                .root_name()
                .unwrap_or_else(|| VIRTUAL_ROOT.to_string()),
            entries: records.paths(),
        }
    }

    pub fn title(&self) -> String {
        if self.root_name == VIRTUAL_ROOT {
            "Virtual Directory".to_string()
        } else {
            format!("Serving \"{}\"", self.root_name)
        }
    }

    /// 渲染为 HTML 片段
    pub fn render_html(&self) -> String {
        let mut html = String::new();
        if self.root_name == VIRTUAL_ROOT {
            html.push_str("<h3>Virtual Directory</h3>\n");
        } else {
            html.push_str(&format!(
                "<h3>Serving <i>\"{}\"</i></h3>\n",
                escape_html(&self.root_name)
            ));
        }

        html.push_str("<ul>\n");
        for path in &self.entries {
            html.push_str(&format!(
                "<li><a href=\"{}\" target=\"{}\">{}</a></li>\n",
                encode_href(path),
                PREVIEW_TARGET,
                escape_html(path)
            ));
        }
        html.push_str("</ul>\n");
        html
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// 逐段百分号编码，保留 `/`
fn encode_href(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
