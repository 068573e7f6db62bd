//! 搜索结果与文本格式化

use serde::{Deserialize, Serialize};

/// 单条搜索结果；每次搜索新建，只用于拼接返回文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// 来源工具（serper / tavily）
    pub source: String,
    pub published_at: Option<String>,
}

/// 把结果列表格式化为给用户看的文本
///
/// ```text
/// 🔍 Serper搜索结果 - 查询: 熊猫
///
/// 1. **标题**
///    摘要
///    链接: https://...
/// ```
pub fn format_results(tool_name: &str, query: &str, results: &[SearchResult]) -> String {
    let mut out = format!("🔍 {}搜索结果 - 查询: {}\n\n", tool_name, query);
    if results.is_empty() {
        out.push_str("未找到相关结果。\n");
        return out;
    }
    for (i, r) in results.iter().enumerate() {
        out.push_str(&format!("{}. **{}**\n", i + 1, r.title));
        out.push_str(&format!("   {}\n", r.snippet));
        out.push_str(&format!("   链接: {}\n", r.url));
        if let Some(ts) = r.published_at.as_deref().filter(|s| !s.is_empty()) {
            out.push_str(&format!("   发布时间: {}\n", ts));
        }
        out.push('\n');
    }
    out
}
