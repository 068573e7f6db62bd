//! 搜索工具注册表
//!
//! 所有搜索工具实现 SearchTool（name / description / execute），由 ToolRegistry 按注册顺序保存。
//! 每次调用都加超时并输出结构化审计日志；双重搜索把同一查询并发分发给全部工具，
//! 单个工具失败只会变成一段失败提示，不影响其它工具的结果。

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;
use tokio::time::timeout;

use crate::core::AgentError;
use crate::tools::intent;

/// 没有任何工具时双重搜索的返回文本
pub const NO_TOOLS_SENTINEL: &str = "❌ 没有可用的搜索工具";

/// 结果之间的分隔
pub fn result_separator() -> String {
    format!("\n\n{}\n\n", "=".repeat(50))
}

/// 搜索工具层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    Parse(String),

    #[error("timed out")]
    Timeout,

    #[error("unknown tool: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ToolError::Timeout
        } else if e.is_decode() {
            ToolError::Parse(e.to_string())
        } else {
            ToolError::Network(e.to_string())
        }
    }
}

/// 搜索工具 trait：名称（用于结果标题与失败提示）、描述、按查询执行
#[async_trait]
pub trait SearchTool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// 发起一次搜索，返回格式化后的结果文本
    async fn execute(&self, query: &str) -> Result<String, ToolError>;
}

/// 工具注册表：保持注册顺序，双重搜索结果也按此顺序拼接
pub struct ToolRegistry {
    tools: Vec<Arc<dyn SearchTool>>,
    timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new(30)
    }
}

impl ToolRegistry {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            tools: Vec::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 注册工具；同名工具替换原实例，位置不变
    pub fn register(&mut self, tool: impl SearchTool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn SearchTool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SearchTool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// (name, description)，按注册顺序
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// 搜索意图检测，见 intent::detect_search_intent
    pub fn detect_intent(&self, text: &str) -> (bool, String) {
        intent::detect_search_intent(text)
    }

    /// 执行指定工具；超时返回 ToolError::Timeout；输出 JSON 审计日志
    pub async fn execute(&self, name: &str, query: &str) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        self.run(tool.as_ref(), query).await
    }

    async fn run(&self, tool: &dyn SearchTool, query: &str) -> Result<String, ToolError> {
        let start = Instant::now();
        let result = match timeout(self.timeout, tool.execute(query)).await {
            Ok(r) => r,
            Err(_) => Err(ToolError::Timeout),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ToolError::Timeout) => "timeout",
            Err(_) => "error",
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool.name(),
            "ok": result.is_ok(),
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "query_chars": query.chars().count(),
        });
        tracing::info!(audit = %audit, "tool");

        result
    }

    /// 把同一查询并发交给全部工具，按注册顺序返回 (工具名, 结果)
    ///
    /// 没有注册工具时返回 NoTools。
    pub async fn search_all(
        &self,
        query: &str,
    ) -> Result<Vec<(String, Result<String, ToolError>)>, AgentError> {
        if self.tools.is_empty() {
            return Err(AgentError::NoTools);
        }
        let runs = self.tools.iter().map(|tool| async move {
            (tool.name().to_string(), self.run(tool.as_ref(), query).await)
        });
        Ok(join_all(runs).await)
    }

    /// 双重搜索：全部工具的结果（或失败提示）按注册顺序用分隔线拼接；从不返回错误
    pub async fn perform_dual_search(&self, query: &str) -> String {
        let outcomes = match self.search_all(query).await {
            Ok(o) => o,
            Err(_) => {
                tracing::warn!("dual search requested with no tools registered");
                return NO_TOOLS_SENTINEL.to_string();
            }
        };

        outcomes
            .into_iter()
            .map(|(name, result)| match result {
                Ok(text) => text,
                Err(e) => format!("❌ {}搜索失败: {}", name, e),
            })
            .collect::<Vec<_>>()
            .join(&result_separator())
    }
}
