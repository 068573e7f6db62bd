//! 调度 / 路由层错误类型
//!
//! 配置类错误（未注册 provider、没有工具）直接返回给调用方；
//! 后端调用错误在路由管线里被降级为模板回复，不会直接出现在用户面前。

use thiserror::Error;

use crate::llm::LlmError;
use crate::tools::ToolError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// setActive 指定了未注册的 provider
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("No active provider configured")]
    NoActiveProvider,

    #[error("No search tools registered")]
    NoTools,

    /// 空白输入（用户轮或任务描述）
    #[error("Empty input")]
    EmptyInput,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Config error: {0}")]
    Config(String),

    /// Concierge 与 Orchestrator 都无法处理输入
    #[error("所有智能体都无法处理用户输入")]
    Unhandled,
}
