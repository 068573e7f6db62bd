//! Loomi - 社媒内容研究与生产助手
//!
//! 模块划分：
//! - **agents**: Concierge（接待）与 Orchestrator（执行）两个 Agent、人设与回复模板
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、组件构建器、助手门面
//! - **llm**: Provider 抽象、豆包 / DeepSeek / Gemini / Mock、流式适配、计费与调度管理
//! - **memory**: 对话日志、工作空间、滚动窗口
//! - **observability**: tracing 日志初始化
//! - **tools**: 意图规则、搜索工具注册表与双重搜索（Serper / Tavily）
//! - **ui**: 行式 REPL

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;
pub mod ui;

pub use crate::core::{Assistant, AssistantBuilder};
