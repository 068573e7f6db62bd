//! 搜索工具层：意图规则、工具注册表与双重搜索、Serper / Tavily

pub mod intent;
pub mod registry;
pub mod serper;
pub mod tavily;
pub mod types;

pub use intent::{
    classify, detect_search_intent, is_generic_confirmation, is_search_confirmation, Intent,
};
pub use registry::{result_separator, SearchTool, ToolError, ToolRegistry, NO_TOOLS_SENTINEL};
pub use serper::SerperTool;
pub use tavily::TavilyTool;
pub use types::{format_results, SearchResult};

use crate::config::ToolsSection;

/// 按配置创建工具注册表：只注册配置了 api_key 的工具，顺序固定为 Serper → Tavily
pub fn create_registry_from_config(cfg: &ToolsSection) -> ToolRegistry {
    let mut registry = ToolRegistry::new(cfg.timeout_secs);

    match cfg.serper.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => registry.register(SerperTool::new(
            &cfg.serper.endpoint,
            key,
            cfg.serper.num_results,
            cfg.timeout_secs,
        )),
        None => tracing::info!("serper api_key not set, tool not registered"),
    }

    match cfg.tavily.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => registry.register(TavilyTool::new(
            &cfg.tavily.endpoint,
            key,
            cfg.tavily.max_results,
            &cfg.tavily.search_depth,
            cfg.timeout_secs,
        )),
        None => tracing::info!("tavily api_key not set, tool not registered"),
    }

    registry
}
