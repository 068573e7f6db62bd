//! DeepSeek Provider（OpenAI 兼容格式）
//!
//! - Base URL: https://api.deepseek.com/v1
//! - 模型: deepseek-chat
//! - 价格: 输入 0.00014 / 输出 0.00028（每千 token）

use crate::config::BackendSection;
use crate::llm::usage::Pricing;
use crate::llm::OpenAiProvider;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_DISPLAY_NAME: &str = "DeepSeek Chat";
pub const DEEPSEEK_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// 创建 DeepSeek Provider
///
/// - key 取自配置 `[llm.deepseek].api_key`，其次环境变量 `DEEPSEEK_API_KEY`；都没有时返回 None（不注册）
/// - 未配置的 base_url / model / 单价使用上面的常量
pub fn create_deepseek_provider(section: &BackendSection) -> Option<OpenAiProvider> {
    let api_key = section.resolve_api_key(DEEPSEEK_API_KEY_ENV)?;
    let pricing = Pricing::per_1k(
        section.cost_input.unwrap_or(0.00014),
        section.cost_output.unwrap_or(0.00028),
    );

    let (model, name) = section.model_and_name(DEEPSEEK_CHAT, DEEPSEEK_DISPLAY_NAME);

    Some(OpenAiProvider::new(
        section.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL),
        &api_key,
        &model,
        &name,
        pricing,
    ))
}
