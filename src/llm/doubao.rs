//! 豆包 Provider（火山方舟，OpenAI 兼容格式）

use crate::config::BackendSection;
use crate::llm::usage::Pricing;
use crate::llm::OpenAiProvider;

pub const DOUBAO_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";
pub const DOUBAO_PRO: &str = "doubao-pro";
pub const DOUBAO_DISPLAY_NAME: &str = "豆包 Pro";
pub const DOUBAO_API_KEY_ENV: &str = "DOUBAO_API_KEY";

/// 创建豆包 Provider；没有 key 时返回 None
///
/// 方舟上的 model 通常是推理接入点 ID（ep-xxxx），可通过 `[llm.doubao].model` 配置，此时 id 也随之变化。
pub fn create_doubao_provider(section: &BackendSection) -> Option<OpenAiProvider> {
    let api_key = section.resolve_api_key(DOUBAO_API_KEY_ENV)?;
    let pricing = Pricing::per_1k(
        section.cost_input.unwrap_or(0.00012),
        section.cost_output.unwrap_or(0.00024),
    );

    let (model, name) = section.model_and_name(DOUBAO_PRO, DOUBAO_DISPLAY_NAME);

    Some(OpenAiProvider::new(
        section.base_url.as_deref().unwrap_or(DOUBAO_BASE_URL),
        &api_key,
        &model,
        &name,
        pricing,
    ))
}
