//! 模型提供方抽象
//!
//! 所有后端（豆包 / DeepSeek / Gemini / Mock）实现 Provider：
//! - 后端只需实现 complete（非流式）与 complete_stream（返回 FragmentSource）；
//! - generate / stream 是统一入口，负责空输入校验、输出后处理与流桥接；
//! - calculate_cost 由 Pricing 系数决定，纯函数。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::stream::{FragmentSource, MessageStream};
use crate::llm::usage::{Pricing, TokenUsage};
use crate::memory::Message;

/// 模型层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Empty input: no messages to send")]
    EmptyInput,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Request timed out")]
    Timeout,
}

/// 一次非流式调用的结果：助手消息 + 本次 token 用量
#[derive(Debug, Clone)]
pub struct Completion {
    pub message: Message,
    pub usage: TokenUsage,
}

/// 去掉中文排版双引号（“ ”）
pub fn process_text(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '“' | '”')).collect()
}

/// 模型提供方：统一的 generate / stream / cost 能力
#[async_trait]
pub trait Provider: Send + Sync {
    /// 注册表中的唯一标识（即模型名，如 `deepseek-chat`）
    fn id(&self) -> &str;

    /// 展示名（如 `DeepSeek Chat`）
    fn name(&self) -> &str;

    fn pricing(&self) -> Pricing;

    /// 后端非流式调用；messages 已保证非空
    async fn complete(&self, messages: &[Message]) -> Result<Completion, LlmError>;

    /// 后端流式调用；返回可逐片 receive 的源
    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<Box<dyn FragmentSource>, LlmError>;

    fn calculate_cost(&self, input_tokens: u64, output_tokens: u64, thinking_tokens: u64) -> f64 {
        self.pricing()
            .cost(&TokenUsage::new(input_tokens, output_tokens, thinking_tokens))
    }

    /// 统一生成入口：空历史直接失败，不触达后端
    async fn generate(&self, messages: &[Message]) -> Result<Completion, LlmError> {
        if messages.is_empty() {
            return Err(LlmError::EmptyInput);
        }
        let mut completion = self.complete(messages).await?;
        completion.message.content = process_text(&completion.message.content);
        Ok(completion)
    }

    /// 统一流式入口：后端打开失败时，错误作为流的唯一（终止）元素返回
    async fn stream(&self, messages: &[Message]) -> Result<MessageStream, LlmError> {
        if messages.is_empty() {
            return Err(LlmError::EmptyInput);
        }
        match self.complete_stream(messages).await {
            Ok(source) => Ok(MessageStream::bridge(source)),
            Err(e) => {
                tracing::warn!(provider = %self.id(), error = %e, "stream open failed");
                Ok(MessageStream::failed(e))
            }
        }
    }
}
