//! OpenAI 兼容 API Provider
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；豆包与 DeepSeek 都走这里。

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use futures_util::StreamExt;

use crate::llm::stream::{FragmentSource, StreamSource};
use crate::llm::traits::{Completion, LlmError, Provider};
use crate::llm::usage::{Pricing, TokenUsage};
use crate::memory::{Message, Role};

/// OpenAI 兼容 Provider：持有 Client 与 model 名，id 即模型名
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    id: String,
    name: String,
    model: String,
    pricing: Pricing,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        name: &str,
        pricing: Pricing,
    ) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            id: model.to_string(),
            name: name.to_string(),
            model: model.to_string(),
            pricing,
        }
    }

    fn to_openai_messages(
        &self,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
        messages
            .iter()
            .map(|m| {
                let msg = match m.role {
                    Role::System => ChatCompletionRequestSystemMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::System),
                    Role::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::User),
                    Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(m.content.clone())
                        .build()
                        .map(ChatCompletionRequestMessage::Assistant),
                };
                msg.map_err(map_openai_error)
            })
            .collect()
    }
}

fn map_openai_error(e: OpenAIError) -> LlmError {
    match e {
        OpenAIError::Reqwest(e) if e.is_timeout() => LlmError::Timeout,
        OpenAIError::Reqwest(e) => LlmError::Network(e.to_string()),
        other => LlmError::InvalidResponse(other.to_string()),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages)?)
            .build()
            .map_err(map_openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let usage = response
            .usage
            .as_ref()
            .map(|u| {
                let thinking = u
                    .completion_tokens_details
                    .as_ref()
                    .and_then(|d| d.reasoning_tokens)
                    .unwrap_or(0);
                TokenUsage::new(
                    u.prompt_tokens as u64,
                    u.completion_tokens as u64,
                    thinking as u64,
                )
            })
            .unwrap_or_default();

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or(LlmError::EmptyResponse)?;

        tracing::debug!(
            provider = %self.id,
            input_tokens = usage.input,
            output_tokens = usage.output,
            thinking_tokens = usage.thinking,
            "chat completion done"
        );

        Ok(Completion {
            message: Message::assistant(content),
            usage,
        })
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<Box<dyn FragmentSource>, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(self.to_openai_messages(messages)?)
            .stream(true)
            .build()
            .map_err(map_openai_error)?;

        let stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(map_openai_error)?;

        // 只转发有文本的 delta；无 content 的块（角色声明、结束标记）映射为空串，由桥接层跳过
        let fragments = stream.map(|chunk| match chunk {
            Ok(resp) => Ok(resp
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect::<String>()),
            Err(e) => Err(LlmError::Stream(e.to_string())),
        });

        Ok(Box::new(StreamSource::new(fragments)))
    }
}
