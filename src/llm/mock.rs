//! Mock Provider（离线、确定性，无需 API）
//!
//! 没有配置任何真实后端时注册它，保证 REPL 可用；测试里也用它替代真实模型。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;

use crate::llm::stream::{FragmentSource, StreamSource};
use crate::llm::traits::{Completion, LlmError, Provider};
use crate::llm::usage::{Pricing, TokenUsage};
use crate::memory::{Message, Role};

pub const MOCK_ID: &str = "mock";

#[derive(Debug, Clone)]
enum Behavior {
    /// 回显最后一条 user 消息
    Echo,
    Fixed(String),
    Fail(LlmError),
}

/// Mock Provider：记录调用次数与最近一次收到的消息
#[derive(Debug)]
pub struct MockProvider {
    id: String,
    name: String,
    pricing: Pricing,
    behavior: Behavior,
    usage: TokenUsage,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_id(MOCK_ID, "Mock (offline)")
    }

    pub fn with_id(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            pricing: Pricing::free(),
            behavior: Behavior::Echo,
            usage: TokenUsage::new(10, 20, 0),
            delay: None,
            calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.behavior = Behavior::Fixed(reply.into());
        self
    }

    pub fn failing(mut self, error: LlmError) -> Self {
        self.behavior = Behavior::Fail(error);
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// 每次调用上报的 token 用量
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    /// 非流式调用先等待 delay 再回复，用于模拟慢后端
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn reply(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }

        match &self.behavior {
            Behavior::Echo => {
                let last_user = messages
                    .iter()
                    .rev()
                    .find(|m| m.role == Role::User)
                    .map(|m| m.content.as_str())
                    .unwrap_or("(no input)");
                Ok(format!("Echo from Mock: {}", last_user))
            }
            Behavior::Fixed(text) => Ok(text.clone()),
            Behavior::Fail(e) => Err(e.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
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
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let content = self.reply(messages)?;
        Ok(Completion {
            message: Message::assistant(content),
            usage: self.usage,
        })
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<Box<dyn FragmentSource>, LlmError> {
        let content = self.reply(messages)?;
        let fragments: Vec<Result<String, LlmError>> =
            content.chars().map(|c| Ok(c.to_string())).collect();
        Ok(Box::new(StreamSource::new(stream::iter(fragments))))
    }
}
