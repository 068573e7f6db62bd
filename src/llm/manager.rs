//! 模型调度管理器
//!
//! 持有所有已注册 Provider（保持注册顺序）、当前激活的 Provider 与会话统计。
//! - 第一个注册的 Provider 自动成为激活者，之后只能通过 set_active 切换；
//! - 切换只替换指针，已在途的调用继续使用旧 Provider；
//! - 每次成功的 call_active 在同一把写锁内累加 SessionStats，读者只会看到完整快照；
//! - 每次 call_active 受单次调用超时约束，超时按 LlmError::Timeout 返回。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::core::AgentError;
use crate::llm::stream::MessageStream;
use crate::llm::traits::{LlmError, Provider};
use crate::llm::usage::SessionStats;
use crate::memory::Message;

#[derive(Default)]
struct Registry {
    order: Vec<String>,
    providers: HashMap<String, Arc<dyn Provider>>,
    active: Option<String>,
}

/// 单次模型调用的默认超时（秒）
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 25;

/// Provider 注册表 + 激活选择 + 统计汇总
pub struct ModelManager {
    registry: RwLock<Registry>,
    stats: RwLock<SessionStats>,
    call_timeout: Duration,
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelManager {
    pub fn new() -> Self {
        Self::with_call_timeout(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS))
    }

    pub fn with_call_timeout(call_timeout: Duration) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            stats: RwLock::new(SessionStats::default()),
            call_timeout,
        }
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// 注册 Provider；同 id 重复注册时替换实例但保留原顺序
    pub async fn register(&self, provider: Arc<dyn Provider>) {
        let id = provider.id().to_string();
        let mut registry = self.registry.write().await;
        if registry.providers.insert(id.clone(), provider).is_some() {
            tracing::warn!(provider = %id, "provider re-registered, instance replaced");
        } else {
            registry.order.push(id.clone());
        }
        if registry.active.is_none() {
            tracing::info!(provider = %id, "first provider registered, now active");
            registry.active = Some(id);
        }
    }

    /// 切换激活 Provider；未注册的 id 返回 ProviderNotFound 且不改变当前激活者
    pub async fn set_active(&self, id: &str) -> Result<(), AgentError> {
        let mut registry = self.registry.write().await;
        if !registry.providers.contains_key(id) {
            return Err(AgentError::ProviderNotFound(id.to_string()));
        }
        tracing::info!(from = ?registry.active, to = %id, "active provider switched");
        registry.active = Some(id.to_string());
        Ok(())
    }

    pub async fn active(&self) -> Option<Arc<dyn Provider>> {
        let registry = self.registry.read().await;
        registry
            .active
            .as_ref()
            .and_then(|id| registry.providers.get(id).cloned())
    }

    pub async fn active_id(&self) -> Option<String> {
        self.registry.read().await.active.clone()
    }

    /// 当前激活 Provider 的展示名
    pub async fn active_name(&self) -> Option<String> {
        self.active().await.map(|p| p.name().to_string())
    }

    pub async fn get(&self, id: &str) -> Option<Arc<dyn Provider>> {
        self.registry.read().await.providers.get(id).cloned()
    }

    /// (id, 展示名)，按注册顺序
    pub async fn list_providers(&self) -> Vec<(String, String)> {
        let registry = self.registry.read().await;
        registry
            .order
            .iter()
            .filter_map(|id| {
                registry
                    .providers
                    .get(id)
                    .map(|p| (id.clone(), p.name().to_string()))
            })
            .collect()
    }

    pub async fn is_empty(&self) -> bool {
        self.registry.read().await.providers.is_empty()
    }

    fn build_history(system_prompt: &str, user_prompt: &str) -> Vec<Message> {
        let mut history = Vec::with_capacity(2);
        if !system_prompt.trim().is_empty() {
            history.push(Message::system(system_prompt));
        }
        history.push(Message::user(user_prompt));
        history
    }

    /// 用激活 Provider 完成一次调用，并把用量与费用计入统计
    pub async fn call_active(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        let provider = self.active().await.ok_or(AgentError::NoActiveProvider)?;
        let history = Self::build_history(system_prompt, user_prompt);

        let started = Instant::now();
        let result = match timeout(self.call_timeout, provider.generate(&history)).await {
            Ok(r) => r,
            Err(_) => Err(LlmError::Timeout),
        };
        let completion = match result {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(
                    provider = %provider.id(),
                    error = %e,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "provider call failed"
                );
                return Err(e.into());
            }
        };

        let usage = completion.usage;
        let cost = provider.calculate_cost(usage.input, usage.output, usage.thinking);
        self.stats.write().await.record(&usage, cost);

        tracing::info!(
            provider = %provider.id(),
            input_tokens = usage.input,
            output_tokens = usage.output,
            thinking_tokens = usage.thinking,
            cost,
            duration_ms = started.elapsed().as_millis() as u64,
            "provider call completed"
        );

        Ok(completion.message.content)
    }

    /// call_active 的流式版本；流式调用不计入统计（后端流不返回用量）
    pub async fn stream_active(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<MessageStream, AgentError> {
        let provider = self.active().await.ok_or(AgentError::NoActiveProvider)?;
        let history = Self::build_history(system_prompt, user_prompt);
        tracing::debug!(provider = %provider.id(), "opening stream");
        Ok(provider.stream(&history).await?)
    }

    /// 统计快照
    pub async fn stats(&self) -> SessionStats {
        self.stats.read().await.clone()
    }

    pub async fn reset_stats(&self) {
        *self.stats.write().await = SessionStats::default();
    }
}
