//! 助手构建器：按配置组装模型调度、搜索工具、共享状态与两个 Agent
//!
//! 所有共享组件在这里显式创建一次，再以 Arc 注入各 Agent，不使用全局单例。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::{Concierge, Orchestrator, Personas};
use crate::config::{AppConfig, LlmSection};
use crate::core::{AgentError, Assistant};
use crate::llm::{
    create_deepseek_provider, create_doubao_provider, create_gemini_provider, MockProvider,
    ModelManager, Provider,
};
use crate::memory::{ConversationState, WorkspaceState};
use crate::tools::{create_registry_from_config, ToolRegistry};

/// 按固定顺序（豆包 → DeepSeek → Gemini）注册配置了 key 的后端，返回注册数量
pub async fn register_providers_from_config(manager: &ModelManager, cfg: &LlmSection) -> usize {
    let candidates: [(&str, Option<Arc<dyn Provider>>); 3] = [
        (
            "doubao",
            create_doubao_provider(&cfg.doubao).map(|p| Arc::new(p) as Arc<dyn Provider>),
        ),
        (
            "deepseek",
            create_deepseek_provider(&cfg.deepseek).map(|p| Arc::new(p) as Arc<dyn Provider>),
        ),
        (
            "gemini",
            create_gemini_provider(&cfg.gemini).map(|p| Arc::new(p) as Arc<dyn Provider>),
        ),
    ];

    let mut registered = 0;
    for (backend, provider) in candidates {
        match provider {
            Some(p) => {
                tracing::info!(backend, provider = %p.id(), "provider registered");
                manager.register(p).await;
                registered += 1;
            }
            None => tracing::info!(backend, "api key not set, provider skipped"),
        }
    }
    registered
}

/// 助手构建器：默认全部来自配置，测试可注入 Provider / 工具 / 人设
pub struct AssistantBuilder {
    config: AppConfig,
    providers: Vec<Arc<dyn Provider>>,
    tools: Option<ToolRegistry>,
    personas: Option<Personas>,
}

impl AssistantBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            providers: Vec::new(),
            tools: None,
            personas: None,
        }
    }

    /// 注入 Provider；一旦注入，不再按配置创建真实后端
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_personas(mut self, personas: Personas) -> Self {
        self.personas = Some(personas);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    async fn build_manager(&mut self) -> Arc<ModelManager> {
        let manager = Arc::new(ModelManager::with_call_timeout(Duration::from_secs(
            self.config.app.model_timeout_secs,
        )));

        if self.providers.is_empty() {
            if register_providers_from_config(&manager, &self.config.llm).await == 0 {
                tracing::warn!("No API key set for any backend, using Mock provider");
                manager.register(Arc::new(MockProvider::new())).await;
            }
        } else {
            for p in self.providers.drain(..) {
                manager.register(p).await;
            }
        }

        if let Some(id) = self.config.llm.default_provider.as_deref() {
            if let Err(e) = manager.set_active(id).await {
                tracing::warn!(error = %e, "default_provider ignored");
            }
        }
        manager
    }

    /// 组装全部组件
    pub async fn build(mut self) -> Result<Assistant, AgentError> {
        if self.config.app.window_size == 0 {
            return Err(AgentError::Config("app.window_size must be at least 1".into()));
        }
        if self.config.app.model_timeout_secs == 0 || self.config.app.turn_timeout_secs == 0 {
            return Err(AgentError::Config("timeouts must be at least 1 second".into()));
        }

        let manager = self.build_manager().await;
        let tools = Arc::new(
            self.tools
                .take()
                .unwrap_or_else(|| create_registry_from_config(&self.config.tools)),
        );
        let personas = self
            .personas
            .take()
            .unwrap_or_else(|| Personas::load(&self.config.app.prompts_dir));

        let conversation = Arc::new(ConversationState::new());
        let workspace = Arc::new(WorkspaceState::new());

        let orchestrator = Arc::new(Orchestrator::new(
            manager.clone(),
            workspace.clone(),
            personas.orchestrator,
        ));
        let concierge = Concierge::new(
            manager.clone(),
            tools.clone(),
            conversation.clone(),
            orchestrator.clone(),
            personas.concierge,
            self.config.app.window_size,
        );

        tracing::info!(
            session = %conversation.session_id(),
            providers = manager.list_providers().await.len(),
            tools = tools.len(),
            "assistant initialized"
        );

        Ok(Assistant::new(
            self.config,
            manager,
            tools,
            conversation,
            workspace,
            concierge,
            orchestrator,
        ))
    }
}

/// 便捷函数：从默认路径加载配置并创建 AssistantBuilder
pub fn create_assistant_builder(config_path: Option<PathBuf>) -> AssistantBuilder {
    AssistantBuilder::new(crate::config::load_config_or_default(config_path))
}
