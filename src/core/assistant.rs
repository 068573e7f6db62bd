//! 助手门面：REPL 与测试的唯一入口
//!
//! 持有构建器组装好的全部组件。用户输入先交给 Concierge；Concierge 报错时
//! 改由 Orchestrator 直接处理原始输入；两者都失败才向上返回错误。
//!
//! Concierge 目前只对空白输入报错，而 Orchestrator 同样拒绝空白任务，所以第二级
//! 只是兜底：Concierge 将来新增的错误分支会落到这里，回复仍成对记入对话。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::agents::{Concierge, Orchestrator};
use crate::config::AppConfig;
use crate::core::AgentError;
use crate::llm::{ModelManager, SessionStats};
use crate::memory::{ConversationState, WorkspaceState};
use crate::tools::ToolRegistry;

/// `status` 命令展示的快照
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub stats: SessionStats,
    pub active_model: Option<String>,
    pub fallback_replies: u64,
    pub orchestrator_running: bool,
    pub workspace_summary: String,
    pub conversation_summary: String,
}

pub struct Assistant {
    config: AppConfig,
    manager: Arc<ModelManager>,
    tools: Arc<ToolRegistry>,
    conversation: Arc<ConversationState>,
    workspace: Arc<WorkspaceState>,
    concierge: Concierge,
    orchestrator: Arc<Orchestrator>,
}

impl Assistant {
    pub(crate) fn new(
        config: AppConfig,
        manager: Arc<ModelManager>,
        tools: Arc<ToolRegistry>,
        conversation: Arc<ConversationState>,
        workspace: Arc<WorkspaceState>,
        concierge: Concierge,
        orchestrator: Arc<Orchestrator>,
    ) -> Self {
        Self {
            config,
            manager,
            tools,
            conversation,
            workspace,
            concierge,
            orchestrator,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn manager(&self) -> &Arc<ModelManager> {
        &self.manager
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn conversation(&self) -> &Arc<ConversationState> {
        &self.conversation
    }

    pub fn workspace(&self) -> &Arc<WorkspaceState> {
        &self.workspace
    }

    pub fn concierge(&self) -> &Concierge {
        &self.concierge
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// 处理一轮用户输入
    pub async fn process_user_input(&self, input: &str) -> Result<String, AgentError> {
        let err = match self.concierge.process(input).await {
            Ok(reply) => return Ok(reply),
            Err(e) => e,
        };
        tracing::warn!(error = %err, "concierge failed, trying orchestrator");

        match self.orchestrator.process_task(input).await {
            Ok(reply) => Ok(self.concierge.finish_turn(input, reply).await),
            Err(e) => {
                tracing::warn!(error = %e, "orchestrator failed as well");
                Err(AgentError::Unhandled)
            }
        }
    }

    /// 带单轮超时的 process_user_input
    ///
    /// 超时会丢弃本轮未完成的处理（在途请求随之取消），按模型失败降级：
    /// 回复固定模板，并与用户轮一起记入对话。
    pub async fn process_with_timeout(&self, input: &str) -> Result<String, AgentError> {
        let secs = self.config.app.turn_timeout_secs;
        match timeout(Duration::from_secs(secs), self.process_user_input(input)).await {
            Ok(result) => result,
            Err(_) => Ok(self.concierge.finish_timed_out_turn(input, secs).await),
        }
    }

    /// 显式启动 Orchestrator（受启动超时约束）
    pub async fn start_orchestrator(&self) -> Result<(), AgentError> {
        let secs = self.config.app.orchestrator_start_timeout_secs;
        timeout(Duration::from_secs(secs), self.orchestrator.start())
            .await
            .map_err(|_| AgentError::Timeout(secs))?
    }

    pub fn stop_orchestrator(&self) {
        self.orchestrator.stop();
    }

    /// 按 id 切换模型
    pub async fn select_model(&self, id: &str) -> Result<(), AgentError> {
        self.manager.set_active(id).await
    }

    /// 降级回复总数（两个 Agent 之和）
    pub fn fallback_replies(&self) -> u64 {
        self.concierge.fallbacks() + self.orchestrator.fallbacks()
    }

    pub async fn status(&self) -> StatusReport {
        StatusReport {
            stats: self.manager.stats().await,
            active_model: self.manager.active_name().await,
            fallback_replies: self.fallback_replies(),
            orchestrator_running: self.orchestrator.is_running(),
            workspace_summary: self.workspace.summary().await,
            conversation_summary: self.conversation.summary().await,
        }
    }
}
