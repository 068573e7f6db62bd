//! Orchestrator（执行 Agent）
//!
//! 接收 Concierge 移交的任务：记入工作空间任务列表，再用内容生成人设调用当前模型。
//! 模型调用失败时返回固定的「任务完成」回执，同时打 `fallback_reply` 告警并计数。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::agents::prompts::task_fallback_reply;
use crate::core::AgentError;
use crate::llm::ModelManager;
use crate::memory::WorkspaceState;

pub struct Orchestrator {
    manager: Arc<ModelManager>,
    workspace: Arc<WorkspaceState>,
    persona: String,
    running: AtomicBool,
    fallbacks: AtomicU64,
}

impl Orchestrator {
    pub fn new(manager: Arc<ModelManager>, workspace: Arc<WorkspaceState>, persona: String) -> Self {
        Self {
            manager,
            workspace,
            persona,
            running: AtomicBool::new(false),
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Stopped → Running；重复调用无副作用
    pub async fn start(&self) -> Result<(), AgentError> {
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!(agent = "orchestrator", "started");
        }
        Ok(())
    }

    /// Running → Stopped；重复调用无副作用
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!(agent = "orchestrator", "stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 降级回复次数
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// 处理一个任务；只有任务为空时返回错误，模型失败会降级为模板回执
    pub async fn process_task(&self, task: &str) -> Result<String, AgentError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(AgentError::EmptyInput);
        }

        self.workspace.add_task(task).await;

        match self.manager.call_active(&self.persona, task).await {
            Ok(content) => Ok(content),
            Err(e) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event = "fallback_reply",
                    agent = "orchestrator",
                    error = %e,
                    "model call failed, replying with task template"
                );
                Ok(task_fallback_reply(task))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockProvider};

    async fn orchestrator_with(provider: Option<MockProvider>) -> (Orchestrator, Arc<WorkspaceState>) {
        let manager = Arc::new(ModelManager::new());
        if let Some(p) = provider {
            manager.register(Arc::new(p)).await;
        }
        let workspace = Arc::new(WorkspaceState::new());
        (
            Orchestrator::new(manager, workspace.clone(), "persona".into()),
            workspace,
        )
    }

    #[tokio::test]
    async fn test_start_stop_idempotent() {
        let (o, _) = orchestrator_with(None).await;
        assert!(!o.is_running());
        o.start().await.unwrap();
        o.start().await.unwrap();
        assert!(o.is_running());
        o.stop();
        o.stop();
        assert!(!o.is_running());
    }

    #[tokio::test]
    async fn test_process_task_records_task_and_returns_content() {
        let (o, workspace) = orchestrator_with(Some(MockProvider::new().with_reply("小红书文案"))).await;
        let out = o.process_task("写熊猫文案").await.unwrap();
        assert_eq!(out, "小红书文案");
        assert_eq!(workspace.tasks().await, vec!["写熊猫文案".to_string()]);
        assert_eq!(o.fallbacks(), 0);
    }

    #[tokio::test]
    async fn test_failure_degrades_to_template() {
        let (o, workspace) =
            orchestrator_with(Some(MockProvider::new().failing(LlmError::Network("down".into())))).await;
        let out = o.process_task("写熊猫文案").await.unwrap();
        assert_eq!(out, task_fallback_reply("写熊猫文案"));
        assert_eq!(workspace.tasks().await.len(), 1);
        assert_eq!(o.fallbacks(), 1);
    }

    #[tokio::test]
    async fn test_no_provider_also_degrades() {
        let (o, _) = orchestrator_with(None).await;
        assert!(o.process_task("任务").await.unwrap().contains("🎯 任务：任务"));
    }

    #[tokio::test]
    async fn test_empty_task_is_error() {
        let (o, workspace) = orchestrator_with(None).await;
        assert!(matches!(o.process_task("  ").await, Err(AgentError::EmptyInput)));
        assert!(workspace.tasks().await.is_empty());
    }
}
