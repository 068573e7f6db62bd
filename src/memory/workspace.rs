//! 工作空间：Agent 共享的可变草稿区（笔记 / 任务 / 键值上下文）
//!
//! 会话内只追加或覆盖，只有显式 reset 会整体清空。

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct WorkspaceInner {
    notes: Vec<String>,
    tasks: Vec<String>,
    context: HashMap<String, Value>,
}

/// 共享工作空间，单把读写锁保护三类数据
#[derive(Debug, Default)]
pub struct WorkspaceState {
    inner: RwLock<WorkspaceInner>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_note(&self, note: impl Into<String>) {
        self.inner.write().await.notes.push(note.into());
    }

    pub async fn notes(&self) -> Vec<String> {
        self.inner.read().await.notes.clone()
    }

    pub async fn add_task(&self, task: impl Into<String>) {
        self.inner.write().await.tasks.push(task.into());
    }

    pub async fn tasks(&self) -> Vec<String> {
        self.inner.read().await.tasks.clone()
    }

    /// 写入上下文；同名键覆盖旧值
    pub async fn set_context(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .write()
            .await
            .context
            .insert(key.into(), value.into());
    }

    pub async fn get_context(&self, key: &str) -> Option<Value> {
        self.inner.read().await.context.get(key).cloned()
    }

    pub async fn all_context(&self) -> HashMap<String, Value> {
        self.inner.read().await.context.clone()
    }

    /// 清空笔记、任务与上下文
    pub async fn reset(&self) {
        *self.inner.write().await = WorkspaceInner::default();
    }

    pub async fn summary(&self) -> String {
        let inner = self.inner.read().await;
        format!(
            "工作空间状态:\n- 笔记数量: {}\n- 任务数量: {}\n- 上下文键数量: {}\n",
            inner.notes.len(),
            inner.tasks.len(),
            inner.context.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notes_tasks_context() {
        let workspace = WorkspaceState::new();
        workspace.add_note("测试笔记").await;
        workspace.add_task("测试任务").await;
        workspace.set_context("test_key", "test_value").await;

        assert_eq!(workspace.notes().await, vec!["测试笔记".to_string()]);
        assert_eq!(workspace.tasks().await.len(), 1);
        assert_eq!(
            workspace.get_context("test_key").await,
            Some(Value::from("test_value"))
        );
        assert_eq!(workspace.get_context("missing").await, None);
    }

    #[tokio::test]
    async fn test_context_key_overwrites() {
        let workspace = WorkspaceState::new();
        workspace.set_context("k", 1).await;
        workspace.set_context("k", 2).await;
        let all = workspace.all_context().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all["k"], Value::from(2));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let workspace = WorkspaceState::new();
        workspace.add_note("n").await;
        workspace.add_task("t").await;
        workspace.set_context("k", true).await;
        workspace.reset().await;

        assert!(workspace.notes().await.is_empty());
        assert!(workspace.tasks().await.is_empty());
        assert!(workspace.all_context().await.is_empty());
        assert!(workspace.summary().await.contains("任务数量: 0"));
    }
}
