//! Concierge（接待 Agent）
//!
//! 每轮流程：
//! 1. 用户输入写入对话日志与滚动窗口；
//! 2. 搜索确认且窗口中更早的用户轮带有搜索查询 → 执行双重搜索；
//! 3. 通用确认 → 用滚动窗口构建任务描述，交给 Orchestrator；
//! 4. 搜索意图 → 先回复确认提示，不立即搜索；
//! 5. 其他 → 用接待人设调用当前模型，失败时返回固定回复；
//! 6. 回复写入对话日志与滚动窗口。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::agents::prompts::{
    search_confirmation_prompt, CONCIERGE_FALLBACK_REPLY, EMPTY_QUERY_REPLY,
};
use crate::agents::Orchestrator;
use crate::core::AgentError;
use crate::llm::ModelManager;
use crate::memory::{ConversationState, Message, Role, RollingWindow};
use crate::tools::{
    detect_search_intent, is_generic_confirmation, is_search_confirmation, ToolRegistry,
};

/// 本轮走的分支，用于日志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    DualSearch,
    Handoff,
    SearchPrompt,
    Chat,
}

impl Route {
    fn as_str(&self) -> &'static str {
        match self {
            Route::DualSearch => "dual_search",
            Route::Handoff => "handoff",
            Route::SearchPrompt => "search_prompt",
            Route::Chat => "chat",
        }
    }
}

pub struct Concierge {
    manager: Arc<ModelManager>,
    tools: Arc<ToolRegistry>,
    conversation: Arc<ConversationState>,
    orchestrator: Arc<Orchestrator>,
    window: RwLock<RollingWindow>,
    persona: String,
    fallbacks: AtomicU64,
}

impl Concierge {
    pub fn new(
        manager: Arc<ModelManager>,
        tools: Arc<ToolRegistry>,
        conversation: Arc<ConversationState>,
        orchestrator: Arc<Orchestrator>,
        persona: String,
        window_size: usize,
    ) -> Self {
        Self {
            manager,
            tools,
            conversation,
            orchestrator,
            window: RwLock::new(RollingWindow::new(window_size)),
            persona,
            fallbacks: AtomicU64::new(0),
        }
    }

    pub fn fallbacks(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// 滚动窗口快照（旧 → 新）
    pub async fn window(&self) -> Vec<Message> {
        self.window.read().await.entries().cloned().collect()
    }

    async fn record(&self, role: Role, content: &str) {
        let message = self.conversation.append(role, content).await;
        self.window.write().await.push(message);
    }

    /// 补齐被中断的一轮：用户轮未记录时先补记，再记入 reply
    ///
    /// 本轮回复已经记录过时不重复写入，直接返回已记录的回复。
    pub async fn finish_turn(&self, input: &str, reply: String) -> String {
        let input = input.trim();
        let recent = self.conversation.recent(2).await;
        match recent.as_slice() {
            [.., user, done]
                if user.role == Role::User
                    && user.content == input
                    && done.role == Role::Assistant =>
            {
                return done.content.clone();
            }
            [.., user] if user.role == Role::User && user.content == input => {}
            _ => self.record(Role::User, input).await,
        }
        self.record(Role::Assistant, &reply).await;
        reply
    }

    /// 单轮超时后的收尾：按模型失败处理，记入固定回复
    pub async fn finish_timed_out_turn(&self, input: &str, timeout_secs: u64) -> String {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(
            event = "fallback_reply",
            agent = "concierge",
            timeout_secs,
            "turn timed out, replying with default template"
        );
        self.finish_turn(input, CONCIERGE_FALLBACK_REPLY.to_string())
            .await
    }

    /// 窗口中最近一次带非空查询的用户搜索请求
    pub async fn last_detected_query(&self) -> Option<String> {
        let window = self.window.read().await;
        let found = window
            .entries()
            .rev()
            .filter(|m| m.role == Role::User)
            .find_map(|m| match detect_search_intent(&m.content) {
                (true, q) if !q.is_empty() => Some(q),
                _ => None,
            });
        found
    }

    /// 处理一轮用户输入并返回回复；只有空白输入会返回错误
    pub async fn process(&self, input: &str) -> Result<String, AgentError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AgentError::EmptyInput);
        }

        // 只看本轮之前的用户轮
        let pending_query = self.last_detected_query().await;
        self.record(Role::User, input).await;

        let (route, reply) = self.route(input, pending_query).await?;
        tracing::info!(
            agent = "concierge",
            route = route.as_str(),
            reply_chars = reply.chars().count(),
            "turn routed"
        );

        self.record(Role::Assistant, &reply).await;
        Ok(reply)
    }

    async fn route(
        &self,
        input: &str,
        pending_query: Option<String>,
    ) -> Result<(Route, String), AgentError> {
        if is_search_confirmation(input) {
            match pending_query {
                Some(query) => {
                    tracing::info!(agent = "concierge", tools = self.tools.len(), "executing dual search");
                    let combined = self.tools.perform_dual_search(&query).await;
                    return Ok((Route::DualSearch, combined));
                }
                None => tracing::debug!("search confirmation without pending query, falling through"),
            }
        }

        if is_generic_confirmation(input) {
            let task = self.window.read().await.task_description();
            let reply = self.orchestrator.process_task(&task).await?;
            return Ok((Route::Handoff, reply));
        }

        if let (true, query) = detect_search_intent(input) {
            let reply = if query.is_empty() {
                EMPTY_QUERY_REPLY.to_string()
            } else {
                search_confirmation_prompt(&query)
            };
            return Ok((Route::SearchPrompt, reply));
        }

        let reply = match self.manager.call_active(&self.persona, input).await {
            Ok(content) => content,
            Err(e) => {
                self.fallbacks.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event = "fallback_reply",
                    agent = "concierge",
                    error = %e,
                    "model call failed, replying with default template"
                );
                CONCIERGE_FALLBACK_REPLY.to_string()
            }
        };
        Ok((Route::Chat, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockProvider};
    use crate::memory::WorkspaceState;
    use crate::tools::test_support::StaticTool;

    struct Fixture {
        concierge: Concierge,
        conversation: Arc<ConversationState>,
        workspace: Arc<WorkspaceState>,
        provider: Arc<MockProvider>,
    }

    async fn fixture(provider: MockProvider, with_tools: bool) -> Fixture {
        let provider = Arc::new(provider);
        let manager = Arc::new(ModelManager::new());
        manager.register(provider.clone()).await;

        let mut tools = ToolRegistry::default();
        if with_tools {
            tools.register(StaticTool::ok("Serper", "serper-result"));
            tools.register(StaticTool::ok("Tavily", "tavily-result"));
        }

        let conversation = Arc::new(ConversationState::new());
        let workspace = Arc::new(WorkspaceState::new());
        let orchestrator = Arc::new(Orchestrator::new(
            manager.clone(),
            workspace.clone(),
            "orchestrator persona".into(),
        ));
        let concierge = Concierge::new(
            manager,
            Arc::new(tools),
            conversation.clone(),
            orchestrator,
            "concierge persona".into(),
            10,
        );
        Fixture {
            concierge,
            conversation,
            workspace,
            provider,
        }
    }

    #[tokio::test]
    async fn test_chat_uses_persona_and_records_both_turns() {
        let f = fixture(MockProvider::new().with_reply("你好呀"), false).await;
        let reply = f.concierge.process("你好").await.unwrap();
        assert_eq!(reply, "你好呀");

        let sent = f.provider.last_messages();
        assert_eq!(sent[0].content, "concierge persona");
        assert_eq!(sent[1].content, "你好");

        let messages = f.conversation.messages().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(f.concierge.window().await.len(), 2);
    }

    #[tokio::test]
    async fn test_chat_failure_falls_back() {
        let f = fixture(MockProvider::new().failing(LlmError::Timeout), false).await;
        let reply = f.concierge.process("写点什么吧").await.unwrap();
        assert_eq!(reply, CONCIERGE_FALLBACK_REPLY);
        assert_eq!(f.concierge.fallbacks(), 1);
        assert_eq!(f.conversation.len().await, 2);
    }

    #[tokio::test]
    async fn test_search_request_prompts_without_searching() {
        let f = fixture(MockProvider::new(), true).await;
        let reply = f.concierge.process("搜索关于熊猫的新闻").await.unwrap();
        assert_eq!(reply, search_confirmation_prompt("熊猫"));
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_query_reply() {
        let f = fixture(MockProvider::new(), true).await;
        // 不含搜索确认词的触发词，且触发词后没有内容
        let reply = f.concierge.process("帮我查找").await.unwrap();
        assert_eq!(reply, EMPTY_QUERY_REPLY);
    }

    #[tokio::test]
    async fn test_search_confirmation_runs_dual_search_on_previous_query() {
        let f = fixture(MockProvider::new(), true).await;
        f.concierge.process("搜索关于熊猫的新闻").await.unwrap();
        assert_eq!(f.concierge.last_detected_query().await.as_deref(), Some("熊猫"));

        let reply = f.concierge.process("搜索").await.unwrap();
        let serper = reply.find("serper-result").unwrap();
        let tavily = reply.find("tavily-result").unwrap();
        assert!(serper < tavily);
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_search_confirmation_without_prior_query_falls_through() {
        let f = fixture(MockProvider::new().with_reply("chat"), true).await;
        // "搜索" 无前序查询：不是通用确认，搜索意图查询为空
        let reply = f.concierge.process("搜索").await.unwrap();
        assert_eq!(reply, EMPTY_QUERY_REPLY);

        // "好的搜索" 同时命中通用确认，落到移交分支
        f.concierge.process("好的搜索").await.unwrap();
        assert_eq!(f.workspace.tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_generic_confirmation_hands_off_with_window() {
        let f = fixture(MockProvider::new().with_reply("生成的内容"), false).await;
        f.concierge.process("我想写一篇关于熊猫的小红书").await.unwrap();
        let reply = f.concierge.process("好的开始生成").await.unwrap();
        assert_eq!(reply, "生成的内容");

        let tasks = f.workspace.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert!(tasks[0].contains("用户: 我想写一篇关于熊猫的小红书"));
        assert!(tasks[0].contains("用户: 好的开始生成"));

        let sent = f.provider.last_messages();
        assert_eq!(sent[0].content, "orchestrator persona");
    }

    #[tokio::test]
    async fn test_finish_turn_pairs_user_and_reply() {
        let f = fixture(MockProvider::new(), false).await;
        f.concierge.process("你好").await.unwrap();

        // 已完成的一轮不重复记录
        let reply = f.concierge.finish_turn("你好", "other".into()).await;
        assert_eq!(reply, "Echo from Mock: 你好");
        assert_eq!(f.conversation.len().await, 2);

        // 用户轮已记录但没有回复
        f.conversation.append(Role::User, "半截").await;
        f.concierge.finish_turn("半截", "补上".into()).await;
        // 用户轮也没记录
        f.concierge.finish_turn("全新", "回复".into()).await;

        let roles: Vec<Role> = f
            .conversation
            .messages()
            .await
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
        let last = f.conversation.last_message().await.unwrap();
        assert_eq!(last.content, "回复");
    }

    #[tokio::test]
    async fn test_blank_input_is_error_and_not_recorded() {
        let f = fixture(MockProvider::new(), false).await;
        assert!(matches!(f.concierge.process("   ").await, Err(AgentError::EmptyInput)));
        assert!(f.conversation.is_empty().await);
    }
}
