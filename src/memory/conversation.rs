//! 对话状态：只追加的消息日志
//!
//! 所有 Agent 共享同一个 ConversationState；写入只能通过 append（独占锁），
//! 读取返回快照副本（共享锁），因此并发读者永远看不到半条写入或乱序。

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条消息，创建后不可变
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

/// 会话级对话日志：严格按追加顺序保存，不支持删除或重排
#[derive(Debug)]
pub struct ConversationState {
    session_id: String,
    messages: RwLock<Vec<Message>>,
}

impl ConversationState {
    /// 新建会话，会话 ID 形如 `session_<unix秒>`
    pub fn new() -> Self {
        Self::with_session_id(format!("session_{}", Utc::now().timestamp()))
    }

    pub fn with_session_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            messages: RwLock::new(Vec::new()),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// 追加一条消息并返回它的副本
    pub async fn append(&self, role: Role, content: impl Into<String>) -> Message {
        let message = Message::new(role, content);
        self.messages.write().await.push(message.clone());
        message
    }

    /// 全部消息的快照
    pub async fn messages(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    pub async fn last_message(&self) -> Option<Message> {
        self.messages.read().await.last().cloned()
    }

    pub async fn messages_by_role(&self, role: Role) -> Vec<Message> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| m.role == role)
            .cloned()
            .collect()
    }

    /// 最近 count 条消息（旧 → 新）
    pub async fn recent(&self, count: usize) -> Vec<Message> {
        let messages = self.messages.read().await;
        let start = messages.len().saturating_sub(count);
        messages[start..].to_vec()
    }

    /// 以 "role: content" 逐行拼接的完整历史
    pub async fn history_text(&self) -> String {
        self.messages
            .read()
            .await
            .iter()
            .map(|m| format!("{}: {}\n", m.role, m.content))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// 对话摘要：会话 ID、消息总数、各角色消息数
    pub async fn summary(&self) -> String {
        let messages = self.messages.read().await;
        let mut role_count: BTreeMap<Role, usize> = BTreeMap::new();
        for m in messages.iter() {
            *role_count.entry(m.role).or_default() += 1;
        }

        let mut s = String::from("对话摘要:\n");
        s.push_str(&format!("- 会话ID: {}\n", self.session_id));
        s.push_str(&format!("- 消息总数: {}\n", messages.len()));
        for (role, count) in role_count {
            s.push_str(&format!("- {}消息: {}\n", role, count));
        }
        s
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
