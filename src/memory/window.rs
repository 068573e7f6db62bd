//! 滚动窗口：只保留最近 N 轮（默认 10），用于构建任务描述与回看搜索意图

use std::collections::VecDeque;

use crate::memory::{Message, Role};

pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// 构建任务描述时最多取的轮数
pub const TASK_DESCRIPTION_TURNS: usize = 10;

#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    entries: VecDeque<Message>,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// 追加一轮，超出容量时丢弃最旧的
    pub fn push(&mut self, message: Message) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    /// 旧 → 新
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 由最近至多 10 轮拼出的内容生成任务描述（旧 → 新，每行 "用户: ..." / "助手: ..."）
    pub fn task_description(&self) -> String {
        if self.entries.is_empty() {
            return "用户确认了内容需求，请生成相应的社交媒体内容。".to_string();
        }

        let skip = self.entries.len().saturating_sub(TASK_DESCRIPTION_TURNS);
        let mut description = String::from("根据以下对话历史，生成相应的社交媒体内容：\n\n");
        for m in self.entries.iter().skip(skip) {
            let speaker = match m.role {
                Role::User => "用户",
                Role::Assistant => "助手",
                Role::System => "系统",
            };
            description.push_str(&format!("{}: {}\n", speaker, m.content));
        }
        description.push_str("\n请根据上述对话内容，生成符合用户需求的社交媒体内容。");
        description
    }
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest() {
        let mut window = RollingWindow::new(3);
        for i in 0..5 {
            window.push(Message::user(i.to_string()));
        }
        let contents: Vec<&str> = window.entries().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["2", "3", "4"]);
        assert_eq!(window.capacity(), 3);
    }

    #[test]
    fn test_task_description_format() {
        let mut window = RollingWindow::default();
        window.push(Message::user("写一篇熊猫文案"));
        window.push(Message::assistant("好的，要什么风格？"));
        let description = window.task_description();
        assert!(description.starts_with("根据以下对话历史"));
        assert!(description.contains("用户: 写一篇熊猫文案\n助手: 好的，要什么风格？\n"));
        assert!(description.ends_with("生成符合用户需求的社交媒体内容。"));
    }

    #[test]
    fn test_task_description_caps_at_ten_turns() {
        let mut window = RollingWindow::new(20);
        for i in 0..15 {
            window.push(Message::user(format!("turn-{i:02}")));
        }
        let description = window.task_description();
        assert!(!description.contains("turn-04"));
        assert!(description.contains("turn-05"));
        assert!(description.contains("turn-14"));
    }

    #[test]
    fn test_empty_window_description() {
        assert_eq!(
            RollingWindow::default().task_description(),
            "用户确认了内容需求，请生成相应的社交媒体内容。"
        );
    }
}
