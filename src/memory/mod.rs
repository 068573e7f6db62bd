//! 会话状态：对话日志、工作空间、滚动窗口
//!
//! 全部是进程内状态，进程退出即丢失。

pub mod conversation;
pub mod window;
pub mod workspace;

pub use conversation::{ConversationState, Message, Role};
pub use window::{RollingWindow, DEFAULT_WINDOW_SIZE};
pub use workspace::WorkspaceState;
