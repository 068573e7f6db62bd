//! 对话路由：Concierge（接待）与 Orchestrator（执行）两个 Agent 角色

pub mod concierge;
pub mod orchestrator;
pub mod prompts;

pub use concierge::{Concierge, Route};
pub use orchestrator::Orchestrator;
pub use prompts::Personas;
