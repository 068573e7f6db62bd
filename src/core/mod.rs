//! 核心层：错误类型、组件构建与助手门面

pub mod assistant;
pub mod builder;
pub mod error;

pub use assistant::{Assistant, StatusReport};
pub use builder::{create_assistant_builder, register_providers_from_config, AssistantBuilder};
pub use error::AgentError;
