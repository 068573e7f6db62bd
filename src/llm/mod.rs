//! 模型调度层：Provider 抽象、流式适配、计费统计与调度管理器

pub mod deepseek;
pub mod doubao;
pub mod gemini;
pub mod manager;
pub mod mock;
pub mod openai;
pub mod stream;
pub mod traits;
pub mod usage;

pub use deepseek::create_deepseek_provider;
pub use doubao::create_doubao_provider;
pub use gemini::{create_gemini_provider, GeminiProvider};
pub use manager::ModelManager;
pub use mock::MockProvider;
pub use openai::OpenAiProvider;
pub use stream::{collect, FragmentSource, MessageStream, StreamSource, STREAM_BUFFER};
pub use traits::{process_text, Completion, LlmError, Provider};
pub use usage::{Pricing, SessionStats, TokenUsage};
