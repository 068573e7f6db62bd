//! Gemini Provider（Google Generative Language REST API）
//!
//! 非流式走 `:generateContent`，流式走 `:streamGenerateContent?alt=sse`。
//! 不读取响应里的用量元数据，token 数一律按「字符数 / 4」估算，费用因此只是近似值。

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::BackendSection;
use crate::llm::stream::FragmentSource;
use crate::llm::traits::{Completion, LlmError, Provider};
use crate::llm::usage::{Pricing, TokenUsage};
use crate::memory::{Message, Role};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_15_PRO: &str = "gemini-1.5-pro";
pub const GEMINI_DISPLAY_NAME: &str = "Gemini 1.5 Pro";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gemini Provider
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    name: String,
    pricing: Pricing,
}

impl GeminiProvider {
    pub fn new(base_url: &str, api_key: &str, model: &str, name: &str, pricing: Pricing) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            name: name.to_string(),
            pricing,
        }
    }

    fn url(&self, stream: bool) -> String {
        if stream {
            format!(
                "{}/models/{}:streamGenerateContent?alt=sse",
                self.base_url, self.model
            )
        } else {
            format!("{}/models/{}:generateContent", self.base_url, self.model)
        }
    }

    async fn post(&self, stream: bool, messages: &[Message]) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(self.url(stream))
            .header("x-goog-api-key", &self.api_key)
            .json(&GeminiRequest::from_messages(messages))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

/// 创建 Gemini Provider；没有 key 时返回 None
///
/// 单价按每百万 token 配置（默认 0.375 / 1.875）。
pub fn create_gemini_provider(section: &BackendSection) -> Option<GeminiProvider> {
    let api_key = section.resolve_api_key(GEMINI_API_KEY_ENV)?;
    let pricing = Pricing::per_million(
        section.cost_input.unwrap_or(0.375),
        section.cost_output.unwrap_or(1.875),
    );

    let (model, name) = section.model_and_name(GEMINI_15_PRO, GEMINI_DISPLAY_NAME);

    Some(GeminiProvider::new(
        section.base_url.as_deref().unwrap_or(GEMINI_BASE_URL),
        &api_key,
        &model,
        &name,
        pricing,
    ))
}

fn map_reqwest_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Network(e.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
}

impl GeminiRequest {
    /// system 消息合并进 systemInstruction，assistant 角色在 Gemini 中叫 model
    fn from_messages(messages: &[Message]) -> Self {
        let system: Vec<GeminiPart> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| GeminiPart {
                text: m.content.clone(),
            })
            .collect();

        let contents = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(if m.role == Role::Assistant { "model" } else { "user" }.to_string()),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        Self {
            contents,
            system_instruction: (!system.is_empty()).then_some(GeminiSystemInstruction { parts: system }),
        }
    }
}

#[derive(Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .map(|p| p.text.as_str())
            .collect()
    }
}

/// 解析一行 SSE；非 data 行返回 None
fn parse_sse_line(line: &str) -> Option<Result<String, LlmError>> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    Some(
        serde_json::from_str::<GeminiResponse>(data)
            .map(|r| r.text())
            .map_err(|e| LlmError::Stream(format!("invalid SSE chunk: {}", e))),
    )
}

type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>;

/// 按行切分 SSE 字节流；按字节缓冲，避免多字节字符跨块被截断
struct GeminiSseSource {
    bytes: ByteStream,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String, LlmError>>,
    finished: bool,
}

impl GeminiSseSource {
    fn new(bytes: ByteStream) -> Self {
        Self {
            bytes,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(item) = parse_sse_line(&line) {
                self.pending.push_back(item);
            }
        }
    }
}

#[async_trait]
impl FragmentSource for GeminiSseSource {
    async fn receive(&mut self) -> Option<Result<String, LlmError>> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                if item.is_err() {
                    self.finished = true;
                    self.pending.clear();
                }
                return Some(item);
            }
            if self.finished {
                return None;
            }
            match self.bytes.next().await {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    self.drain_lines();
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(LlmError::Stream(e.to_string())));
                }
                None => {
                    self.finished = true;
                    // 末尾没有换行的残留行
                    self.buffer.push(b'\n');
                    self.drain_lines();
                }
            }
        }
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn id(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn pricing(&self) -> Pricing {
        self.pricing
    }

    async fn complete(&self, messages: &[Message]) -> Result<Completion, LlmError> {
        let response = self.post(false, messages).await?;
        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = parsed.text();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let input_chars: String = messages.iter().map(|m| m.content.as_str()).collect();
        let usage = TokenUsage::new(
            TokenUsage::estimate_tokens(&input_chars),
            TokenUsage::estimate_tokens(&text),
            0,
        );

        Ok(Completion {
            message: Message::assistant(text),
            usage,
        })
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
    ) -> Result<Box<dyn FragmentSource>, LlmError> {
        let response = self.post(true, messages).await?;
        let bytes: ByteStream = Box::pin(response.bytes_stream().map(|r| r.map(|b| b.to_vec())));
        Ok(Box::new(GeminiSseSource::new(bytes)))
    }
}
