//! Tavily 搜索工具（面向 LLM 的高质量检索）
//!
//! POST {endpoint}，JSON `{query, search_depth, include_answer, include_raw_content, max_results}`，
//! 鉴权头 `Authorization: Bearer <key>`；取响应中的 results 列表。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::tools::registry::{SearchTool, ToolError};
use crate::tools::types::{format_results, SearchResult};

pub struct TavilyTool {
    client: Client,
    endpoint: String,
    api_key: String,
    max_results: u32,
    search_depth: String,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    max_results: u32,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
    #[serde(alias = "published_date")]
    published_at: Option<String>,
}

impl TavilyTool {
    pub fn new(
        endpoint: &str,
        api_key: &str,
        max_results: u32,
        search_depth: &str,
        timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            max_results,
            search_depth: search_depth.to_string(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let request = TavilyRequest {
            query,
            search_depth: &self.search_depth,
            include_answer: false,
            include_raw_content: false,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ToolError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<Vec<SearchResult>, ToolError> {
    let parsed: TavilyResponse =
        serde_json::from_str(body).map_err(|e| ToolError::Parse(e.to_string()))?;
    Ok(parsed
        .results
        .into_iter()
        .map(|r| SearchResult {
            title: r.title,
            url: r.url,
            snippet: r.content,
            source: "tavily".to_string(),
            published_at: r.published_at,
        })
        .collect())
}

#[async_trait]
impl SearchTool for TavilyTool {
    fn name(&self) -> &str {
        "Tavily"
    }

    fn description(&self) -> &str {
        "高质量信息搜索"
    }

    async fn execute(&self, query: &str) -> Result<String, ToolError> {
        let results = self.search(query).await?;
        tracing::debug!(tool = "tavily", results = results.len(), "search done");
        Ok(format_results(self.name(), query, &results))
    }
}
