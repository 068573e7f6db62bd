//! Serper 搜索工具（Google 实时网络搜索）
//!
//! POST {endpoint}，JSON `{q, num}`，鉴权头 `X-API-KEY`；取响应中的 organic 列表。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::tools::registry::{SearchTool, ToolError};
use crate::tools::types::{format_results, SearchResult};

pub struct SerperTool {
    client: Client,
    endpoint: String,
    api_key: String,
    num_results: u32,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperOrganic>,
}

#[derive(Deserialize)]
struct SerperOrganic {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
    date: Option<String>,
}

impl SerperTool {
    pub fn new(endpoint: &str, api_key: &str, num_results: u32, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            num_results,
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, ToolError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query, "num": self.num_results }))
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
    let parsed: SerperResponse =
        serde_json::from_str(body).map_err(|e| ToolError::Parse(e.to_string()))?;
    Ok(parsed
        .organic
        .into_iter()
        .map(|o| SearchResult {
            title: o.title,
            url: o.link,
            snippet: o.snippet,
            source: "serper".to_string(),
            published_at: o.date,
        })
        .collect())
}

#[async_trait]
impl SearchTool for SerperTool {
    fn name(&self) -> &str {
        "Serper"
    }

    fn description(&self) -> &str {
        "实时网络搜索"
    }

    async fn execute(&self, query: &str) -> Result<String, ToolError> {
        let results = self.search(query).await?;
        tracing::debug!(tool = "serper", results = results.len(), "search done");
        Ok(format_results(self.name(), query, &results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::serve_once;

    #[test]
    fn test_parse_organic() {
        let body = r#"{"searchParameters":{"q":"熊猫"},"organic":[
            {"title":"大熊猫","link":"https://a.example","snippet":"国宝","position":1},
            {"title":"小熊猫","link":"https://b.example","snippet":"不是熊猫","date":"3 days ago"}
        ]}"#;
        let results = parse_response(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://a.example");
        assert_eq!(results[1].published_at.as_deref(), Some("3 days ago"));
        assert!(results.iter().all(|r| r.source == "serper"));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_response("not json"), Err(ToolError::Parse(_))));
        assert!(parse_response("{}").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_sends_key_and_formats() {
        let (url, server) = serve_once(
            200,
            r#"{"organic":[{"title":"T","link":"https://t.example","snippet":"S"}]}"#,
        )
        .await;
        let tool = SerperTool::new(&url, "serper-key", 10, 5);
        let text = tool.execute("熊猫").await.unwrap();
        assert!(text.starts_with("🔍 Serper搜索结果 - 查询: 熊猫"));
        assert!(text.contains("1. **T**\n   S\n   链接: https://t.example"));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("x-api-key: serper-key"));
        assert!(request.contains("\"num\":10"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let (url, _server) = serve_once(403, r#"{"message":"bad key"}"#).await;
        let tool = SerperTool::new(&url, "k", 10, 5);
        let err = tool.execute("q").await.unwrap_err();
        assert!(matches!(err, ToolError::Status { status: 403, .. }));
    }
}
