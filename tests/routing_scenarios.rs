//! 路由端到端测试：只用公开 API，Mock 模型 + 本地静态搜索工具

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use loomi::agents::prompts::{search_confirmation_prompt, CONCIERGE_FALLBACK_REPLY};
use loomi::agents::Personas;
use loomi::config::AppConfig;
use loomi::core::{AgentError, AssistantBuilder};
use loomi::llm::{LlmError, MockProvider, ModelManager, Pricing, Provider, TokenUsage};
use loomi::memory::Role;
use loomi::tools::{
    detect_search_intent, result_separator, SearchTool, ToolError, ToolRegistry,
    NO_TOOLS_SENTINEL,
};

/// 记录调用次数的静态搜索工具
struct CannedTool {
    name: &'static str,
    reply: Result<String, ToolError>,
    calls: AtomicUsize,
}

impl CannedTool {
    fn ok(name: &'static str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
        })
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Err(ToolError::Network("connection refused".into())),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchTool for CannedTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "canned results"
    }

    async fn execute(&self, _query: &str) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

fn registry(tools: &[Arc<CannedTool>]) -> ToolRegistry {
    let mut registry = ToolRegistry::new(5);
    for tool in tools {
        registry.register_arc(tool.clone());
    }
    registry
}

async fn assistant_with(provider: Arc<MockProvider>, tools: ToolRegistry) -> loomi::Assistant {
    AssistantBuilder::new(AppConfig::default())
        .with_provider(provider)
        .with_tools(tools)
        .with_personas(Personas::default())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn search_request_asks_for_confirmation_first() {
    assert_eq!(
        detect_search_intent("搜索关于熊猫的新闻"),
        (true, "熊猫".to_string())
    );

    let serper = CannedTool::ok("Serper", "serper: panda");
    let tavily = CannedTool::ok("Tavily", "tavily: panda");
    let provider = Arc::new(MockProvider::new());
    let assistant = assistant_with(provider.clone(), registry(&[serper.clone(), tavily.clone()])).await;

    let reply = assistant.process_user_input("搜索关于熊猫的新闻").await.unwrap();
    assert_eq!(reply, search_confirmation_prompt("熊猫"));
    assert_eq!(serper.calls() + tavily.calls(), 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn confirmation_runs_both_tools_in_order() {
    let serper = CannedTool::ok("Serper", "serper: panda");
    let tavily = CannedTool::ok("Tavily", "tavily: panda");
    let provider = Arc::new(MockProvider::new());
    let assistant = assistant_with(provider.clone(), registry(&[serper.clone(), tavily.clone()])).await;

    assistant.process_user_input("搜索关于熊猫的新闻").await.unwrap();
    let reply = assistant.process_user_input("搜索").await.unwrap();

    assert_eq!(
        reply,
        format!("serper: panda{}tavily: panda", result_separator())
    );
    assert_eq!(serper.calls(), 1);
    assert_eq!(tavily.calls(), 1);
    assert_eq!(provider.calls(), 0);

    let messages = assistant.conversation().messages().await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3].role, Role::Assistant);
    assert_eq!(messages[3].content, reply);
}

#[tokio::test]
async fn confirmation_with_particle_still_searches() {
    for confirm in ["开始搜索吧", "好的，搜索吧", "好的搜索一下"] {
        let serper = CannedTool::ok("Serper", "serper: panda");
        let tavily = CannedTool::ok("Tavily", "tavily: panda");
        let tools = registry(&[serper.clone(), tavily.clone()]);
        let assistant = assistant_with(Arc::new(MockProvider::new()), tools).await;

        assistant.process_user_input("搜索关于熊猫的新闻").await.unwrap();
        let reply = assistant.process_user_input(confirm).await.unwrap();

        assert_eq!(serper.calls(), 1, "{confirm}");
        assert_eq!(tavily.calls(), 1, "{confirm}");
        assert!(reply.contains("serper: panda"), "{confirm}");
        assert!(assistant.workspace().tasks().await.is_empty(), "{confirm}");
    }
}

#[tokio::test]
async fn slow_model_turn_gets_fallback_reply() {
    let mut config = AppConfig::default();
    config.app.turn_timeout_secs = 1;
    let assistant = AssistantBuilder::new(config)
        .with_provider(Arc::new(
            MockProvider::new().with_delay(Duration::from_secs(3)),
        ))
        .with_tools(ToolRegistry::default())
        .with_personas(Personas::default())
        .build()
        .await
        .unwrap();

    let reply = assistant.process_with_timeout("写一段开场白").await.unwrap();
    assert_eq!(reply, CONCIERGE_FALLBACK_REPLY);
    assert_eq!(assistant.fallback_replies(), 1);

    let messages = assistant.conversation().messages().await;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
}

#[tokio::test]
async fn one_failing_tool_does_not_hide_the_other() {
    let serper = CannedTool::failing("Serper");
    let tavily = CannedTool::ok("Tavily", "tavily: panda");
    let assistant = assistant_with(
        Arc::new(MockProvider::new()),
        registry(&[serper, tavily]),
    )
    .await;

    assistant.process_user_input("search for pandas").await.unwrap();
    let reply = assistant.process_user_input("执行搜索").await.unwrap();

    let failure = reply.find("❌ Serper搜索失败").unwrap();
    let success = reply.find("tavily: panda").unwrap();
    assert!(failure < success);
}

#[tokio::test]
async fn confirmation_without_tools_returns_sentinel() {
    let assistant = assistant_with(Arc::new(MockProvider::new()), ToolRegistry::default()).await;
    assistant.process_user_input("搜索关于熊猫的新闻").await.unwrap();
    let reply = assistant.process_user_input("开始搜索").await.unwrap();
    assert_eq!(reply, NO_TOOLS_SENTINEL);
}

#[tokio::test]
async fn generic_confirmation_hands_off_to_orchestrator() {
    let provider = Arc::new(MockProvider::new().with_reply("熊猫文案草稿"));
    let assistant = assistant_with(provider.clone(), ToolRegistry::default()).await;

    assistant
        .process_user_input("帮我写一篇熊猫主题的小红书笔记")
        .await
        .unwrap();
    let reply = assistant.process_user_input("好的开始生成").await.unwrap();
    assert_eq!(reply, "熊猫文案草稿");

    let tasks = assistant.workspace().tasks().await;
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].contains("用户: 帮我写一篇熊猫主题的小红书笔记"));

    let sent = provider.last_messages();
    assert_eq!(sent[0].role, Role::System);
    assert_eq!(sent[0].content, Personas::default().orchestrator);
}

#[tokio::test]
async fn empty_history_never_reaches_backend() {
    let provider = MockProvider::new();
    assert!(matches!(provider.generate(&[]).await, Err(LlmError::EmptyInput)));
    assert!(matches!(provider.stream(&[]).await, Err(LlmError::EmptyInput)));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn failing_model_yields_fallback_reply() {
    let provider = Arc::new(MockProvider::new().failing(LlmError::Network("down".into())));
    let assistant = assistant_with(provider, ToolRegistry::default()).await;

    let reply = assistant.process_user_input("你好").await.unwrap();
    assert!(reply.contains("Loomi 2.0"));
    assert_eq!(assistant.fallback_replies(), 1);
    assert_eq!(assistant.status().await.stats.total_calls, 0);
}

#[tokio::test]
async fn stats_accumulate_across_calls() {
    let manager = ModelManager::new();
    manager
        .register(Arc::new(
            MockProvider::new()
                .with_pricing(Pricing::per_1k(1.0, 2.0))
                .with_usage(TokenUsage::new(1000, 500, 500)),
        ))
        .await;

    manager.call_active("", "一").await.unwrap();
    manager.call_active("系统", "二").await.unwrap();

    let stats = manager.stats().await;
    assert_eq!(stats.total_calls, 2);
    assert_eq!(stats.total_input_tokens, 2000);
    assert_eq!(stats.total_output_tokens, 1000);
    assert_eq!(stats.total_thinking_tokens, 1000);
    // 每次 1.0 + (500 + 500) / 1000 * 2.0 = 3.0
    assert!((stats.total_cost - 6.0).abs() < 1e-9);

    manager.reset_stats().await;
    assert_eq!(manager.stats().await.total_calls, 0);
}

#[tokio::test]
async fn switching_models_routes_calls() {
    let first = Arc::new(MockProvider::with_id("first", "First").with_reply("from first"));
    let second = Arc::new(MockProvider::with_id("second", "Second").with_reply("from second"));
    let manager = ModelManager::new();
    manager.register(first.clone()).await;
    manager.register(second.clone()).await;

    assert_eq!(manager.call_active("", "hi").await.unwrap(), "from first");
    manager.set_active("second").await.unwrap();
    assert_eq!(manager.call_active("", "hi").await.unwrap(), "from second");
    assert!(matches!(
        manager.set_active("third").await,
        Err(AgentError::ProviderNotFound(_))
    ));
    assert_eq!(manager.active_id().await.as_deref(), Some("second"));
    assert_eq!((first.calls(), second.calls()), (1, 1));
}

#[tokio::test]
async fn streaming_reassembles_reply() {
    let manager = ModelManager::new();
    manager
        .register(Arc::new(MockProvider::new().with_reply("你好，熊猫")))
        .await;

    let mut stream = manager.stream_active("", "hi").await.unwrap();
    let mut text = String::new();
    while let Some(fragment) = stream.next().await {
        text.push_str(&fragment.unwrap().content);
    }
    assert_eq!(text, "你好，熊猫");
}
