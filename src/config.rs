//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `LOOMI__*` 覆盖（双下划线表示嵌套，如 `LOOMI__LLM__DEEPSEEK__API_KEY=...`）。
//! API Key 只作为不透明字符串传给后端，不写日志、不进错误信息。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub tools: ToolsSection,
}

/// [app] 段：滚动窗口大小、超时、提示词目录
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    /// 滚动窗口保留的最近轮数（用于构建任务描述）
    pub window_size: usize,
    /// 单轮对话超时（秒）
    pub turn_timeout_secs: u64,
    /// 单次模型调用超时（秒），应小于 turn_timeout_secs
    pub model_timeout_secs: u64,
    /// 显式启动 Orchestrator 的超时（秒）
    pub orchestrator_start_timeout_secs: u64,
    /// 人设提示词目录（concierge.md / orchestrator.md），缺失时用内置文本
    pub prompts_dir: PathBuf,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            window_size: 10,
            turn_timeout_secs: 30,
            model_timeout_secs: 25,
            orchestrator_start_timeout_secs: 60,
            prompts_dir: PathBuf::from("config/prompts"),
        }
    }
}

/// [llm] 段：默认激活的后端 + 各后端参数
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LlmSection {
    /// 注册完成后要激活的 provider id；为空时第一个注册的生效
    pub default_provider: Option<String>,
    pub doubao: BackendSection,
    pub deepseek: BackendSection,
    pub gemini: BackendSection,
}

/// [llm.<backend>] 段：未填写的字段使用各后端内置默认值
///
/// cost_input / cost_output 的单位与厂商报价一致：OpenAI 兼容后端为每千 token，Gemini 为每百万 token。
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct BackendSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub cost_input: Option<f64>,
    pub cost_output: Option<f64>,
}

impl BackendSection {
    /// 配置中的 key 优先，其次读约定的环境变量；空串视为未配置
    pub fn resolve_api_key(&self, env_var: &str) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(env_var).ok())
            .filter(|k| !k.trim().is_empty())
    }

    /// 实际使用的 (模型名, 展示名)；覆盖了默认模型时展示名后附模型名
    pub fn model_and_name(&self, default_model: &str, display_name: &str) -> (String, String) {
        match self.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(model) if model != default_model => {
                (model.to_string(), format!("{} ({})", display_name, model))
            }
            _ => (default_model.to_string(), display_name.to_string()),
        }
    }
}

/// [tools] 段：搜索工具超时与各搜索后端
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 单次搜索请求超时（秒）
    pub timeout_secs: u64,
    pub serper: SerperSection,
    pub tavily: TavilySection,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            serper: SerperSection::default(),
            tavily: TavilySection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SerperSection {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub num_results: u32,
}

impl Default for SerperSection {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://google.serper.dev/search".to_string(),
            num_results: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TavilySection {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub max_results: u32,
    /// basic / advanced
    pub search_depth: String,
}

impl Default for TavilySection {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.tavily.com/search".to_string(),
            max_results: 10,
            search_depth: "basic".to_string(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 LOOMI__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 LOOMI__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default", "default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("LOOMI")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

/// 加载失败时退回默认配置并告警，保证 REPL 可以启动
pub fn load_config_or_default(config_path: Option<PathBuf>) -> AppConfig {
    match load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "config load failed, using defaults");
            AppConfig::default()
        }
    }
}
