//! REPL 命令解析
//!
//! 保留字（忽略大小写）转为对应命令，其余非空输入都作为一轮对话交给助手。

/// REPL 中一行输入的含义
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    Status,
    Clear,
    /// 启动 Orchestrator
    Orchestrator,
    /// 普通对话内容（已去首尾空白）
    Chat(String),
    /// 空行
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplCommand::Empty;
        }
        match line.to_lowercase().as_str() {
            "quit" | "exit" | "q" => ReplCommand::Quit,
            "help" | "h" => ReplCommand::Help,
            "status" => ReplCommand::Status,
            "clear" => ReplCommand::Clear,
            "orchestrator" | "orch" => ReplCommand::Orchestrator,
            _ => ReplCommand::Chat(line.to_string()),
        }
    }
}

pub const HELP_TEXT: &str = "可用命令：
  help, h          显示帮助
  status           显示调用统计与当前模型
  clear            清屏
  orchestrator     启动编排器（别名 orch）
  quit, exit, q    退出

其他输入将作为对话内容发送给 Loomi。
例如：搜索关于熊猫的新闻 → 回复 '搜索' 执行；描述需求后回复 '好的' 开始生成内容。";

/// 解析模型选择输入：空输入为 1；返回 0 起的下标，越界或非数字返回 None
pub fn parse_model_choice(input: &str, count: usize) -> Option<usize> {
    let input = input.trim();
    let n: usize = if input.is_empty() { 1 } else { input.parse().ok()? };
    (1..=count).contains(&n).then(|| n - 1)
}
