//! 行式 REPL 主循环
//!
//! 启动时打印横幅并让用户选择模型，然后逐行读取 stdin：保留字执行对应命令，
//! 其余内容在单轮超时内交给助手处理。日志走 stderr，这里只向 stdout 输出对话。

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    execute,
    style::Stylize,
    terminal::{Clear, ClearType},
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::core::{Assistant, StatusReport};
use crate::ui::command::{parse_model_choice, ReplCommand, HELP_TEXT};

const BANNER: &str = r#"
 _                           _
| |    ___   ___  _ __ ___  (_)
| |   / _ \ / _ \| '_ ` _ \ | |
| |__| (_) | (_) | | | | | || |
|_____\___/ \___/|_| |_| |_||_|   2.0
"#;

/// 把状态快照格式化为多行文本
pub fn format_status(status: &StatusReport) -> String {
    let s = &status.stats;
    format!(
        "📊 会话统计:\n\
         总调用次数: {}\n\
         总输入Token: {}\n\
         总输出Token: {}\n\
         总思考Token: {}\n\
         总费用: ${:.4}\n\
         当前模型: {}\n\
         降级回复次数: {}\n\
         编排器: {}\n\n\
         {}\n\
         {}",
        s.total_calls,
        s.total_input_tokens,
        s.total_output_tokens,
        s.total_thinking_tokens,
        s.total_cost,
        status.active_model.as_deref().unwrap_or("未选择"),
        status.fallback_replies,
        if status.orchestrator_running { "运行中" } else { "未启动" },
        status.workspace_summary.trim_end(),
        status.conversation_summary.trim_end(),
    )
}

fn prompt(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", text)?;
    stdout.flush()
}

/// 列出已注册模型并读取用户选择（回车默认第一个）
async fn select_model(assistant: &Assistant, lines: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<()> {
    let providers = assistant.manager().list_providers().await;
    if providers.len() <= 1 {
        return Ok(());
    }

    println!("{}", "可用模型：".bold());
    for (i, (id, name)) in providers.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, name, id);
    }
    prompt(&format!("请选择模型 [1-{}] (默认 1): ", providers.len()))?;

    let line = lines.next_line().await?.unwrap_or_default();
    let index = parse_model_choice(&line, providers.len()).unwrap_or_else(|| {
        println!("{}", "无效选择，使用默认模型".yellow());
        0
    });
    assistant.select_model(&providers[index].0).await?;
    Ok(())
}

/// 运行 REPL 直到 quit 或 stdin 关闭
pub async fn run_repl(assistant: Assistant) -> anyhow::Result<()> {
    println!("{}", BANNER.cyan());
    println!("欢迎使用 Loomi 2.0，社媒内容研究与生产助手。输入 help 查看命令。\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    select_model(&assistant, &mut lines).await?;

    if let Some(name) = assistant.manager().active_name().await {
        println!("当前模型: {}\n", name.green());
    }

    loop {
        prompt(&format!("{} ", "你>".bold().blue()))?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}\n", HELP_TEXT),
            ReplCommand::Status => println!("{}\n", format_status(&assistant.status().await)),
            ReplCommand::Clear => {
                execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
            }
            ReplCommand::Orchestrator => match assistant.start_orchestrator().await {
                Ok(()) => println!("{}\n", "✅ 编排器已启动".green()),
                Err(e) => println!("{}\n", format!("❌ 编排器启动失败: {}", e).red()),
            },
            ReplCommand::Chat(text) => match assistant.process_with_timeout(&text).await {
                Ok(reply) => println!("{}\n{}\n", "Loomi>".bold().green(), reply),
                Err(e) => println!("{}\n", format!("❌ 处理失败: {}", e).red()),
            },
        }
    }

    assistant.stop_orchestrator();
    println!("再见！");
    Ok(())
}
