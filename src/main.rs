//! Loomi - 社媒内容研究与生产助手
//!
//! 入口：初始化日志、加载配置、组装助手并运行 REPL。
//!
//! 用法：`loomi [--config <path>] [start]`，`loomi version` 打印版本后退出。

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use loomi::{core::create_assistant_builder, observability, ui::run_repl};

#[derive(Debug, Parser)]
#[command(name = "loomi", version, about = "社媒内容研究与生产助手")]
struct Cli {
    /// 配置文件路径；缺省时按默认路径查找 config/default.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 启动助手，进入交互模式（默认）
    Start,
    /// 显示版本信息
    Version,
}

fn print_version() {
    println!("Loomi 2.0");
    println!("版本: v{}", env!("CARGO_PKG_VERSION"));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Start) {
        Command::Version => {
            print_version();
            Ok(())
        }
        Command::Start => {
            // 日志：默认 info，可通过 RUST_LOG 覆盖；写 stderr
            observability::init();

            let assistant = create_assistant_builder(cli.config)
                .build()
                .await
                .context("Failed to initialize assistant")?;

            run_repl(assistant).await.context("REPL failed")?;
            Ok(())
        }
    }
}
