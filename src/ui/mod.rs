//! 命令行交互层：行式 REPL（repl）与命令解析（command），彩色输出用 crossterm

pub mod command;
pub mod repl;

pub use command::{parse_model_choice, ReplCommand, HELP_TEXT};
pub use repl::{format_status, run_repl};
