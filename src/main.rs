use clap::Parser;

use alpha_steg::{
    cli::{Cli, Commands},
    handler::{handle_hide, handle_recover},
};

/// 程序的主入口点
///
/// 负责初始化日志、解析命令行参数，并根据指定的子命令（`hide` 或 `recover`）
/// 将执行分派到相应的处理函数
fn main() -> anyhow::Result<()> {
    // 日志默认关闭，通过 RUST_LOG 开启
    env_logger::init();

    // 解析命令行参数
    let cli = Cli::parse();

    // 根据子命令调用相应的处理函数
    match cli.command {
        Commands::Hide(args) => handle_hide(args),
        Commands::Recover(args) => handle_recover(args),
    }
}
