pub mod cli;
pub mod errors;
pub mod loader;
pub mod resource_locator;

use std::path::PathBuf;

use errors::FrontendError;
use scrawl_config::AppConfig;
use tracing::info;

pub use cli::Cli;

/// 执行一次命令行转换，返回写出的场景文件路径。
pub fn run_cli(cli: &Cli, config: &AppConfig) -> Result<PathBuf, FrontendError> {
    info!(source = %cli.source.display(), "启动 CLI 转换");
    cli::run(cli, config)
}
