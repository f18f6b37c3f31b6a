use std::path::Path;

use clap::Parser;
use scrawl_config::{AppConfig, ConfigError};
use scrawl_frontend::Cli;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = load_configuration(cli.config.as_deref());
    init_logging(&config);
    if let Some(err) = config_error {
        match &err {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                warn!(path = %path.display(), error = %err, "加载配置失败，使用内建默认值");
            }
            ConfigError::Context { .. } => {
                warn!(error = %err, "加载配置失败，使用内建默认值");
            }
        }
    }
    info!("启动 scrawl2vtt");

    if let Err(err) = scrawl_frontend::run_cli(&cli, &config) {
        error!(error = %err, "转换失败");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// 日志尚未初始化，加载失败的原因交由调用方在初始化后记录。
fn load_configuration(override_path: Option<&Path>) -> (AppConfig, Option<ConfigError>) {
    let loaded = match override_path {
        Some(path) => AppConfig::from_file(path),
        None => AppConfig::discover(),
    };
    match loaded {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

/// `RUST_LOG` 优先，其次使用配置中的日志等级；日志写入 stderr，stdout 只输出结果。
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.logging.level.clone()))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
