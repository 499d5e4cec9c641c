//! # 示例应用程序
//!
//! 演示如何使用 Lorn Koin 声明模块、加载属性并解析组件

use anyhow::Context;
use clap::Parser;
use config_impl::{
    file_property_source, EnvironmentPropertySource, MapPropertySource, PropertySourceChain,
};
use di_abstractions::Module;
use infrastructure_composition::{start_koin, stop_koin, KoinApplication, LoggingConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn Koin 示例应用")]
struct Args {
    /// 属性文件路径（TOML 或 JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 环境变量前缀
    #[arg(long, default_value = "LORN")]
    env_prefix: String,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 是否使用 JSON 日志格式
    #[arg(long)]
    json_logs: bool,

    /// 启动后预检所有组件定义
    #[arg(long)]
    dry_run: bool,
}

/// 应用设置
#[derive(Debug)]
struct AppSettings {
    name: String,
    greeting: String,
}

/// 用户仓储
#[derive(Debug)]
struct UserRepository {
    users: Vec<String>,
}

/// 用户服务
struct UserService {
    settings: Arc<AppSettings>,
    repository: Arc<UserRepository>,
}

impl UserService {
    fn greet_all(&self) -> Vec<String> {
        self.repository
            .users
            .iter()
            .map(|user| format!("[{}] {}, {}", self.settings.name, self.settings.greeting, user))
            .collect()
    }
}

fn app_module() -> Module {
    Module::root()
        .created_at_start()
        .single(|r| {
            Ok(AppSettings {
                name: r.get_property("app.name")?.unwrap_or_else(|| "example-app".to_string()),
                greeting: r.get_property("app.greeting")?.unwrap_or_else(|| "你好".to_string()),
            })
        })
}

fn user_module() -> Module {
    Module::root()
        .single(|_| {
            Ok(UserRepository {
                users: vec!["alice".to_string(), "bob".to_string()],
            })
        })
        .single(|r| {
            Ok(UserService {
                settings: r.get()?,
                repository: r.get()?,
            })
        })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::default().with_level(parse_log_level(&args.log_level));
    logging.json_format = args.json_logs;

    let app = KoinApplication::init();
    app.with_logging(logging)?;

    info!("启动 Lorn Koin 示例应用");

    // 默认属性优先级最低，文件和环境变量依次覆盖
    let mut sources = PropertySourceChain::new()
        .with_source(MapPropertySource::default().with_property("app.name", "example-app"))
        .with_source(EnvironmentPropertySource::new(&args.env_prefix));
    if let Some(path) = &args.config {
        sources.add_source(file_property_source(path));
    }
    app.load_properties(&sources)
        .await
        .with_context(|| format!("加载属性失败: {:?}", sources))?;

    app.modules(&[app_module(), user_module()])?;
    let app = start_koin(app)?;

    if args.dry_run {
        app.koin().dry_run().context("组件预检失败")?;
        info!("组件预检通过");
    }

    let service = app.get::<UserService>()?;
    for line in service.greet_all() {
        info!("{}", line);
    }

    stop_koin();
    info!("应用已退出");
    Ok(())
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
