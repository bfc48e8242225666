//! # 示例应用程序
//!
//! 演示组件注册、依赖注入与生命周期管理

mod components;

use anyhow::Context as _;
use clap::Parser;
use components::{MapCache, MemoryUserRepository, UserController, UserService, UserServiceImpl};
use ioc_common::{ContainerConfig, InjectionPolicy};
use ioc_container::ApplicationContext;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "basic-app")]
#[command(about = "Lorn IoC 示例应用")]
struct Args {
    /// 容器配置文件路径
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 使用 JSON 格式输出日志
    #[arg(long)]
    json: bool,

    /// 必需依赖缺失时启动失败
    #[arg(long)]
    strict: bool,
}

/// 日志配置
#[derive(Debug, Clone)]
struct LoggingConfig {
    level: tracing::Level,
    show_target: bool,
    json_format: bool,
}

impl LoggingConfig {
    fn from_args(args: &Args) -> Self {
        Self {
            level: parse_log_level(&args.log_level),
            show_target: true,
            json_format: args.json,
        }
    }

    fn init(&self) -> anyhow::Result<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| anyhow::anyhow!("日志初始化失败: {e}"))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    LoggingConfig::from_args(&args).init()?;

    info!("启动 Lorn IoC 示例应用");

    let mut config = ContainerConfig::load(args.config.as_deref()).context("加载容器配置失败")?;
    if args.strict {
        config = config.with_injection_policy(InjectionPolicy::Strict);
    }

    let ctx = ApplicationContext::builder().with_config(config).build();
    register_components(&ctx)?;

    ctx.start().context("应用上下文启动失败")?;
    info!("初始化顺序: {:?}", ctx.init_order());

    demonstrate(&ctx);

    let report = ctx.stop().context("应用上下文停止失败")?;
    for failure in &report.failures {
        error!("销毁失败: {}", failure);
    }
    info!("销毁顺序: {:?}", ctx.destroy_order());

    info!("应用已关闭");
    Ok(())
}

/// 注册示例组件
fn register_components(ctx: &ApplicationContext) -> anyhow::Result<()> {
    ctx.register_component(Arc::new(MemoryUserRepository::default()))?;
    ctx.register_component(Arc::new(MapCache::default()))?;
    ctx.register_interface::<dyn UserService, _>(
        "userService",
        Arc::new(UserServiceImpl::default()),
    )?;
    ctx.register_component(Arc::new(UserController::default()))?;

    info!("已注册组件: {:?}", ctx.registry().registration_order());
    Ok(())
}

/// 演示组件使用
fn demonstrate(ctx: &ApplicationContext) {
    let Some(controller) = ctx.get_bean_as::<UserController>("userController") else {
        warn!("未找到 userController");
        return;
    };

    info!("{}", controller.show(1));
    info!("{}", controller.show(1));
    info!("{}", controller.show(42));

    if let Some(user) = controller.register("王五", "wangwu@example.com") {
        info!("创建用户: {:?}", user);
    }

    // 原型控制器每次解析都是新实例，共享同一个单例服务
    if let Some(other) = ctx.get_bean_as::<UserController>("userController") {
        info!("新控制器实例: {}", !Arc::ptr_eq(&controller, &other));
        info!("{}", other.show(100));
    }
}

/// 解析日志级别
fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
