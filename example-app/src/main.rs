//! # 示例应用程序
//!
//! 演示如何使用 Lorn IoC 组装组件：配置绑定、字段注入、工厂、可注入函数与应用事件。

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use clap::Parser;
use component_macros::{Autowire, Component, ValueBind};
use config_abstractions::ConfigValue;
use di_abstractions::{
    Autowired, Disposable, FunctionRegistrar, FunctionRegistrarExt, InjectFunction, Initializing,
    Registration,
};
use infrastructure_common::{BoxError, DependencyError};
use infrastructure_composition::builder::RESOURCE_LOCATOR_BEAN;
use infrastructure_composition::{
    Application, ApplicationEvent, ApplicationEventListener, ApplicationEventPublisher,
    LoggingConfig, ResourceLocator,
};
use serde_json::json;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn IoC 示例应用")]
struct Args {
    /// 配置文件路径
    #[arg(short = 'f', long, env = "LORN_CONFIG_FILE", default_value = "application.yaml")]
    config: String,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 启动完成后立即关闭，而不是等待 Ctrl-C
    #[arg(long)]
    once: bool,
}

/// 问候能力
pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

di_abstractions::capability!(dyn Greeter);

/// 数据库连接配置
#[derive(Default, Component, ValueBind)]
#[component(value_bind, disposable)]
#[value_prefix("database")]
pub struct Database {
    #[value("url")]
    url: ConfigValue<String>,
    #[value("pool-size")]
    pool_size: ConfigValue<u32>,
}

impl Disposable for Database {
    fn destroy(&self) -> Result<(), BoxError> {
        info!("关闭数据库连接池: {}", self.url.get().unwrap_or_default());
        Ok(())
    }
}

/// 带前缀的问候服务
#[derive(Default, Component, ValueBind)]
#[component(provides(dyn Greeter), value_bind)]
#[value_prefix("greeter")]
pub struct PrefixGreeter {
    #[value("prefix")]
    prefix: ConfigValue<String>,
}

impl Greeter for PrefixGreeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {}", self.prefix.get_or("hello".to_string()), name)
    }
}

/// 由工厂构造的仓储
#[derive(Component)]
#[component(initializing)]
pub struct Repository {
    db: Arc<Database>,
}

impl Initializing for Repository {
    fn after_inject(&self) -> Result<(), BoxError> {
        info!(
            "仓储就绪: {} (连接数 {})",
            self.db.url.get().unwrap_or_default(),
            self.db.pool_size.get_or(1)
        );
        Ok(())
    }
}

/// 应用入口组件
#[derive(Default, Component, Autowire)]
#[component(autowire, initializing, inject_function)]
pub struct Controller {
    #[inject]
    greeter: Autowired<Arc<dyn Greeter>>,
    #[inject("repository")]
    repository: Autowired<Arc<Repository>>,
    #[inject]
    publisher: Autowired<Arc<dyn ApplicationEventPublisher>>,
    #[inject("audit,omiterror")]
    audit: Autowired<Option<Arc<dyn ApplicationEventListener>>>,
}

impl Initializing for Controller {
    fn after_inject(&self) -> Result<(), BoxError> {
        if let Some(greeter) = self.greeter.get() {
            info!("{}", greeter.greet("Lorn"));
        }
        if let Some(repository) = self.repository.get() {
            info!("控制器使用数据库: {}", repository.db.url.get().unwrap_or_default());
        }
        if !self.audit.is_set() {
            info!("未配置审计监听器");
        }
        if let Some(publisher) = self.publisher.get() {
            publisher.publish_event(ApplicationEvent::payload(json!({ "controller": "ready" })))?;
        }
        Ok(())
    }
}

impl InjectFunction for Controller {
    fn register_functions(&self, registrar: &dyn FunctionRegistrar) -> Result<(), DependencyError> {
        registrar.register(
            |locator: Arc<ResourceLocator>| {
                info!("资源目录: {}", locator.root().display());
            },
            &[RESOURCE_LOCATOR_BEAN],
        )
    }
}

/// 打印所有应用事件
#[derive(Default, Component)]
#[component(provides(dyn ApplicationEventListener))]
pub struct EventLogger {
    received: AtomicUsize,
}

impl ApplicationEventListener for EventLogger {
    fn on_application_event(&self, event: &ApplicationEvent) {
        let count = self.received.fetch_add(1, Ordering::SeqCst) + 1;
        match event.payload_value() {
            Some(payload) => info!("收到事件 #{}: {} {}", count, event.kind(), payload),
            None => info!("收到事件 #{}: {}", count, event.kind()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging = LoggingConfig {
        level: parse_log_level(&args.log_level),
        ..LoggingConfig::default()
    };
    let mut builder = Application::builder().with_logging(logging);

    // 配置文件不存在时使用空配置启动
    let config_exists = Path::new(&args.config).exists();
    if config_exists {
        builder = builder.with_config_file(&args.config);
    }
    let application = builder.build()?;
    if !config_exists {
        warn!("配置文件不存在, 使用默认配置: {}", args.config);
    }

    register_components(&application)?;
    info!("启动 {}", application.name());

    if args.once {
        application.start()?;
        application.close()?;
    } else {
        application.run().await?;
    }

    info!("应用已关闭");
    Ok(())
}

/// 注册示例组件
fn register_components(application: &Application) -> anyhow::Result<()> {
    application.register(Registration::object(Arc::new(Database::default())).named("db"))?;
    application.register(Registration::object(Arc::new(PrefixGreeter::default())).named("greeter"))?;
    application.register(
        Registration::factory(|db: Arc<Database>| Arc::new(Repository { db }))
            .named("repository")
            .inject_names(["db"]),
    )?;
    application.register(Registration::object(Arc::new(Controller::default())).named("controller"))?;
    application.register(Registration::object(Arc::new(EventLogger::default())).named("eventLogger"))?;
    Ok(())
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
