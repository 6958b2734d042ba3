//! # 组合层
//!
//! 把注册表、注入器、配置源与事件总线组合成一个可运行的应用。
//!
//! ## 主要功能
//!
//! - **应用构建器**: 组装配置源、日志、注入器选项与事件模式
//! - **应用上下文**: 按固定阶段驱动启动，一次性执行关闭
//! - **应用事件**: 有界队列加专用消费线程的事件总线
//! - **资源定位**: 相对路径解析到可由环境变量覆盖的资源根目录
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use di_abstractions::{Component, Registration};
//! use infrastructure_composition::Application;
//!
//! #[derive(Default)]
//! struct Database;
//!
//! impl Component for Database {}
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let application = Application::builder()
//!         .with_config_file("application.yaml")
//!         .build()?;
//!
//!     application.register(Registration::object(Arc::new(Database)).named("db"))?;
//!
//!     // 启动，等待 Ctrl-C 后关闭
//!     application.run().await?;
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod builder;
pub mod context;
pub mod events;
pub mod resource;

// 重新导出主要类型
pub use application::Application;
pub use builder::{ApplicationBuilder, LoggingConfig};
pub use context::{ContextSettings, DefaultApplicationContext};
pub use events::{
    ApplicationEvent, ApplicationEventKind, ApplicationEventListener, ApplicationEventProcessor,
    ApplicationEventPublisher, DefaultEventProcessor, DisabledEventProcessor, EventPublisher,
};
pub use resource::ResourceLocator;

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
