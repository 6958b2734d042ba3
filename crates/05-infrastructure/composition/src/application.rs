//! 应用主入口

use std::future::Future;
use std::sync::Arc;

use di_abstractions::{ApplicationContext, Registration};
use infrastructure_common::{ContextState, InfrastructureError};
use tracing::{info, warn};

use crate::builder::ApplicationBuilder;
use crate::context::DefaultApplicationContext;
use crate::events::ApplicationEventListener;

/// 应用
///
/// 组合根：由程序入口创建并持有，内部只有一个应用上下文。
#[derive(Debug, Clone)]
pub struct Application {
    context: Arc<DefaultApplicationContext>,
}

impl Application {
    /// 创建应用构建器
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub(crate) fn new(context: Arc<DefaultApplicationContext>) -> Self {
        Self { context }
    }

    /// 应用上下文
    pub fn context(&self) -> &Arc<DefaultApplicationContext> {
        &self.context
    }

    /// 应用名称
    pub fn name(&self) -> String {
        self.context.application_name()
    }

    /// 当前状态
    pub fn state(&self) -> ContextState {
        self.context.state()
    }

    /// 注册组件
    pub fn register(&self, registration: Registration) -> Result<(), InfrastructureError> {
        self.context.register(registration)
    }

    /// 添加事件监听器
    pub fn add_listener(
        &self,
        listener: Arc<dyn ApplicationEventListener>,
    ) -> Result<(), InfrastructureError> {
        self.context.add_listener(listener)
    }

    /// 启动应用
    pub fn start(&self) -> Result<(), InfrastructureError> {
        self.context.start()
    }

    /// 关闭应用，可重复调用
    pub fn close(&self) -> Result<(), InfrastructureError> {
        self.context.close()
    }

    /// 启动应用，等待 Ctrl-C 后关闭
    pub async fn run(&self) -> Result<(), InfrastructureError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("监听退出信号失败: {}", e);
            }
        })
        .await
    }

    /// 启动应用，等待给定信号完成后关闭
    ///
    /// 启动失败时同样执行关闭，返回启动错误。
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), InfrastructureError>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.start() {
            if let Err(close_error) = self.close() {
                warn!("启动失败后关闭应用出错: {}", close_error);
            }
            return Err(e);
        }
        info!("应用运行中: {}", self.name());
        shutdown.await;
        info!("收到退出信号");
        self.close()
    }
}
