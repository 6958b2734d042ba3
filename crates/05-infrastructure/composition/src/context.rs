//! 默认应用上下文
//!
//! 上下文拥有注册表、注入器、处理器列表与事件处理器，并按固定顺序驱动启动：
//!
//! 1. 向感知上下文的组件传递上下文引用
//! 2. 为每个对象定义注入字段，并解析尚未产生实例的工厂
//! 3. 用每个处理器对每个定义分类
//! 4. 调用登记的可注入函数
//! 5. 触发注入完成回调
//! 6. 调用每个处理器的 `process`
//! 7. 进入 `Initialized` 并投递启动事件
//!
//! 分类与回调的错误只记录；注入、函数注入与 `process` 的错误中止启动，
//! 中止后状态停留在 `Initializing`，仍然可以关闭。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use config_abstractions::Properties;
use di_abstractions::{
    ApplicationContext, ApplicationContextAware, BeanRegistry, BeanSource, BeanValue,
    DefinitionKind, InjectFunction, Injector, Processor, Registration,
};
use di_impl::{
    DefaultBeanRegistry, DefaultInjector, DefinitionFactory, FunctionInjectHandler,
    FunctionInjector,
};
use infrastructure_common::{AggregateError, ContextState, DependencyError, InfrastructureError};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{
    ApplicationEvent, ApplicationEventKind, ApplicationEventListener, ApplicationEventProcessor,
    DefaultEventProcessor, DisabledEventProcessor, EventPublisher,
};

/// 应用名称配置键
pub const APPLICATION_NAME_KEY: &str = "lorn.application.name";
/// 关闭注入的配置键
pub const INJECT_DISABLE_KEY: &str = "lorn.inject.disable";
/// 事件模式配置键
pub const EVENT_MODE_KEY: &str = "lorn.application.event-mode";
/// 默认应用名称
pub const DEFAULT_APPLICATION_NAME: &str = "Lorn Application";
/// 事件发布者的组件名称
pub const EVENT_PUBLISHER_BEAN: &str = "lorn.applicationEventPublisher";

/// 上下文的启动参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSettings {
    /// 应用名称
    pub application_name: String,
    /// 是否跳过字段注入与函数注入
    pub inject_disabled: bool,
    /// 是否启用事件总线
    pub events_enabled: bool,
}

impl ContextSettings {
    /// 从配置读取，缺失的键使用默认值
    pub fn from_properties(properties: &dyn Properties) -> Self {
        let event_mode = properties
            .get_string(EVENT_MODE_KEY, "on")
            .trim()
            .to_ascii_lowercase();
        Self {
            application_name: properties.get_string(APPLICATION_NAME_KEY, DEFAULT_APPLICATION_NAME),
            inject_disabled: properties.get_bool(INJECT_DISABLE_KEY, false),
            events_enabled: !matches!(event_mode.as_str(), "off" | "false"),
        }
    }
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            application_name: DEFAULT_APPLICATION_NAME.to_string(),
            inject_disabled: false,
            events_enabled: true,
        }
    }
}

/// 默认应用上下文
pub struct DefaultApplicationContext {
    id: String,
    settings: ContextSettings,
    properties: Arc<dyn Properties>,
    registry: Arc<DefaultBeanRegistry>,
    injector: Arc<DefaultInjector>,
    function_handler: Arc<FunctionInjectHandler>,
    definition_factory: DefinitionFactory,
    processors: Mutex<Vec<Arc<dyn Processor>>>,
    aware: Mutex<Vec<Arc<dyn ApplicationContextAware>>>,
    // 注册与启动互斥，启动后不会再有组件混入各阶段的快照
    registration: Mutex<()>,
    events: Arc<dyn ApplicationEventProcessor>,
    state: AtomicU8,
    close_outcome: OnceCell<Option<String>>,
    this: Weak<DefaultApplicationContext>,
}

impl DefaultApplicationContext {
    /// 使用从配置读取的参数创建上下文
    pub fn new(
        properties: Arc<dyn Properties>,
        injector: Arc<DefaultInjector>,
    ) -> Result<Arc<Self>, InfrastructureError> {
        let settings = ContextSettings::from_properties(properties.as_ref());
        Self::with_settings(properties, injector, settings)
    }

    /// 使用给定参数创建上下文
    ///
    /// 创建时启动事件处理器，并把事件发布者注册为组件。
    pub fn with_settings(
        properties: Arc<dyn Properties>,
        injector: Arc<DefaultInjector>,
        settings: ContextSettings,
    ) -> Result<Arc<Self>, InfrastructureError> {
        let events: Arc<dyn ApplicationEventProcessor> = if settings.events_enabled {
            Arc::new(DefaultEventProcessor::new())
        } else {
            info!("事件总线已禁用");
            Arc::new(DisabledEventProcessor)
        };
        let function_injector = FunctionInjector::new(injector.clone());
        let context = Arc::new_cyclic(|this| Self {
            id: Uuid::new_v4().to_string(),
            settings,
            properties,
            registry: Arc::new(DefaultBeanRegistry::new()),
            injector,
            function_handler: Arc::new(FunctionInjectHandler::new(function_injector.clone())),
            definition_factory: DefinitionFactory::new(function_injector),
            processors: Mutex::new(Vec::new()),
            aware: Mutex::new(Vec::new()),
            registration: Mutex::new(()),
            events,
            state: AtomicU8::new(ContextState::None as u8),
            close_outcome: OnceCell::new(),
            this: this.clone(),
        });

        context.register(
            Registration::object(Arc::new(EventPublisher::new(Arc::clone(&context.events))))
                .named(EVENT_PUBLISHER_BEAN),
        )?;
        context.events.start()?;
        debug!("创建应用上下文: {} ({})", context.settings.application_name, context.id);
        Ok(context)
    }

    /// 启动参数
    pub fn settings(&self) -> &ContextSettings {
        &self.settings
    }

    /// 配置源
    pub fn properties(&self) -> &Arc<dyn Properties> {
        &self.properties
    }

    /// 已注册的处理器数量
    pub fn processor_count(&self) -> usize {
        self.processors.lock().len()
    }

    /// 已登记的可注入函数数量
    pub fn function_count(&self) -> usize {
        self.function_handler.len()
    }

    /// 注册组件
    ///
    /// 对象值会按能力自动归类：处理器立即初始化并加入处理器列表，
    /// 感知上下文的组件在启动第一阶段收到上下文，
    /// 可注入函数组件立即登记其函数，事件监听器加入事件总线。
    pub fn register(&self, registration: Registration) -> Result<(), InfrastructureError> {
        let _guard = self.registration.lock();
        let state = self.state();
        if state != ContextState::None {
            return Err(DependencyError::NotAcceptingRegistrations { state }.into());
        }

        let mut parts = registration.into_parts();
        let options = std::mem::take(&mut parts.options);
        let object = match &parts.source {
            BeanSource::Object(value) => Some(value.clone()),
            _ => None,
        };
        let registry: Arc<dyn BeanRegistry> = self.registry.clone();
        let definition = self
            .definition_factory
            .create(parts, Arc::downgrade(&registry))?;
        let name = definition.name().to_string();
        self.registry.register(definition, options)?;

        if let Some(value) = object {
            self.classify_object(&name, &value)?;
        }
        Ok(())
    }

    fn classify_object(&self, name: &str, value: &BeanValue) -> Result<(), InfrastructureError> {
        if let Some(processor) = value.cast::<dyn Processor>() {
            self.add_processor(processor)?;
        }
        if let Some(aware) = value.cast::<dyn ApplicationContextAware>() {
            debug!("登记感知上下文的组件: {}", name);
            self.aware.lock().push(aware);
        }
        if let Some(functions) = value.cast::<dyn InjectFunction>() {
            debug!("登记组件提供的可注入函数: {}", name);
            functions.register_functions(self.function_handler.as_ref())?;
        }
        if let Some(listener) = value.cast::<dyn ApplicationEventListener>() {
            match self.events.add_listener(listener) {
                Ok(()) => debug!("登记事件监听器: {}", name),
                Err(InfrastructureError::EventsDisabled) => {
                    warn!("事件总线已禁用, 忽略监听器: {}", name);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// 添加处理器，添加时调用其 `init`
    pub fn add_processor(&self, processor: Arc<dyn Processor>) -> Result<(), InfrastructureError> {
        let registry: Arc<dyn BeanRegistry> = self.registry.clone();
        processor
            .init(Arc::clone(&self.properties), registry)
            .map_err(|source| InfrastructureError::ProcessorFailed {
                processor: processor.name().to_string(),
                source,
            })?;
        info!("添加处理器: {}", processor.name());
        self.processors.lock().push(processor);
        Ok(())
    }

    /// 添加事件监听器
    pub fn add_listener(
        &self,
        listener: Arc<dyn ApplicationEventListener>,
    ) -> Result<(), InfrastructureError> {
        self.events.add_listener(listener)
    }

    /// 投递事件
    pub fn publish_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError> {
        self.events.publish_event(event)
    }

    /// 启动上下文
    ///
    /// 只能从 `None` 状态调用一次，否则返回 `BadStateTransition` 且状态不变。
    pub fn start(&self) -> Result<(), InfrastructureError> {
        {
            let _guard = self.registration.lock();
            self.state
                .compare_exchange(
                    ContextState::None as u8,
                    ContextState::Initializing as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .map_err(|actual| DependencyError::BadStateTransition {
                    expected: ContextState::None,
                    actual: ContextState::from_u8(actual),
                })?;
            self.registry.seal(ContextState::Initializing);
        }
        info!(
            "Lorn IoC {} 启动应用: {} ({})",
            env!("CARGO_PKG_VERSION"),
            self.settings.application_name,
            self.id
        );

        self.notify_aware();
        self.inject_objects()?;
        self.classify_definitions();
        self.inject_functions()?;
        self.notify_after_set();
        self.run_processors()?;

        self.state
            .store(ContextState::Initialized as u8, Ordering::Release);
        self.registry.seal(ContextState::Initialized);
        info!("应用启动完成: {}", self.settings.application_name);
        self.notify_started();
        Ok(())
    }

    fn notify_aware(&self) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let context: Arc<dyn ApplicationContext> = this;
        let weak = Arc::downgrade(&context);
        let aware = self.aware.lock().clone();
        for target in &aware {
            target.set_application_context(weak.clone());
        }
        debug!("上下文引用已传递给 {} 个组件", aware.len());
    }

    fn inject_objects(&self) -> Result<(), InfrastructureError> {
        if self.settings.inject_disabled {
            info!("字段注入已禁用");
            return Ok(());
        }
        for definition in self.registry.definitions() {
            if definition.kind() == DefinitionKind::Object {
                self.injector
                    .inject(self.registry.as_ref(), definition.as_ref())
                    .map_err(|e| {
                        error!("组件注入失败: {}: {}", definition.name(), e);
                        e
                    })?;
            }
        }
        self.resolve_factories()
    }

    // 工厂至少产生一个实例，后续的分类与回调才能覆盖到它
    fn resolve_factories(&self) -> Result<(), InfrastructureError> {
        for definition in self.registry.definitions() {
            if definition.kind() == DefinitionKind::Factory && definition.instances().is_empty() {
                debug!("解析工厂组件: {}", definition.name());
                definition.value().map_err(|e| {
                    error!("工厂组件解析失败: {}: {}", definition.name(), e);
                    e
                })?;
            }
        }
        Ok(())
    }

    fn classify_definitions(&self) {
        let processors = self.processors.lock().clone();
        if processors.is_empty() {
            return;
        }
        for definition in self.registry.definitions() {
            for processor in &processors {
                if let Err(errors) = definition.classify(processor.as_ref()) {
                    error!(
                        "组件分类失败: {} [{}]: {}",
                        definition.name(),
                        processor.name(),
                        errors
                    );
                }
            }
        }
    }

    fn inject_functions(&self) -> Result<(), InfrastructureError> {
        if self.settings.inject_disabled {
            return Ok(());
        }
        self.function_handler
            .inject_all_functions(self.registry.as_ref())?;
        Ok(())
    }

    fn notify_after_set(&self) {
        for definition in self.registry.definitions() {
            if let Err(errors) = definition.after_set() {
                error!("注入完成回调失败: {}: {}", definition.name(), errors);
            }
        }
    }

    fn run_processors(&self) -> Result<(), InfrastructureError> {
        let processors = self.processors.lock().clone();
        for processor in &processors {
            processor
                .process()
                .map_err(|source| {
                    error!("处理器执行失败: {}: {}", processor.name(), source);
                    InfrastructureError::ProcessorFailed {
                        processor: processor.name().to_string(),
                        source,
                    }
                })?;
        }
        Ok(())
    }

    fn notify_started(&self) {
        if !self.settings.events_enabled {
            return;
        }
        if let Err(e) = self
            .events
            .publish_event(ApplicationEvent::new(ApplicationEventKind::Started))
        {
            warn!("启动事件投递失败: {}", e);
        }
    }

    fn notify_sync(&self, kind: ApplicationEventKind, errors: &mut AggregateError) {
        if !self.settings.events_enabled {
            return;
        }
        if let Err(e) = self.events.notify_event(ApplicationEvent::new(kind)) {
            error!("事件通知失败: {}", e);
            errors.push(e);
        }
    }

    /// 关闭上下文
    ///
    /// 关闭过程只执行一次；重复或并发调用都得到同一个结果。
    /// 任一步骤失败时返回 `ShutdownFailed`，其余步骤照常执行。
    pub fn close(&self) -> Result<(), InfrastructureError> {
        match self.close_outcome.get_or_init(|| self.teardown()) {
            None => Ok(()),
            Some(message) => Err(InfrastructureError::ShutdownFailed {
                message: message.clone(),
            }),
        }
    }

    /// 是否已经关闭
    pub fn is_closed(&self) -> bool {
        self.close_outcome.get().is_some()
    }

    fn teardown(&self) -> Option<String> {
        info!("关闭应用: {}", self.settings.application_name);
        let mut errors = AggregateError::new();

        if let Err(e) = self.events.close() {
            error!("事件处理器关闭失败: {}", e);
            errors.push(e);
        }
        self.notify_sync(ApplicationEventKind::Stopped, &mut errors);

        for definition in self.registry.definitions() {
            if let Err(destroy_errors) = definition.destroy() {
                error!("销毁回调失败: {}: {}", definition.name(), destroy_errors);
                errors.push(destroy_errors);
            }
        }

        self.notify_sync(ApplicationEventKind::Closed, &mut errors);
        info!("应用已关闭: {}", self.settings.application_name);
        if errors.is_empty() {
            None
        } else {
            Some(errors.to_string())
        }
    }
}

impl ApplicationContext for DefaultApplicationContext {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn application_name(&self) -> String {
        self.settings.application_name.clone()
    }

    fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn registry(&self) -> Arc<dyn BeanRegistry> {
        self.registry.clone()
    }

    fn injector(&self) -> Arc<dyn Injector> {
        self.injector.clone()
    }
}

impl fmt::Debug for DefaultApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultApplicationContext")
            .field("id", &self.id)
            .field("settings", &self.settings)
            .field("state", &self.state())
            .field("beans", &self.registry.len())
            .finish()
    }
}
