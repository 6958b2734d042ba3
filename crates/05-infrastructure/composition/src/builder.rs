//! 应用构建器

use std::path::{Path, PathBuf};
use std::sync::Arc;

use config_abstractions::Properties;
use config_impl::{FileProperties, MapProperties, ValueProcessor};
use di_abstractions::{Autowire, Component, Registration};
use di_impl::DefaultInjector;
use infrastructure_common::InfrastructureError;
use tracing::info;

use crate::application::Application;
use crate::context::{ContextSettings, DefaultApplicationContext};
use crate::resource::ResourceLocator;

/// 配置值绑定处理器的组件名称
pub const VALUE_PROCESSOR_BEAN: &str = "lorn.valueProcessor";
/// 资源定位器的组件名称
pub const RESOURCE_LOCATOR_BEAN: &str = "lorn.resourceLocator";

type DeepTypeRegistration = fn(&DefaultInjector);

fn register_deep<T: Component + Default + Autowire>(injector: &DefaultInjector) {
    injector.register_deep_type::<T>();
}

/// 应用构建器
///
/// 组合配置源、日志、注入器选项与事件模式，构建出 [`Application`]。
pub struct ApplicationBuilder {
    /// 配置源
    properties: Option<Arc<dyn Properties>>,
    /// 配置文件，构建时加载
    config_file: Option<PathBuf>,
    /// 是否初始化日志
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
    /// 是否开启深度注入
    recursive_inject: bool,
    /// 深度注入可构造的类型
    deep_types: Vec<DeepTypeRegistration>,
    /// 是否注册配置值绑定处理器
    value_processor_enabled: bool,
    /// 配置值绑定的标签名
    value_tags: Option<(String, String)>,
    /// 资源根目录
    resource_root: Option<PathBuf>,
    /// 覆盖配置中的应用名称
    application_name: Option<String>,
    /// 覆盖配置中的事件模式
    event_mode: Option<bool>,
    /// 覆盖配置中的注入开关
    inject_disabled: Option<bool>,
}

impl ApplicationBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            properties: None,
            config_file: None,
            logging_enabled: false,
            logging_config: LoggingConfig::default(),
            recursive_inject: false,
            deep_types: Vec::new(),
            value_processor_enabled: true,
            value_tags: None,
            resource_root: None,
            application_name: None,
            event_mode: None,
            inject_disabled: None,
        }
    }

    /// 使用给定配置源
    pub fn with_properties<P: Properties + 'static>(mut self, properties: P) -> Self {
        self.properties = Some(Arc::new(properties));
        self
    }

    /// 使用共享的配置源
    pub fn with_shared_properties(mut self, properties: Arc<dyn Properties>) -> Self {
        self.properties = Some(properties);
        self
    }

    /// 从配置文件加载配置（YAML / TOML / JSON），并叠加 `LORN_` 环境变量
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 开启或关闭深度注入
    pub fn with_recursive_inject(mut self, enabled: bool) -> Self {
        self.recursive_inject = enabled;
        self
    }

    /// 登记深度注入时可构造的类型
    pub fn with_deep_type<T: Component + Default + Autowire>(mut self) -> Self {
        self.deep_types.push(register_deep::<T>);
        self
    }

    /// 配置值绑定使用的前缀标签名与标签名
    pub fn with_value_tags(mut self, prefix_tag: &str, tag: &str) -> Self {
        self.value_tags = Some((prefix_tag.to_string(), tag.to_string()));
        self
    }

    /// 不注册配置值绑定处理器
    pub fn without_value_processor(mut self) -> Self {
        self.value_processor_enabled = false;
        self
    }

    /// 资源根目录
    pub fn with_resource_root<P: AsRef<Path>>(mut self, root: P) -> Self {
        self.resource_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// 应用名称
    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// 启用或禁用事件总线
    pub fn with_event_mode(mut self, enabled: bool) -> Self {
        self.event_mode = Some(enabled);
        self
    }

    /// 启用或禁用注入
    pub fn with_inject_disabled(mut self, disabled: bool) -> Self {
        self.inject_disabled = Some(disabled);
        self
    }

    /// 构建应用
    pub fn build(self) -> Result<Application, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.initialize_logging()?;
        }
        info!("开始构建应用");

        let properties: Arc<dyn Properties> = match (&self.config_file, &self.properties) {
            (Some(path), _) => Arc::new(FileProperties::from_file(path)?),
            (None, Some(properties)) => Arc::clone(properties),
            (None, None) => Arc::new(MapProperties::new()),
        };

        let mut settings = ContextSettings::from_properties(properties.as_ref());
        if let Some(name) = self.application_name {
            settings.application_name = name;
        }
        if let Some(enabled) = self.event_mode {
            settings.events_enabled = enabled;
        }
        if let Some(disabled) = self.inject_disabled {
            settings.inject_disabled = disabled;
        }

        let injector = DefaultInjector::new().with_recursive(self.recursive_inject);
        for register in &self.deep_types {
            register(&injector);
        }

        let context =
            DefaultApplicationContext::with_settings(properties, Arc::new(injector), settings)?;

        if self.value_processor_enabled {
            let processor = match &self.value_tags {
                Some((prefix_tag, tag)) => ValueProcessor::new().with_tags(prefix_tag, tag),
                None => ValueProcessor::new(),
            };
            context.register(Registration::object(Arc::new(processor)).named(VALUE_PROCESSOR_BEAN))?;
        }

        let locator = match self.resource_root {
            Some(root) => ResourceLocator::new(root),
            None => ResourceLocator::default(),
        };
        context.register(Registration::object(Arc::new(locator)).named(RESOURCE_LOCATOR_BEAN))?;

        info!("应用构建完成");
        Ok(Application::new(context))
    }

    /// 初始化日志系统
    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.logging_config.level)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        let result = if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };
        // 已经存在全局订阅者时沿用它
        if let Err(e) = result {
            tracing::debug!("日志系统已初始化, 跳过: {}", e);
            return Ok(());
        }

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }
}
