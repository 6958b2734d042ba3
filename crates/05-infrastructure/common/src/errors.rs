//! 错误类型定义

use std::fmt;

use thiserror::Error;

use crate::lifecycle::ContextState;
use crate::metadata::InjectionPolicy;

/// 装箱的通用错误，用于生命周期钩子、处理器等由使用方实现的扩展点
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError { source: BoxError },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("配置键不存在: {key}")]
    KeyNotFound { key: String },

    #[error("配置类型转换失败: {key}, 原因: {message}")]
    TypeConversionError { key: String, message: String },
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件名称重复: {name}")]
    DuplicateName { name: String },

    #[error("组件未找到: name={name}, type={type_name}")]
    NotFound { name: String, type_name: String },

    #[error("组件匹配不唯一: {type_name}, 候选: {candidates:?}")]
    AmbiguousBinding {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("不支持注入的类型: {type_name}, 原因: {reason}")]
    UnsupportedKind { type_name: String, reason: String },

    #[error("工厂函数签名无效: {factory}, 原因: {reason}")]
    InvalidFactorySignature { factory: String, reason: String },

    #[error("循环依赖检测到: {name}")]
    CircularDependency { name: String },

    #[error("状态迁移非法: 期望 {expected}, 实际 {actual}")]
    BadStateTransition {
        expected: ContextState,
        actual: ContextState,
    },

    #[error("容器已不再接受注册, 当前状态: {state}")]
    NotAcceptingRegistrations { state: ContextState },

    #[error("注入失败: {target} ({policy}), 原因: {source}")]
    InjectionFailed {
        target: String,
        policy: InjectionPolicy,
        #[source]
        source: Box<DependencyError>,
    },

    #[error("工厂函数执行失败: {factory}, 原因: {source}")]
    FactoryFailed { factory: String, source: BoxError },

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("组件注册表已释放")]
    RegistryUnavailable,
}

impl DependencyError {
    /// 创建未找到错误
    pub fn not_found(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// 创建不支持类型错误
    pub fn unsupported(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// 剥离 `InjectionFailed` 包装，返回最底层的错误
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::InjectionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("处理器执行失败: {processor}, 原因: {source}")]
    ProcessorFailed { processor: String, source: BoxError },

    #[error("事件总线已禁用")]
    EventsDisabled,

    #[error("事件投递失败: {message}")]
    EventDeliveryFailed { message: String },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },

    #[error("基础设施关闭失败: {message}")]
    ShutdownFailed { message: String },
}

/// 多个错误的聚合
///
/// 用于那些"记录后继续"的阶段：逐个收集错误，最后统一记录或返回。
/// 显示时以逗号连接所有错误信息。
#[derive(Debug, Default)]
pub struct AggregateError {
    errors: Vec<BoxError>,
}

impl AggregateError {
    /// 创建空的聚合错误
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个错误；追加的若是另一个聚合错误则展开合并
    pub fn push(&mut self, error: impl Into<BoxError>) {
        let error = error.into();
        match error.downcast::<Self>() {
            Ok(nested) => self.errors.extend(nested.errors),
            Err(error) => self.errors.push(error),
        }
    }

    /// 是否没有收集到错误
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// 收集到的错误数量
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// 遍历收集到的错误
    pub fn iter(&self) -> impl Iterator<Item = &BoxError> {
        self.errors.iter()
    }

    /// 没有错误时返回 `Ok(())`
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str(",")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

impl From<DependencyError> for AggregateError {
    fn from(error: DependencyError) -> Self {
        let mut aggregate = Self::new();
        aggregate.push(error);
        aggregate
    }
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
