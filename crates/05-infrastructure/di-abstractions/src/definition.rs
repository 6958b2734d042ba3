//! 组件定义
//!
//! [`Definition`] 是注册表中每个条目的统一包装：普通对象、工厂函数、序列或映射。

use std::fmt;
use std::sync::Arc;

use infrastructure_common::{
    AggregateError, BoxError, DependencyError, Disposable, Initializing, TypeDescriptor,
};

use crate::component::Capabilities;
use crate::processor::Processor;
use crate::value::BeanValue;

/// 定义种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
    /// 注册时即已存在的对象
    Object,
    /// 每次解析调用一次的工厂
    Factory,
    /// 元素序列
    Sequence,
    /// 名称到元素的映射
    Mapping,
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Factory => "factory",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// 组件定义
pub trait Definition: Send + Sync {
    /// 注册名称，在注册表内唯一
    fn name(&self) -> &str;

    /// 定义种类
    fn kind(&self) -> DefinitionKind;

    /// 值的能力表（工厂为其输出类型的能力表）
    fn capabilities(&self) -> &Arc<Capabilities>;

    /// 值的类型描述符
    fn descriptor(&self) -> &TypeDescriptor {
        self.capabilities().owner()
    }

    /// 解析值；工厂定义每次调用都会产生一个新实例
    fn value(&self) -> Result<BeanValue, DependencyError>;

    /// 当前持有的全部实例
    fn instances(&self) -> Vec<BeanValue>;

    /// 对每个实例触发注入完成回调，只执行一次
    fn after_set(&self) -> Result<(), AggregateError>;

    /// 对每个实例触发销毁回调，只执行一次
    fn destroy(&self) -> Result<(), AggregateError>;

    /// 用处理器对每个实例进行分类，返回是否有实例被处理
    fn classify(&self, processor: &dyn Processor) -> Result<bool, AggregateError> {
        let mut errors = AggregateError::new();
        let mut applied = false;
        for instance in self.instances() {
            match processor.classify(&instance) {
                Ok(hit) => applied |= hit,
                Err(error) => errors.push(error),
            }
        }
        errors.into_result().map(|()| applied)
    }
}

/// 实例级回调
pub type InstanceHook = Arc<dyn Fn(&BeanValue) -> Result<(), BoxError> + Send + Sync>;

/// 注册时附加的自定义初始化与销毁回调
///
/// 与 [`Initializing`] / [`Disposable`] 能力并存，能力回调先执行。
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    on_init: Option<InstanceHook>,
    on_destroy: Option<InstanceHook>,
}

impl LifecycleHooks {
    /// 设置初始化回调
    #[must_use]
    pub fn with_init(mut self, hook: InstanceHook) -> Self {
        self.on_init = Some(hook);
        self
    }

    /// 设置销毁回调
    #[must_use]
    pub fn with_destroy(mut self, hook: InstanceHook) -> Self {
        self.on_destroy = Some(hook);
        self
    }

    /// 对实例触发注入完成回调，错误收集到 `errors`
    pub fn fire_init(&self, instance: &BeanValue, errors: &mut AggregateError) {
        if let Some(target) = instance.cast::<dyn Initializing>() {
            if let Err(error) = target.after_inject() {
                errors.push(error);
            }
        }
        if let Some(hook) = &self.on_init {
            if let Err(error) = hook(instance) {
                errors.push(error);
            }
        }
    }

    /// 对实例触发销毁回调，错误收集到 `errors`
    pub fn fire_destroy(&self, instance: &BeanValue, errors: &mut AggregateError) {
        if let Some(target) = instance.cast::<dyn Disposable>() {
            if let Err(error) = target.destroy() {
                errors.push(error);
            }
        }
        if let Some(hook) = &self.on_destroy {
            if let Err(error) = hook(instance) {
                errors.push(error);
            }
        }
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_init", &self.on_init.is_some())
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}
