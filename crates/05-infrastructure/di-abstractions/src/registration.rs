//! 类型化的注册构建器

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use infrastructure_common::{BoxError, TypeDescriptor};

use crate::component::Component;
use crate::definition::LifecycleHooks;
use crate::factory::{FactoryDescriptor, FactoryOutput, InjectableFn};
use crate::registry::RegisterOptions;
use crate::target::{mapping_value, sequence_value};
use crate::value::BeanValue;

/// 注册来源
#[derive(Debug, Clone)]
pub enum BeanSource {
    /// 已存在的对象
    Object(BeanValue),
    /// 工厂
    Factory(FactoryDescriptor),
    /// 元素序列
    Sequence(BeanValue),
    /// 名称到元素的映射
    Mapping(BeanValue),
}

impl BeanSource {
    /// 值或工厂输出的类型描述符
    pub fn descriptor(&self) -> &TypeDescriptor {
        match self {
            Self::Object(value) | Self::Sequence(value) | Self::Mapping(value) => value.descriptor(),
            Self::Factory(factory) => factory.output_descriptor(),
        }
    }
}

/// 一次注册
///
/// ```ignore
/// context.register(Registration::object(Arc::new(Database::default())).named("db"))?;
/// context.register(Registration::factory(|db: Arc<Database>| Arc::new(Service::new(db))))?;
/// ```
pub struct Registration {
    name: Option<String>,
    source: BeanSource,
    inject_names: Vec<String>,
    options: RegisterOptions,
    hooks: LifecycleHooks,
}

impl Registration {
    /// 由来源直接构造
    pub fn new(source: BeanSource) -> Self {
        Self {
            name: None,
            source,
            inject_names: Vec::new(),
            options: RegisterOptions::default(),
            hooks: LifecycleHooks::default(),
        }
    }

    /// 注册对象
    pub fn object<T: ?Sized + Component>(value: Arc<T>) -> Self {
        Self::new(BeanSource::Object(BeanValue::new(value)))
    }

    /// 注册已包装的值
    pub fn value(value: BeanValue) -> Self {
        Self::new(BeanSource::Object(value))
    }

    /// 注册工厂闭包
    pub fn factory<F, Args>(factory: F) -> Self
    where
        F: InjectableFn<Args>,
        F::Output: FactoryOutput,
    {
        Self::new(BeanSource::Factory(FactoryDescriptor::from_fn(factory)))
    }

    /// 注册元素序列
    pub fn sequence<T: ?Sized + Component>(items: Vec<Arc<T>>) -> Self {
        Self::new(BeanSource::Sequence(sequence_value(items)))
    }

    /// 注册名称到元素的映射
    pub fn mapping<T: ?Sized + Component>(items: HashMap<String, Arc<T>>) -> Self {
        Self::new(BeanSource::Mapping(mapping_value(items)))
    }

    /// 指定名称，默认使用规范类型名
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 工厂参数的名称提示，按参数位置对应
    #[must_use]
    pub fn inject_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inject_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// 添加别名
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.options.aliases.push(alias.into());
        self
    }

    /// 自定义初始化回调，在注入完成阶段对每个实例调用
    #[must_use]
    pub fn on_init<T, F>(mut self, hook: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Arc<T>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_init(typed_hook(hook));
        self
    }

    /// 自定义销毁回调
    #[must_use]
    pub fn on_destroy<T, F>(mut self, hook: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&Arc<T>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hooks = self.hooks.with_destroy(typed_hook(hook));
        self
    }

    /// 生效的名称
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.source.descriptor().name().to_string())
    }

    /// 注册来源
    pub fn source(&self) -> &BeanSource {
        &self.source
    }

    /// 拆分为各部分
    pub fn into_parts(self) -> RegistrationParts {
        RegistrationParts {
            name: self.name(),
            source: self.source,
            inject_names: self.inject_names,
            options: self.options,
            hooks: self.hooks,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name())
            .field("source", &self.source)
            .field("inject_names", &self.inject_names)
            .field("options", &self.options)
            .finish()
    }
}

/// 拆分后的注册
#[derive(Debug)]
pub struct RegistrationParts {
    /// 生效的名称
    pub name: String,
    /// 注册来源
    pub source: BeanSource,
    /// 工厂参数名称提示
    pub inject_names: Vec<String>,
    /// 注册选项
    pub options: RegisterOptions,
    /// 自定义回调
    pub hooks: LifecycleHooks,
}

fn typed_hook<T, F>(hook: F) -> crate::definition::InstanceHook
where
    T: ?Sized + Send + Sync + 'static,
    F: Fn(&Arc<T>) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(move |instance: &BeanValue| match instance.downcast::<T>() {
        Some(value) => hook(&value),
        None => Ok(()),
    })
}
