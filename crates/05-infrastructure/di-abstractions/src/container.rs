//! 应用上下文抽象接口
//!
//! 组件通过这里的能力与编排器交互：获取上下文引用、追加可注入函数。

use std::sync::{Arc, Weak};

use infrastructure_common::{ContextState, DependencyError, TypeDescriptor};

use crate::factory::{FunctionDescriptor, FunctionOutcome, InjectableFn};
use crate::injector::{resolve, Injector};
use crate::registry::BeanRegistry;
use crate::target::InjectTarget;
use crate::value::BeanValue;

/// 应用上下文
pub trait ApplicationContext: Send + Sync {
    /// 上下文 ID
    fn id(&self) -> String;

    /// 应用名称
    fn application_name(&self) -> String;

    /// 当前状态
    fn state(&self) -> ContextState;

    /// 组件注册表
    fn registry(&self) -> Arc<dyn BeanRegistry>;

    /// 注入器
    fn injector(&self) -> Arc<dyn Injector>;

    /// 按名称解析组件值
    fn get_bean(&self, name: &str) -> Result<BeanValue, DependencyError> {
        let registry = self.registry();
        let definition = registry
            .get(name)
            .ok_or_else(|| DependencyError::not_found(name, ""))?;
        definition.value()
    }

    /// 按类型解析唯一的组件值
    fn get_bean_by_type(&self, descriptor: &TypeDescriptor) -> Result<BeanValue, DependencyError> {
        self.registry().get_by_type(descriptor)?.value()
    }
}

/// [`ApplicationContext`] 的类型化扩展
pub trait ApplicationContextExt: ApplicationContext {
    /// 按注解解析 `X`，注解语法与字段注入相同
    fn get<X: InjectTarget>(&self, tag: &str) -> Result<X, DependencyError> {
        let injector = self.injector();
        let registry = self.registry();
        resolve::<X>(injector.as_ref(), registry.as_ref(), tag)
    }
}

impl<C: ApplicationContext + ?Sized> ApplicationContextExt for C {}

/// 需要获取上下文引用的组件
///
/// 上下文持有组件，组件只保存弱引用以避免循环引用。
pub trait ApplicationContextAware: Send + Sync {
    /// 接收上下文
    fn set_application_context(&self, context: Weak<dyn ApplicationContext>);
}

/// 可注入函数的登记处
pub trait FunctionRegistrar: Send + Sync {
    /// 登记函数，名称提示按参数位置对应
    fn register_function(
        &self,
        function: FunctionDescriptor,
        names: Vec<String>,
    ) -> Result<(), DependencyError>;
}

/// [`FunctionRegistrar`] 的类型化扩展
pub trait FunctionRegistrarExt: FunctionRegistrar {
    /// 登记闭包
    fn register<F, Args>(&self, function: F, names: &[&str]) -> Result<(), DependencyError>
    where
        F: InjectableFn<Args>,
        F::Output: FunctionOutcome,
    {
        self.register_function(
            FunctionDescriptor::from_fn(function),
            names.iter().map(|name| (*name).to_string()).collect(),
        )
    }
}

impl<R: FunctionRegistrar + ?Sized> FunctionRegistrarExt for R {}

/// 注册额外可注入函数的组件
pub trait InjectFunction: Send + Sync {
    /// 向登记处追加函数，在启动的函数注入阶段统一调用
    fn register_functions(&self, registrar: &dyn FunctionRegistrar) -> Result<(), DependencyError>;
}
