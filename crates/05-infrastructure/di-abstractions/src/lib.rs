//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义组件注册、类型匹配与依赖解析的核心接口。
//!
//! ## 核心接口
//!
//! - [`Component`] / [`Capabilities`] - 类型描述符与显式能力表
//! - [`BeanValue`] - 类型擦除的共享组件值
//! - [`Definition`] - 注册表条目的统一包装
//! - [`BeanRegistry`] - 按名称保存定义的注册表
//! - [`Injector`] - 单个注入目标的解析
//! - [`FactoryDescriptor`] / [`FunctionDescriptor`] - 工厂与可注入函数
//! - [`Processor`] - 分类阶段的横切处理器
//! - [`ApplicationContext`] - 组件可见的上下文

pub mod component;
pub mod container;
pub mod definition;
pub mod factory;
pub mod injector;
pub mod listener;
pub mod processor;
pub mod registration;
pub mod registry;
pub mod target;
pub mod value;

pub use component::*;
pub use container::*;
pub use definition::*;
pub use factory::*;
pub use injector::*;
pub use listener::*;
pub use processor::*;
pub use registration::*;
pub use registry::*;
pub use target::*;
pub use value::*;

pub use infrastructure_common::{
    AggregateError, BoxError, ContextState, DependencyError, Disposable, Initializing,
    InjectionPolicy, TypeDescriptor, TypeKind,
};

crate::capability!(
    dyn Autowire,
    dyn Initializing,
    dyn Disposable,
    dyn Processor,
    dyn InjectFunction,
    dyn ApplicationContextAware,
    dyn config_abstractions::ValueBindable,
);
