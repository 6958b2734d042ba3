//! # 依赖注入具体实现
//!
//! 提供注册表、四种组件定义、注入器与函数注入的默认实现。
//!
//! - [`DefaultBeanRegistry`] - 按注册顺序保存定义的注册表
//! - [`ObjectDefinition`] / [`FunctionDefinition`] / [`AggregateDefinition`] - 组件定义
//! - [`DefaultInjector`] - 按目标种类分派的注入器
//! - [`FunctionInjector`] / [`FunctionInjectHandler`] - 工厂包装与可注入函数
//! - [`DefinitionFactory`] - 由注册构建器生成定义

pub mod definition;
pub mod factory;
pub mod function;
pub mod injector;
pub mod registry;

pub use definition::*;
pub use factory::*;
pub use function::*;
pub use injector::*;
pub use registry::*;
