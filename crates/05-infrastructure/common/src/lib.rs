//! # Infrastructure Common
//!
//! Lorn IoC 容器各层共享的基础类型。
//!
//! ## 核心组件
//!
//! - [`TypeDescriptor`] - 可比较的类型身份
//! - [`InjectionPolicy`] - 注入失败时的处理策略
//! - [`DependencyError`] / [`InfrastructureError`] - 错误分类
//! - [`AggregateError`] - "记录后继续"阶段的错误聚合
//! - [`Initializing`] / [`Disposable`] - 生命周期钩子

pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
