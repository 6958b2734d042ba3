//! # Configuration Abstractions
//!
//! 配置抽象层，容器只通过这里的窄接口消费配置。
//!
//! ## 核心接口
//!
//! - [`Properties`] - 只读的键值配置源，缺失的键永远回落到默认值
//! - [`ValueBindable`] - 可由配置绑定字段的组件
//! - [`ValueBinder`] - 按"前缀 + 路径"把配置值写入 [`ConfigValue`] 字段

pub mod binding;
pub mod provider;

pub use binding::*;
pub use provider::*;

pub use infrastructure_common::ConfigError;
