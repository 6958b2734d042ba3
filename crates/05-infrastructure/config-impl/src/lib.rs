//! # Configuration Implementation
//!
//! 配置源与配置绑定的具体实现。
//!
//! ## 主要组件
//!
//! - [`MapProperties`] - 内存配置源
//! - [`FileProperties`] - 文件配置源（YAML / TOML / JSON，叠加环境变量）
//! - [`ValueProcessor`] - 分类阶段的配置值绑定处理器

pub mod binder;
pub mod providers;

pub use binder::*;
pub use providers::*;

#[cfg(test)]
mod tests;
