//! 组件生命周期

use std::fmt;

use crate::errors::BoxError;

/// 应用上下文状态
///
/// 只能单向迁移：`None -> Initializing -> Initialized`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ContextState {
    /// 尚未启动，允许注册
    None = 0,
    /// 启动阶段进行中
    Initializing = 1,
    /// 启动完成
    Initialized = 2,
}

impl ContextState {
    /// 从原子存储的数值还原状态
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::None,
            1 => Self::Initializing,
            _ => Self::Initialized,
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Initializing => "Initializing",
            Self::Initialized => "Initialized",
        };
        f.write_str(name)
    }
}

/// 注入完成后的回调
///
/// 在所有字段与函数注入完成后，对每个实现了该能力的实例调用一次。
pub trait Initializing: Send + Sync {
    /// 注入完成
    fn after_inject(&self) -> Result<(), BoxError>;
}

/// 销毁前的回调
pub trait Disposable: Send + Sync {
    /// 释放资源
    fn destroy(&self) -> Result<(), BoxError>;
}
