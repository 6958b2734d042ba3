//! 分类处理器
//!
//! 处理器是横切的访问者：启动时对每个定义持有的每个实例调用 [`Processor::classify`]，
//! 最后统一调用一次 [`Processor::process`]。

use std::sync::Arc;

use config_abstractions::Properties;
use infrastructure_common::BoxError;

use crate::registry::BeanRegistry;
use crate::value::BeanValue;

/// 处理器 trait
pub trait Processor: Send + Sync {
    /// 处理器名称
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 注册时调用一次
    fn init(&self, properties: Arc<dyn Properties>, registry: Arc<dyn BeanRegistry>) -> Result<(), BoxError>;

    /// 对单个实例分类，返回是否处理了该实例；错误只记录，不会中止启动
    fn classify(&self, instance: &BeanValue) -> Result<bool, BoxError>;

    /// 分类阶段结束后调用；返回错误会中止启动
    fn process(&self) -> Result<(), BoxError>;
}
