//! 配置值绑定处理器

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use config_abstractions::{Properties, ValueBindable, ValueBinder, DEFAULT_VALUE_TAG};
use di_abstractions::{BeanRegistry, BeanValue, Capabilities, Component, Processor};
use infrastructure_common::BoxError;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

/// 配置值绑定处理器
///
/// 在分类阶段为每个实现了 [`ValueBindable`] 的实例填充配置值。
/// 绑定失败只影响该实例，错误交给上下文汇总记录。
pub struct ValueProcessor {
    prefix_tag: String,
    tag: String,
    properties: RwLock<Option<Arc<dyn Properties>>>,
    bound: AtomicUsize,
}

impl ValueProcessor {
    /// 使用默认标签 `value` 创建
    pub fn new() -> Self {
        Self {
            prefix_tag: DEFAULT_VALUE_TAG.to_string(),
            tag: DEFAULT_VALUE_TAG.to_string(),
            properties: RwLock::new(None),
            bound: AtomicUsize::new(0),
        }
    }

    /// 自定义标签名
    ///
    /// `tag` 为空时保持默认；`prefix_tag` 为空时使用默认前缀标签。
    /// 默认标签 `value` 始终作为后备被识别。
    #[must_use]
    pub fn with_tags(mut self, prefix_tag: &str, tag: &str) -> Self {
        if !tag.is_empty() {
            self.tag = tag.to_string();
            self.prefix_tag = if prefix_tag.is_empty() {
                DEFAULT_VALUE_TAG.to_string()
            } else {
                prefix_tag.to_string()
            };
        }
        self
    }

    /// 前缀标签名
    pub fn prefix_tag(&self) -> &str {
        &self.prefix_tag
    }

    /// 字段标签名
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// 已完成绑定的实例数量
    pub fn bound_count(&self) -> usize {
        self.bound.load(Ordering::Relaxed)
    }
}

impl Default for ValueProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for ValueProcessor {
    fn name(&self) -> &str {
        "ValueProcessor"
    }

    fn init(&self, properties: Arc<dyn Properties>, _registry: Arc<dyn BeanRegistry>) -> Result<(), BoxError> {
        debug!("配置绑定处理器使用配置源: {}", properties.name());
        *self.properties.write() = Some(properties);
        Ok(())
    }

    fn classify(&self, instance: &BeanValue) -> Result<bool, BoxError> {
        let Some(target) = instance.cast::<dyn ValueBindable>() else {
            return Ok(false);
        };
        let Some(properties) = self.properties.read().clone() else {
            warn!("配置绑定处理器尚未初始化, 跳过: {}", instance.descriptor());
            return Ok(false);
        };
        let binder = ValueBinder::new(properties.as_ref(), &self.prefix_tag, &self.tag);
        target.bind_values(&binder)?;
        self.bound.fetch_add(1, Ordering::Relaxed);
        debug!("完成配置绑定: {}", instance.descriptor());
        Ok(true)
    }

    fn process(&self) -> Result<(), BoxError> {
        info!("配置绑定完成, 共 {} 个实例", self.bound_count());
        Ok(())
    }
}

impl Component for ValueProcessor {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Processor>(|v| v)
            .build()
    }
}
