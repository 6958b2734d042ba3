//! 配置值绑定
//!
//! 组件把需要配置的字段声明为 [`ConfigValue`]，并通过 [`ValueBindable`]
//! 告诉绑定器每个字段的路径标签与结构体的前缀标签。
//! 标签是 `(标签名, 路径)` 对，绑定器优先使用自己配置的标签名，
//! 找不到时回落到默认标签 [`DEFAULT_VALUE_TAG`]。

use std::fmt;

use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::provider::{deserialize_value, Properties};

/// 默认的标签名
pub const DEFAULT_VALUE_TAG: &str = "value";

/// 字段或结构体上的标签集合：`(标签名, 路径)`
pub type ValueTags<'a> = &'a [(&'a str, &'a str)];

/// 可被配置绑定的字段槽位
pub struct ConfigValue<T> {
    value: RwLock<Option<T>>,
}

impl<T> ConfigValue<T> {
    /// 创建未绑定的槽位
    pub fn new() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }

    /// 创建带初始值的槽位
    pub fn with_default(value: T) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// 写入新值
    pub fn set(&self, value: T) {
        *self.value.write() = Some(value);
    }

    /// 是否已有值
    pub fn is_bound(&self) -> bool {
        self.value.read().is_some()
    }
}

impl<T: Clone> ConfigValue<T> {
    /// 读取当前值
    pub fn get(&self) -> Option<T> {
        self.value.read().clone()
    }

    /// 读取当前值，没有值时返回给定默认值
    pub fn get_or(&self, default: T) -> T {
        self.get().unwrap_or(default)
    }
}

impl<T> Default for ConfigValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for ConfigValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigValue").field(&*self.value.read()).finish()
    }
}

/// 可被配置绑定的组件
pub trait ValueBindable: Send + Sync {
    /// 绑定所有带标签的字段
    fn bind_values(&self, binder: &ValueBinder<'_>) -> Result<(), ConfigError>;
}

/// 配置绑定器
pub struct ValueBinder<'a> {
    properties: &'a dyn Properties,
    prefix_tag: &'a str,
    tag: &'a str,
}

impl<'a> ValueBinder<'a> {
    /// 创建绑定器
    pub fn new(properties: &'a dyn Properties, prefix_tag: &'a str, tag: &'a str) -> Self {
        Self {
            properties,
            prefix_tag,
            tag,
        }
    }

    /// 使用默认标签名的绑定器
    pub fn with_default_tags(properties: &'a dyn Properties) -> Self {
        Self::new(properties, DEFAULT_VALUE_TAG, DEFAULT_VALUE_TAG)
    }

    /// 计算字段的完整配置路径；字段没有可识别的标签时返回 `None`
    pub fn resolve_path(&self, prefixes: ValueTags<'_>, tags: ValueTags<'_>) -> Option<String> {
        let path = lookup_tag(tags, self.tag)?;
        match lookup_tag(prefixes, self.prefix_tag) {
            Some(prefix) if !prefix.is_empty() => Some(format!("{prefix}.{path}")),
            _ => Some(path.to_string()),
        }
    }

    /// 绑定单个字段，返回是否写入了值
    ///
    /// 没有标签或配置中不存在该键时保持原值并返回 `Ok(false)`。
    pub fn bind<T: DeserializeOwned>(
        &self,
        slot: &ConfigValue<T>,
        prefixes: ValueTags<'_>,
        tags: ValueTags<'_>,
    ) -> Result<bool, ConfigError> {
        let Some(path) = self.resolve_path(prefixes, tags) else {
            return Ok(false);
        };
        let Some(raw) = self.properties.get_value(&path) else {
            debug!("配置键不存在, 跳过绑定: {}", path);
            return Ok(false);
        };
        slot.set(deserialize_value(&path, raw)?);
        debug!("绑定配置值: {}", path);
        Ok(true)
    }
}

fn lookup_tag<'t>(tags: ValueTags<'t>, name: &str) -> Option<&'t str> {
    tags.iter()
        .find(|(tag, _)| *tag == name)
        .or_else(|| tags.iter().find(|(tag, _)| *tag == DEFAULT_VALUE_TAG))
        .map(|(_, path)| *path)
}
