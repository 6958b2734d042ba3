//! 配置源抽象接口

use infrastructure_common::ConfigError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 只读配置源
///
/// 键使用点号分隔的路径，例如 `lorn.application.name`。
pub trait Properties: Send + Sync {
    /// 获取原始配置值，不存在时返回 `None`
    fn get_value(&self, key: &str) -> Option<Value>;

    /// 获取配置源名称
    fn name(&self) -> &str;

    /// 检查配置键是否存在
    fn contains_key(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// 读取字符串，缺失或为 null 时返回默认值
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get_value(key) {
            Some(Value::String(value)) => value,
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// 读取布尔值，无法识别时返回默认值
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get_value(key) {
            Some(Value::Bool(value)) => value,
            Some(Value::Number(number)) => number.as_i64().map_or(default, |n| n != 0),
            Some(Value::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => true,
                "false" | "no" | "off" | "0" => false,
                _ => default,
            },
            _ => default,
        }
    }
}

/// [`Properties`] 的类型化读取扩展
pub trait PropertiesExt: Properties {
    /// 读取并反序列化为 `T`；键不存在时返回 `Ok(None)`
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get_value(key)
            .map(|value| deserialize_value(key, value))
            .transpose()
    }
}

impl<P: Properties + ?Sized> PropertiesExt for P {}

/// 将配置值反序列化为目标类型
///
/// 环境变量等来源只能提供字符串，直接反序列化失败时再把字符串当作 JSON 解析一次。
pub fn deserialize_value<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, ConfigError> {
    match serde_json::from_value::<T>(value.clone()) {
        Ok(parsed) => Ok(parsed),
        Err(first) => {
            if let Value::String(text) = &value {
                if let Ok(parsed) = serde_json::from_str::<T>(text) {
                    return Ok(parsed);
                }
            }
            Err(ConfigError::TypeConversionError {
                key: key.to_string(),
                message: first.to_string(),
            })
        }
    }
}
