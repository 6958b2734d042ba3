//! 配置源实现

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use config_abstractions::Properties;
use infrastructure_common::ConfigError;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// 环境变量覆盖使用的前缀
pub const ENV_PREFIX: &str = "LORN";

/// 环境变量中表示层级的分隔符，`LORN_SERVER__PORT` 对应 `server.port`
pub const ENV_SEPARATOR: &str = "__";

/// 内存配置源
///
/// 以 JSON 树保存配置，键按点号拆分后逐层查找；
/// 顶层恰好存在同名的扁平键（例如 `"server.port"`）时优先返回它。
#[derive(Debug)]
pub struct MapProperties {
    name: String,
    root: RwLock<Value>,
}

impl MapProperties {
    /// 创建空配置源
    pub fn new() -> Self {
        Self::from_value(Value::Object(Map::new()))
    }

    /// 由 JSON 树创建
    pub fn from_value(root: Value) -> Self {
        Self {
            name: "map".to_string(),
            root: RwLock::new(root),
        }
    }

    /// 设置配置源名称
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 构建时设置一个值
    #[must_use]
    pub fn with(self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// 按点号路径写入值，必要时创建中间层
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let mut root = self.root.write();
        let mut current = &mut *root;
        for part in key.split('.') {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            current = match current {
                Value::Object(map) => map
                    .entry(part.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return,
            };
        }
        *current = value.into();
    }

    /// 整棵配置树的副本
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }
}

impl Default for MapProperties {
    fn default() -> Self {
        Self::new()
    }
}

impl Properties for MapProperties {
    fn get_value(&self, key: &str) -> Option<Value> {
        let root = self.root.read();
        if let Some(flat) = root.get(key) {
            return Some(flat.clone());
        }
        lookup_path(&root, key).cloned()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn lookup_path<'v>(root: &'v Value, key: &str) -> Option<&'v Value> {
    key.split('.').try_fold(root, |current, part| match current {
        Value::Object(map) => map.get(part),
        Value::Array(items) => part.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    })
}

/// 文件配置源
///
/// 文件格式由扩展名决定（YAML / TOML / JSON），
/// 随后叠加 `LORN_` 前缀的环境变量覆盖。
#[derive(Debug)]
pub struct FileProperties {
    path: PathBuf,
    inner: MapProperties,
}

impl FileProperties {
    /// 加载配置文件并叠加环境变量
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load(path.as_ref(), true)
    }

    /// 只加载配置文件，不读取环境变量
    pub fn from_file_only<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load(path.as_ref(), false)
    }

    fn load(path: &Path, with_env: bool) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载配置文件: {}", path.display());

        let mut builder = Config::builder().add_source(File::from(path));
        if with_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            );
        }
        let settings = builder.build().map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError { source: Box::new(e) }
        })?;
        let root: Value = settings
            .try_deserialize()
            .map_err(|e| ConfigError::ParseError { source: Box::new(e) })?;

        info!("配置文件加载完成: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            inner: MapProperties::from_value(root).named(path.display().to_string()),
        })
    }

    /// 配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Properties for FileProperties {
    fn get_value(&self, key: &str) -> Option<Value> {
        self.inner.get_value(key)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
