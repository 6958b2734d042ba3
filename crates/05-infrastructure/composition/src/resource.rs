//! 资源路径定位

use std::path::{Path, PathBuf};

use di_abstractions::Component;

/// 覆盖资源根目录的环境变量
pub const RESOURCE_DIR_ENV: &str = "LORN_RESOURCE_DIR";

/// 资源定位器
///
/// 把相对路径解析到资源根目录下。环境变量 `LORN_RESOURCE_DIR` 非空时优先于构造时的根目录。
#[derive(Debug, Clone)]
pub struct ResourceLocator {
    root: PathBuf,
}

impl ResourceLocator {
    /// 以给定目录为根
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// 当前生效的根目录
    pub fn root(&self) -> PathBuf {
        match std::env::var(RESOURCE_DIR_ENV) {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.root.clone(),
        }
    }

    /// 解析资源路径
    pub fn resolve<P: AsRef<Path>>(&self, relative: P) -> PathBuf {
        self.root().join(relative)
    }
}

impl Default for ResourceLocator {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Component for ResourceLocator {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_against_configured_root() {
        let locator = ResourceLocator::new("/srv/app");
        if std::env::var(RESOURCE_DIR_ENV).map_or(true, |dir| dir.is_empty()) {
            assert_eq!(
                locator.resolve("config/application.yaml"),
                PathBuf::from("/srv/app/config/application.yaml")
            );
        }
    }

    #[test]
    fn test_default_root_is_current_directory() {
        let locator = ResourceLocator::default();
        if std::env::var(RESOURCE_DIR_ENV).is_err() {
            assert_eq!(locator.resolve("a.txt"), PathBuf::from("./a.txt"));
        }
    }
}
