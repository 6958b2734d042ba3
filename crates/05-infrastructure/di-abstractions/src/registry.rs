//! 组件注册表抽象接口

use std::sync::Arc;

use infrastructure_common::{ContextState, DependencyError, TypeDescriptor};

use crate::definition::Definition;

/// 共享的组件定义
pub type DefinitionRef = Arc<dyn Definition>;

/// 扫描访问者的返回值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    /// 继续访问下一个条目
    Continue,
    /// 提前结束扫描
    Stop,
}

/// 注册选项
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    /// 指向同一定义的额外键；别名条目不参与按类型的自动匹配
    pub aliases: Vec<String>,
}

impl RegisterOptions {
    /// 创建默认选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加别名
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// 组件注册表 trait
///
/// 以名称为键保存 [`Definition`]，迭代顺序即注册顺序。
/// 除定义自身名称外，同一定义还可能以别名或缓存键出现；
/// 键与 [`Definition::name`] 不一致的条目在按类型匹配时必须跳过。
pub trait BeanRegistry: Send + Sync {
    /// 注册定义，名称重复时返回 `DuplicateName`
    fn register(
        &self,
        definition: DefinitionRef,
        options: RegisterOptions,
    ) -> Result<(), DependencyError>;

    /// 按名称查找
    fn get(&self, name: &str) -> Option<DefinitionRef>;

    /// 查找唯一一个可赋值给目标类型的定义
    fn get_by_type(&self, descriptor: &TypeDescriptor) -> Result<DefinitionRef, DependencyError>;

    /// 按注册顺序访问每个条目；访问期间不持有内部锁
    fn scan(&self, visitor: &mut dyn FnMut(&str, &DefinitionRef) -> ScanControl);

    /// 缓存计算得到的定义，键已存在时保留原条目
    fn put_definition(&self, name: &str, definition: DefinitionRef);

    /// 同步上下文状态；非 `None` 状态下拒绝新的注册
    fn seal(&self, state: ContextState);

    /// 条目数量（包括别名与缓存条目）
    fn len(&self) -> usize;

    /// 是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有键，按注册顺序
    fn names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.len());
        self.scan(&mut |name, _| {
            names.push(name.to_string());
            ScanControl::Continue
        });
        names
    }

    /// 所有"主"定义（键与定义名一致的条目），按注册顺序
    fn definitions(&self) -> Vec<DefinitionRef> {
        let mut definitions = Vec::new();
        self.scan(&mut |name, definition| {
            if name == definition.name() {
                definitions.push(Arc::clone(definition));
            }
            ScanControl::Continue
        });
        definitions
    }
}
