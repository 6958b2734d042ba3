//! 注入器抽象接口

use infrastructure_common::{DependencyError, TypeDescriptor};
use tracing::debug;

use crate::definition::Definition;
use crate::listener::{InjectionTarget, ListenerManager};
use crate::registry::BeanRegistry;
use crate::target::{Autowired, InjectTarget};
use crate::value::BeanValue;

/// 注入器 trait
///
/// 针对单个注入目标（字段或参数）在注册表中解析值。
pub trait Injector: Send + Sync {
    /// 检查目标类型是否可以被注入
    fn can_inject(&self, descriptor: &TypeDescriptor) -> Result<(), DependencyError>;

    /// 解析单个目标
    fn inject_value(
        &self,
        registry: &dyn BeanRegistry,
        target: &InjectionTarget,
    ) -> Result<BeanValue, DependencyError>;

    /// 为定义的值注入所有带注解的字段
    fn inject(
        &self,
        registry: &dyn BeanRegistry,
        definition: &dyn Definition,
    ) -> Result<(), DependencyError>;

    /// 注解修饰符注册表
    fn listener_manager(&self) -> &ListenerManager;
}

/// 具有可注入字段的组件
///
/// 通常由 `#[derive(Autowire)]` 生成，每个带 `#[inject("...")]` 的字段调用一次
/// [`FieldWiring::field`]。
pub trait Autowire: Send + Sync {
    /// 注入全部字段
    fn autowire(&self, wiring: &mut FieldWiring<'_>) -> Result<(), DependencyError>;
}

/// 一次字段注入过程
pub struct FieldWiring<'a> {
    injector: &'a dyn Injector,
    registry: &'a dyn BeanRegistry,
    owner: &'a str,
    wired: usize,
}

impl<'a> FieldWiring<'a> {
    /// 为名为 `owner` 的组件创建注入过程
    pub fn new(injector: &'a dyn Injector, registry: &'a dyn BeanRegistry, owner: &'a str) -> Self {
        Self {
            injector,
            registry,
            owner,
            wired: 0,
        }
    }

    /// 所属组件名称
    pub fn owner(&self) -> &str {
        self.owner
    }

    /// 已成功注入的字段数
    pub fn wired(&self) -> usize {
        self.wired
    }

    /// 注入单个字段；已有值的槽位保持不变
    pub fn field<X: InjectTarget>(
        &mut self,
        field: &str,
        tag: &str,
        slot: &Autowired<X>,
    ) -> Result<(), DependencyError> {
        if slot.is_set() {
            return Ok(());
        }
        let target = self.injector.listener_manager().parse::<X>(tag);
        let label = format!("{}.{}", self.owner, field);
        match resolve_target::<X>(self.injector, self.registry, &target) {
            Ok(value) => {
                if slot.set(value).is_ok() {
                    self.wired += 1;
                    debug!("字段注入完成: {}", label);
                }
                Ok(())
            }
            Err(error) => target.on_failure(&label, error),
        }
    }
}

/// 解析已构造好的目标并还原为 `X`
pub fn resolve_target<X: InjectTarget>(
    injector: &dyn Injector,
    registry: &dyn BeanRegistry,
    target: &InjectionTarget,
) -> Result<X, DependencyError> {
    let value = injector.inject_value(registry, target)?;
    X::from_value(&value).ok_or_else(|| DependencyError::TypeMismatch {
        expected: target.declared().name().to_string(),
        actual: value.descriptor().name().to_string(),
    })
}

/// 按注解解析 `X`
///
/// 注解的策略只决定监听器链；这里总是把失败返回给调用方。
pub fn resolve<X: InjectTarget>(
    injector: &dyn Injector,
    registry: &dyn BeanRegistry,
    tag: &str,
) -> Result<X, DependencyError> {
    let target = injector.listener_manager().parse::<X>(tag);
    resolve_target(injector, registry, &target)
}
