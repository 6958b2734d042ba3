//! 默认注入器

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use di_abstractions::{
    Autowire, BeanRegistry, BeanValue, Component, Definition, DefinitionKind, DefinitionRef,
    FieldWiring, InjectionTarget, Injector, ListenerManager, ScanControl,
};
use infrastructure_common::{DependencyError, TypeDescriptor, TypeKind};
use parking_lot::Mutex;
use tracing::debug;

use crate::definition::AggregateDefinition;

/// 深度构造函数：构造一个未注册的具体类型并注入其字段
pub type DeepConstructor =
    fn(&dyn Injector, &dyn BeanRegistry) -> Result<BeanValue, DependencyError>;

/// 默认注入器
///
/// 按目标种类分派：
///
/// - 能力类型：先按名称查找，找不到再扫描唯一可赋值的定义，命中后以规范类型名缓存
/// - 具体类型：只按名称查找；深度模式下可以构造登记过的类型
/// - 序列与映射：先按名称查找，找不到再扫描所有可赋值或可转换的定义，组装后缓存
pub struct DefaultInjector {
    listeners: ListenerManager,
    recursive: bool,
    deep_types: DashMap<TypeId, DeepConstructor>,
    constructing: Mutex<HashSet<TypeId>>,
}

impl DefaultInjector {
    /// 创建默认注入器
    pub fn new() -> Self {
        Self {
            listeners: ListenerManager::new(),
            recursive: false,
            deep_types: DashMap::new(),
            constructing: Mutex::new(HashSet::new()),
        }
    }

    /// 开启或关闭深度模式
    #[must_use]
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 是否为深度模式
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// 登记可在深度模式下构造的类型
    pub fn register_deep_type<T>(&self)
    where
        T: Component + Default + Autowire,
    {
        self.deep_types
            .insert(TypeId::of::<T>(), construct_deep::<T> as DeepConstructor);
    }

    fn inject_capability(
        &self,
        registry: &dyn BeanRegistry,
        target: &InjectionTarget,
    ) -> Result<BeanValue, DependencyError> {
        let key = target.lookup_key();
        if let Some(definition) = registry.get(key) {
            return definition.value();
        }

        let declared = target.declared();
        let mut matches: Vec<DefinitionRef> = Vec::new();
        registry.scan(&mut |name, definition| {
            if name == definition.name() && definition.capabilities().is_assignable_to(declared) {
                matches.push(Arc::clone(definition));
            }
            ScanControl::Continue
        });

        match matches.len() {
            0 => Err(DependencyError::not_found(key, declared.name())),
            1 => {
                let definition = matches.remove(0);
                debug!("按类型匹配到唯一组件: {} -> {}", declared, definition.name());
                registry.put_definition(declared.name(), Arc::clone(&definition));
                definition.value()
            }
            _ => Err(DependencyError::AmbiguousBinding {
                type_name: declared.name().to_string(),
                candidates: matches.iter().map(|d| d.name().to_string()).collect(),
            }),
        }
    }

    fn inject_concrete(
        &self,
        registry: &dyn BeanRegistry,
        target: &InjectionTarget,
    ) -> Result<BeanValue, DependencyError> {
        let key = target.lookup_key();
        if let Some(definition) = registry.get(key) {
            return definition.value();
        }
        if self.recursive {
            if let Some(result) = self.construct_deep(registry, target.declared()) {
                return result;
            }
        }
        Err(DependencyError::not_found(key, target.declared().name()))
    }

    fn construct_deep(
        &self,
        registry: &dyn BeanRegistry,
        declared: &TypeDescriptor,
    ) -> Option<Result<BeanValue, DependencyError>> {
        let constructor = *self.deep_types.get(&declared.id())?.value();
        if !self.constructing.lock().insert(declared.id()) {
            return Some(Err(DependencyError::CircularDependency {
                name: declared.name().to_string(),
            }));
        }
        debug!("深度构造: {}", declared);
        let result = constructor(self, registry);
        self.constructing.lock().remove(&declared.id());
        Some(result)
    }

    fn inject_aggregate(
        &self,
        registry: &dyn BeanRegistry,
        target: &InjectionTarget,
    ) -> Result<BeanValue, DependencyError> {
        let key = target.lookup_key();
        if let Some(definition) = registry.get(key) {
            return definition.value();
        }

        let declared = target.declared();
        let Some(element) = declared.element() else {
            return Err(DependencyError::unsupported(declared.name(), "聚合类型缺少元素类型"));
        };
        let Some(assemble) = target.assembler() else {
            return Err(DependencyError::unsupported(declared.name(), "聚合类型缺少组装函数"));
        };

        let mut entries = Vec::new();
        let mut failure = None;
        registry.scan(&mut |name, definition| {
            let aggregate = matches!(
                definition.kind(),
                DefinitionKind::Sequence | DefinitionKind::Mapping
            );
            if name != definition.name() || aggregate {
                return ScanControl::Continue;
            }
            let capabilities = definition.capabilities();
            if !capabilities.is_assignable_to(element) && !capabilities.is_convertible_to(element) {
                return ScanControl::Continue;
            }
            match definition.value() {
                Ok(value) => {
                    entries.push((name.to_string(), value));
                    ScanControl::Continue
                }
                Err(error) => {
                    failure = Some(error);
                    ScanControl::Stop
                }
            }
        });
        if let Some(error) = failure {
            return Err(error);
        }
        // 没有任何元素时不缓存，交给监听器链决定是否忽略
        if entries.is_empty() {
            debug!("聚合注入没有匹配的组件: {}", declared);
            return Err(DependencyError::not_found(key, declared.name()));
        }

        debug!("聚合注入: {} 共 {} 个元素", declared, entries.len());
        let value = assemble(&entries);
        let definition: DefinitionRef = match declared.kind() {
            TypeKind::Mapping => {
                Arc::new(AggregateDefinition::mapping(declared.name(), value.clone()))
            }
            _ => Arc::new(AggregateDefinition::sequence(declared.name(), value.clone())),
        };
        registry.put_definition(declared.name(), definition);
        Ok(value)
    }
}

impl Default for DefaultInjector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultInjector")
            .field("recursive", &self.recursive)
            .field("deep_types", &self.deep_types.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl Injector for DefaultInjector {
    fn can_inject(&self, descriptor: &TypeDescriptor) -> Result<(), DependencyError> {
        match descriptor.kind() {
            TypeKind::Concrete | TypeKind::Capability => Ok(()),
            TypeKind::Sequence | TypeKind::Mapping => {
                if descriptor.kind() == TypeKind::Mapping
                    && !descriptor.key().is_some_and(TypeDescriptor::is_text)
                {
                    return Err(DependencyError::unsupported(
                        descriptor.name(),
                        "映射的键必须是文本类型",
                    ));
                }
                match descriptor.element().map(TypeDescriptor::kind) {
                    Some(TypeKind::Concrete | TypeKind::Capability) => Ok(()),
                    _ => Err(DependencyError::unsupported(
                        descriptor.name(),
                        "聚合的元素必须是具体类型或能力类型",
                    )),
                }
            }
        }
    }

    fn inject_value(
        &self,
        registry: &dyn BeanRegistry,
        target: &InjectionTarget,
    ) -> Result<BeanValue, DependencyError> {
        let declared = target.declared();
        self.can_inject(declared)?;
        match declared.kind() {
            TypeKind::Capability => self.inject_capability(registry, target),
            TypeKind::Concrete => self.inject_concrete(registry, target),
            TypeKind::Sequence | TypeKind::Mapping => self.inject_aggregate(registry, target),
        }
    }

    fn inject(
        &self,
        registry: &dyn BeanRegistry,
        definition: &dyn Definition,
    ) -> Result<(), DependencyError> {
        let value = definition.value()?;
        let Some(target) = value.cast::<dyn Autowire>() else {
            return Ok(());
        };
        let mut wiring = FieldWiring::new(self, registry, definition.name());
        target.autowire(&mut wiring)?;
        debug!("组件字段注入完成: {} ({} 个字段)", definition.name(), wiring.wired());
        Ok(())
    }

    fn listener_manager(&self) -> &ListenerManager {
        &self.listeners
    }
}

fn construct_deep<T>(
    injector: &dyn Injector,
    registry: &dyn BeanRegistry,
) -> Result<BeanValue, DependencyError>
where
    T: Component + Default + Autowire,
{
    let instance = Arc::new(T::default());
    let mut wiring = FieldWiring::new(injector, registry, std::any::type_name::<T>());
    instance.autowire(&mut wiring)?;
    Ok(BeanValue::new(instance))
}
