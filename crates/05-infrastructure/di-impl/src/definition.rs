//! 组件定义的四种实现

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use di_abstractions::{
    BeanValue, Capabilities, Definition, DefinitionKind, LifecycleHooks, Processor, Producer,
};
use infrastructure_common::{AggregateError, DependencyError};
use parking_lot::RwLock;
use tracing::debug;

/// 只执行一次的标记
#[derive(Debug, Default)]
struct Once(AtomicBool);

impl Once {
    /// 第一次调用返回 `true`
    fn first(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// 对象定义：注册时即已存在的单个实例
pub struct ObjectDefinition {
    name: String,
    value: BeanValue,
    hooks: LifecycleHooks,
    initialized: Once,
    destroyed: Once,
}

impl ObjectDefinition {
    /// 创建对象定义
    pub fn new(name: impl Into<String>, value: BeanValue, hooks: LifecycleHooks) -> Self {
        Self {
            name: name.into(),
            value,
            hooks,
            initialized: Once::default(),
            destroyed: Once::default(),
        }
    }
}

impl Definition for ObjectDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Object
    }

    fn capabilities(&self) -> &Arc<Capabilities> {
        self.value.capabilities()
    }

    fn value(&self) -> Result<BeanValue, DependencyError> {
        Ok(self.value.clone())
    }

    fn instances(&self) -> Vec<BeanValue> {
        vec![self.value.clone()]
    }

    fn after_set(&self) -> Result<(), AggregateError> {
        if !self.initialized.first() {
            return Ok(());
        }
        let mut errors = AggregateError::new();
        self.hooks.fire_init(&self.value, &mut errors);
        errors.into_result()
    }

    fn destroy(&self) -> Result<(), AggregateError> {
        if !self.destroyed.first() {
            return Ok(());
        }
        let mut errors = AggregateError::new();
        self.hooks.fire_destroy(&self.value, &mut errors);
        errors.into_result()
    }
}

/// 工厂定义
///
/// 每次解析调用一次生产者，产生的实例全部记录在实例集合中。
/// `resolving` 标记保证同一时刻至多一次调用，重入立即返回 `CircularDependency`。
pub struct FunctionDefinition {
    name: String,
    capabilities: Arc<Capabilities>,
    producer: Producer,
    hooks: LifecycleHooks,
    resolving: AtomicBool,
    instances: RwLock<Vec<BeanValue>>,
    initialized: Once,
    destroyed: Once,
}

impl FunctionDefinition {
    /// 创建工厂定义
    pub fn new(
        name: impl Into<String>,
        capabilities: Arc<Capabilities>,
        producer: Producer,
        hooks: LifecycleHooks,
    ) -> Self {
        Self {
            name: name.into(),
            capabilities,
            producer,
            hooks,
            resolving: AtomicBool::new(false),
            instances: RwLock::new(Vec::new()),
            initialized: Once::default(),
            destroyed: Once::default(),
        }
    }

    /// 是否正在解析
    pub fn is_resolving(&self) -> bool {
        self.resolving.load(Ordering::Acquire)
    }
}

struct ResolvingGuard<'a>(&'a AtomicBool);

impl Drop for ResolvingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Definition for FunctionDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DefinitionKind {
        DefinitionKind::Factory
    }

    fn capabilities(&self) -> &Arc<Capabilities> {
        &self.capabilities
    }

    fn value(&self) -> Result<BeanValue, DependencyError> {
        if self
            .resolving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DependencyError::CircularDependency {
                name: self.name.clone(),
            });
        }
        let value = {
            let _guard = ResolvingGuard(&self.resolving);
            (self.producer)()?
        };

        let mut instances = self.instances.write();
        if !instances
            .iter()
            .any(|instance| instance.identity() == value.identity())
        {
            instances.push(value.clone());
            debug!("工厂产生新实例: {} (共 {} 个)", self.name, instances.len());
        }
        Ok(value)
    }

    fn instances(&self) -> Vec<BeanValue> {
        self.instances.read().clone()
    }

    fn after_set(&self) -> Result<(), AggregateError> {
        if !self.initialized.first() {
            return Ok(());
        }
        let mut errors = AggregateError::new();
        for instance in self.instances() {
            self.hooks.fire_init(&instance, &mut errors);
        }
        errors.into_result()
    }

    fn destroy(&self) -> Result<(), AggregateError> {
        if !self.destroyed.first() {
            return Ok(());
        }
        let mut errors = AggregateError::new();
        for instance in self.instances() {
            self.hooks.fire_destroy(&instance, &mut errors);
        }
        errors.into_result()
    }
}

/// 序列或映射定义
///
/// 既用于显式注册的聚合，也用于注入器缓存的聚合结果。
/// 聚合本身不参与生命周期回调与分类，其元素由各自的定义负责。
pub struct AggregateDefinition {
    name: String,
    kind: DefinitionKind,
    value: BeanValue,
}

impl AggregateDefinition {
    /// 序列定义
    pub fn sequence(name: impl Into<String>, value: BeanValue) -> Self {
        Self {
            name: name.into(),
            kind: DefinitionKind::Sequence,
            value,
        }
    }

    /// 映射定义
    pub fn mapping(name: impl Into<String>, value: BeanValue) -> Self {
        Self {
            name: name.into(),
            kind: DefinitionKind::Mapping,
            value,
        }
    }
}

impl Definition for AggregateDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> DefinitionKind {
        self.kind
    }

    fn capabilities(&self) -> &Arc<Capabilities> {
        self.value.capabilities()
    }

    fn value(&self) -> Result<BeanValue, DependencyError> {
        Ok(self.value.clone())
    }

    fn instances(&self) -> Vec<BeanValue> {
        vec![self.value.clone()]
    }

    fn after_set(&self) -> Result<(), AggregateError> {
        Ok(())
    }

    fn destroy(&self) -> Result<(), AggregateError> {
        Ok(())
    }

    fn classify(&self, _processor: &dyn Processor) -> Result<bool, AggregateError> {
        Ok(false)
    }
}
