//! 默认组件注册表

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use di_abstractions::{BeanRegistry, DefinitionRef, RegisterOptions, ScanControl};
use indexmap::IndexMap;
use infrastructure_common::{ContextState, DependencyError, TypeDescriptor};
use parking_lot::RwLock;
use tracing::{debug, info};

/// 默认组件注册表
///
/// 条目按插入顺序保存。扫描时先复制一份快照再释放锁，
/// 访问者可以在扫描过程中安全地回调注册表（例如缓存聚合结果）。
pub struct DefaultBeanRegistry {
    definitions: RwLock<IndexMap<String, DefinitionRef>>,
    state: AtomicU8,
}

impl DefaultBeanRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(IndexMap::new()),
            state: AtomicU8::new(ContextState::None as u8),
        }
    }

    fn snapshot(&self) -> Vec<(String, DefinitionRef)> {
        self.definitions
            .read()
            .iter()
            .map(|(name, definition)| (name.clone(), Arc::clone(definition)))
            .collect()
    }
}

impl Default for DefaultBeanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanRegistry for DefaultBeanRegistry {
    fn register(
        &self,
        definition: DefinitionRef,
        options: RegisterOptions,
    ) -> Result<(), DependencyError> {
        let state = ContextState::from_u8(self.state.load(Ordering::Acquire));
        if state != ContextState::None {
            return Err(DependencyError::NotAcceptingRegistrations { state });
        }

        let name = definition.name().to_string();
        let mut definitions = self.definitions.write();
        if let Some(duplicate) = std::iter::once(&name)
            .chain(options.aliases.iter())
            .find(|key| definitions.contains_key(key.as_str()))
        {
            return Err(DependencyError::DuplicateName {
                name: duplicate.clone(),
            });
        }

        info!(
            "注册组件: {} ({}, {})",
            name,
            definition.kind(),
            definition.descriptor()
        );
        for alias in options.aliases {
            debug!("注册别名: {} -> {}", alias, name);
            definitions.insert(alias, Arc::clone(&definition));
        }
        definitions.insert(name, definition);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<DefinitionRef> {
        self.definitions.read().get(name).cloned()
    }

    fn get_by_type(&self, descriptor: &TypeDescriptor) -> Result<DefinitionRef, DependencyError> {
        let mut matches = Vec::new();
        self.scan(&mut |name, definition| {
            if name == definition.name() && definition.capabilities().is_assignable_to(descriptor) {
                matches.push(Arc::clone(definition));
            }
            ScanControl::Continue
        });

        match matches.len() {
            0 => Err(DependencyError::not_found("", descriptor.name())),
            1 => Ok(matches.remove(0)),
            _ => Err(DependencyError::AmbiguousBinding {
                type_name: descriptor.name().to_string(),
                candidates: matches.iter().map(|d| d.name().to_string()).collect(),
            }),
        }
    }

    fn scan(&self, visitor: &mut dyn FnMut(&str, &DefinitionRef) -> ScanControl) {
        for (name, definition) in self.snapshot() {
            if visitor(&name, &definition) == ScanControl::Stop {
                break;
            }
        }
    }

    fn put_definition(&self, name: &str, definition: DefinitionRef) {
        let mut definitions = self.definitions.write();
        if definitions.contains_key(name) {
            debug!("缓存键已存在, 保留原条目: {}", name);
            return;
        }
        debug!("缓存组件定义: {} -> {}", name, definition.name());
        definitions.insert(name.to_string(), definition);
    }

    fn seal(&self, state: ContextState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn len(&self) -> usize {
        self.definitions.read().len()
    }
}
