//! 注入失败监听器
//!
//! 注解语法为 `name[,modifier]*`。每个修饰符对应一个监听器，
//! 注入失败时依次通知目标上的全部监听器，任一监听器要求上报即向上传播。

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use infrastructure_common::{DependencyError, InjectionPolicy, TypeDescriptor};
use tracing::warn;

use crate::target::{Assembler, InjectTarget};

/// 必需修饰符
pub const MODIFIER_REQUIRED: &str = "required";
/// 忽略错误修饰符
pub const MODIFIER_OMIT_ERROR: &str = "omiterror";

/// 监听器对失败的处置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// 向上传播，中止当前阶段
    Escalate,
    /// 吞掉错误，目标保持零值
    Continue,
}

/// 注入失败监听器
pub trait InjectListener: Send + Sync {
    /// 处理一次注入失败
    fn on_inject_failed(&self, target: &str, error: &DependencyError) -> FailureAction;

    /// 该监听器对应的注入策略
    fn policy(&self) -> InjectionPolicy;
}

/// `required`：上报错误
#[derive(Debug, Default, Clone, Copy)]
pub struct RequiredListener;

impl InjectListener for RequiredListener {
    fn on_inject_failed(&self, _target: &str, _error: &DependencyError) -> FailureAction {
        FailureAction::Escalate
    }

    fn policy(&self) -> InjectionPolicy {
        InjectionPolicy::Required
    }
}

/// `omiterror`：记录警告后继续
#[derive(Debug, Default, Clone, Copy)]
pub struct OmitErrorListener;

impl InjectListener for OmitErrorListener {
    fn on_inject_failed(&self, target: &str, error: &DependencyError) -> FailureAction {
        warn!("注入失败, 已忽略: {}, 原因: {}", target, error);
        FailureAction::Continue
    }

    fn policy(&self) -> InjectionPolicy {
        InjectionPolicy::OptionalLogged
    }
}

/// 解析后的注入目标
#[derive(Clone)]
pub struct InjectionTarget {
    declared: TypeDescriptor,
    name_hint: String,
    policy: InjectionPolicy,
    listeners: Vec<Arc<dyn InjectListener>>,
    assembler: Option<Assembler>,
}

impl InjectionTarget {
    /// 以 `required` 策略创建目标
    pub fn new(declared: TypeDescriptor, name_hint: impl Into<String>) -> Self {
        Self {
            declared,
            name_hint: name_hint.into(),
            policy: InjectionPolicy::Required,
            listeners: vec![Arc::new(RequiredListener)],
            assembler: None,
        }
    }

    /// 为 Rust 类型 `X` 创建目标
    pub fn of<X: InjectTarget>(name_hint: impl Into<String>) -> Self {
        Self::new(X::descriptor(), name_hint).with_assembler(X::assembler())
    }

    /// 设置聚合组装函数
    #[must_use]
    pub fn with_assembler(mut self, assembler: Option<Assembler>) -> Self {
        self.assembler = assembler;
        self
    }

    /// 替换监听器链；任一监听器为 `Required` 时目标即为 `Required`
    #[must_use]
    pub fn with_listeners(mut self, listeners: Vec<Arc<dyn InjectListener>>) -> Self {
        self.policy = if listeners
            .iter()
            .any(|listener| listener.policy() == InjectionPolicy::Required)
        {
            InjectionPolicy::Required
        } else {
            InjectionPolicy::OptionalLogged
        };
        self.listeners = listeners;
        self
    }

    /// 声明类型
    pub fn declared(&self) -> &TypeDescriptor {
        &self.declared
    }

    /// 名称提示，为空表示按类型匹配
    pub fn name_hint(&self) -> &str {
        &self.name_hint
    }

    /// 查找键：名称提示或规范类型名
    pub fn lookup_key(&self) -> &str {
        if self.name_hint.is_empty() {
            self.declared.name()
        } else {
            &self.name_hint
        }
    }

    /// 注入策略
    pub fn policy(&self) -> InjectionPolicy {
        self.policy
    }

    /// 聚合组装函数
    pub fn assembler(&self) -> Option<Assembler> {
        self.assembler
    }

    /// 把失败交给监听器链；需要上报时返回 `InjectionFailed`
    pub fn on_failure(&self, label: &str, error: DependencyError) -> Result<(), DependencyError> {
        let mut action = FailureAction::Continue;
        for listener in &self.listeners {
            if listener.on_inject_failed(label, &error) == FailureAction::Escalate {
                action = FailureAction::Escalate;
            }
        }
        match action {
            FailureAction::Continue => Ok(()),
            FailureAction::Escalate => Err(DependencyError::InjectionFailed {
                target: label.to_string(),
                policy: self.policy,
                source: Box::new(error),
            }),
        }
    }
}

impl fmt::Debug for InjectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionTarget")
            .field("declared", &self.declared.name())
            .field("name_hint", &self.name_hint)
            .field("policy", &self.policy)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// 修饰符到监听器的注册表
pub struct ListenerManager {
    listeners: DashMap<String, Arc<dyn InjectListener>>,
}

impl ListenerManager {
    /// 创建包含 `required` 与 `omiterror` 的管理器
    pub fn new() -> Self {
        let manager = Self {
            listeners: DashMap::new(),
        };
        manager.register(MODIFIER_REQUIRED, Arc::new(RequiredListener));
        manager.register(MODIFIER_OMIT_ERROR, Arc::new(OmitErrorListener));
        manager
    }

    /// 注册或替换修饰符对应的监听器
    pub fn register(&self, modifier: impl Into<String>, listener: Arc<dyn InjectListener>) {
        self.listeners
            .insert(modifier.into().to_ascii_lowercase(), listener);
    }

    /// 查找修饰符对应的监听器
    pub fn get(&self, modifier: &str) -> Option<Arc<dyn InjectListener>> {
        self.listeners
            .get(&modifier.to_ascii_lowercase())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// 为类型 `X` 解析注解
    pub fn parse<X: InjectTarget>(&self, tag: &str) -> InjectionTarget {
        self.parse_with(X::descriptor(), X::assembler(), tag)
    }

    /// 解析 `name[,modifier]*` 注解
    ///
    /// 未知修饰符记录警告后忽略；没有可识别的修饰符时回落到 `required`。
    pub fn parse_with(
        &self,
        declared: TypeDescriptor,
        assembler: Option<Assembler>,
        tag: &str,
    ) -> InjectionTarget {
        let mut parts = tag.split(',').map(str::trim);
        let name = parts.next().unwrap_or_default();

        let mut listeners = Vec::new();
        for modifier in parts.filter(|part| !part.is_empty()) {
            match self.get(modifier) {
                Some(listener) => listeners.push(listener),
                None => warn!("未知的注入修饰符, 已忽略: {} (注解: {})", modifier, tag),
            }
        }
        if listeners.is_empty() {
            listeners.push(Arc::new(RequiredListener));
        }

        InjectionTarget::new(declared, name)
            .with_assembler(assembler)
            .with_listeners(listeners)
    }
}

impl Default for ListenerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListenerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modifiers = self
            .listeners
            .iter()
            .map(|entry| entry.key().clone())
            .collect::<Vec<_>>();
        modifiers.sort();
        f.debug_struct("ListenerManager")
            .field("modifiers", &modifiers)
            .finish()
    }
}
