//! 类型元数据
//!
//! [`TypeDescriptor`] 为每个可注册类型提供规范且可比较的身份，
//! 包括为"T 的序列"和"K 到 V 的映射"派生出的复合身份。

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 具体类型（结构体等）
    Concrete,
    /// 能力类型（trait object）
    Capability,
    /// 元素序列
    Sequence,
    /// 文本键到元素的映射
    Mapping,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Concrete => "concrete",
            Self::Capability => "capability",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// 类型描述符
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: String,
    id: TypeId,
    kind: TypeKind,
    element: Option<Box<TypeDescriptor>>,
    key: Option<Box<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// 以给定种类描述类型 `T`
    pub fn of<T: ?Sized + 'static>(kind: TypeKind) -> Self {
        Self {
            name: std::any::type_name::<T>().to_string(),
            id: TypeId::of::<T>(),
            kind,
            element: None,
            key: None,
        }
    }

    /// 具体类型描述符
    pub fn concrete<T: 'static>() -> Self {
        Self::of::<T>(TypeKind::Concrete)
    }

    /// 能力类型描述符，`C` 通常是 `dyn Trait`
    pub fn capability<C: ?Sized + 'static>() -> Self {
        Self::of::<C>(TypeKind::Capability)
    }

    /// 序列描述符，`S` 为承载序列的实际类型
    pub fn sequence<S: 'static>(element: Self) -> Self {
        Self {
            name: format!("[]{}", element.name),
            id: TypeId::of::<S>(),
            kind: TypeKind::Sequence,
            element: Some(Box::new(element)),
            key: None,
        }
    }

    /// 映射描述符，`M` 为承载映射的实际类型
    pub fn mapping<M: 'static>(key: Self, value: Self) -> Self {
        Self {
            name: format!("map[{}]{}", key.name, value.name),
            id: TypeId::of::<M>(),
            kind: TypeKind::Mapping,
            element: Some(Box::new(value)),
            key: Some(Box::new(key)),
        }
    }

    /// 规范类型名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 类型 ID
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 类型种类
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// 序列或映射的元素类型
    pub fn element(&self) -> Option<&Self> {
        self.element.as_deref()
    }

    /// 映射的键类型
    pub fn key(&self) -> Option<&Self> {
        self.key.as_deref()
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// 是否为聚合类型（序列或映射）
    pub fn is_aggregate(&self) -> bool {
        matches!(self.kind, TypeKind::Sequence | TypeKind::Mapping)
    }

    /// 是否为文本类型，只有文本类型可以作为映射键
    pub fn is_text(&self) -> bool {
        self.id == TypeId::of::<String>()
            || self.id == TypeId::of::<Box<str>>()
            || self.id == TypeId::of::<Arc<str>>()
            || self.id == TypeId::of::<&'static str>()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 注入策略
///
/// 由注解修饰符在组装时决定，决定注入失败时的处理方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InjectionPolicy {
    /// 失败即向上传播，中止当前阶段
    #[default]
    Required,
    /// 失败时记录警告，目标保持零值
    OptionalLogged,
}

impl fmt::Display for InjectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("required"),
            Self::OptionalLogged => f.write_str("omiterror"),
        }
    }
}
