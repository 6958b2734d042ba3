//! 组件与能力表
//!
//! 容器不做运行时反射：每个可注册类型通过 [`Component`] 给出规范的
//! [`TypeDescriptor`]，并显式声明自己实现了哪些能力（trait object）。
//! 能力声明依赖编译期的 unsizing 转换，所以声明本身就是一次静态的一致性检查：
//!
//! ```ignore
//! impl Component for Service {
//!     fn capabilities() -> Arc<Capabilities> {
//!         Capabilities::builder::<Self>()
//!             .provides::<dyn Greeter>(|v| v)
//!             .build()
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use infrastructure_common::{TypeDescriptor, TypeKind};

/// 可注册组件
///
/// 具体类型使用默认的 `KIND`；能力类型（`dyn Trait`）通过 [`capability!`](crate::capability)
/// 宏实现，`KIND` 为 [`TypeKind::Capability`]。
pub trait Component: Send + Sync + 'static {
    /// 作为注入目标时的类型种类
    const KIND: TypeKind = TypeKind::Concrete;

    /// 规范类型描述符
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>(Self::KIND)
    }

    /// 该类型声明的能力表
    fn capabilities() -> Arc<Capabilities> {
        Arc::new(Capabilities::bare(Self::descriptor()))
    }
}

/// 为能力类型实现 [`Component`]
///
/// ```ignore
/// pub trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// capability!(dyn Greeter);
/// ```
#[macro_export]
macro_rules! capability {
    ($($capability:ty),+ $(,)?) => {
        $(
            impl $crate::Component for $capability {
                const KIND: $crate::TypeKind = $crate::TypeKind::Capability;
            }
        )+
    };
}

type Caster =
    Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

#[derive(Clone)]
struct CapabilityEntry {
    descriptor: TypeDescriptor,
    cast: Caster,
}

/// 类型的能力表
///
/// `assignable` 为可直接赋值的能力（静态 unsizing 转换），
/// `convertible` 为需要显式转换函数的能力。匹配时总是先查可赋值，再查可转换。
pub struct Capabilities {
    owner: TypeDescriptor,
    assignable: IndexMap<TypeId, CapabilityEntry>,
    convertible: IndexMap<TypeId, CapabilityEntry>,
}

impl Capabilities {
    /// 不声明任何能力
    pub fn bare(owner: TypeDescriptor) -> Self {
        Self {
            owner,
            assignable: IndexMap::new(),
            convertible: IndexMap::new(),
        }
    }

    /// 为组件类型 `T` 创建能力表构建器
    pub fn builder<T: Component>() -> CapabilitiesBuilder<T> {
        CapabilitiesBuilder::new(T::descriptor())
    }

    /// 拥有者类型
    pub fn owner(&self) -> &TypeDescriptor {
        &self.owner
    }

    /// 拥有者类型本身或声明的能力是否可直接赋值给目标
    pub fn is_assignable_to(&self, target: &TypeDescriptor) -> bool {
        self.owner.id() == target.id() || self.assignable.contains_key(&target.id())
    }

    /// 是否声明了到目标的转换
    pub fn is_convertible_to(&self, target: &TypeDescriptor) -> bool {
        self.convertible.contains_key(&target.id())
    }

    /// 声明的可赋值能力
    pub fn provided(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.assignable.values().map(|entry| &entry.descriptor)
    }

    /// 声明的可转换能力
    pub fn conversions(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.convertible.values().map(|entry| &entry.descriptor)
    }

    pub(crate) fn cast_erased(
        &self,
        target: TypeId,
        inner: &(dyn Any + Send + Sync),
    ) -> Option<Box<dyn Any + Send + Sync>> {
        self.assignable
            .get(&target)
            .and_then(|entry| (entry.cast)(inner))
    }

    pub(crate) fn convert_erased(
        &self,
        target: TypeId,
        inner: &(dyn Any + Send + Sync),
    ) -> Option<Box<dyn Any + Send + Sync>> {
        self.convertible
            .get(&target)
            .and_then(|entry| (entry.cast)(inner))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("owner", &self.owner.name())
            .field(
                "assignable",
                &self.provided().map(TypeDescriptor::name).collect::<Vec<_>>(),
            )
            .field(
                "convertible",
                &self.conversions().map(TypeDescriptor::name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// 能力表构建器
pub struct CapabilitiesBuilder<T: ?Sized> {
    capabilities: Capabilities,
    _owner: PhantomData<fn(Arc<T>)>,
}

impl<T: ?Sized + Send + Sync + 'static> CapabilitiesBuilder<T> {
    /// 以拥有者描述符创建构建器
    pub fn new(owner: TypeDescriptor) -> Self {
        Self {
            capabilities: Capabilities::bare(owner),
            _owner: PhantomData,
        }
    }

    /// 声明 `T` 可直接赋值为能力 `C`，通常写作 `provides::<dyn Trait>(|v| v)`
    #[must_use]
    pub fn provides<C: ?Sized + Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<C>) -> Self {
        self.capabilities.assignable.insert(
            TypeId::of::<C>(),
            CapabilityEntry {
                descriptor: TypeDescriptor::capability::<C>(),
                cast: caster::<T, C, _>(cast),
            },
        );
        self
    }

    /// 声明 `T` 可通过转换函数得到 `C`
    #[must_use]
    pub fn converts_to<C, F>(mut self, convert: F) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
    {
        self.capabilities.convertible.insert(
            TypeId::of::<C>(),
            CapabilityEntry {
                descriptor: TypeDescriptor::capability::<C>(),
                cast: caster::<T, C, _>(convert),
            },
        );
        self
    }

    /// 完成构建
    pub fn build(self) -> Arc<Capabilities> {
        Arc::new(self.capabilities)
    }
}

fn caster<T, C, F>(cast: F) -> Caster
where
    T: ?Sized + Send + Sync + 'static,
    C: ?Sized + Send + Sync + 'static,
    F: Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static,
{
    Arc::new(move |inner| {
        inner
            .downcast_ref::<Arc<T>>()
            .map(|value| Box::new(cast(Arc::clone(value))) as Box<dyn Any + Send + Sync>)
    })
}
