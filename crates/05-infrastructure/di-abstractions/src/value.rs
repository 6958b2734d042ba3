//! 类型擦除的组件值

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use infrastructure_common::TypeDescriptor;

use crate::component::{Capabilities, Component};

/// 类型擦除的共享组件值
///
/// 内部保存 `Arc<T>`，克隆只增加引用计数。
/// 连同值一起携带其类型的能力表，使注入器无需知道具体类型即可完成匹配。
#[derive(Clone)]
pub struct BeanValue {
    inner: Arc<dyn Any + Send + Sync>,
    identity: usize,
    capabilities: Arc<Capabilities>,
}

impl BeanValue {
    /// 使用组件类型自身声明的能力表包装值
    pub fn new<T: ?Sized + Component>(value: Arc<T>) -> Self {
        Self::with_capabilities(value, T::capabilities())
    }

    /// 使用给定的能力表包装值
    pub fn with_capabilities<T: ?Sized + Send + Sync + 'static>(
        value: Arc<T>,
        capabilities: Arc<Capabilities>,
    ) -> Self {
        let identity = Arc::as_ptr(&value).cast::<()>() as usize;
        Self {
            inner: Arc::new(value),
            identity,
            capabilities,
        }
    }

    /// 值的类型描述符
    pub fn descriptor(&self) -> &TypeDescriptor {
        self.capabilities.owner()
    }

    /// 值的能力表
    pub fn capabilities(&self) -> &Arc<Capabilities> {
        &self.capabilities
    }

    /// 指针身份，同一个底层实例的所有包装共享同一身份
    pub fn identity(&self) -> usize {
        self.identity
    }

    /// 精确还原为 `Arc<T>`
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.inner.downcast_ref::<Arc<T>>().cloned()
    }

    /// 还原为 `T` 本身或其声明的可赋值能力
    pub fn cast<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        self.downcast::<C>().or_else(|| {
            self.capabilities
                .cast_erased(TypeId::of::<C>(), self.inner.as_ref())
                .and_then(unbox::<C>)
        })
    }

    /// 通过声明的转换函数得到 `C`
    pub fn convert<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        self.capabilities
            .convert_erased(TypeId::of::<C>(), self.inner.as_ref())
            .and_then(unbox::<C>)
    }

    /// 先尝试直接赋值，再尝试转换
    pub fn cast_or_convert<C: ?Sized + 'static>(&self) -> Option<Arc<C>> {
        self.cast::<C>().or_else(|| self.convert::<C>())
    }
}

fn unbox<C: ?Sized + 'static>(boxed: Box<dyn Any + Send + Sync>) -> Option<Arc<C>> {
    boxed.downcast::<Arc<C>>().ok().map(|value| *value)
}

impl fmt::Debug for BeanValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanValue")
            .field("type", &self.descriptor().name())
            .field("identity", &format_args!("{:#x}", self.identity))
            .finish()
    }
}
