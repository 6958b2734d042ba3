//! 注入目标类型
//!
//! [`InjectTarget`] 把一个 Rust 类型映射为注入器能理解的 [`TypeDescriptor`]，
//! 并负责把解析得到的 [`BeanValue`] 还原为该类型：
//!
//! - `Arc<T>`：具体类型或能力类型，取决于 `T::KIND`
//! - `Vec<Arc<T>>`：序列聚合
//! - `HashMap<K, Arc<T>>`：映射聚合，键必须是文本
//! - `Option<X>`：零值为 `None` 的可选目标

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use infrastructure_common::TypeDescriptor;
use once_cell::sync::OnceCell;

use crate::component::{Capabilities, Component};
use crate::value::BeanValue;

/// 聚合组装函数：把已按类型筛选、按扫描顺序排列的 `(名称, 值)` 组装为聚合值
pub type Assembler = fn(&[(String, BeanValue)]) -> BeanValue;

/// 可被注入的目标类型
pub trait InjectTarget: Sized + Send + Sync + 'static {
    /// 目标类型描述符
    fn descriptor() -> TypeDescriptor;

    /// 从解析得到的值还原
    fn from_value(value: &BeanValue) -> Option<Self>;

    /// 聚合目标的组装函数
    fn assembler() -> Option<Assembler> {
        None
    }

    /// 可选注入失败时使用的零值；没有零值的目标无法跳过
    fn zero() -> Option<Self> {
        None
    }
}

impl<T: ?Sized + Component> InjectTarget for Arc<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor()
    }

    fn from_value(value: &BeanValue) -> Option<Self> {
        value.cast_or_convert::<T>()
    }
}

impl<T: ?Sized + Component> InjectTarget for Vec<Arc<T>> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::sequence::<Self>(T::descriptor())
    }

    fn from_value(value: &BeanValue) -> Option<Self> {
        value.downcast::<Self>().map(|items| items.as_ref().clone())
    }

    fn assembler() -> Option<Assembler> {
        Some(assemble_sequence::<T>)
    }

    fn zero() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<K: MapKey, T: ?Sized + Component> InjectTarget for HashMap<K, Arc<T>> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::mapping::<Self>(TypeDescriptor::concrete::<K>(), T::descriptor())
    }

    fn from_value(value: &BeanValue) -> Option<Self> {
        value.downcast::<Self>().map(|items| items.as_ref().clone())
    }

    fn assembler() -> Option<Assembler> {
        Some(assemble_mapping::<K, T>)
    }

    fn zero() -> Option<Self> {
        Some(HashMap::new())
    }
}

impl<X: InjectTarget> InjectTarget for Option<X> {
    fn descriptor() -> TypeDescriptor {
        X::descriptor()
    }

    fn from_value(value: &BeanValue) -> Option<Self> {
        X::from_value(value).map(Some)
    }

    fn assembler() -> Option<Assembler> {
        X::assembler()
    }

    fn zero() -> Option<Self> {
        Some(None)
    }
}

/// 把元素序列包装为聚合值
pub fn sequence_value<T: ?Sized + Component>(items: Vec<Arc<T>>) -> BeanValue {
    let capabilities = Arc::new(Capabilities::bare(<Vec<Arc<T>>>::descriptor()));
    BeanValue::with_capabilities(Arc::new(items), capabilities)
}

/// 把映射包装为聚合值
pub fn mapping_value<K: MapKey, T: ?Sized + Component>(items: HashMap<K, Arc<T>>) -> BeanValue {
    let capabilities = Arc::new(Capabilities::bare(<HashMap<K, Arc<T>>>::descriptor()));
    BeanValue::with_capabilities(Arc::new(items), capabilities)
}

fn assemble_sequence<T: ?Sized + Component>(entries: &[(String, BeanValue)]) -> BeanValue {
    let items = entries
        .iter()
        .filter_map(|(_, value)| value.cast_or_convert::<T>())
        .collect::<Vec<_>>();
    sequence_value(items)
}

fn assemble_mapping<K: MapKey, T: ?Sized + Component>(entries: &[(String, BeanValue)]) -> BeanValue {
    let mut items = HashMap::with_capacity(entries.len());
    for (name, value) in entries {
        if let (Some(key), Some(item)) = (K::from_name(name), value.cast_or_convert::<T>()) {
            items.insert(key, item);
        }
    }
    mapping_value(items)
}

/// 映射聚合的键类型
///
/// 只有文本键可以被注入；其他键类型可以声明，但注入器会以 `UnsupportedKind` 拒绝。
pub trait MapKey: Eq + Hash + Clone + Send + Sync + 'static {
    /// 从定义名称构造键
    fn from_name(name: &str) -> Option<Self>;
}

impl MapKey for String {
    fn from_name(name: &str) -> Option<Self> {
        Some(name.to_string())
    }
}

impl MapKey for Box<str> {
    fn from_name(name: &str) -> Option<Self> {
        Some(name.into())
    }
}

impl MapKey for Arc<str> {
    fn from_name(name: &str) -> Option<Self> {
        Some(name.into())
    }
}

macro_rules! impl_numeric_map_key {
    ($($ty:ty),*) => {
        $(
            impl MapKey for $ty {
                fn from_name(name: &str) -> Option<Self> {
                    name.parse().ok()
                }
            }
        )*
    };
}

impl_numeric_map_key!(i32, i64, u32, u64, usize);

/// 字段注入槽位
///
/// 只能写入一次；可选注入失败时保持为空，即零值。
pub struct Autowired<X> {
    slot: OnceCell<X>,
}

impl<X> Autowired<X> {
    /// 创建空槽位
    pub const fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    /// 读取注入值
    pub fn get(&self) -> Option<&X> {
        self.slot.get()
    }

    /// 是否已注入
    pub fn is_set(&self) -> bool {
        self.slot.get().is_some()
    }

    /// 写入值；已写入时原样返回新值
    pub fn set(&self, value: X) -> Result<(), X> {
        self.slot.set(value)
    }
}

impl<X> Default for Autowired<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X> fmt::Debug for Autowired<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("set", &self.is_set())
            .finish()
    }
}
