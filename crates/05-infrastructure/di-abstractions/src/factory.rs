//! 工厂与可注入函数描述符
//!
//! 任意参数个数的闭包在注册时被转换为显式的描述符：
//! 零参数的生产者，或"参数类型列表 + 类型擦除的调用器"。
//! 参数类型列表来自 [`InjectableFn::params`]，因此在编译期就已确定。

use std::fmt;
use std::sync::Arc;

use infrastructure_common::{BoxError, DependencyError, TypeDescriptor};

use crate::component::{Capabilities, Component};
use crate::target::{Assembler, InjectTarget};
use crate::value::BeanValue;

/// 按参数顺序排列的已解析参数；`None` 表示可选注入失败，使用零值
pub type ArgSlots = Vec<Option<BeanValue>>;

/// 零参数生产者
pub type Producer = Arc<dyn Fn() -> Result<BeanValue, DependencyError> + Send + Sync>;

/// 带参数的工厂调用器
pub type FactoryInvoker = Arc<dyn Fn(ArgSlots) -> Result<BeanValue, DependencyError> + Send + Sync>;

/// 带参数的函数调用器
pub type FunctionInvoker = Arc<dyn Fn(ArgSlots) -> Result<(), DependencyError> + Send + Sync>;

/// 参数描述
#[derive(Clone)]
pub struct ParamSpec {
    descriptor: TypeDescriptor,
    assembler: Option<Assembler>,
    has_zero: bool,
}

impl ParamSpec {
    /// 直接构造参数描述
    pub fn new(descriptor: TypeDescriptor, assembler: Option<Assembler>, has_zero: bool) -> Self {
        Self {
            descriptor,
            assembler,
            has_zero,
        }
    }

    /// 由参数类型 `X` 推导
    pub fn of<X: InjectTarget>() -> Self {
        Self::new(X::descriptor(), X::assembler(), X::zero().is_some())
    }

    /// 参数类型
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// 聚合组装函数
    pub fn assembler(&self) -> Option<Assembler> {
        self.assembler
    }

    /// 参数是否有零值
    pub fn has_zero(&self) -> bool {
        self.has_zero
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("descriptor", &self.descriptor.name())
            .field("has_zero", &self.has_zero)
            .finish()
    }
}

/// 工厂描述符
#[derive(Clone)]
pub enum FactoryDescriptor {
    /// 零参数生产者
    Producer {
        /// 工厂名称，用于诊断
        name: String,
        /// 输出类型的能力表
        output: Arc<Capabilities>,
        /// 生产函数
        produce: Producer,
    },
    /// 带参数的工厂
    Parameterized {
        /// 工厂名称，用于诊断
        name: String,
        /// 输出类型的能力表
        output: Arc<Capabilities>,
        /// 参数描述
        params: Vec<ParamSpec>,
        /// 调用器
        invoke: FactoryInvoker,
    },
}

impl FactoryDescriptor {
    /// 由闭包构造；参数个数为零时得到 `Producer`
    pub fn from_fn<F, Args>(factory: F) -> Self
    where
        F: InjectableFn<Args>,
        F::Output: FactoryOutput,
    {
        let name = std::any::type_name::<F>().to_string();
        let output = <F::Output as FactoryOutput>::capabilities();
        let params = F::params();
        let factory = Arc::new(factory);

        if params.is_empty() {
            let label = name.clone();
            let capabilities = Arc::clone(&output);
            Self::Producer {
                name,
                output,
                produce: Arc::new(move || {
                    factory.call(Vec::new())?.into_value(&label, &capabilities)
                }),
            }
        } else {
            let label = name.clone();
            let capabilities = Arc::clone(&output);
            Self::Parameterized {
                name,
                output,
                params,
                invoke: Arc::new(move |args| {
                    factory.call(args)?.into_value(&label, &capabilities)
                }),
            }
        }
    }

    /// 工厂名称
    pub fn name(&self) -> &str {
        match self {
            Self::Producer { name, .. } | Self::Parameterized { name, .. } => name,
        }
    }

    /// 输出类型的能力表
    pub fn output(&self) -> &Arc<Capabilities> {
        match self {
            Self::Producer { output, .. } | Self::Parameterized { output, .. } => output,
        }
    }

    /// 输出类型
    pub fn output_descriptor(&self) -> &TypeDescriptor {
        self.output().owner()
    }

    /// 参数描述；生产者没有参数
    pub fn params(&self) -> &[ParamSpec] {
        match self {
            Self::Producer { .. } => &[],
            Self::Parameterized { params, .. } => params,
        }
    }
}

impl fmt::Debug for FactoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryDescriptor")
            .field("name", &self.name())
            .field("output", &self.output_descriptor().name())
            .field("params", &self.params())
            .finish()
    }
}

/// 可注入函数描述符
#[derive(Clone)]
pub struct FunctionDescriptor {
    name: String,
    params: Vec<ParamSpec>,
    invoke: FunctionInvoker,
}

impl FunctionDescriptor {
    /// 直接构造
    pub fn new(name: impl Into<String>, params: Vec<ParamSpec>, invoke: FunctionInvoker) -> Self {
        Self {
            name: name.into(),
            params,
            invoke,
        }
    }

    /// 由闭包构造
    pub fn from_fn<F, Args>(function: F) -> Self
    where
        F: InjectableFn<Args>,
        F::Output: FunctionOutcome,
    {
        let name = std::any::type_name::<F>().to_string();
        let label = name.clone();
        let function = Arc::new(function);
        Self::new(
            name,
            F::params(),
            Arc::new(move |args| function.call(args)?.into_outcome(&label)),
        )
    }

    /// 函数名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 参数描述
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// 调用器
    pub fn invoker(&self) -> &FunctionInvoker {
        &self.invoke
    }
}

impl fmt::Debug for FunctionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

/// 参数全部可注入的闭包
pub trait InjectableFn<Args>: Send + Sync + 'static {
    /// 返回类型
    type Output;

    /// 参数描述，按参数顺序
    fn params() -> Vec<ParamSpec>;

    /// 用已解析的参数调用
    fn call(&self, args: ArgSlots) -> Result<Self::Output, DependencyError>;
}

/// 取出一个参数；缺失时使用零值
pub fn take_arg<X: InjectTarget>(slot: Option<Option<BeanValue>>) -> Result<X, DependencyError> {
    match slot.flatten() {
        Some(value) => X::from_value(&value).ok_or_else(|| DependencyError::TypeMismatch {
            expected: X::descriptor().name().to_string(),
            actual: value.descriptor().name().to_string(),
        }),
        None => X::zero().ok_or_else(|| DependencyError::not_found("", X::descriptor().name())),
    }
}

macro_rules! impl_injectable_fn {
    ($($arg:ident),*) => {
        impl<Func, Out, $($arg,)*> InjectableFn<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out + Send + Sync + 'static,
            $($arg: InjectTarget,)*
        {
            type Output = Out;

            fn params() -> Vec<ParamSpec> {
                vec![$(ParamSpec::of::<$arg>()),*]
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&self, args: ArgSlots) -> Result<Out, DependencyError> {
                let mut slots = args.into_iter();
                $(let $arg = take_arg::<$arg>(slots.next())?;)*
                Ok((self)($($arg),*))
            }
        }
    };
}

impl_injectable_fn!();
impl_injectable_fn!(A1);
impl_injectable_fn!(A1, A2);
impl_injectable_fn!(A1, A2, A3);
impl_injectable_fn!(A1, A2, A3, A4);
impl_injectable_fn!(A1, A2, A3, A4, A5);
impl_injectable_fn!(A1, A2, A3, A4, A5, A6);
impl_injectable_fn!(A1, A2, A3, A4, A5, A6, A7);
impl_injectable_fn!(A1, A2, A3, A4, A5, A6, A7, A8);

/// 工厂的返回类型：`Arc<T>` 或 `Result<Arc<T>, E>`
pub trait FactoryOutput: Send + 'static {
    /// 输出类型的能力表
    fn capabilities() -> Arc<Capabilities>;

    /// 包装为组件值
    fn into_value(self, factory: &str, capabilities: &Arc<Capabilities>) -> Result<BeanValue, DependencyError>;
}

impl<T: ?Sized + Component> FactoryOutput for Arc<T> {
    fn capabilities() -> Arc<Capabilities> {
        T::capabilities()
    }

    fn into_value(self, _factory: &str, capabilities: &Arc<Capabilities>) -> Result<BeanValue, DependencyError> {
        Ok(BeanValue::with_capabilities(self, Arc::clone(capabilities)))
    }
}

impl<T, E> FactoryOutput for Result<Arc<T>, E>
where
    T: ?Sized + Component,
    E: Into<BoxError> + Send + 'static,
{
    fn capabilities() -> Arc<Capabilities> {
        T::capabilities()
    }

    fn into_value(self, factory: &str, capabilities: &Arc<Capabilities>) -> Result<BeanValue, DependencyError> {
        match self {
            Ok(value) => Ok(BeanValue::with_capabilities(value, Arc::clone(capabilities))),
            Err(error) => Err(DependencyError::FactoryFailed {
                factory: factory.to_string(),
                source: error.into(),
            }),
        }
    }
}

/// 可注入函数的返回类型：`()` 或 `Result<(), E>`
pub trait FunctionOutcome {
    /// 转换为统一的结果
    fn into_outcome(self, function: &str) -> Result<(), DependencyError>;
}

impl FunctionOutcome for () {
    fn into_outcome(self, _function: &str) -> Result<(), DependencyError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> FunctionOutcome for Result<(), E> {
    fn into_outcome(self, function: &str) -> Result<(), DependencyError> {
        self.map_err(|error| DependencyError::FactoryFailed {
            factory: function.to_string(),
            source: error.into(),
        })
    }
}
