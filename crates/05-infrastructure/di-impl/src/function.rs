//! 函数注入
//!
//! [`FunctionInjector`] 负责两件事：
//!
//! - 把带参数的工厂包装为零参数生产者，参数在每次调用时通过注入器解析
//! - 把可注入函数绑定为 [`InjectInvoker`]，在启动的函数注入阶段统一调用

use std::fmt;
use std::sync::{Arc, Weak};

use di_abstractions::{
    ArgSlots, BeanRegistry, FactoryDescriptor, FunctionDescriptor, FunctionInvoker,
    FunctionRegistrar, InjectionTarget, Injector, ParamSpec, Producer,
};
use infrastructure_common::{DependencyError, TypeKind};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// 名称提示按参数个数补齐或截断
pub fn format_names(names: &[String], count: usize) -> Vec<String> {
    let mut formatted = names.iter().take(count).cloned().collect::<Vec<_>>();
    formatted.resize(count, String::new());
    formatted
}

/// 函数注入器
#[derive(Clone)]
pub struct FunctionInjector {
    injector: Arc<dyn Injector>,
}

impl FunctionInjector {
    /// 基于注入器创建
    pub fn new(injector: Arc<dyn Injector>) -> Self {
        Self { injector }
    }

    /// 使用的注入器
    pub fn injector(&self) -> &Arc<dyn Injector> {
        &self.injector
    }

    fn targets(
        &self,
        params: &[ParamSpec],
        names: &[String],
    ) -> Result<Vec<InjectionTarget>, DependencyError> {
        params
            .iter()
            .zip(format_names(names, params.len()))
            .map(|(param, tag)| {
                self.injector.can_inject(param.descriptor())?;
                Ok(self.injector.listener_manager().parse_with(
                    param.descriptor().clone(),
                    param.assembler(),
                    &tag,
                ))
            })
            .collect()
    }

    /// 绑定可注入函数
    ///
    /// 函数至少需要一个参数，且每个参数类型都必须可注入。
    pub fn resolve_function(
        &self,
        function: &FunctionDescriptor,
        names: &[String],
    ) -> Result<InjectInvoker, DependencyError> {
        if function.params().is_empty() {
            return Err(DependencyError::InvalidFactorySignature {
                factory: function.name().to_string(),
                reason: "可注入函数至少需要一个参数".to_string(),
            });
        }
        Ok(InjectInvoker {
            name: function.name().to_string(),
            params: function.params().to_vec(),
            targets: self.targets(function.params(), names)?,
            invoke: Arc::clone(function.invoker()),
        })
    }

    /// 把工厂包装为零参数生产者
    ///
    /// 输出必须是具体类型或能力类型。参数在每次调用时才解析，
    /// 生产者只弱引用注册表，注册表释放后调用返回 `RegistryUnavailable`。
    pub fn wrap_factory(
        &self,
        factory: FactoryDescriptor,
        names: &[String],
        registry: Weak<dyn BeanRegistry>,
    ) -> Result<Producer, DependencyError> {
        let output = factory.output_descriptor();
        if !matches!(output.kind(), TypeKind::Concrete | TypeKind::Capability) {
            return Err(DependencyError::InvalidFactorySignature {
                factory: factory.name().to_string(),
                reason: format!("工厂输出必须是具体类型或能力类型, 实际为 {}", output.kind()),
            });
        }

        match factory {
            FactoryDescriptor::Producer { produce, .. } => Ok(produce),
            FactoryDescriptor::Parameterized {
                name,
                params,
                invoke,
                ..
            } => {
                let targets = self.targets(&params, names)?;
                let injector = Arc::clone(&self.injector);
                Ok(Arc::new(move || {
                    let registry = registry
                        .upgrade()
                        .ok_or(DependencyError::RegistryUnavailable)?;
                    debug!("解析工厂参数: {}", name);
                    let args = resolve_args(injector.as_ref(), registry.as_ref(), &name, &targets)?;
                    invoke(args)
                }))
            }
        }
    }
}

impl fmt::Debug for FunctionInjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionInjector").finish_non_exhaustive()
    }
}

/// 逐个解析参数；可选参数失败时留空，必需参数失败时中止
fn resolve_args(
    injector: &dyn Injector,
    registry: &dyn BeanRegistry,
    owner: &str,
    targets: &[InjectionTarget],
) -> Result<ArgSlots, DependencyError> {
    let mut slots = Vec::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        match injector.inject_value(registry, target) {
            Ok(value) => slots.push(Some(value)),
            Err(error) => {
                target.on_failure(&format!("{owner}#{index}"), error)?;
                slots.push(None);
            }
        }
    }
    Ok(slots)
}

/// 已绑定的可注入函数
#[derive(Clone)]
pub struct InjectInvoker {
    name: String,
    params: Vec<ParamSpec>,
    targets: Vec<InjectionTarget>,
    invoke: FunctionInvoker,
}

impl InjectInvoker {
    /// 函数名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 各参数的注入目标
    pub fn targets(&self) -> &[InjectionTarget] {
        &self.targets
    }

    /// 解析参数并调用，返回是否真正调用了函数
    ///
    /// 可选参数解析失败且该参数没有零值时跳过调用。
    pub fn invoke(
        &self,
        injector: &dyn Injector,
        registry: &dyn BeanRegistry,
    ) -> Result<bool, DependencyError> {
        let args = resolve_args(injector, registry, &self.name, &self.targets)?;
        if let Some(index) = args
            .iter()
            .zip(&self.params)
            .position(|(arg, param)| arg.is_none() && !param.has_zero())
        {
            warn!("参数无法注入且没有零值, 跳过调用: {}#{}", self.name, index);
            return Ok(false);
        }
        (self.invoke)(args)?;
        Ok(true)
    }
}

impl fmt::Debug for InjectInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectInvoker")
            .field("name", &self.name)
            .field("targets", &self.targets)
            .finish()
    }
}

/// 可注入函数的登记处与执行者
pub struct FunctionInjectHandler {
    function_injector: FunctionInjector,
    invokers: Mutex<Vec<InjectInvoker>>,
}

impl FunctionInjectHandler {
    /// 创建
    pub fn new(function_injector: FunctionInjector) -> Self {
        Self {
            function_injector,
            invokers: Mutex::new(Vec::new()),
        }
    }

    /// 已登记的函数数量
    pub fn len(&self) -> usize {
        self.invokers.lock().len()
    }

    /// 是否没有登记函数
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 按登记顺序调用全部函数，第一个上报的错误中止执行
    pub fn inject_all_functions(&self, registry: &dyn BeanRegistry) -> Result<usize, DependencyError> {
        let invokers = self.invokers.lock().clone();
        let injector = self.function_injector.injector();
        let mut invoked = 0;
        for invoker in &invokers {
            if invoker.invoke(injector.as_ref(), registry)? {
                invoked += 1;
            }
        }
        info!("函数注入完成: 调用 {}/{}", invoked, invokers.len());
        Ok(invoked)
    }
}

impl FunctionRegistrar for FunctionInjectHandler {
    fn register_function(
        &self,
        function: FunctionDescriptor,
        names: Vec<String>,
    ) -> Result<(), DependencyError> {
        let invoker = self.function_injector.resolve_function(&function, &names)?;
        debug!("登记可注入函数: {}", invoker.name());
        self.invokers.lock().push(invoker);
        Ok(())
    }
}
