//! 由注册构建器生成组件定义

use std::sync::{Arc, Weak};

use di_abstractions::{BeanRegistry, BeanSource, DefinitionRef, RegistrationParts};
use infrastructure_common::DependencyError;

use crate::definition::{AggregateDefinition, FunctionDefinition, ObjectDefinition};
use crate::function::FunctionInjector;

/// 定义工厂
#[derive(Debug, Clone)]
pub struct DefinitionFactory {
    function_injector: FunctionInjector,
}

impl DefinitionFactory {
    /// 创建定义工厂
    pub fn new(function_injector: FunctionInjector) -> Self {
        Self { function_injector }
    }

    /// 把一次注册转换为定义；工厂在此处完成签名校验与包装
    pub fn create(
        &self,
        parts: RegistrationParts,
        registry: Weak<dyn BeanRegistry>,
    ) -> Result<DefinitionRef, DependencyError> {
        let RegistrationParts {
            name,
            source,
            inject_names,
            hooks,
            ..
        } = parts;
        let definition: DefinitionRef = match source {
            BeanSource::Object(value) => Arc::new(ObjectDefinition::new(name, value, hooks)),
            BeanSource::Factory(factory) => {
                let capabilities = Arc::clone(factory.output());
                let producer =
                    self.function_injector
                        .wrap_factory(factory, &inject_names, registry)?;
                Arc::new(FunctionDefinition::new(name, capabilities, producer, hooks))
            }
            BeanSource::Sequence(value) => Arc::new(AggregateDefinition::sequence(name, value)),
            BeanSource::Mapping(value) => Arc::new(AggregateDefinition::mapping(name, value)),
        };
        Ok(definition)
    }
}
