//! 配置绑定处理器测试

use std::sync::Arc;

use config_abstractions::{ConfigValue, ValueBindable, ValueBinder};
use di_abstractions::{BeanValue, Capabilities, Component, Processor};
use di_impl::DefaultBeanRegistry;
use infrastructure_common::ConfigError;
use serde_json::json;

use crate::binder::ValueProcessor;
use crate::providers::MapProperties;

#[derive(Default)]
struct ServerConfig {
    port: ConfigValue<u16>,
    host: ConfigValue<String>,
}

impl ValueBindable for ServerConfig {
    fn bind_values(&self, binder: &ValueBinder<'_>) -> Result<(), ConfigError> {
        let prefixes = [("value", "server"), ("yaml", "listener")];
        binder.bind(&self.port, &prefixes, &[("value", "port")])?;
        binder.bind(&self.host, &prefixes, &[("value", "host"), ("yaml", "address")])?;
        Ok(())
    }
}

impl Component for ServerConfig {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn ValueBindable>(|v| v)
            .build()
    }
}

struct Plain;

impl Component for Plain {}

fn processor_with(properties: MapProperties, processor: ValueProcessor) -> ValueProcessor {
    processor
        .init(Arc::new(properties), Arc::new(DefaultBeanRegistry::new()))
        .unwrap();
    processor
}

#[test]
fn test_value_processor_binds_default_tags() {
    let processor = processor_with(
        MapProperties::from_value(json!({ "server": { "port": 8080, "host": "localhost" } })),
        ValueProcessor::new(),
    );
    let config = Arc::new(ServerConfig::default());

    assert!(processor.classify(&BeanValue::new(Arc::clone(&config))).unwrap());
    assert_eq!(config.port.get(), Some(8080));
    assert_eq!(config.host.get().as_deref(), Some("localhost"));
    assert_eq!(processor.bound_count(), 1);
    assert!(processor.process().is_ok());
}

#[test]
fn test_value_processor_custom_tags_fall_back_to_default() {
    let processor = processor_with(
        MapProperties::from_value(json!({ "listener": { "port": 9090, "address": "0.0.0.0" } })),
        ValueProcessor::new().with_tags("yaml", "yaml"),
    );
    let config = Arc::new(ServerConfig::default());

    assert!(processor.classify(&BeanValue::new(Arc::clone(&config))).unwrap());
    assert_eq!(config.port.get(), Some(9090));
    assert_eq!(config.host.get().as_deref(), Some("0.0.0.0"));
}

#[test]
fn test_value_processor_empty_tag_keeps_defaults() {
    let processor = ValueProcessor::new().with_tags("yaml", "");
    assert_eq!(processor.tag(), "value");
    assert_eq!(processor.prefix_tag(), "value");

    let processor = ValueProcessor::new().with_tags("", "yaml");
    assert_eq!(processor.tag(), "yaml");
    assert_eq!(processor.prefix_tag(), "value");
}

#[test]
fn test_value_processor_skips_unbindable_instances() {
    let processor = processor_with(MapProperties::new(), ValueProcessor::new());
    assert!(!processor.classify(&BeanValue::new(Arc::new(Plain))).unwrap());
    assert_eq!(processor.bound_count(), 0);
}

#[test]
fn test_value_processor_reports_conversion_errors() {
    let processor = processor_with(
        MapProperties::from_value(json!({ "server": { "port": "not-a-port" } })),
        ValueProcessor::new(),
    );
    let config = Arc::new(ServerConfig::default());

    assert!(processor.classify(&BeanValue::new(Arc::clone(&config))).is_err());
    assert!(!config.port.is_bound());
}
