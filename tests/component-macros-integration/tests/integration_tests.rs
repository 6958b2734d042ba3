//! 派生宏集中集成测试：派生出的组件在应用上下文中完成注入与配置绑定

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use component_macros::{Autowire, Component, ValueBind};
use config_abstractions::{ConfigValue, ValueBindable, ValueBinder};
use config_impl::MapProperties;
use di_abstractions::{
    ApplicationContextExt, Autowired, BeanValue, Initializing, Registration,
};
use infrastructure_common::BoxError;
use infrastructure_composition::ApplicationBuilder;
use serde_json::json;

pub trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

di_abstractions::capability!(dyn Greeter);

pub trait Described: Send + Sync {
    fn describe(&self) -> String;
}

di_abstractions::capability!(dyn Described);

#[derive(Default, Component, ValueBind)]
#[component(provides(dyn Greeter), value_bind)]
#[value_prefix("greeter", yaml = "hello")]
pub struct English {
    #[value("prefix")]
    prefix: ConfigValue<String>,
}

impl Greeter for English {
    fn greet(&self, name: &str) -> String {
        format!("{} {}", self.prefix.get_or("hello".to_string()), name)
    }
}

struct Description(Arc<Counter>);

impl Described for Description {
    fn describe(&self) -> String {
        format!("counter({})", self.0.hits.load(Ordering::SeqCst))
    }
}

fn describe_counter(counter: Arc<Counter>) -> Arc<dyn Described> {
    Arc::new(Description(counter))
}

#[derive(Default, Component)]
#[component(converts(dyn Described = describe_counter))]
pub struct Counter {
    hits: AtomicUsize,
}

#[derive(Default, Component, Autowire, ValueBind)]
#[component(autowire, value_bind, initializing)]
#[value_prefix("controller")]
pub struct Controller {
    #[inject]
    greeter: Autowired<Arc<dyn Greeter>>,
    #[inject("counter")]
    counter: Autowired<Arc<Counter>>,
    #[inject("missing,omiterror")]
    missing: Autowired<Option<Arc<Counter>>>,
    #[inject]
    described: Autowired<Vec<Arc<dyn Described>>>,
    #[value("name")]
    name: ConfigValue<String>,
    #[value("retries", yaml = "attempts")]
    retries: ConfigValue<u32>,
    ready: AtomicUsize,
}

impl Initializing for Controller {
    fn after_inject(&self) -> Result<(), BoxError> {
        self.ready.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_component_derive_declares_capabilities() {
    let english = BeanValue::new(Arc::new(English::default()));
    assert!(english.cast::<dyn Greeter>().is_some());
    assert!(english.cast::<dyn ValueBindable>().is_some());
    assert!(english.cast::<dyn Initializing>().is_none());

    let counter = BeanValue::new(Arc::new(Counter::default()));
    assert!(counter.cast::<dyn Described>().is_none());
    assert_eq!(
        counter.cast_or_convert::<dyn Described>().map(|d| d.describe()),
        Some("counter(0)".to_string())
    );
}

#[test]
fn test_value_bind_derive_uses_prefix_and_tags() {
    let properties = MapProperties::from_value(json!({
        "controller": { "name": "front", "retries": 3, "attempts": 9 },
        "hello": { "prefix": "hi" },
        "greeter": { "prefix": "hey" },
    }));

    let controller = Controller::default();
    controller
        .bind_values(&ValueBinder::with_default_tags(&properties))
        .unwrap();
    assert_eq!(controller.name.get(), Some("front".to_string()));
    assert_eq!(controller.retries.get(), Some(3));

    let yaml = Controller::default();
    yaml.bind_values(&ValueBinder::new(&properties, "yaml", "yaml"))
        .unwrap();
    assert_eq!(yaml.retries.get(), Some(9));
    assert_eq!(yaml.name.get(), Some("front".to_string()));

    let english = English::default();
    english
        .bind_values(&ValueBinder::new(&properties, "yaml", "value"))
        .unwrap();
    assert_eq!(english.greet("lorn"), "hi lorn");
}

#[test]
fn test_value_bind_reports_conversion_error() {
    let properties = MapProperties::from_value(json!({
        "controller": { "retries": "many" },
    }));
    let controller = Controller::default();
    assert!(controller
        .bind_values(&ValueBinder::with_default_tags(&properties))
        .is_err());
}

#[test]
fn test_derived_components_wire_inside_application() {
    let properties = MapProperties::from_value(json!({
        "controller": { "name": "front" },
        "greeter": { "prefix": "welcome" },
    }));
    let app = ApplicationBuilder::new()
        .with_properties(properties)
        .build()
        .unwrap();

    let counter = Arc::new(Counter::default());
    let controller = Arc::new(Controller::default());
    app.register(Registration::object(Arc::new(English::default())).named("english"))
        .unwrap();
    app.register(Registration::object(counter.clone()).named("counter"))
        .unwrap();
    app.register(Registration::object(controller.clone()).named("controller"))
        .unwrap();
    app.start().unwrap();

    let greeter = controller.greeter.get().unwrap();
    assert_eq!(greeter.greet("lorn"), "welcome lorn");
    assert!(Arc::ptr_eq(controller.counter.get().unwrap(), &counter));
    assert!(!controller.missing.is_set());

    counter.hits.fetch_add(2, Ordering::SeqCst);
    let described = controller.described.get().unwrap();
    assert_eq!(described.len(), 1);
    assert_eq!(described[0].describe(), "counter(2)");

    assert_eq!(controller.name.get(), Some("front".to_string()));
    assert!(!controller.retries.is_bound());
    assert_eq!(controller.ready.load(Ordering::SeqCst), 1);

    let english: Arc<dyn Greeter> = app.context().get("english").unwrap();
    assert_eq!(english.greet("again"), "welcome again");
    app.close().unwrap();
}
