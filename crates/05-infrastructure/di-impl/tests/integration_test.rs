//! 依赖注入实现的集成测试

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use di_abstractions::{
    resolve, Autowire, Autowired, BeanRegistry, BeanValue, Capabilities, Component, DependencyError,
    FieldWiring, FunctionRegistrarExt, Initializing, InjectionPolicy, Injector, LifecycleHooks,
    RegisterOptions, Registration, TypeKind,
};
use di_impl::{
    DefaultBeanRegistry, DefaultInjector, DefinitionFactory, FunctionInjectHandler,
    FunctionInjector, ObjectDefinition,
};
use infrastructure_common::BoxError;

trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

di_abstractions::capability!(dyn Greeter);

struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

impl Component for English {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Greeter>(|v| v)
            .build()
    }
}

struct French;

impl Greeter for French {
    fn greet(&self) -> String {
        "bonjour".to_string()
    }
}

impl Component for French {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Greeter>(|v| v)
            .build()
    }
}

/// 不直接实现 Greeter，只能通过转换得到
struct Legacy {
    text: String,
}

struct LegacyAdapter(Arc<Legacy>);

impl Greeter for LegacyAdapter {
    fn greet(&self) -> String {
        self.0.text.clone()
    }
}

impl Component for Legacy {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .converts_to::<dyn Greeter, _>(|legacy: Arc<Legacy>| {
                Arc::new(LegacyAdapter(legacy)) as Arc<dyn Greeter>
            })
            .build()
    }
}

#[derive(Default)]
struct Database {
    id: usize,
}

impl Component for Database {}

struct Service {
    db: Arc<Database>,
    ready: AtomicUsize,
}

impl Initializing for Service {
    fn after_inject(&self) -> Result<(), BoxError> {
        self.ready.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Component for Service {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Initializing>(|v| v)
            .build()
    }
}

#[derive(Default)]
struct Repository {
    db: Autowired<Arc<Database>>,
}

impl Autowire for Repository {
    fn autowire(&self, wiring: &mut FieldWiring<'_>) -> Result<(), DependencyError> {
        wiring.field("db", "db", &self.db)
    }
}

impl Component for Repository {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Autowire>(|v| v)
            .build()
    }
}

#[derive(Default)]
struct Consumer {
    optional: Autowired<Option<Arc<Database>>>,
    required: Autowired<Arc<Database>>,
    tag: &'static str,
}

impl Autowire for Consumer {
    fn autowire(&self, wiring: &mut FieldWiring<'_>) -> Result<(), DependencyError> {
        wiring.field("optional", "cache,omiterror", &self.optional)?;
        wiring.field("required", self.tag, &self.required)?;
        Ok(())
    }
}

impl Component for Consumer {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Autowire>(|v| v)
            .build()
    }
}

#[derive(Default)]
struct Audience {
    greeters: Autowired<Vec<Arc<dyn Greeter>>>,
    by_name: Autowired<HashMap<String, Arc<dyn Greeter>>>,
}

impl Autowire for Audience {
    fn autowire(&self, wiring: &mut FieldWiring<'_>) -> Result<(), DependencyError> {
        wiring.field("greeters", ",omiterror", &self.greeters)?;
        wiring.field("by_name", "", &self.by_name)?;
        Ok(())
    }
}

impl Component for Audience {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Autowire>(|v| v)
            .build()
    }
}

struct Fixture {
    registry: Arc<DefaultBeanRegistry>,
    injector: Arc<DefaultInjector>,
    factory: DefinitionFactory,
}

impl Fixture {
    fn new() -> Self {
        Self::with_injector(DefaultInjector::new())
    }

    fn with_injector(injector: DefaultInjector) -> Self {
        // 多个测试共享全局订阅者，重复初始化的错误可以忽略
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
        let injector = Arc::new(injector);
        Self {
            registry: Arc::new(DefaultBeanRegistry::new()),
            factory: DefinitionFactory::new(FunctionInjector::new(injector.clone())),
            injector,
        }
    }

    fn object<T: ?Sized + Component>(&self, name: &str, value: Arc<T>) {
        self.registry
            .register(
                Arc::new(ObjectDefinition::new(
                    name,
                    BeanValue::new(value),
                    LifecycleHooks::default(),
                )),
                RegisterOptions::default(),
            )
            .unwrap();
    }

    fn register(&self, registration: Registration) -> Result<(), DependencyError> {
        let mut parts = registration.into_parts();
        let options = std::mem::take(&mut parts.options);
        let registry: Arc<dyn BeanRegistry> = self.registry.clone();
        let definition = self.factory.create(parts, Arc::downgrade(&registry))?;
        self.registry.register(definition, options)
    }

    fn resolve<X: di_abstractions::InjectTarget>(&self, tag: &str) -> Result<X, DependencyError> {
        resolve::<X>(self.injector.as_ref(), self.registry.as_ref(), tag)
    }
}

#[test]
fn test_explicit_name_wins_and_auto_match_is_ambiguous() {
    let fixture = Fixture::new();
    fixture.object("A", Arc::new(English));
    fixture.object("B", Arc::new(French));

    let a: Arc<dyn Greeter> = fixture.resolve("A").unwrap();
    assert_eq!(a.greet(), "hello");

    let result = fixture.resolve::<Arc<dyn Greeter>>("");
    match result {
        Err(DependencyError::AmbiguousBinding { candidates, .. }) => {
            assert_eq!(candidates, vec!["A".to_string(), "B".to_string()]);
        }
        other => panic!("expected ambiguity, got {:?}", other.map(|g| g.greet())),
    }
}

#[test]
fn test_unique_capability_match_is_cached() {
    let fixture = Fixture::new();
    fixture.object("english", Arc::new(English));

    let first: Arc<dyn Greeter> = fixture.resolve("").unwrap();
    let canonical = <dyn Greeter as Component>::descriptor();
    let cached = fixture.registry.get(canonical.name()).unwrap();
    assert_eq!(cached.name(), "english");
    assert_eq!(fixture.registry.definitions().len(), 1);

    let second: Arc<dyn Greeter> = fixture.resolve("").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_missing_capability_is_not_found() {
    let fixture = Fixture::new();
    assert!(matches!(
        fixture.resolve::<Arc<dyn Greeter>>(""),
        Err(DependencyError::NotFound { .. })
    ));
}

#[test]
fn test_concrete_target_uses_name_only() {
    let fixture = Fixture::new();
    fixture.object("db", Arc::new(Database { id: 7 }));

    assert!(matches!(
        fixture.resolve::<Arc<Database>>(""),
        Err(DependencyError::NotFound { .. })
    ));
    let db: Arc<Database> = fixture.resolve("db").unwrap();
    assert_eq!(db.id, 7);
}

#[test]
fn test_deep_mode_constructs_registered_types() {
    let injector = DefaultInjector::new().with_recursive(true);
    injector.register_deep_type::<Repository>();
    let fixture = Fixture::with_injector(injector);
    fixture.object("db", Arc::new(Database { id: 3 }));

    let repository: Arc<Repository> = fixture.resolve("").unwrap();
    assert_eq!(repository.db.get().unwrap().id, 3);
}

#[test]
fn test_deep_mode_off_fails_for_unregistered_type() {
    let injector = DefaultInjector::new();
    injector.register_deep_type::<Repository>();
    let fixture = Fixture::with_injector(injector);

    assert!(matches!(
        fixture.resolve::<Arc<Repository>>(""),
        Err(DependencyError::NotFound { .. })
    ));
}

#[test]
fn test_sequence_keeps_scan_order_with_conversions() {
    let fixture = Fixture::new();
    fixture.object("english", Arc::new(English));
    fixture.object(
        "legacy",
        Arc::new(Legacy {
            text: "howdy".to_string(),
        }),
    );
    fixture.object("db", Arc::new(Database::default()));
    fixture.object("french", Arc::new(French));

    let greeters: Vec<Arc<dyn Greeter>> = fixture.resolve("").unwrap();
    let greetings: Vec<String> = greeters.iter().map(|g| g.greet()).collect();
    assert_eq!(greetings, vec!["hello", "howdy", "bonjour"]);

    let descriptor = <Vec<Arc<dyn Greeter>> as di_abstractions::InjectTarget>::descriptor();
    assert_eq!(descriptor.kind(), TypeKind::Sequence);
    assert!(fixture.registry.get(descriptor.name()).is_some());
}

#[test]
fn test_capability_auto_match_ignores_conversions() {
    let fixture = Fixture::new();
    fixture.object("english", Arc::new(English));
    fixture.object(
        "legacy",
        Arc::new(Legacy {
            text: "howdy".to_string(),
        }),
    );

    let greeter: Arc<dyn Greeter> = fixture.resolve("").unwrap();
    assert_eq!(greeter.greet(), "hello");
}

#[test]
fn test_mapping_is_keyed_by_definition_name() {
    let fixture = Fixture::new();
    fixture.object("english", Arc::new(English));
    fixture.object("french", Arc::new(French));

    let greeters: HashMap<String, Arc<dyn Greeter>> = fixture.resolve("").unwrap();
    assert_eq!(greeters.len(), 2);
    assert_eq!(greeters["french"].greet(), "bonjour");
}

#[test]
fn test_integer_mapping_key_is_unsupported() {
    let fixture = Fixture::new();
    fixture.object("english", Arc::new(English));

    assert!(matches!(
        fixture.resolve::<HashMap<u32, Arc<dyn Greeter>>>(""),
        Err(DependencyError::UnsupportedKind { .. })
    ));
}

#[test]
fn test_empty_aggregate_is_not_found_and_not_cached() {
    let fixture = Fixture::new();
    fixture.object("db", Arc::new(Database::default()));

    assert!(matches!(
        fixture.resolve::<Vec<Arc<dyn Greeter>>>(""),
        Err(DependencyError::NotFound { .. })
    ));
    assert!(matches!(
        fixture.resolve::<HashMap<String, Arc<dyn Greeter>>>(""),
        Err(DependencyError::NotFound { .. })
    ));
    let sequence = <Vec<Arc<dyn Greeter>> as di_abstractions::InjectTarget>::descriptor();
    assert!(fixture.registry.get(sequence.name()).is_none());

    // 之后注册的组件仍然能被聚合
    fixture.object("english", Arc::new(English));
    let greeters: Vec<Arc<dyn Greeter>> = fixture.resolve("").unwrap();
    assert_eq!(greeters.len(), 1);
}

#[test]
fn test_empty_aggregate_field_follows_policy() {
    let fixture = Fixture::new();
    let audience = Arc::new(Audience::default());
    fixture.object("audience", audience.clone());

    let definition = fixture.registry.get("audience").unwrap();
    let error = fixture
        .injector
        .inject(fixture.registry.as_ref(), definition.as_ref())
        .unwrap_err();
    match &error {
        DependencyError::InjectionFailed { target, policy, .. } => {
            assert_eq!(target, "audience.by_name");
            assert_eq!(*policy, InjectionPolicy::Required);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(error.root_cause(), DependencyError::NotFound { .. }));
    assert!(!audience.greeters.is_set());
    assert!(!audience.by_name.is_set());
}

#[test]
fn test_optional_field_failure_leaves_zero_value() {
    let fixture = Fixture::new();
    fixture.object("db", Arc::new(Database { id: 1 }));
    let consumer = Arc::new(Consumer {
        tag: "db",
        ..Consumer::default()
    });
    fixture.object("consumer", consumer.clone());

    let definition = fixture.registry.get("consumer").unwrap();
    fixture
        .injector
        .inject(fixture.registry.as_ref(), definition.as_ref())
        .unwrap();
    assert!(!consumer.optional.is_set());
    assert_eq!(consumer.required.get().unwrap().id, 1);
}

#[test]
fn test_required_field_failure_escalates() {
    let fixture = Fixture::new();
    fixture.object(
        "consumer",
        Arc::new(Consumer {
            tag: "missing",
            ..Consumer::default()
        }),
    );

    let definition = fixture.registry.get("consumer").unwrap();
    let error = fixture
        .injector
        .inject(fixture.registry.as_ref(), definition.as_ref())
        .unwrap_err();
    match &error {
        DependencyError::InjectionFailed { target, policy, .. } => {
            assert_eq!(target, "consumer.required");
            assert_eq!(*policy, InjectionPolicy::Required);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(error.root_cause(), DependencyError::NotFound { .. }));
}

#[test]
fn test_factory_resolves_dependency_then_constructs() {
    let fixture = Fixture::new();
    fixture.object("db", Arc::new(Database { id: 42 }));
    fixture
        .register(
            Registration::factory(|db: Arc<Database>| {
                Arc::new(Service {
                    db,
                    ready: AtomicUsize::new(0),
                })
            })
            .named("service")
            .inject_names(["db"]),
        )
        .unwrap();

    let definition = fixture.registry.get("service").unwrap();
    let service = definition.value().unwrap().downcast::<Service>().unwrap();
    assert_eq!(service.db.id, 42);

    definition.after_set().unwrap();
    definition.after_set().unwrap();
    assert_eq!(service.ready.load(Ordering::SeqCst), 1);
}

#[test]
fn test_each_factory_resolution_adds_an_instance() {
    let fixture = Fixture::new();
    fixture
        .register(Registration::factory(|| Arc::new(Database::default())).named("db"))
        .unwrap();

    let definition = fixture.registry.get("db").unwrap();
    definition.value().unwrap();
    definition.value().unwrap();
    assert_eq!(definition.instances().len(), 2);
}

#[test]
fn test_self_dependent_factory_is_circular() {
    let fixture = Fixture::new();
    fixture
        .register(
            Registration::factory(|inner: Arc<Database>| Arc::new(Database { id: inner.id + 1 }))
                .named("db")
                .inject_names(["db"]),
        )
        .unwrap();

    let error = fixture.registry.get("db").unwrap().value().unwrap_err();
    assert!(matches!(
        error.root_cause(),
        DependencyError::CircularDependency { .. }
    ));
}

#[test]
fn test_factory_reports_dropped_registry() {
    let fixture = Fixture::new();
    fixture.object("db", Arc::new(Database::default()));
    fixture
        .register(
            Registration::factory(|db: Arc<Database>| Arc::new(Database { id: db.id }))
                .named("copy")
                .inject_names(["db"]),
        )
        .unwrap();

    let definition = fixture.registry.get("copy").unwrap();
    drop(fixture);
    assert!(matches!(
        definition.value(),
        Err(DependencyError::RegistryUnavailable)
    ));
}

#[test]
fn test_function_registration_requires_parameters() {
    let fixture = Fixture::new();
    let handler = FunctionInjectHandler::new(FunctionInjector::new(fixture.injector.clone()));

    assert!(matches!(
        handler.register(|| {}, &[]),
        Err(DependencyError::InvalidFactorySignature { .. })
    ));
    assert!(handler.is_empty());
}

#[test]
fn test_functions_run_in_registration_order() {
    let fixture = Fixture::new();
    fixture.object("db", Arc::new(Database { id: 5 }));
    let handler = FunctionInjectHandler::new(FunctionInjector::new(fixture.injector.clone()));
    let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let first = Arc::clone(&calls);
    handler
        .register(move |db: Arc<Database>| first.lock().push(db.id), &["db"])
        .unwrap();
    let second = Arc::clone(&calls);
    handler
        .register(
            move |db: Arc<Database>| second.lock().push(db.id * 10),
            &["missing,omiterror"],
        )
        .unwrap();

    let invoked = handler.inject_all_functions(fixture.registry.as_ref()).unwrap();
    assert_eq!(invoked, 1);
    assert_eq!(*calls.lock(), vec![5]);
}

#[test]
fn test_required_function_argument_aborts() {
    let fixture = Fixture::new();
    let handler = FunctionInjectHandler::new(FunctionInjector::new(fixture.injector.clone()));
    handler
        .register(|_db: Arc<Database>| {}, &["missing"])
        .unwrap();

    assert!(matches!(
        handler.inject_all_functions(fixture.registry.as_ref()),
        Err(DependencyError::InjectionFailed { .. })
    ));
}
