//! 依赖注入集中集成测试：通过应用上下文驱动注册表、注入器与工厂

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use di_abstractions::{
    ApplicationContext, ApplicationContextExt, Autowire, Autowired, Capabilities, Component,
    DefinitionKind, FieldWiring, Initializing, Registration,
};
use infrastructure_common::{BoxError, ContextState, DependencyError, InfrastructureError};
use infrastructure_composition::{Application, ApplicationBuilder};

trait Codec: Send + Sync {
    fn id(&self) -> &'static str;
}

di_abstractions::capability!(dyn Codec);

macro_rules! codec {
    ($name:ident, $id:literal) => {
        struct $name;

        impl Codec for $name {
            fn id(&self) -> &'static str {
                $id
            }
        }

        impl Component for $name {
            fn capabilities() -> Arc<Capabilities> {
                Capabilities::builder::<Self>()
                    .provides::<dyn Codec>(|v| v)
                    .build()
            }
        }
    };
}

codec!(Json, "json");
codec!(Yaml, "yaml");
codec!(Toml, "toml");

#[derive(Default)]
struct Database {
    connections: AtomicUsize,
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

fn produce_service(db: Arc<Database>) -> Arc<Service> {
    db.connections.fetch_add(1, Ordering::SeqCst);
    Arc::new(Service {
        db,
        ready: AtomicUsize::new(0),
    })
}

#[derive(Default)]
struct Gateway {
    codecs: Autowired<Vec<Arc<dyn Codec>>>,
    by_name: Autowired<HashMap<String, Arc<dyn Codec>>>,
    primary: Autowired<Arc<dyn Codec>>,
    fallback: Autowired<Option<Arc<dyn Codec>>>,
}

impl Autowire for Gateway {
    fn autowire(&self, wiring: &mut FieldWiring<'_>) -> Result<(), DependencyError> {
        wiring.field("codecs", "", &self.codecs)?;
        wiring.field("by_name", "", &self.by_name)?;
        wiring.field("primary", "yaml", &self.primary)?;
        wiring.field("fallback", ",omiterror", &self.fallback)?;
        Ok(())
    }
}

impl Component for Gateway {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn Autowire>(|v| v)
            .build()
    }
}

fn application() -> Application {
    ApplicationBuilder::new()
        .with_application_name("di-integration")
        .build()
        .expect("应用构建失败")
}

fn dependency_error(error: &InfrastructureError) -> &DependencyError {
    match error {
        InfrastructureError::DependencyError { source } => source,
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_register_then_get_returns_same_definition() -> anyhow::Result<()> {
    let app = application();
    let db = Arc::new(Database::default());
    app.register(Registration::object(db.clone()).named("db"))?;

    let registry = app.context().registry();
    let first = registry.get("db").expect("db 未注册");
    let second = registry.get("db").expect("db 未注册");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.kind(), DefinitionKind::Object);

    let error = app
        .register(Registration::object(Arc::new(Database::default())).named("db"))
        .unwrap_err();
    assert!(matches!(
        dependency_error(&error),
        DependencyError::DuplicateName { name } if name == "db"
    ));
    Ok(())
}

#[test]
fn test_explicit_name_succeeds_where_auto_match_is_ambiguous() -> anyhow::Result<()> {
    let app = application();
    app.register(Registration::object(Arc::new(Json)).named("A"))?;
    app.register(Registration::object(Arc::new(Yaml)).named("B"))?;
    app.start()?;

    let context = app.context();
    let a: Arc<dyn Codec> = context.get("A")?;
    assert_eq!(a.id(), "json");

    match context.get::<Arc<dyn Codec>>("") {
        Err(DependencyError::AmbiguousBinding { candidates, .. }) => {
            assert_eq!(candidates, vec!["A".to_string(), "B".to_string()]);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("ambiguous capability resolved"),
    }
    app.close()?;
    Ok(())
}

#[test]
fn test_factory_injects_dependency_and_fires_hook_once() -> anyhow::Result<()> {
    let app = application();
    let db = Arc::new(Database::default());
    app.register(Registration::object(db.clone()).named("db"))?;
    app.register(
        Registration::factory(produce_service)
            .named("service")
            .inject_names(["db"]),
    )?;
    app.start()?;

    let definition = app.context().registry().get("service").expect("service 未注册");
    let instances = definition.instances();
    assert_eq!(instances.len(), 1);
    assert_eq!(db.connections.load(Ordering::SeqCst), 1);

    let service = instances[0].downcast::<Service>().expect("类型不符");
    assert!(Arc::ptr_eq(&service.db, &db));
    assert_eq!(service.ready.load(Ordering::SeqCst), 1);

    let again: Arc<Service> = app.context().get("service")?;
    assert!(!Arc::ptr_eq(&again, &service));
    assert_eq!(definition.instances().len(), 2);
    assert_eq!(again.ready.load(Ordering::SeqCst), 0);
    app.close()?;
    Ok(())
}

#[test]
fn test_aggregates_follow_registration_order() -> anyhow::Result<()> {
    let app = application();
    app.register(Registration::object(Arc::new(Toml)).named("toml"))?;
    app.register(Registration::object(Arc::new(Json)).named("json"))?;
    app.register(Registration::object(Arc::new(Database::default())).named("db"))?;
    app.register(Registration::object(Arc::new(Yaml)).named("yaml"))?;
    let gateway = Arc::new(Gateway::default());
    app.register(Registration::object(gateway.clone()).named("gateway"))?;
    app.start()?;

    let ids: Vec<&str> = gateway
        .codecs
        .get()
        .expect("序列未注入")
        .iter()
        .map(|codec| codec.id())
        .collect();
    assert_eq!(ids, vec!["toml", "json", "yaml"]);

    let by_name = gateway.by_name.get().expect("映射未注入");
    assert_eq!(by_name.len(), 3);
    assert_eq!(by_name["json"].id(), "json");

    assert_eq!(gateway.primary.get().map(|codec| codec.id()), Some("yaml"));
    assert!(!gateway.fallback.is_set());
    app.close()?;
    Ok(())
}

#[test]
fn test_mutual_factories_fail_with_circular_dependency() -> anyhow::Result<()> {
    struct Left;
    impl Component for Left {}
    struct Right;
    impl Component for Right {}

    let app = application();
    app.register(
        Registration::factory(|_right: Arc<Right>| Arc::new(Left))
            .named("left")
            .inject_names(["right"]),
    )?;
    app.register(
        Registration::factory(|_left: Arc<Left>| Arc::new(Right))
            .named("right")
            .inject_names(["left"]),
    )?;

    let error = app.start().unwrap_err();
    assert!(matches!(
        dependency_error(&error).root_cause(),
        DependencyError::CircularDependency { .. }
    ));
    assert_eq!(app.state(), ContextState::Initializing);
    app.close()?;
    Ok(())
}

#[test]
fn test_start_twice_leaves_state_unchanged() -> anyhow::Result<()> {
    let app = application();
    app.start()?;
    let error = app.start().unwrap_err();
    assert!(matches!(
        dependency_error(&error),
        DependencyError::BadStateTransition { .. }
    ));
    assert_eq!(app.state(), ContextState::Initialized);
    app.close()?;
    Ok(())
}

#[tokio::test]
async fn test_concurrent_close_tears_down_once() -> anyhow::Result<()> {
    let app = application();
    let destroyed = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&destroyed);
    app.register(
        Registration::object(Arc::new(Database::default()))
            .named("db")
            .on_destroy(move |_db: &Arc<Database>| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
    )?;
    app.start()?;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            tokio::task::spawn_blocking(move || app.close().is_ok())
        })
        .collect();
    for handle in handles {
        assert!(handle.await?);
    }
    assert_eq!(destroyed.load(Ordering::SeqCst), 1);
    Ok(())
}
