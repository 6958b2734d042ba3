use std::sync::Arc;

use component_macros::{Autowire, Component, ValueBind};
use config_abstractions::ConfigValue;
use di_abstractions::{Autowired, Capabilities, Component};

#[derive(Default, Component)]
struct Database;

#[derive(Default, Component, Autowire, ValueBind)]
#[component(autowire, value_bind, initializing)]
#[value_prefix("server")]
struct Server<T: Send + Sync + 'static> {
    #[inject("db")]
    db: Autowired<Arc<Database>>,
    #[inject(",omiterror")]
    cache: Autowired<Option<Arc<Database>>>,
    #[value("port")]
    port: ConfigValue<u16>,
    marker: std::marker::PhantomData<T>,
}

impl<T: Send + Sync + 'static> di_abstractions::Initializing for Server<T> {
    fn after_inject(&self) -> Result<(), infrastructure_common::BoxError> {
        Ok(())
    }
}

fn main() {
    let capabilities: Arc<Capabilities> = <Server<u8> as Component>::capabilities();
    assert_eq!(capabilities.provided().count(), 3);
    let server = Server::<u8>::default();
    assert!(!server.db.is_set());
    assert!(!server.cache.is_set());
    assert!(!server.port.is_bound());
}
