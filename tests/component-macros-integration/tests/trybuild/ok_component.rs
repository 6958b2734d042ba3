use std::sync::Arc;

use component_macros::Component;
use di_abstractions::{BeanValue, Component, TypeKind};

pub trait Named: Send + Sync {
    fn label(&self) -> String;
}

di_abstractions::capability!(dyn Named);

pub trait Shouting: Send + Sync {
    fn shout(&self) -> String;
}

di_abstractions::capability!(dyn Shouting);

struct Loud(Arc<OkService>);

impl Shouting for Loud {
    fn shout(&self) -> String {
        self.0.label().to_uppercase()
    }
}

fn shouting(service: Arc<OkService>) -> Arc<dyn Shouting> {
    Arc::new(Loud(service))
}

#[derive(Component)]
#[component(provides(dyn Named), converts(dyn Shouting = shouting))]
struct OkService;

impl Named for OkService {
    fn label(&self) -> String {
        "ok".to_string()
    }
}

#[derive(Component)]
struct Plain;

fn main() {
    assert_eq!(<OkService as Component>::KIND, TypeKind::Concrete);
    let value = BeanValue::new(Arc::new(OkService));
    assert_eq!(value.cast::<dyn Named>().map(|v| v.label()), Some("ok".to_string()));
    assert!(value.cast::<dyn Shouting>().is_none());
    assert_eq!(value.convert::<dyn Shouting>().map(|v| v.shout()), Some("OK".to_string()));

    let plain = BeanValue::new(Arc::new(Plain));
    assert!(plain.cast::<dyn Named>().is_none());
}
