use fieldwire_di::injected::{Injected, InitializationKind};
use fieldwire_di::lookup_policy::LookupPolicy;
use fieldwire_di::registry::Registry;
use std::sync::Arc;

// this is a trait we would like to use in our consumer
trait TestTrait {
    fn foo(&self);
}

// this is a dependency which implements the above trait
struct TestDependency;

impl TestTrait for TestDependency {
    fn foo(&self) {
        println!("Hello world!");
    }
}

// this is a consumer holding an injection point for the trait
struct TestConsumer {
    // the dependency is resolved on first access and cached afterwards
    dependency: Injected<Arc<dyn TestTrait + Send + Sync>>,
}

impl TestConsumer {
    fn new() -> Self {
        Self {
            dependency: Injected::new::<Self>(InitializationKind::Lazily, None),
        }
    }

    fn call_foo(&self) {
        self.dependency.get(self).foo();
    }
}

fn main() {
    // registrations are typically made once, when the application starts
    let registry = Registry::default();
    registry.register(None, || {
        Arc::new(TestDependency) as Arc<dyn TestTrait + Send + Sync>
    });

    // consumers without an explicit registry use the process-wide lookup policy
    LookupPolicy::shared().set_global(Arc::new(registry));

    let consumer = TestConsumer::new();

    // prints "Hello world!"
    consumer.call_foo();
}
