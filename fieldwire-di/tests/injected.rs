use fieldwire_di::diagnostics::{Diagnostics, DiagnosticsPtr};
use fieldwire_di::injected::{Injected, InjectedOptional, InitializationKind};
use fieldwire_di::injected_weakly::InjectedWeakly;
use fieldwire_di::lookup_policy::{LookupPolicy, LookupPolicyPtr};
use fieldwire_di::registry::{Registry, RegistryPtr};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use tracing::Level;

const TEST_STRING_VALUE: &str = "Yes Service!";

trait MyService {
    fn test_value(&self) -> &str;
}

struct MyServiceImplementation {
    test_value: String,
}

impl MyService for MyServiceImplementation {
    fn test_value(&self) -> &str {
        &self.test_value
    }
}

type MyServicePtr = Arc<dyn MyService + Send + Sync>;

#[derive(Default)]
struct RecordingDiagnostics {
    fatal: Mutex<Vec<String>>,
}

impl RecordingDiagnostics {
    fn fatal_messages(&self) -> Vec<String> {
        self.fatal.lock().unwrap().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn log(&self, _level: Level, _message: &str, _location: &'static Location<'static>) {}

    fn die(&self, message: &str, _location: &'static Location<'static>) -> ! {
        self.fatal.lock().unwrap().push(message.to_string());
        panic!("{message}");
    }
}

fn create_registry() -> (RegistryPtr, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::default());
    let registry = Registry::new(diagnostics.clone() as DiagnosticsPtr);
    registry.register_optional(None, || None::<i32>);
    registry.register(None, || {
        Arc::new(MyServiceImplementation {
            test_value: TEST_STRING_VALUE.to_string(),
        }) as MyServicePtr
    });
    registry.register_parametrized(None, |_: &dyn Any| TEST_STRING_VALUE.to_string());

    (Arc::new(registry), diagnostics)
}

fn create_policy(registry: RegistryPtr) -> LookupPolicyPtr {
    let policy = Arc::new(LookupPolicy::new(
        Arc::new(RecordingDiagnostics::default()) as DiagnosticsPtr
    ));
    policy.set_global(registry);
    policy
}

fn expect_fatal_error<R>(
    diagnostics: &RecordingDiagnostics,
    test_case: impl FnOnce() -> R,
) -> String {
    let result = catch_unwind(AssertUnwindSafe(test_case));
    assert!(result.is_err(), "expected a fatal error");

    diagnostics
        .fatal_messages()
        .pop()
        .expect("die was not called")
}

struct MyController {
    my_service: Injected<MyServicePtr>,
}

impl MyController {
    fn new(registry: &RegistryPtr, policy: &LookupPolicyPtr) -> Self {
        Self {
            my_service: Injected::with_policy::<Self>(
                policy.clone(),
                InitializationKind::Immediate(Some(registry.clone())),
                None,
            ),
        }
    }

    fn my_service(&self) -> &MyServicePtr {
        self.my_service.get(self)
    }
}

struct MyControllerWrongInjectedType {
    _my_service: Injected<Arc<MyServiceImplementation>>,
}

struct MyControllerNilInjected {
    _my_value: Injected<i32>,
}

struct MyControllerParametrizedInjected {
    _my_value: Injected<String>,
}

#[test]
fn should_inject_greedily() {
    let (registry, _) = create_registry();
    let policy = create_policy(registry.clone());

    let controller = MyController::new(&registry, &policy);
    assert_eq!(controller.my_service().test_value(), TEST_STRING_VALUE);
}

#[test]
fn should_die_on_wrong_injected_type() {
    let (registry, diagnostics) = create_registry();
    let policy = create_policy(registry.clone());

    let message = expect_fatal_error(&diagnostics, || MyControllerWrongInjectedType {
        _my_service: Injected::with_policy::<MyControllerWrongInjectedType>(
            policy,
            InitializationKind::Immediate(Some(registry)),
            None,
        ),
    });

    assert!(message.contains("does not have a resolver"));
}

#[test]
fn should_die_on_nil_injected() {
    let (registry, diagnostics) = create_registry();
    let policy = create_policy(registry.clone());

    let message = expect_fatal_error(&diagnostics, || MyControllerNilInjected {
        _my_value: Injected::with_policy::<MyControllerNilInjected>(
            policy,
            InitializationKind::Immediate(Some(registry)),
            None,
        ),
    });

    assert!(message.contains("returned no instance"));
}

#[test]
fn should_die_on_parametrized_greedy_injection() {
    let (registry, diagnostics) = create_registry();
    let policy = create_policy(registry.clone());

    let message = expect_fatal_error(&diagnostics, || MyControllerParametrizedInjected {
        _my_value: Injected::with_policy::<MyControllerParametrizedInjected>(
            policy,
            InitializationKind::Immediate(Some(registry)),
            None,
        ),
    });

    assert!(message
        .to_lowercase()
        .contains("parametrized resolvers are not supported"));
}

#[test]
fn should_die_on_nil_injected_lazily() {
    let (registry, diagnostics) = create_registry();
    let policy = create_policy(registry);

    let controller = MyControllerNilInjected {
        _my_value: Injected::with_policy::<MyControllerNilInjected>(
            policy,
            InitializationKind::Lazily,
            None,
        ),
    };

    expect_fatal_error(&diagnostics, || *controller._my_value.get(&controller));
}

#[test]
fn should_inject_parametrized_lazily() {
    let (registry, _) = create_registry();
    let policy = create_policy(registry);

    let controller = MyControllerParametrizedInjected {
        _my_value: Injected::with_policy::<MyControllerParametrizedInjected>(
            policy,
            InitializationKind::Lazily,
            None,
        ),
    };

    assert_eq!(controller._my_value.get(&controller), TEST_STRING_VALUE);
}

#[test]
fn should_inject_absent_optional_value() {
    struct Consumer {
        value: InjectedOptional<i32>,
        missing: InjectedOptional<u64>,
    }

    let (registry, diagnostics) = create_registry();
    let policy = create_policy(registry);

    let consumer = Consumer {
        value: InjectedOptional::with_policy::<Consumer>(
            policy.clone(),
            InitializationKind::Lazily,
            None,
        ),
        missing: InjectedOptional::with_policy::<Consumer>(
            policy,
            InitializationKind::Lazily,
            None,
        ),
    };

    assert!(consumer.value.get(&consumer).is_none());
    assert!(consumer.missing.get(&consumer).is_none());
    assert!(diagnostics.fatal_messages().is_empty());
}

#[test]
fn should_keep_cached_value_after_registry_changes() {
    struct Consumer {
        value: Injected<u8>,
    }

    let (registry, _) = create_registry();
    registry.register(None, || 1_u8);
    let policy = create_policy(registry.clone());

    let consumer = Consumer {
        value: Injected::with_policy::<Consumer>(policy, InitializationKind::Lazily, None),
    };

    assert_eq!(*consumer.value.get(&consumer), 1);
    registry.register(None, || 2_u8);
    assert_eq!(*consumer.value.get(&consumer), 1);
}

#[test]
fn should_invoke_factory_once_for_concurrent_access() {
    const THREADS: usize = 16;

    struct Consumer {
        service: Injected<Arc<usize>>,
    }

    let (registry, _) = create_registry();
    let calls = Arc::new(AtomicUsize::new(0));
    let factory_calls = calls.clone();
    registry.register(None, move || {
        let call = factory_calls.fetch_add(1, Ordering::SeqCst);
        thread::yield_now();
        Arc::new(call)
    });
    let policy = create_policy(registry);

    let consumer = Arc::new(Consumer {
        service: Injected::with_policy::<Consumer>(policy, InitializationKind::Lazily, None),
    });

    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles = (0..THREADS)
        .map(|_| {
            let consumer = consumer.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let service = consumer.service.get(&*consumer);
                Arc::as_ptr(service) as usize
            })
        })
        .collect::<Vec<_>>();

    let results = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|result| *result == results[0]));
}

#[test]
fn should_select_registry_per_consumer() {
    struct ProductionConsumer {
        value: Injected<String>,
    }

    struct TestConsumer {
        value: Injected<String>,
    }

    let production = Registry::new(Arc::new(RecordingDiagnostics::default()) as DiagnosticsPtr);
    production.register(Some("environment"), || "production".to_string());
    let test = Registry::new(Arc::new(RecordingDiagnostics::default()) as DiagnosticsPtr);
    test.register(Some("environment"), || "test".to_string());

    let policy = create_policy(Arc::new(production));
    let test = Arc::new(test);
    policy.set_finder(move |consumer| consumer.is::<TestConsumer>().then(|| test.clone()));

    let production_consumer = ProductionConsumer {
        value: Injected::with_policy::<ProductionConsumer>(
            policy.clone(),
            InitializationKind::Lazily,
            Some("environment"),
        ),
    };
    let test_consumer = TestConsumer {
        value: Injected::with_policy::<TestConsumer>(
            policy,
            InitializationKind::Lazily,
            Some("environment"),
        ),
    };

    assert_eq!(
        production_consumer.value.get(&production_consumer),
        "production"
    );
    assert_eq!(test_consumer.value.get(&test_consumer), "test");
}

#[test]
fn should_invoke_weak_factory_once_for_concurrent_access() {
    const THREADS: usize = 16;

    struct Consumer {
        service: InjectedWeakly<usize>,
    }

    let (registry, _) = create_registry();
    let service = Arc::new(7_usize);
    let weak_service = Arc::downgrade(&service);
    let calls = Arc::new(AtomicUsize::new(0));
    let factory_calls = calls.clone();
    registry.register_optional(None, move || {
        factory_calls.fetch_add(1, Ordering::SeqCst);
        thread::yield_now();
        weak_service.upgrade()
    });
    let policy = create_policy(registry);

    let consumer = Arc::new(Consumer {
        service: InjectedWeakly::with_policy::<Consumer>(policy, InitializationKind::Lazily, None),
    });

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles = (0..THREADS)
        .map(|_| {
            let consumer = consumer.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                consumer
                    .service
                    .get(&*consumer)
                    .map(|service| Arc::as_ptr(&service) as usize)
            })
        })
        .collect::<Vec<_>>();

    let results = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect::<Vec<_>>();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results
        .iter()
        .all(|result| *result == Some(Arc::as_ptr(&service) as usize)));
}
