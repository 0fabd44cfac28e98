use fieldwire_di::injected::{Injected, InitializationKind};
use fieldwire_di::lookup_policy::LookupPolicy;
use fieldwire_di::registry::Registry;
use std::sync::Arc;

trait Clock {
    fn now(&self) -> u64;
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        1_700_000_000
    }
}

struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        0
    }
}

type ClockPtr = Arc<dyn Clock + Send + Sync>;

struct Scheduler {
    clock: Injected<ClockPtr>,
}

struct SchedulerUnderTest {
    clock: Injected<ClockPtr>,
}

fn main() {
    let production = Registry::default();
    production.register(None, || Arc::new(SystemClock) as ClockPtr);

    let testing = Arc::new(Registry::default());
    testing.register(None, || Arc::new(FixedClock) as ClockPtr);

    let policy = LookupPolicy::shared();
    policy.set_global(Arc::new(production));

    // a finder picks a registry per consumer; declined consumers fall back to the global registry
    policy.set_finder(move |consumer| {
        consumer
            .is::<SchedulerUnderTest>()
            .then(|| testing.clone())
    });

    let scheduler = Scheduler {
        clock: Injected::new::<Scheduler>(InitializationKind::Lazily, None),
    };
    let scheduler_under_test = SchedulerUnderTest {
        clock: Injected::new::<SchedulerUnderTest>(InitializationKind::Lazily, None),
    };

    // prints "1700000000 vs 0"
    println!(
        "{} vs {}",
        scheduler.clock.get(&scheduler).now(),
        scheduler_under_test.clock.get(&scheduler_under_test).now()
    );
}
