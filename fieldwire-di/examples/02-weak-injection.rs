use fieldwire_di::injected::InitializationKind;
use fieldwire_di::injected_weakly::InjectedWeakly;
use fieldwire_di::lookup_policy::LookupPolicy;
use fieldwire_di::registry::Registry;
use std::sync::Arc;

struct Session {
    user: String,
}

struct Screen {
    // the screen does not own the session
    session: InjectedWeakly<Session>,
}

impl Screen {
    fn describe(&self) -> String {
        self.session
            .get(self)
            .map(|session| format!("Logged in as {}", session.user))
            .unwrap_or_else(|| "Logged out".to_string())
    }
}

fn main() {
    let session = Arc::new(Session {
        user: "admin".to_string(),
    });

    // the factory must not keep the session alive, so it only holds a weak reference
    let weak_session = Arc::downgrade(&session);
    let registry = Registry::default();
    registry.register_optional(None, move || weak_session.upgrade());

    LookupPolicy::shared().set_global(Arc::new(registry));

    let screen = Screen {
        session: InjectedWeakly::new::<Screen>(InitializationKind::Lazily, None),
    };

    // prints "Logged in as admin"
    println!("{}", screen.describe());

    drop(session);

    // prints "Logged out"
    println!("{}", screen.describe());
}
