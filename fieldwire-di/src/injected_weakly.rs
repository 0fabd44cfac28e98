//! Weak injection for dependencies owned by someone else. [InjectedWeakly] resolves an `Arc<T>`
//! binding like any other injection point, but only keeps a [Weak] reference to the result. The
//! consumer therefore doesn't extend the lifetime of the dependency, and every access checks if
//! the dependency is still alive.
//!
//! Factories for weakly injected types should not hold the instance strongly themselves, otherwise
//! it will never be released. Capture a `Weak` and upgrade it instead:
//!
//! ```
//! use fieldwire_di::injected::InitializationKind;
//! use fieldwire_di::injected_weakly::InjectedWeakly;
//! use fieldwire_di::lookup_policy::LookupPolicy;
//! use fieldwire_di::registry::Registry;
//! use std::sync::Arc;
//!
//! struct Session;
//!
//! struct Screen {
//!     session: InjectedWeakly<Session>,
//! }
//!
//! let session = Arc::new(Session);
//! let weak_session = Arc::downgrade(&session);
//!
//! let registry = Registry::default();
//! registry.register_optional(None, move || weak_session.upgrade());
//!
//! let policy = Arc::new(LookupPolicy::default());
//! policy.set_global(Arc::new(registry));
//!
//! let screen = Screen {
//!     session: InjectedWeakly::with_policy::<Screen>(policy, InitializationKind::Lazily, None),
//! };
//! assert!(screen.session.get(&screen).is_some());
//!
//! drop(session);
//! assert!(screen.session.get(&screen).is_none());
//! ```

use crate::consumer::Consumer;
use crate::injected::{Initialization, InitializationKind, InjectionTarget, Requirement};
use crate::lookup_policy::{LookupPolicy, LookupPolicyPtr};
use derivative::Derivative;
use std::any::Any;
use std::panic::Location;
use std::sync::{Arc, OnceLock, Weak};

/// A weakly held, always optional dependency resolved from an `Arc<T>` binding.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct InjectedWeakly<T: ?Sized> {
    target: InjectionTarget,
    #[derivative(Debug = "ignore")]
    state: OnceLock<Option<Weak<T>>>,
}

impl<T: ?Sized + 'static> InjectedWeakly<T> {
    /// Creates an injection point for consumer `C`, using the process-wide lookup policy.
    #[track_caller]
    pub fn new<C: Any>(kind: InitializationKind, alternative: Option<&str>) -> Self {
        Self::with_policy::<C>(LookupPolicy::shared(), kind, alternative)
    }

    /// Creates an injection point for consumer `C`, using given lookup policy.
    #[track_caller]
    pub fn with_policy<C: Any>(
        policy: LookupPolicyPtr,
        kind: InitializationKind,
        alternative: Option<&str>,
    ) -> Self {
        let location = Location::caller();
        let (target, initialization) =
            InjectionTarget::new::<C>(policy, kind, alternative, Requirement::Optional, location);

        let state = OnceLock::new();
        match initialization {
            Initialization::Eager => {
                let _ = state.set(
                    target
                        .resolve_eager::<Arc<T>>(location)
                        .map(|instance| Arc::downgrade(&instance)),
                );
            }
            Initialization::Absent => {
                let _ = state.set(None);
            }
            Initialization::Deferred => {}
        }

        Self { target, state }
    }

    /// Returns the dependency, if resolved and still alive. Resolution happens only once; a
    /// released dependency is reported as absent, not resolved again.
    #[track_caller]
    pub fn get<C: Any>(&self, consumer: &C) -> Option<Arc<T>> {
        let location = Location::caller();
        self.state
            .get_or_init(|| {
                self.target
                    .resolve_on_access::<Arc<T>>(Consumer::of(consumer), location)
                    .map(|instance| Arc::downgrade(&instance))
            })
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Ignores the value. Weakly injected dependencies are owned elsewhere and cannot be replaced
    /// through the consumer.
    #[inline]
    pub fn set(&self, _value: Option<Arc<T>>) {}

    /// Checks if resolution has already happened, regardless of its outcome or liveness.
    pub fn is_resolved(&self) -> bool {
        self.state.get().is_some()
    }
}
