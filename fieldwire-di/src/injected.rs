//! Injection points are handles held by consumer objects, which resolve a dependency from a
//! [Registry](crate::registry::Registry) and cache it for the lifetime of the consumer. Once
//! resolved, an injection point never touches the registry again, even if bindings change.
//!
//! ## Initialization kinds
//!
//! * [InitializationKind::Immediate] - resolve while constructing the consumer. Parametrized
//! factories cannot be used, since there's no consumer instance to pass yet.
//! * [InitializationKind::FromRegistry] - pick the registry while constructing the consumer, but
//! resolve on first access.
//! * [InitializationKind::Lazily] - pick the registry and resolve on first access (default).
//!
//! When no registry is given explicitly, it's selected by a
//! [LookupPolicy](crate::lookup_policy::LookupPolicy) - the process-wide one, unless the injection
//! point was created with [Injected::with_policy].
//!
//! ## Failure handling
//!
//! [Injected] is a required dependency: any failure to resolve it is fatal and reported via
//! [Diagnostics::die](crate::diagnostics::Diagnostics::die). [InjectedOptional] maps failures to
//! absence, with two exceptions which are always fatal: a missing lookup policy and eager injection
//! of a parametrized factory.
//!
//! ```
//! use fieldwire_di::injected::{Injected, InitializationKind};
//! use fieldwire_di::lookup_policy::LookupPolicy;
//! use fieldwire_di::registry::Registry;
//! use std::sync::Arc;
//!
//! struct Controller {
//!     name: Injected<String>,
//! }
//!
//! impl Controller {
//!     fn new(policy: &Arc<LookupPolicy>) -> Self {
//!         Self {
//!             name: Injected::with_policy::<Self>(
//!                 policy.clone(),
//!                 InitializationKind::Lazily,
//!                 None,
//!             ),
//!         }
//!     }
//!
//!     fn name(&self) -> &str {
//!         self.name.get(self)
//!     }
//! }
//!
//! let registry = Registry::default();
//! registry.register(None, || "controller".to_string());
//!
//! let policy = Arc::new(LookupPolicy::default());
//! policy.set_global(Arc::new(registry));
//!
//! let controller = Controller::new(&policy);
//! assert_eq!(controller.name(), "controller");
//! ```

use crate::consumer::Consumer;
use crate::diagnostics::DiagnosticsPtr;
use crate::error::ResolveError;
use crate::lookup_policy::{LookupPolicy, LookupPolicyPtr};
use crate::registry::{describe, RegistryPtr};
use derivative::Derivative;
use std::any::{type_name, Any};
use std::panic::Location;
use std::sync::OnceLock;
use tracing::Level;

/// Defines when an injection point selects its registry and resolves its value.
#[derive(Clone, Default, Debug)]
pub enum InitializationKind {
    /// Resolve during construction, from given registry or one selected by the lookup policy.
    Immediate(Option<RegistryPtr>),
    /// Select given registry or one from the lookup policy during construction, resolve on first
    /// access.
    FromRegistry(Option<RegistryPtr>),
    /// Select the registry and resolve on first access.
    #[default]
    Lazily,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Requirement {
    Required,
    Optional,
}

/// Where and how an injection point resolves its value. Shared by all injection point flavors.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct InjectionTarget {
    #[derivative(Debug = "ignore")]
    policy: LookupPolicyPtr,
    registry: Option<RegistryPtr>,
    alternative: Option<String>,
    requirement: Requirement,
}

/// What an injection point should do right after construction.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Initialization {
    /// Resolve now, without a consumer instance.
    Eager,
    /// Resolve on first access.
    Deferred,
    /// No registry serves the consumer; the dependency is absent for good.
    Absent,
}

impl InjectionTarget {
    /// Creates a target for consumer `C`, along with what to do right after construction.
    pub(crate) fn new<C: Any>(
        policy: LookupPolicyPtr,
        kind: InitializationKind,
        alternative: Option<&str>,
        requirement: Requirement,
        location: &'static Location<'static>,
    ) -> (Self, Initialization) {
        let mut target = Self {
            policy,
            registry: None,
            alternative: alternative.map(str::to_string),
            requirement,
        };

        let (registry, initialization) = match kind {
            InitializationKind::Immediate(registry) => (registry, Initialization::Eager),
            InitializationKind::FromRegistry(registry) => (registry, Initialization::Deferred),
            InitializationKind::Lazily => return (target, Initialization::Deferred),
        };

        let registry = match registry {
            Some(registry) => registry,
            None => match target.policy.registry_for(&Consumer::of_type::<C>()) {
                Ok(registry) => registry,
                Err(error) => {
                    let message =
                        format!("Can't find container for \"{}\": {error}", type_name::<C>());
                    let diagnostics = target.policy.diagnostics();

                    if matches!(error, ResolveError::NoPolicyConfigured)
                        || requirement == Requirement::Required
                    {
                        diagnostics.die(&message, location);
                    }

                    diagnostics.log(
                        Level::DEBUG,
                        &format!("Injecting nothing: {message}"),
                        location,
                    );
                    return (target, Initialization::Absent);
                }
            },
        };

        target.registry = Some(registry);
        (target, initialization)
    }

    /// Resolves during consumer construction, without a parameter.
    pub(crate) fn resolve_eager<T: 'static>(
        &self,
        location: &'static Location<'static>,
    ) -> Option<T> {
        self.resolve(None, location)
    }

    /// Resolves on first access, passing the consumer to parametrized factories.
    pub(crate) fn resolve_on_access<T: 'static>(
        &self,
        consumer: Consumer<'_>,
        location: &'static Location<'static>,
    ) -> Option<T> {
        self.resolve(Some(consumer), location)
    }

    #[inline]
    pub(crate) fn alternative(&self) -> Option<&str> {
        self.alternative.as_deref()
    }

    fn resolve<T: 'static>(
        &self,
        consumer: Option<Consumer<'_>>,
        location: &'static Location<'static>,
    ) -> Option<T> {
        let alternative = self.alternative();
        let registry = match (&self.registry, consumer) {
            (Some(registry), _) => Ok(registry.clone()),
            (None, Some(consumer)) => self.policy.registry_for(&consumer),
            (None, None) => Err(ResolveError::NoPolicyConfigured),
        };

        let (registry, diagnostics) = match registry {
            Ok(registry) => {
                let diagnostics = registry.diagnostics().clone();
                (registry, diagnostics)
            }
            Err(error) => {
                return self.handle_failure(error, self.policy.diagnostics(), false, location);
            }
        };

        let parameter = consumer.and_then(|consumer| consumer.instance());
        let greedy = parameter.is_none();

        match registry.resolve_optional::<T>(alternative, parameter) {
            Ok(Some(instance)) => {
                diagnostics.log(
                    Level::DEBUG,
                    &format!(
                        "Injecting ({} from container): {}",
                        if greedy { "eager" } else { "lazy" },
                        describe(type_name::<T>(), alternative)
                    ),
                    location,
                );
                Some(instance)
            }
            Ok(None) => self.handle_failure(
                ResolveError::EmptyInstance {
                    type_name: type_name::<T>(),
                },
                &diagnostics,
                greedy,
                location,
            ),
            Err(error) => self.handle_failure(error, &diagnostics, greedy, location),
        }
    }

    fn handle_failure<T>(
        &self,
        error: ResolveError,
        diagnostics: &DiagnosticsPtr,
        greedy: bool,
        location: &'static Location<'static>,
    ) -> Option<T> {
        match error {
            ResolveError::NoPolicyConfigured => diagnostics.die(&error.to_string(), location),
            ResolveError::ParametrizedResolverMisuse { type_name } if greedy => diagnostics.die(
                &format!(
                    "Parametrized resolvers are not supported for greedy injection (\"{type_name}\")."
                ),
                location,
            ),
            error if self.requirement == Requirement::Required => {
                diagnostics.die(&error.to_string(), location)
            }
            error => {
                diagnostics.log(
                    Level::DEBUG,
                    &format!("Injecting nothing: {error}"),
                    location,
                );
                None
            }
        }
    }
}

/// A required dependency of type `T`. See module-level documentation for details.
#[derive(Derivative)]
#[derivative(Debug(bound = "T: std::fmt::Debug"))]
pub struct Injected<T> {
    target: InjectionTarget,
    state: OnceLock<T>,
}

impl<T: 'static> Injected<T> {
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
            InjectionTarget::new::<C>(policy, kind, alternative, Requirement::Required, location);

        let state = OnceLock::new();
        if initialization == Initialization::Eager {
            if let Some(instance) = target.resolve_eager(location) {
                let _ = state.set(instance);
            }
        }

        Self { target, state }
    }

    /// Returns the dependency, resolving it on first access. Fatal if it cannot be resolved.
    #[track_caller]
    pub fn get<C: Any>(&self, consumer: &C) -> &T {
        let location = Location::caller();
        self.state.get_or_init(|| {
            match self
                .target
                .resolve_on_access(Consumer::of(consumer), location)
            {
                Some(instance) => instance,
                None => self.target.policy.diagnostics().die(
                    &format!(
                        "Dependency {} could not be injected",
                        describe(type_name::<T>(), self.target.alternative())
                    ),
                    location,
                ),
            }
        })
    }

    /// Checks if the dependency has already been resolved.
    pub fn is_resolved(&self) -> bool {
        self.state.get().is_some()
    }
}

/// An optional dependency of type `T`. See module-level documentation for details.
#[derive(Derivative)]
#[derivative(Debug(bound = "T: std::fmt::Debug"))]
pub struct InjectedOptional<T> {
    target: InjectionTarget,
    state: OnceLock<Option<T>>,
}

impl<T: 'static> InjectedOptional<T> {
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
                let _ = state.set(target.resolve_eager(location));
            }
            Initialization::Absent => {
                let _ = state.set(None);
            }
            Initialization::Deferred => {}
        }

        Self { target, state }
    }

    /// Returns the dependency, if available, resolving it on first access.
    #[track_caller]
    pub fn get<C: Any>(&self, consumer: &C) -> Option<&T> {
        let location = Location::caller();
        self.state
            .get_or_init(|| {
                self.target
                    .resolve_on_access(Consumer::of(consumer), location)
            })
            .as_ref()
    }

    /// Checks if resolution has already happened, regardless of its outcome.
    pub fn is_resolved(&self) -> bool {
        self.state.get().is_some()
    }
}
