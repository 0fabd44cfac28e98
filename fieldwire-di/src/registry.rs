//! Functionality related to registering factories for injectable types. A [Registry] maps a service
//! type, optionally qualified by an *alternative* name, to a factory producing instances of that
//! type.
//!
//! Service types are matched exactly: a factory registered for `Arc<dyn Service + Send + Sync>`
//! will only ever serve requests for `Arc<dyn Service + Send + Sync>`, never for a concrete
//! implementation of `Service` or some other trait object. Registering again for the same type and
//! alternative replaces the previous factory.
//!
//! Lookups are keyed by the requested type, so requesting a type nobody registered is reported as
//! [ResolveError::NoResolver]. Only a named alternative can tell more: when the name is bound to
//! some other type, the error is [ResolveError::TypeMismatch] instead.
//!
//! ```
//! use fieldwire_di::registry::Registry;
//! use std::sync::Arc;
//!
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter;
//!
//! impl Greeter for EnglishGreeter {
//!     fn greet(&self) -> String {
//!         "Hello!".to_string()
//!     }
//! }
//!
//! let registry = Registry::default();
//! registry.register(None, || Arc::new(EnglishGreeter) as Arc<dyn Greeter + Send + Sync>);
//!
//! let greeter = registry
//!     .resolve::<Arc<dyn Greeter + Send + Sync>>(None, None)
//!     .unwrap();
//! assert_eq!(greeter.greet(), "Hello!");
//! ```

use crate::diagnostics::{DiagnosticsPtr, TracingDiagnostics};
use crate::error::{ErrorPtr, ResolveError};
use derivative::Derivative;
use fxhash::FxHashMap;
use itertools::Itertools;
use std::any::{type_name, Any, TypeId};
use std::panic::Location;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::Level;

pub type RegistryPtr = Arc<Registry>;

/// Type-erased factory. Receives the optional parameter and produces an instance, nothing, or an
/// error.
pub type FactoryFn =
    Arc<dyn Fn(Option<&dyn Any>) -> Result<Option<Box<dyn Any>>, ErrorPtr> + Send + Sync>;

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
struct BindingKey {
    type_id: TypeId,
    alternative: Option<String>,
}

impl BindingKey {
    fn of<T: 'static>(alternative: Option<&str>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            alternative: alternative.map(str::to_string),
        }
    }
}

/// A factory registered for a given type and alternative.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Binding {
    /// Name of the produced type.
    pub type_name: &'static str,

    /// Optional name distinguishing multiple bindings for the same type.
    pub alternative: Option<String>,

    /// Parametrized factories can only be invoked when a parameter is supplied.
    pub is_parametrized: bool,

    #[derivative(Debug = "ignore")]
    factory: FactoryFn,
}

/// Thread-safe registry of [Binding]s.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Registry {
    bindings: RwLock<FxHashMap<BindingKey, Binding>>,
    #[derivative(Debug = "ignore")]
    diagnostics: DiagnosticsPtr,
    overwrite_level: Level,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(TracingDiagnostics::shared())
    }
}

impl Registry {
    /// Creates an empty registry reporting to given diagnostics.
    pub fn new(diagnostics: DiagnosticsPtr) -> Self {
        Self {
            bindings: Default::default(),
            diagnostics,
            overwrite_level: Level::WARN,
        }
    }

    /// Sets whether replacing an existing binding is reported as a warning (default) or only as a
    /// debug message.
    pub fn with_overwrite_warnings(mut self, enabled: bool) -> Self {
        self.overwrite_level = if enabled { Level::WARN } else { Level::DEBUG };
        self
    }

    #[inline]
    pub fn diagnostics(&self) -> &DiagnosticsPtr {
        &self.diagnostics
    }

    /// Registers a factory for `T`.
    #[track_caller]
    pub fn register<T, F>(&self, alternative: Option<&str>, factory: F)
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register_fallible(alternative, false, move |_| Ok(Some(factory())));
    }

    /// Registers a factory for `T` which might not produce anything.
    #[track_caller]
    pub fn register_optional<T, F>(&self, alternative: Option<&str>, factory: F)
    where
        T: 'static,
        F: Fn() -> Option<T> + Send + Sync + 'static,
    {
        self.register_fallible(alternative, false, move |_| Ok(factory()));
    }

    /// Registers a factory for `T` requiring a parameter. Lazy injection points pass their consumer
    /// as the parameter; eager injection cannot supply one.
    #[track_caller]
    pub fn register_parametrized<T, F>(&self, alternative: Option<&str>, factory: F)
    where
        T: 'static,
        F: Fn(&dyn Any) -> T + Send + Sync + 'static,
    {
        self.register_fallible(alternative, true, move |parameter| {
            Ok(parameter.map(&factory))
        });
    }

    /// Registers a general factory for `T`. If `is_parametrized` is set, the factory is never
    /// invoked without a parameter.
    #[track_caller]
    pub fn register_fallible<T, F>(
        &self,
        alternative: Option<&str>,
        is_parametrized: bool,
        factory: F,
    ) where
        T: 'static,
        F: Fn(Option<&dyn Any>) -> Result<Option<T>, ErrorPtr> + Send + Sync + 'static,
    {
        let location = Location::caller();
        let binding = Binding {
            type_name: type_name::<T>(),
            alternative: alternative.map(str::to_string),
            is_parametrized,
            factory: Arc::new(move |parameter: Option<&dyn Any>| {
                factory(parameter)
                    .map(|instance| instance.map(|instance| Box::new(instance) as Box<dyn Any>))
            }),
        };

        let previous = self
            .bindings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(BindingKey::of::<T>(alternative), binding);

        let description = describe(type_name::<T>(), alternative);
        if previous.is_some() {
            self.diagnostics.log(
                self.overwrite_level,
                &format!("Overwriting resolver for {description}"),
                location,
            );
        } else {
            self.diagnostics.log(
                Level::DEBUG,
                &format!("Registering resolver for {description}"),
                location,
            );
        }
    }

    /// Resolves an instance of `T`. A factory producing nothing results in
    /// [ResolveError::EmptyInstance].
    pub fn resolve<T: 'static>(
        &self,
        alternative: Option<&str>,
        parameter: Option<&dyn Any>,
    ) -> Result<T, ResolveError> {
        self.resolve_optional(alternative, parameter)?
            .ok_or(ResolveError::EmptyInstance {
                type_name: type_name::<T>(),
            })
    }

    /// Resolves an instance of `T`, returning `None` when the factory produces nothing.
    pub fn resolve_optional<T: 'static>(
        &self,
        alternative: Option<&str>,
        parameter: Option<&dyn Any>,
    ) -> Result<Option<T>, ResolveError> {
        // the factory is called without holding the lock, so it can use the registry itself
        let binding = self.binding::<T>(alternative)?;
        if binding.is_parametrized && parameter.is_none() {
            return Err(ResolveError::ParametrizedResolverMisuse {
                type_name: binding.type_name,
            });
        }

        let instance = (binding.factory)(parameter).map_err(|error| ResolveError::Factory {
            type_name: binding.type_name,
            error,
        })?;

        instance
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .map(|instance| *instance)
                    .map_err(|_| ResolveError::TypeMismatch {
                        requested: type_name::<T>(),
                        registered: binding.type_name,
                        alternative: binding.alternative.clone(),
                    })
            })
            .transpose()
    }

    /// Checks if there's a binding for `T` and given alternative. Never calls the factory.
    pub fn is_resolvable<T: 'static>(&self, alternative: Option<&str>) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&BindingKey::of::<T>(alternative))
    }

    /// Checks if the binding for `T` and given alternative requires a parameter.
    pub fn is_parametrized<T: 'static>(&self, alternative: Option<&str>) -> bool {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&BindingKey::of::<T>(alternative))
            .map(|binding| binding.is_parametrized)
            .unwrap_or(false)
    }

    /// Returns a snapshot of all bindings, sorted by type name and alternative.
    pub fn bindings(&self) -> Vec<Binding> {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .sorted_by(|first, second| {
                (first.type_name, &first.alternative).cmp(&(second.type_name, &second.alternative))
            })
            .collect_vec()
    }

    pub fn len(&self) -> usize {
        self.bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn binding<T: 'static>(&self, alternative: Option<&str>) -> Result<Binding, ResolveError> {
        let bindings = self.bindings.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(binding) = bindings.get(&BindingKey::of::<T>(alternative)) {
            return Ok(binding.clone());
        }

        // a name bound to some other type is a type error, not a missing resolver
        let registered = alternative.and_then(|alternative| {
            bindings
                .values()
                .filter(|binding| binding.alternative.as_deref() == Some(alternative))
                .map(|binding| binding.type_name)
                .min()
        });

        Err(match registered {
            Some(registered) => ResolveError::TypeMismatch {
                requested: type_name::<T>(),
                registered,
                alternative: alternative.map(str::to_string),
            },
            None => ResolveError::NoResolver {
                type_name: type_name::<T>(),
                alternative: alternative.map(str::to_string),
            },
        })
    }
}

/// Human-readable `Type/alternative` description used in diagnostics.
pub(crate) fn describe(type_name: &str, alternative: Option<&str>) -> String {
    match alternative {
        Some(alternative) => format!("\"{type_name}/{alternative}\""),
        None => format!("\"{type_name}\""),
    }
}
