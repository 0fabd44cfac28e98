//! A [LookupPolicy] decides which [Registry](crate::registry::Registry) serves a given consumer.
//! Most applications install a single global registry at startup. When some part of the object
//! graph needs different wiring, e.g. test doubles for one subsystem, a custom finder can pick a
//! registry per [Consumer].
//!
//! Exactly one strategy is active at a time. Installing a finder while a global registry is active
//! keeps that registry as a fallback for consumers the finder declines. Resolving with no strategy
//! installed is a configuration error.

use crate::consumer::Consumer;
use crate::diagnostics::{DiagnosticsPtr, TracingDiagnostics};
use crate::error::ResolveError;
use crate::registry::RegistryPtr;
use derivative::Derivative;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

pub type LookupPolicyPtr = Arc<LookupPolicy>;

/// Custom strategy selecting a registry for a consumer. Returning `None` falls through to the
/// global registry, if one was active when the finder got installed.
pub type RegistryFinderPtr = Arc<dyn Fn(&Consumer<'_>) -> Option<RegistryPtr> + Send + Sync>;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
enum Strategy {
    Global(RegistryPtr),
    Finder {
        #[derivative(Debug = "ignore")]
        finder: RegistryFinderPtr,
        fallback: Option<RegistryPtr>,
    },
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct LookupPolicy {
    strategy: RwLock<Option<Strategy>>,
    #[derivative(Debug = "ignore")]
    diagnostics: DiagnosticsPtr,
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self::new(TracingDiagnostics::shared())
    }
}

impl LookupPolicy {
    /// Creates an unconfigured policy reporting to given diagnostics.
    pub fn new(diagnostics: DiagnosticsPtr) -> Self {
        Self {
            strategy: RwLock::new(None),
            diagnostics,
        }
    }

    /// Returns the process-wide policy used by injection points not given an explicit one.
    pub fn shared() -> LookupPolicyPtr {
        static SHARED: OnceLock<LookupPolicyPtr> = OnceLock::new();
        SHARED.get_or_init(Default::default).clone()
    }

    #[inline]
    pub fn diagnostics(&self) -> &DiagnosticsPtr {
        &self.diagnostics
    }

    /// Makes given registry serve every consumer, replacing any finder.
    #[track_caller]
    pub fn set_global(&self, registry: RegistryPtr) {
        *self.strategy.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Strategy::Global(registry));
        self.diagnostics.debug("Installed global container lookup policy");
    }

    /// Installs a custom finder. A currently active global registry becomes its fallback.
    #[track_caller]
    pub fn set_finder<F>(&self, finder: F)
    where
        F: Fn(&Consumer<'_>) -> Option<RegistryPtr> + Send + Sync + 'static,
    {
        let mut strategy = self.strategy.write().unwrap_or_else(PoisonError::into_inner);
        let fallback = match strategy.take() {
            Some(Strategy::Global(registry)) => Some(registry),
            Some(Strategy::Finder { fallback, .. }) => fallback,
            None => None,
        };

        *strategy = Some(Strategy::Finder {
            finder: Arc::new(finder),
            fallback,
        });
        drop(strategy);

        self.diagnostics
            .debug("Installed custom container lookup policy");
    }

    /// Removes any installed strategy.
    pub fn clear(&self) {
        *self.strategy.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_configured(&self) -> bool {
        self.strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Selects the registry serving given consumer.
    pub fn registry_for(&self, consumer: &Consumer<'_>) -> Result<RegistryPtr, ResolveError> {
        // the finder runs without the lock held
        let strategy = self
            .strategy
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match strategy {
            None => Err(ResolveError::NoPolicyConfigured),
            Some(Strategy::Global(registry)) => Ok(registry),
            Some(Strategy::Finder { finder, fallback }) => finder(consumer)
                .or(fallback)
                .ok_or(ResolveError::NoRegistryForConsumer {
                    consumer: consumer.type_name(),
                }),
        }
    }
}
