//! Runtime dependency injection core. Dependencies are resolved on first use, against factories
//! registered explicitly in a [Registry](registry::Registry).
//!
//! Consumers hold injection points ([Injected](injected::Injected),
//! [InjectedOptional](injected::InjectedOptional) or
//! [InjectedWeakly](injected_weakly::InjectedWeakly)) which ask a
//! [LookupPolicy](lookup_policy::LookupPolicy) for the registry serving them, resolve their
//! dependency once and cache it afterwards. Wiring errors for required dependencies are fatal and
//! reported via [Diagnostics](diagnostics::Diagnostics).

pub mod consumer;
pub mod diagnostics;
mod error;
pub mod injected;
pub mod injected_weakly;
pub mod lookup_policy;
pub mod registry;

pub use error::{ErrorPtr, ResolveError};
