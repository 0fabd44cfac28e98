use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Type-erased error produced by fallible factories.
pub type ErrorPtr = Arc<dyn Error + Send + Sync>;

/// Errors related to resolving instances from a [Registry](crate::registry::Registry) and
/// selecting registries via a [LookupPolicy](crate::lookup_policy::LookupPolicy).
#[derive(Error, Clone, Debug)]
pub enum ResolveError {
    #[error("Dependency \"{type_name}\"{} does not have a resolver", fmt_alternative(.alternative))]
    NoResolver {
        type_name: &'static str,
        alternative: Option<String>,
    },
    #[error("Requested \"{requested}\"{}, but the resolver produces \"{registered}\"", fmt_alternative(.alternative))]
    TypeMismatch {
        requested: &'static str,
        registered: &'static str,
        alternative: Option<String>,
    },
    #[error("Resolver for \"{type_name}\" requires a parameter, but none was supplied")]
    ParametrizedResolverMisuse { type_name: &'static str },
    #[error("Container lookup policy is not set")]
    NoPolicyConfigured,
    #[error("Container lookup policy found no registry for consumer \"{consumer}\"")]
    NoRegistryForConsumer { consumer: &'static str },
    #[error("Resolver for \"{type_name}\" returned no instance")]
    EmptyInstance { type_name: &'static str },
    #[error("Resolver for \"{type_name}\" failed: {error}")]
    Factory {
        type_name: &'static str,
        error: ErrorPtr,
    },
}

fn fmt_alternative(alternative: &Option<String>) -> String {
    alternative
        .as_ref()
        .map(|alternative| format!(" (alternative \"{alternative}\")"))
        .unwrap_or_default()
}
