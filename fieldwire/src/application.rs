//! Core bootstrapping functionality.

use crate::config::{DefaultWiringConfigProvider, WiringConfig, WiringConfigProvider};
use derive_more::Constructor;
use fieldwire_di::diagnostics::{DiagnosticsPtr, TracingDiagnostics};
use fieldwire_di::lookup_policy::{LookupPolicy, LookupPolicyPtr};
use fieldwire_di::registry::{Registry, RegistryPtr};
use fieldwire_di::ErrorPtr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Error, Debug)]
pub enum ApplicationError {
    #[error("Error retrieving configuration: {0}")]
    ConfigError(ErrorPtr),
    #[error("Invalid log filter '{filter}': {message}")]
    InvalidLogFilter { filter: String, message: String },
}

/// Outermost composition point for dependency injection. Reads [WiringConfig], installs logging,
/// creates the [Registry] with default diagnostics and makes it the global registry of the lookup
/// policy.
#[derive(Constructor)]
pub struct Application<CP: WiringConfigProvider> {
    config_provider: CP,
    lookup_policy: LookupPolicyPtr,
}

impl Application<DefaultWiringConfigProvider> {
    /// Creates an application using configuration from the environment and the process-wide lookup
    /// policy.
    pub fn from_environment() -> Self {
        Self::new(DefaultWiringConfigProvider::new(), LookupPolicy::shared())
    }
}

impl<CP: WiringConfigProvider> Application<CP> {
    /// Bootstraps dependency injection. The `register` callback receives the new registry to make
    /// registrations, before it's installed as the global registry.
    pub fn bootstrap<F>(&self, register: F) -> Result<RegistryPtr, ApplicationError>
    where
        F: FnOnce(&Registry),
    {
        let config = self
            .config_provider
            .config()
            .map_err(ApplicationError::ConfigError)?;

        if config.install_tracing_logger {
            install_tracing_logger(&config)?;
        }

        info!("Registering dependencies...");

        let diagnostics =
            Arc::new(TracingDiagnostics::new(config.abort_on_fatal)) as DiagnosticsPtr;
        let registry = Registry::new(diagnostics).with_overwrite_warnings(config.warn_on_overwrite);
        register(&registry);

        let registry = Arc::new(registry);

        info!(bindings = registry.len(), "Installing global registry...");
        self.lookup_policy.set_global(registry.clone());

        Ok(registry)
    }
}

fn install_tracing_logger(config: &WiringConfig) -> Result<(), ApplicationError> {
    let filter = EnvFilter::try_new(&config.log_filter).map_err(|error| {
        ApplicationError::InvalidLogFilter {
            filter: config.log_filter.clone(),
            message: error.to_string(),
        }
    })?;

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        debug!("Global tracing logger already installed - skipping.");
    }

    Ok(())
}
