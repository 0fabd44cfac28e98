//! Wiring configuration is retrieved through a [WiringConfigProvider], which the
//! [Application](crate::application::Application) consults when bootstrapping dependency
//! injection.
//!
//! By default, the config is created with opinionated default values, which can then be overwritten
//! by environment variables prefixed with `FIELDWIRE_` or `fieldwire.json` file.

use config::{Config, ConfigError, Environment, File};
use fieldwire_di::ErrorPtr;
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use std::error::Error;
use std::sync::Arc;

const CONFIG_ENV_PREFIX: &str = "FIELDWIRE";

/// Name of the default config file.
pub const CONFIG_FILE: &str = "fieldwire.json";

fn convert_error<E: Error + Send + Sync + 'static>(error: E) -> ErrorPtr {
    Arc::new(error) as ErrorPtr
}

/// Framework configuration which can be provided by a [WiringConfigProvider].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WiringConfig {
    /// Should a default tracing logger be installed when bootstrapping.
    pub install_tracing_logger: bool,

    /// Filter directives for the installed tracing logger, e.g. `info,fieldwire_di=debug`.
    pub log_filter: String,

    /// Should overwriting an existing registration be reported as a warning.
    pub warn_on_overwrite: bool,

    /// Should fatal wiring errors abort the process instead of panicking the current thread.
    pub abort_on_fatal: bool,
}

impl Default for WiringConfig {
    fn default() -> Self {
        Self {
            install_tracing_logger: true,
            log_filter: "info".to_string(),
            warn_on_overwrite: true,
            abort_on_fatal: false,
        }
    }
}

impl From<OptionalWiringConfig> for WiringConfig {
    fn from(value: OptionalWiringConfig) -> Self {
        let default = Self::default();
        Self {
            install_tracing_logger: value
                .install_tracing_logger
                .unwrap_or(default.install_tracing_logger),
            log_filter: value.log_filter.unwrap_or(default.log_filter),
            warn_on_overwrite: value
                .warn_on_overwrite
                .unwrap_or(default.warn_on_overwrite),
            abort_on_fatal: value.abort_on_fatal.unwrap_or(default.abort_on_fatal),
        }
    }
}

impl WiringConfig {
    fn init_from_environment() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(CONFIG_ENV_PREFIX))
            .build()
            .and_then(|config| config.try_deserialize::<OptionalWiringConfig>())
            .map(|config| config.into())
    }
}

/// Provider for [WiringConfig].
#[cfg_attr(test, automock)]
pub trait WiringConfigProvider {
    fn config(&self) -> Result<WiringConfig, ErrorPtr>;
}

/// Provider reading configuration from `fieldwire.json` and the environment once, on creation.
pub struct DefaultWiringConfigProvider {
    // cached init result
    config: Result<WiringConfig, ErrorPtr>,
}

impl DefaultWiringConfigProvider {
    pub fn new() -> Self {
        Self {
            config: WiringConfig::init_from_environment().map_err(convert_error),
        }
    }
}

impl Default for DefaultWiringConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl WiringConfigProvider for DefaultWiringConfigProvider {
    fn config(&self) -> Result<WiringConfig, ErrorPtr> {
        self.config.clone()
    }
}

#[derive(Deserialize)]
struct OptionalWiringConfig {
    install_tracing_logger: Option<bool>,
    log_filter: Option<String>,
    warn_on_overwrite: Option<bool>,
    abort_on_fatal: Option<bool>,
}
