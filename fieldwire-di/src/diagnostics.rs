//! Diagnostics are the sink for everything the injection machinery wants to report: debug traces of
//! resolved dependencies, warnings about overwritten bindings and, most importantly, fatal wiring
//! errors. A fatal error means the application tried to use a dependency which cannot be provided,
//! so [Diagnostics::die] never returns.
//!
//! Diagnostics are passed explicitly to every [Registry](crate::registry::Registry) and
//! [LookupPolicy](crate::lookup_policy::LookupPolicy). [TracingDiagnostics] is the default
//! implementation, reporting through `tracing`.

use std::panic::Location;
use std::process;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, trace, warn, Level};

pub type DiagnosticsPtr = Arc<dyn Diagnostics + Send + Sync>;

/// Receiver of log messages and fatal errors.
pub trait Diagnostics {
    /// Records a message. Fire-and-forget.
    fn log(&self, level: Level, message: &str, location: &'static Location<'static>);

    /// Reports a fatal error and terminates the current execution path. Implementations must not
    /// return, either by panicking the current thread or aborting the process.
    fn die(&self, message: &str, location: &'static Location<'static>) -> !;

    #[track_caller]
    fn debug(&self, message: &str) {
        self.log(Level::DEBUG, message, Location::caller());
    }

    #[track_caller]
    fn warn(&self, message: &str) {
        self.log(Level::WARN, message, Location::caller());
    }
}

/// [Diagnostics] reporting through `tracing`. Fatal errors panic the current thread, unless
/// configured to abort the whole process.
#[derive(Default, Copy, Clone, Eq, PartialEq, Debug)]
pub struct TracingDiagnostics {
    abort_on_fatal: bool,
}

impl TracingDiagnostics {
    pub fn new(abort_on_fatal: bool) -> Self {
        Self { abort_on_fatal }
    }

    /// Returns the process-wide default diagnostics instance.
    pub fn shared() -> DiagnosticsPtr {
        static SHARED: OnceLock<DiagnosticsPtr> = OnceLock::new();
        SHARED
            .get_or_init(|| Arc::new(Self::default()))
            .clone()
    }
}

impl Diagnostics for TracingDiagnostics {
    fn log(&self, level: Level, message: &str, location: &'static Location<'static>) {
        let file = location.file();
        let line = location.line();

        match level {
            Level::ERROR => error!(file, line, "{message}"),
            Level::WARN => warn!(file, line, "{message}"),
            Level::INFO => info!(file, line, "{message}"),
            Level::DEBUG => debug!(file, line, "{message}"),
            _ => trace!(file, line, "{message}"),
        }
    }

    fn die(&self, message: &str, location: &'static Location<'static>) -> ! {
        error!(file = location.file(), line = location.line(), "{message}");

        if self.abort_on_fatal {
            process::abort();
        }

        panic!("{message} ({location})");
    }
}
