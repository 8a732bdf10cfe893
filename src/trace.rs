//! Injected operation tracing.
//!
//! The controller never writes to the global logger on its own. A platform
//! that wants a register-level trace hands a `&'static dyn log::Log` to
//! [`Tracer::new`] and installs it with
//! [`Dsim::with_tracer`](crate::Dsim::with_tracer). Without one every trace
//! point compiles down to a branch on `None`.

use core::fmt;

use log::{Level, Log, Record};

/// Log target used for every record
pub const TARGET: &str = "mipi_dsim";

/// Optional sink for operation records
#[derive(Clone, Copy, Default)]
pub struct Tracer {
    logger: Option<&'static dyn Log>,
}

impl Tracer {
    /// Tracing off
    pub const fn disabled() -> Self {
        Self { logger: None }
    }

    /// Trace through `logger`
    pub const fn new(logger: &'static dyn Log) -> Self {
        Self {
            logger: Some(logger),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.logger.is_some()
    }

    /// Emit one record if a logger is installed and accepts it
    pub fn emit(&self, level: Level, args: fmt::Arguments<'_>) {
        let Some(logger) = self.logger else {
            return;
        };
        let record = Record::builder()
            .level(level)
            .target(TARGET)
            .module_path_static(Some(module_path!()))
            .args(args)
            .build();
        if logger.enabled(record.metadata()) {
            logger.log(&record);
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Debug-level record for a register operation
macro_rules! dsim_trace {
    ($tracer:expr, $($arg:tt)+) => {
        if $tracer.is_enabled() {
            $tracer.emit(log::Level::Debug, format_args!($($arg)+));
        }
    };
}

/// Warn-level record, used when a poll gives up
macro_rules! dsim_warn {
    ($tracer:expr, $($arg:tt)+) => {
        if $tracer.is_enabled() {
            $tracer.emit(log::Level::Warn, format_args!($($arg)+));
        }
    };
}

pub(crate) use dsim_trace;
pub(crate) use dsim_warn;

// ============================================================================
// TESTS
// ============================================================================
