//! Fatal-path handling and the shim's own logging.

use crate::config::LOG_VAR;
use std::fmt;
use tracing_subscriber::EnvFilter;

/// Report `err` and abort the process.
///
/// Capture has no channel for returning errors to the host, and a trace with a hole
/// in it is worse than no trace.
pub fn die(err: impl fmt::Display) -> ! {
    tracing::error!(%err, "capture failed");
    eprintln!("ztrace: {err}");
    std::process::abort()
}

/// Unwrap a capture result or [`die`]
pub trait OrDie<T> {
    /// The value, or abort with the error
    fn or_die(self) -> T;
}

impl<T, E: fmt::Display> OrDie<T> for Result<T, E> {
    fn or_die(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => die(err),
        }
    }
}

/// Install a stderr subscriber filtered by `ZTRACE_LOG` (default `warn`).
///
/// Leaves an already-installed subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
