//! ztrace command-line tools
//!
//! Shared pieces of `ztrace-replay` and `ztrace-inspect`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod inspect;

pub use inspect::Inspection;

use tracing_subscriber::EnvFilter;

/// Log to stderr, filtered by `RUST_LOG` (default `warn`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
