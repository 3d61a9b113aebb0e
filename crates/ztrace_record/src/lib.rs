//! ztrace capture
//!
//! Everything the preload shim needs to record a host process's zlib calls: where
//! traces go, which streams are live, which calls are nested inside others, and the
//! forwarding wrappers themselves. Nothing here exports a C symbol.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod fatal;
pub mod intercept;
pub mod real;
pub mod reentrancy;
pub mod registry;

// Re-exports
pub use config::RecordConfig;
pub use error::{RecordError, RecordResult};
pub use fatal::{OrDie, die, init_logging};
pub use intercept::Interceptor;
pub use real::resolve_next;
pub use reentrancy::CallDepth;
pub use registry::{Session, SessionRegistry};
