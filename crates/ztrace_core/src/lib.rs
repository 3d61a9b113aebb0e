//! ztrace core types
//!
//! Records, the line-oriented metadata protocol, trace naming, and the table of
//! zlib entry points shared by capture and replay.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod encoding;
pub mod error;
pub mod kind;
pub mod naming;
pub mod record;
pub mod status;

// Re-exports
pub use api::{ZlibApi, new_stream};
pub use error::{FormatError, FormatResult};
pub use kind::StreamKind;
pub use naming::{SessionId, TracePaths};
pub use record::{
    CallKind, CallRecord, CallSite, DeflateParams, InitRecord, Lineage, Outcome, PAGE_OFFSET_MASK,
    PAGE_SIZE,
};
pub use status::{Status, flush_name};
