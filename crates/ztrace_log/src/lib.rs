//! ztrace trace files
//!
//! Append-only writer used during capture, and the reader replay walks through.
//! A trace is a metadata log plus two raw payload logs; see `ztrace_core::record`
//! for the line protocol.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor;
pub mod error;
pub mod reader;
pub mod writer;

pub use cursor::Cursor;
pub use error::{LogError, LogResult};
pub use reader::{PayloadLog, TraceReader};
pub use writer::TraceWriter;
