//! ztrace replay
//!
//! Rebuilds each recorded call's buffers with the captured page offsets, drives the
//! linked zlib through the same sequence, and stops at the first call whose status,
//! counts, or output bytes differ from the capture.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod error;
pub mod scratch;
pub mod stream;
pub mod verify;

pub use engine::{MAX_LINEAGE_DEPTH, ReplayConfig, ReplayEngine, ReplayReport};
pub use error::{ReplayError, ReplayResult};
pub use scratch::{Scratch, align_up_with_offset, layout};
pub use stream::ZStream;
pub use verify::{Divergence, Field};
