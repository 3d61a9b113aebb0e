//! Replay errors.

use crate::verify::Divergence;
use std::path::PathBuf;
use ztrace_core::{CallKind, Status, StreamKind};
use ztrace_log::LogError;

/// Result type for replay
pub type ReplayResult<T> = Result<T, ReplayError>;

/// Why a replay stopped
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Reading the trace failed
    #[error(transparent)]
    Log(#[from] LogError),

    /// zlib refused the recorded init parameters
    #[error("stream init failed: {status}")]
    Init {
        /// Returned status
        status: Status,
    },

    /// zlib refused to clone the lineage source
    #[error("stream copy failed: {status}")]
    Copy {
        /// Returned status
        status: Status,
    },

    /// A clone record reached a code path that has no source stream
    #[error("clone record needs its source stream")]
    DetachedClone,

    /// A call diverged from the capture
    #[error("{0}")]
    Mismatch(Box<Divergence>),

    /// A clone's source trace has the other direction
    #[error("lineage source is {actual}, clone is {expected}")]
    KindMismatch {
        /// Direction of the clone
        expected: StreamKind,
        /// Direction of the source
        actual: StreamKind,
    },

    /// The call has no counterpart for this direction
    #[error("{call} is not valid on {kind} streams")]
    InvalidCall {
        /// Recorded call
        call: CallKind,
        /// Stream direction
        kind: StreamKind,
    },

    /// Tearing the stream down did not return `Z_OK`
    #[error("stream teardown returned {status}")]
    Teardown {
        /// Returned status
        status: Status,
    },

    /// Replaying a clone's source failed
    #[error("lineage source {}: {error}", .path.display())]
    Lineage {
        /// Source metadata log
        path: PathBuf,
        /// Failure inside the source replay
        #[source]
        error: Box<ReplayError>,
    },

    /// Clone records nest deeper than any real capture could
    #[error("lineage deeper than {depth} sources")]
    LineageTooDeep {
        /// Limit reached
        depth: usize,
    },
}
