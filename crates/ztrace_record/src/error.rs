//! Capture errors.
//!
//! None of these ever reach the host: the interception layer turns each into a
//! diagnostic and an abort.

use ztrace_core::StreamKind;
use ztrace_log::LogError;

/// Result type for capture bookkeeping
pub type RecordResult<T> = Result<T, RecordError>;

/// Capture bookkeeping failure
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// A call named a stream that was never registered, or was already torn down
    #[error("unknown stream {handle:#x}")]
    UnknownSession {
        /// Stream handle
        handle: usize,
    },

    /// An init reported success for a handle that is still live
    #[error("stream {handle:#x} registered twice")]
    DuplicateSession {
        /// Stream handle
        handle: usize,
    },

    /// A deflate entry point reached an inflate stream, or the reverse
    #[error("stream {handle:#x} is {actual}, called as {expected}")]
    KindMismatch {
        /// Stream handle
        handle: usize,
        /// Direction the entry point expects
        expected: StreamKind,
        /// Direction the stream was registered with
        actual: StreamKind,
    },

    /// The real zlib entry point could not be found
    #[error("cannot resolve {symbol}: {reason}")]
    Unresolved {
        /// Symbol name
        symbol: &'static str,
        /// Loader message
        reason: String,
    },

    /// Trace file failure
    #[error(transparent)]
    Log(#[from] LogError),
}
