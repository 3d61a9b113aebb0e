//! Trace file errors.

use std::io;
use std::path::PathBuf;
use ztrace_core::FormatError;

/// Result type for trace file operations
pub type LogResult<T> = Result<T, LogError>;

/// Error reading or writing a trace
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Underlying file operation failed
    #[error("failed to {op} {}: {source}", .path.display())]
    Io {
        /// Operation attempted
        op: &'static str,
        /// File involved
        path: PathBuf,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// Metadata log has no complete init record
    #[error("{}: missing init record", .path.display())]
    MissingInit {
        /// Metadata log
        path: PathBuf,
    },

    /// A complete metadata line failed to parse
    #[error("{}: malformed record at offset {offset}: {source}", .path.display())]
    Malformed {
        /// Metadata log
        path: PathBuf,
        /// Byte offset of the record
        offset: u64,
        /// Parse failure
        #[source]
        source: FormatError,
    },
}

impl LogError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LogError::io("open", "/tmp/deflate.1.0")(io::Error::from(io::ErrorKind::NotFound));
        assert!(err.to_string().starts_with("failed to open /tmp/deflate.1.0"));

        let err = LogError::Malformed {
            path: PathBuf::from("deflate.1.0"),
            offset: 12,
            source: FormatError::EmptyRecord,
        };
        assert_eq!(
            err.to_string(),
            "deflate.1.0: malformed record at offset 12: empty record"
        );
    }
}
