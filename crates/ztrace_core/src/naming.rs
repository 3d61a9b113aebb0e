//! Trace artifact naming.
//!
//! A session's metadata log is named `<kind>.<pid>.<sequence>`; its payload logs add
//! `.in` and `.out`. The pid and process-wide sequence keep concurrent sessions and
//! processes from colliding in one directory.

use crate::error::{FormatError, FormatResult};
use crate::kind::StreamKind;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identity of a captured session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    /// Direction
    pub kind: StreamKind,
    /// Capturing process
    pub pid: u32,
    /// Process-wide session counter value
    pub sequence: u64,
}

impl SessionId {
    /// Create an id
    #[must_use]
    pub const fn new(kind: StreamKind, pid: u32, sequence: u64) -> Self {
        Self {
            kind,
            pid,
            sequence,
        }
    }

    /// Metadata file name
    #[must_use]
    pub fn file_name(&self) -> String {
        self.to_string()
    }

    /// Parse a metadata file name
    ///
    /// # Errors
    ///
    /// Returns error if the name is not `<kind>.<pid>.<sequence>`
    pub fn parse(name: &str) -> FormatResult<Self> {
        let invalid = || FormatError::InvalidName {
            name: name.to_string(),
        };
        let mut parts = name.split('.');
        let kind = parts.next().and_then(StreamKind::from_name).ok_or_else(invalid)?;
        let pid = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let sequence = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self::new(kind, pid, sequence))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.kind, self.pid, self.sequence)
    }
}

/// The three files making up one trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracePaths {
    /// Metadata log
    pub metadata: PathBuf,
    /// Consumed-input bytes
    pub input: PathBuf,
    /// Produced-output bytes
    pub output: PathBuf,
}

impl TracePaths {
    /// Paths for a session captured into `dir`
    #[must_use]
    pub fn new(dir: &Path, id: &SessionId) -> Self {
        Self::from_metadata(&dir.join(id.file_name()))
    }

    /// Paths derived from a metadata file path
    #[must_use]
    pub fn from_metadata(metadata: &Path) -> Self {
        Self {
            metadata: metadata.to_path_buf(),
            input: with_suffix(metadata, ".in"),
            output: with_suffix(metadata, ".out"),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_roundtrip() {
        let id = SessionId::new(StreamKind::Deflate, 4242, 7);
        assert_eq!(id.file_name(), "deflate.4242.7");
        assert_eq!(SessionId::parse("deflate.4242.7").unwrap(), id);
    }

    #[test]
    fn test_session_id_invalid() {
        for name in ["gzip.1.2", "deflate.x.2", "deflate.1", "deflate.1.2.in", ""] {
            assert!(SessionId::parse(name).is_err(), "{name}");
        }
    }

    #[test]
    fn test_trace_paths() {
        let id = SessionId::new(StreamKind::Inflate, 10, 3);
        let paths = TracePaths::new(Path::new("/tmp/t"), &id);
        assert_eq!(paths.metadata, PathBuf::from("/tmp/t/inflate.10.3"));
        assert_eq!(paths.input, PathBuf::from("/tmp/t/inflate.10.3.in"));
        assert_eq!(paths.output, PathBuf::from("/tmp/t/inflate.10.3.out"));
    }
}
