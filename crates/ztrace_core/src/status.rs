//! Symbolic names for zlib status codes and flush modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A zlib return code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(pub i32);

impl Status {
    /// `Z_OK`
    pub const OK: Self = Self(0);
    /// `Z_STREAM_END`
    pub const STREAM_END: Self = Self(1);
    /// `Z_DATA_ERROR`
    pub const DATA_ERROR: Self = Self(-3);

    /// Symbolic name, if the code is one zlib defines
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("Z_OK"),
            1 => Some("Z_STREAM_END"),
            2 => Some("Z_NEED_DICT"),
            -1 => Some("Z_ERRNO"),
            -2 => Some("Z_STREAM_ERROR"),
            -3 => Some("Z_DATA_ERROR"),
            -4 => Some("Z_MEM_ERROR"),
            -5 => Some("Z_BUF_ERROR"),
            -6 => Some("Z_VERSION_ERROR"),
            _ => None,
        }
    }

    /// Whether this is `Z_OK`
    #[must_use]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "status {}", self.0),
        }
    }
}

/// Symbolic name of a flush mode
#[must_use]
pub const fn flush_name(flush: i32) -> Option<&'static str> {
    match flush {
        0 => Some("Z_NO_FLUSH"),
        1 => Some("Z_PARTIAL_FLUSH"),
        2 => Some("Z_SYNC_FLUSH"),
        3 => Some("Z_FULL_FLUSH"),
        4 => Some("Z_FINISH"),
        5 => Some("Z_BLOCK"),
        6 => Some("Z_TREES"),
        _ => None,
    }
}
