//! Stream direction.

use crate::error::{FormatError, FormatResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which direction of transform a session performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// Producing side (`deflate*`)
    Deflate,
    /// Consuming side (`inflate*`)
    Inflate,
}

impl StreamKind {
    /// Name used as the trace file prefix
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deflate => "deflate",
            Self::Inflate => "inflate",
        }
    }

    /// Single-character tag opening an init record
    #[must_use]
    pub const fn tag(self) -> char {
        match self {
            Self::Deflate => 'd',
            Self::Inflate => 'i',
        }
    }

    /// Parse an init record tag
    ///
    /// # Errors
    ///
    /// Returns error if the tag is neither `d` nor `i`
    pub fn from_tag(tag: &str) -> FormatResult<Self> {
        match tag {
            "d" => Ok(Self::Deflate),
            "i" => Ok(Self::Inflate),
            other => Err(FormatError::UnknownTag {
                what: "stream",
                tag: other.to_string(),
            }),
        }
    }

    /// Parse a trace file prefix
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "deflate" => Some(Self::Deflate),
            "inflate" => Some(Self::Inflate),
            _ => None,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
