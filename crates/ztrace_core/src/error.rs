//! Trace format errors.

/// Result type for parsing trace records
pub type FormatResult<T> = Result<T, FormatError>;

/// Error raised when a metadata line or trace name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Line held no fields at all
    #[error("empty record")]
    EmptyRecord,

    /// First field did not name a known record
    #[error("unknown {what} tag {tag:?}")]
    UnknownTag {
        /// Which record family was being parsed
        what: &'static str,
        /// The offending tag
        tag: String,
    },

    /// A required field was absent
    #[error("missing field `{field}` in {line:?}")]
    MissingField {
        /// Field name
        field: &'static str,
        /// The whole line
        line: String,
    },

    /// A field was present but not a valid number
    #[error("invalid {field}: {value:?}")]
    InvalidNumber {
        /// Field name
        field: &'static str,
        /// Raw field text
        value: String,
    },

    /// More fields than the record allows
    #[error("trailing data in {line:?}")]
    TrailingData {
        /// The whole line
        line: String,
    },

    /// Line is not valid UTF-8
    #[error("record is not valid UTF-8")]
    NotUtf8,

    /// A trace file name does not follow `<kind>.<pid>.<sequence>`
    #[error("invalid trace name {name:?}")]
    InvalidName {
        /// The name as given
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FormatError::MissingField {
            field: "avail_in",
            line: "0x10".to_string(),
        };
        assert_eq!(err.to_string(), "missing field `avail_in` in \"0x10\"");

        let err = FormatError::UnknownTag {
            what: "call",
            tag: "z".to_string(),
        };
        assert_eq!(err.to_string(), "unknown call tag \"z\"");
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(FormatError::EmptyRecord, FormatError::EmptyRecord);
        assert_ne!(FormatError::EmptyRecord, FormatError::NotUtf8);
    }
}
