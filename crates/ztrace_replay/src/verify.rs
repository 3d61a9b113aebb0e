//! Comparing a replayed call against its capture.

use serde::{Deserialize, Serialize};
use std::fmt;
use ztrace_core::{CallKind, Outcome, Status};

/// Bytes of context shown around a byte mismatch
const WINDOW: usize = 16;

/// Which part of a call's outcome diverged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Returned status
    Status,
    /// Input bytes consumed
    ConsumedIn,
    /// Output bytes produced
    ConsumedOut,
    /// Produced bytes, first difference at `offset`
    OutputBytes {
        /// Offset into the call's output
        offset: usize,
    },
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => write!(f, "status"),
            Self::ConsumedIn => write!(f, "consumed input"),
            Self::ConsumedOut => write!(f, "produced output"),
            Self::OutputBytes { offset } => write!(f, "output bytes at offset {offset}"),
        }
    }
}

/// A replayed call that did not do what the capture recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    /// Zero-based index of the call in its trace
    pub call_index: usize,
    /// The call
    pub call: CallKind,
    /// What differed
    pub field: Field,
    /// Recorded value
    pub expected: String,
    /// Replayed value
    pub actual: String,
    /// zlib's `total_in` after the call
    pub total_in: u64,
    /// zlib's `total_out` after the call
    pub total_out: u64,
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "call {} ({}): {} mismatch: expected {}, got {} (total_in {}, total_out {})",
            self.call_index,
            self.call,
            self.field,
            self.expected,
            self.actual,
            self.total_in,
            self.total_out
        )
    }
}

/// First difference between a recorded and a replayed call, as
/// `(field, expected, actual)`.
///
/// Checked in order: status, consumed input, produced output, then the produced bytes.
/// `expected_bytes` may be shorter than the recorded count if `.out` ended early.
#[must_use]
pub fn compare(
    expected: &Outcome,
    actual: &Outcome,
    expected_bytes: &[u8],
    actual_bytes: &[u8],
) -> Option<(Field, String, String)> {
    if expected.status != actual.status {
        return Some((
            Field::Status,
            Status(expected.status).to_string(),
            Status(actual.status).to_string(),
        ));
    }
    if expected.consumed_in != actual.consumed_in {
        return Some((
            Field::ConsumedIn,
            expected.consumed_in.to_string(),
            actual.consumed_in.to_string(),
        ));
    }
    if expected.consumed_out != actual.consumed_out {
        return Some((
            Field::ConsumedOut,
            expected.consumed_out.to_string(),
            actual.consumed_out.to_string(),
        ));
    }
    let produced = &actual_bytes[..(actual.consumed_out as usize).min(actual_bytes.len())];
    let offset = (0..produced.len()).find(|&i| expected_bytes.get(i) != produced.get(i))?;
    Some((
        Field::OutputBytes { offset },
        window(expected_bytes, offset),
        window(produced, offset),
    ))
}

fn window(bytes: &[u8], offset: usize) -> String {
    let end = (offset + WINDOW).min(bytes.len());
    match bytes.get(offset..end) {
        Some(slice) if !slice.is_empty() => hex::encode(slice),
        _ => "end of output".to_string(),
    }
}
