//! Replay engine.
//!
//! A trace is replayed strictly in order on the calling thread. A clone's trace first
//! replays its source up to the recorded offset, copies that stream, and drops the
//! source; the clone's own calls then continue from the copy.

use crate::error::{ReplayError, ReplayResult};
use crate::scratch::Scratch;
use crate::stream::ZStream;
use crate::verify::{self, Divergence};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use ztrace_core::{CallRecord, InitRecord, Lineage, Status, StreamKind, ZlibApi};
use ztrace_log::TraceReader;

/// Deepest chain of clone-of-clone traces followed
pub const MAX_LINEAGE_DEPTH: usize = 64;

/// Replay engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Require the final teardown to return `Z_OK`
    pub verify_teardown: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            verify_teardown: true,
        }
    }
}

/// Summary of a successful replay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Stream direction
    pub kind: StreamKind,
    /// Calls replayed and verified, excluding lineage sources
    pub calls: usize,
    /// zlib's `total_in` before teardown
    pub total_in: u64,
    /// zlib's `total_out` before teardown
    pub total_out: u64,
    /// The trace ended in an incomplete record
    pub truncated: bool,
    /// Number of source traces re-derived through clone records
    pub lineage_depth: usize,
    /// Status of the final teardown
    pub teardown: Status,
}

impl fmt::Display for ReplayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} calls verified (total_in {}, total_out {})",
            self.calls, self.kind, self.total_in, self.total_out
        )?;
        if self.lineage_depth > 0 {
            write!(f, ", lineage depth {}", self.lineage_depth)?;
        }
        if self.truncated {
            write!(f, ", trace truncated")?;
        }
        Ok(())
    }
}

/// A stream after its trace, or a prefix of it, has been replayed
struct Run {
    stream: ZStream,
    calls: usize,
    truncated: bool,
    lineage_depth: usize,
}

/// Drives a trace through zlib
#[derive(Debug, Clone)]
pub struct ReplayEngine {
    api: ZlibApi,
    config: ReplayConfig,
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayEngine {
    /// Engine driving the linked zlib
    #[must_use]
    pub fn new() -> Self {
        Self::with_api(ZlibApi::linked())
    }

    /// Engine driving `api`
    #[must_use]
    pub fn with_api(api: ZlibApi) -> Self {
        Self {
            api,
            config: ReplayConfig::default(),
        }
    }

    /// Create with custom config
    #[must_use]
    pub fn with_config(mut self, config: ReplayConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replay the trace whose metadata log is at `metadata`
    ///
    /// # Errors
    ///
    /// Returns the first divergence, read failure, or teardown failure
    pub fn replay(&self, metadata: &Path) -> ReplayResult<ReplayReport> {
        tracing::info!(trace = %metadata.display(), "replay started");
        let Run {
            stream,
            calls,
            truncated,
            lineage_depth,
        } = self.run(metadata, None, 0)?;

        let kind = stream.kind();
        let (total_in, total_out) = (stream.total_in(), stream.total_out());
        let teardown = stream.end();
        // A capture that died mid-stream never finished it either.
        let accepted = teardown.is_ok() || (truncated && teardown == Status::DATA_ERROR);
        if self.config.verify_teardown && !accepted {
            return Err(ReplayError::Teardown { status: teardown });
        }

        let report = ReplayReport {
            kind,
            calls,
            total_in,
            total_out,
            truncated,
            lineage_depth,
            teardown,
        };
        tracing::info!(trace = %metadata.display(), %report, "replay verified");
        Ok(report)
    }

    fn run(&self, metadata: &Path, stop: Option<u64>, depth: usize) -> ReplayResult<Run> {
        let mut reader = TraceReader::open(metadata)?;
        if let Some(offset) = stop {
            reader = reader.stop_at(offset);
        }
        let init = reader.read_init()?;
        let (mut stream, lineage_depth) = match &init {
            InitRecord::Clone { kind, lineage } => self.fork(metadata, *kind, lineage, depth)?,
            record => (ZStream::open(self.api, record)?, 0),
        };

        let mut calls = 0;
        while let Some(record) = reader.next_call()? {
            replay_call(&mut reader, &mut stream, calls, &record)?;
            calls += 1;
        }
        if reader.truncated() {
            tracing::warn!(trace = %metadata.display(), offset = reader.position(), "trace ends mid-record");
        }
        Ok(Run {
            stream,
            calls,
            truncated: reader.truncated(),
            lineage_depth,
        })
    }

    /// Rebuild a clone's starting state from its source trace
    fn fork(
        &self,
        metadata: &Path,
        kind: StreamKind,
        lineage: &Lineage,
        depth: usize,
    ) -> ReplayResult<(ZStream, usize)> {
        if depth >= MAX_LINEAGE_DEPTH {
            return Err(ReplayError::LineageTooDeep {
                depth: MAX_LINEAGE_DEPTH,
            });
        }
        let path = lineage.resolve(metadata);
        tracing::debug!(source = %path.display(), offset = lineage.offset, "replaying lineage source");
        let mut source = self
            .run(&path, Some(lineage.offset), depth + 1)
            .map_err(|error| ReplayError::Lineage {
                path: path.clone(),
                error: Box::new(error),
            })?;
        if source.stream.kind() != kind {
            return Err(ReplayError::KindMismatch {
                expected: kind,
                actual: source.stream.kind(),
            });
        }
        let clone = ZStream::fork(&mut source.stream)?;
        // The source is usually mid-stream here, so its teardown status means nothing.
        let status = source.stream.end();
        tracing::debug!(source = %path.display(), %status, "lineage source released");
        Ok((clone, source.lineage_depth + 1))
    }
}

fn replay_call(
    reader: &mut TraceReader,
    stream: &mut ZStream,
    call_index: usize,
    record: &CallRecord,
) -> ReplayResult<()> {
    let recorded = &record.outcome;
    let mut scratch = Scratch::new(&record.site);
    let (input, output) = scratch.regions_mut();
    reader.read_input(input, recorded.consumed_in)?;
    let mut expected = vec![0u8; record.site.avail_out as usize];
    let available = reader.read_output(&mut expected, recorded.consumed_out)?;
    expected.truncate(available);

    let actual = stream.invoke(&record.kind, input, output)?;
    if let Some((field, expected, actual)) =
        verify::compare(recorded, &actual, &expected, scratch.output())
    {
        return Err(ReplayError::Mismatch(Box::new(Divergence {
            call_index,
            call: record.kind,
            field,
            expected,
            actual,
            total_in: stream.total_in(),
            total_out: stream.total_out(),
        })));
    }
    tracing::debug!(
        call_index,
        call = %record.kind,
        consumed_in = actual.consumed_in,
        consumed_out = actual.consumed_out,
        status = %Status(actual.status),
        "call verified"
    );
    Ok(())
}
