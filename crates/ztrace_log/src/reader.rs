//! Replay-side trace reader.

use crate::cursor::Cursor;
use crate::error::{LogError, LogResult};
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use ztrace_core::{CallKind, CallRecord, CallSite, FormatError, InitRecord, Outcome, TracePaths};

/// One raw payload log (`.in` or `.out`)
#[derive(Debug)]
pub struct PayloadLog {
    path: PathBuf,
    file: File,
}

impl PayloadLog {
    /// Open a payload log for reading
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened
    pub fn open(path: &Path) -> LogResult<Self> {
        let file = File::open(path).map_err(LogError::io("open", path))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Fill as much of `buf` as the file still holds, then leave the file cursor
    /// `advance` bytes past where the read started.
    ///
    /// A call is offered more bytes than it consumes, so the read may run ahead into
    /// the next call's payload or hit end-of-file; the cursor still moves by exactly the
    /// recorded amount. Returns the number of bytes read.
    ///
    /// # Errors
    ///
    /// Returns error on a read or seek failure
    pub fn read_then_advance(&mut self, buf: &mut [u8], advance: u64) -> LogResult<usize> {
        let start = self
            .file
            .stream_position()
            .map_err(LogError::io("seek", &self.path))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(LogError::io("read", &self.path)(e)),
            }
        }
        self.file
            .seek(SeekFrom::Start(start + advance))
            .map_err(LogError::io("seek", &self.path))?;
        Ok(filled)
    }

    /// Current file cursor
    ///
    /// # Errors
    ///
    /// Returns error if the position cannot be queried
    pub fn position(&mut self) -> LogResult<u64> {
        self.file
            .stream_position()
            .map_err(LogError::io("seek", &self.path))
    }
}

/// Sequential reader over one session's trace
#[derive(Debug)]
pub struct TraceReader {
    paths: TracePaths,
    metadata: Vec<u8>,
    cursor: Cursor,
    input: PayloadLog,
    output: PayloadLog,
    truncated: bool,
}

impl TraceReader {
    /// Open a trace by its metadata path; `.in` and `.out` are found beside it
    ///
    /// # Errors
    ///
    /// Returns error if any of the three files cannot be read
    pub fn open(metadata: &Path) -> LogResult<Self> {
        let paths = TracePaths::from_metadata(metadata);
        let bytes = fs::read(&paths.metadata).map_err(LogError::io("read", &paths.metadata))?;
        let input = PayloadLog::open(&paths.input)?;
        let output = PayloadLog::open(&paths.output)?;
        Ok(Self {
            paths,
            metadata: bytes,
            cursor: Cursor::new(),
            input,
            output,
            truncated: false,
        })
    }

    /// Stop before metadata offset `offset`, replaying only a prefix of the session
    #[must_use]
    pub fn stop_at(mut self, offset: u64) -> Self {
        self.cursor = self.cursor.with_limit(offset);
        self
    }

    /// Paths of the trace files
    #[must_use]
    pub fn paths(&self) -> &TracePaths {
        &self.paths
    }

    /// Offset of the next unread metadata byte
    #[must_use]
    pub fn position(&self) -> u64 {
        self.cursor.pos()
    }

    /// Whether reading ended on an incomplete record
    #[must_use]
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Read the init record
    ///
    /// # Errors
    ///
    /// Returns error if the first line is absent, incomplete, or malformed
    pub fn read_init(&mut self) -> LogResult<InitRecord> {
        let offset = self.cursor.pos();
        self.next_parsed(offset, InitRecord::parse)?
            .ok_or_else(|| LogError::MissingInit {
                path: self.paths.metadata.clone(),
            })
    }

    /// Read the next complete call record.
    ///
    /// Returns `None` at end of file, at the stop offset, or on an incomplete trailing
    /// record (see [`TraceReader::truncated`]).
    ///
    /// # Errors
    ///
    /// Returns error if a complete line is malformed
    pub fn next_call(&mut self) -> LogResult<Option<CallRecord>> {
        let offset = self.cursor.pos();
        let Some(kind) = self.next_parsed(offset, CallKind::parse)? else {
            return Ok(None);
        };
        let Some(site) = self.next_parsed(offset, CallSite::parse)? else {
            self.mark_incomplete();
            return Ok(None);
        };
        let Some(outcome) = self.next_parsed(offset, Outcome::parse)? else {
            self.mark_incomplete();
            return Ok(None);
        };
        Ok(Some(CallRecord {
            kind,
            site,
            outcome,
        }))
    }

    /// Read a call's offered input, advancing `.in` by the consumed count
    ///
    /// # Errors
    ///
    /// Returns error on I/O failure
    pub fn read_input(&mut self, buf: &mut [u8], consumed: u32) -> LogResult<usize> {
        self.input.read_then_advance(buf, u64::from(consumed))
    }

    /// Read a call's expected output, advancing `.out` by the produced count
    ///
    /// # Errors
    ///
    /// Returns error on I/O failure
    pub fn read_output(&mut self, buf: &mut [u8], produced: u32) -> LogResult<usize> {
        self.output.read_then_advance(buf, u64::from(produced))
    }

    fn next_parsed<T>(
        &mut self,
        offset: u64,
        parse: fn(&str) -> Result<T, FormatError>,
    ) -> LogResult<Option<T>> {
        let parsed = match self.next_line() {
            Ok(Some(line)) => parse(line).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        parsed.map_err(|e| self.malformed(offset, e))
    }

    /// Next newline-terminated line before the bound. A partial line at end of file
    /// marks the trace truncated.
    fn next_line(&mut self) -> Result<Option<&str>, FormatError> {
        let len = self.metadata.len() as u64;
        if self.cursor.is_exhausted(len) {
            return Ok(None);
        }
        let start = self.cursor.pos() as usize;
        let bound = self.cursor.bound(len) as usize;
        let Some(newline) = self.metadata[start..bound].iter().position(|&b| b == b'\n') else {
            if bound == self.metadata.len() {
                self.truncated = true;
            }
            return Ok(None);
        };
        self.cursor.move_forward(newline as u64 + 1);
        std::str::from_utf8(&self.metadata[start..start + newline])
            .map(Some)
            .map_err(|_| FormatError::NotUtf8)
    }

    fn mark_incomplete(&mut self) {
        // Running out mid-record at the stop offset is not a crash.
        if self.cursor.bound(self.metadata.len() as u64) == self.metadata.len() as u64 {
            self.truncated = true;
        }
    }

    fn malformed(&self, offset: u64, source: FormatError) -> LogError {
        LogError::Malformed {
            path: self.paths.metadata.clone(),
            offset,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn trace(dir: &Path, metadata: &str, input: &[u8], output: &[u8]) -> PathBuf {
        let path = dir.join("deflate.1.0");
        fs::write(&path, metadata).unwrap();
        fs::write(dir.join("deflate.1.0.in"), input).unwrap();
        fs::write(dir.join("deflate.1.0.out"), output).unwrap();
        path
    }

    const TWO_CALLS: &str = "d 1 6\nc 0\n0x10 4 0x20 8\n4 2 0\nc 4\n0x10 0 0x20 8\n0 3 1\n";

    #[test]
    fn test_reads_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), TWO_CALLS, b"abcd", b"xyzzy");
        let mut reader = TraceReader::open(&path).unwrap();

        assert_eq!(reader.read_init().unwrap(), InitRecord::DeflateDefault { level: 6 });
        let first = reader.next_call().unwrap().unwrap();
        assert_eq!(first.kind, CallKind::Step { flush: 0 });
        assert_eq!(first.site.avail_out, 8);
        let second = reader.next_call().unwrap().unwrap();
        assert_eq!(second.outcome.status, 1);
        assert!(reader.next_call().unwrap().is_none());
        assert!(!reader.truncated());
    }

    #[test]
    fn test_partial_trailing_line_is_end_of_trace() {
        let dir = tempfile::tempdir().unwrap();
        let cut = &TWO_CALLS[..TWO_CALLS.len() - 3];
        let path = trace(dir.path(), cut, b"abcd", b"xyzzy");
        let mut reader = TraceReader::open(&path).unwrap();
        reader.read_init().unwrap();
        assert!(reader.next_call().unwrap().is_some());
        assert!(reader.next_call().unwrap().is_none());
        assert!(reader.truncated());
    }

    #[test]
    fn test_missing_outcome_line_is_end_of_trace() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), "i 1\nc 0\n0x10 4 0x20 8\n", b"", b"");
        let mut reader = TraceReader::open(&path).unwrap();
        assert_eq!(reader.read_init().unwrap(), InitRecord::InflateDefault);
        assert!(reader.next_call().unwrap().is_none());
        assert!(reader.truncated());
    }

    #[test]
    fn test_stop_offset_limits_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), TWO_CALLS, b"abcd", b"xyzzy");
        let first_record_end = "d 1 6\nc 0\n0x10 4 0x20 8\n4 2 0\n".len() as u64;
        let mut reader = TraceReader::open(&path).unwrap().stop_at(first_record_end);
        reader.read_init().unwrap();
        assert!(reader.next_call().unwrap().is_some());
        assert!(reader.next_call().unwrap().is_none());
        assert!(!reader.truncated());
        assert_eq!(reader.position(), first_record_end);
    }

    #[test]
    fn test_malformed_line_reports_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), "d 1 6\nc 0\nnot-a-site\n1 1 0\n", b"", b"");
        let mut reader = TraceReader::open(&path).unwrap();
        reader.read_init().unwrap();
        match reader.next_call().unwrap_err() {
            LogError::Malformed { offset, .. } => assert_eq!(offset, 6),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_metadata_has_no_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), "", b"", b"");
        let mut reader = TraceReader::open(&path).unwrap();
        assert!(matches!(reader.read_init(), Err(LogError::MissingInit { .. })));
    }

    #[test]
    fn test_missing_payload_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inflate.1.0");
        fs::write(&path, "i 1\n").unwrap();
        assert!(matches!(TraceReader::open(&path), Err(LogError::Io { op: "open", .. })));
    }

    #[test]
    fn test_read_then_advance_by_recorded_amount() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), TWO_CALLS, b"abcdef", b"");
        let mut reader = TraceReader::open(&path).unwrap();

        let mut offered = [0u8; 4];
        assert_eq!(reader.read_input(&mut offered, 2).unwrap(), 4);
        assert_eq!(&offered, b"abcd");

        let mut offered = [0u8; 8];
        assert_eq!(reader.read_input(&mut offered, 4).unwrap(), 4);
        assert_eq!(&offered[..4], b"cdef");
        assert_eq!(reader.input.position().unwrap(), 6);
    }

    #[test]
    fn test_read_past_end_still_advances() {
        let dir = tempfile::tempdir().unwrap();
        let path = trace(dir.path(), TWO_CALLS, b"", b"xy");
        let mut reader = TraceReader::open(&path).unwrap();
        let mut expected = [0u8; 8];
        assert_eq!(reader.read_output(&mut expected, 5).unwrap(), 2);
        assert_eq!(reader.output.position().unwrap(), 5);
    }
}
