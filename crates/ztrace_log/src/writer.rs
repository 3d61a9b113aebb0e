//! Capture-side trace writer.
//!
//! Every metadata record is formatted in full and handed to a single `write_all`, so a
//! record is either entirely on disk or absent. With `sync` on, each append is followed
//! by `fsync`, which keeps a trace from a crashed process replayable up to its last
//! complete record.

use crate::error::{LogError, LogResult};
use std::fs::{File, OpenOptions};
use std::io::{Seek, Write};
use std::path::Path;
use ztrace_core::{CallKind, CallSite, InitRecord, Outcome, TracePaths};

/// Writer for one session's three trace files
///
/// All methods take `&self`: a session is driven by one call at a time, and files of
/// different sessions are independent.
#[derive(Debug)]
pub struct TraceWriter {
    paths: TracePaths,
    metadata: File,
    input: File,
    output: File,
    sync: bool,
}

impl TraceWriter {
    /// Create the trace files, which must not exist yet
    ///
    /// # Errors
    ///
    /// Returns error if any file exists already or cannot be created
    pub fn create(paths: TracePaths, sync: bool) -> LogResult<Self> {
        let metadata = create(&paths.metadata)?;
        let input = create(&paths.input)?;
        let output = create(&paths.output)?;
        tracing::debug!(path = %paths.metadata.display(), "trace created");
        Ok(Self {
            paths,
            metadata,
            input,
            output,
            sync,
        })
    }

    /// Paths of the trace files
    #[must_use]
    pub fn paths(&self) -> &TracePaths {
        &self.paths
    }

    /// Write the session's init or lineage record
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn write_init(&self, record: &InitRecord) -> LogResult<()> {
        self.append_metadata(format!("{record}\n").as_bytes())
    }

    /// Write a call header and its call-site snapshot, before forwarding the call
    ///
    /// # Errors
    ///
    /// Returns error if the write fails
    pub fn write_call_site(&self, kind: &CallKind, site: &CallSite) -> LogResult<()> {
        self.append_metadata(format!("{kind}\n{site}\n").as_bytes())
    }

    /// Write the payload bytes a call moved, then its outcome line
    ///
    /// # Errors
    ///
    /// Returns error if any write fails
    pub fn write_outcome(&self, outcome: &Outcome, input: &[u8], output: &[u8]) -> LogResult<()> {
        append(&self.input, &self.paths.input, input, self.sync)?;
        append(&self.output, &self.paths.output, output, self.sync)?;
        self.append_metadata(format!("{outcome}\n").as_bytes())
    }

    /// Current length of the metadata log
    ///
    /// # Errors
    ///
    /// Returns error if the position cannot be queried
    pub fn metadata_offset(&self) -> LogResult<u64> {
        (&self.metadata)
            .stream_position()
            .map_err(LogError::io("seek", &self.paths.metadata))
    }

    /// Flush everything to stable storage when syncing is on; the files close when the
    /// writer drops
    ///
    /// # Errors
    ///
    /// Returns error if a sync fails
    pub fn close(&self) -> LogResult<()> {
        if self.sync {
            for (file, path) in [
                (&self.input, &self.paths.input),
                (&self.output, &self.paths.output),
                (&self.metadata, &self.paths.metadata),
            ] {
                file.sync_all().map_err(LogError::io("sync", path))?;
            }
        }
        tracing::debug!(path = %self.paths.metadata.display(), "trace closed");
        Ok(())
    }

    fn append_metadata(&self, bytes: &[u8]) -> LogResult<()> {
        append(&self.metadata, &self.paths.metadata, bytes, self.sync)
    }
}

fn create(path: &Path) -> LogResult<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(LogError::io("create", path))
}

fn append(mut file: &File, path: &Path, bytes: &[u8], sync: bool) -> LogResult<()> {
    if bytes.is_empty() {
        return Ok(());
    }
    file.write_all(bytes).map_err(LogError::io("write", path))?;
    if sync {
        file.sync_data().map_err(LogError::io("sync", path))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use ztrace_core::{SessionId, StreamKind};

    fn paths(dir: &Path) -> TracePaths {
        TracePaths::new(dir, &SessionId::new(StreamKind::Deflate, 1, 0))
    }

    fn writer(dir: &Path) -> TraceWriter {
        TraceWriter::create(paths(dir), false).unwrap()
    }

    #[test]
    fn test_writer_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        assert!(writer.paths().metadata.exists());
        assert!(writer.paths().input.exists());
        assert!(writer.paths().output.exists());
    }

    #[test]
    fn test_writer_record_layout() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        writer.write_init(&InitRecord::DeflateDefault { level: 6 }).unwrap();
        let site = CallSite {
            next_in: 0x1000,
            avail_in: 3,
            next_out: 0x2010,
            avail_out: 8,
        };
        writer.write_call_site(&CallKind::Step { flush: 0 }, &site).unwrap();
        let outcome = Outcome {
            consumed_in: 3,
            consumed_out: 2,
            status: 0,
        };
        writer.write_outcome(&outcome, b"abc", &[0x78, 0x9c]).unwrap();
        writer.close().unwrap();

        let metadata = fs::read_to_string(&writer.paths().metadata).unwrap();
        assert_eq!(metadata, "d 1 6\nc 0\n0x1000 3 0x2010 8\n3 2 0\n");
        assert_eq!(fs::read(&writer.paths().input).unwrap(), b"abc");
        assert_eq!(fs::read(&writer.paths().output).unwrap(), vec![0x78, 0x9c]);
    }

    #[test]
    fn test_metadata_offset_tracks_appends() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        assert_eq!(writer.metadata_offset().unwrap(), 0);
        writer.write_init(&InitRecord::InflateDefault).unwrap();
        assert_eq!(writer.metadata_offset().unwrap(), 4);
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let id = SessionId::new(StreamKind::Inflate, 1, 0);
        let paths = TracePaths::new(&dir.path().join("missing"), &id);
        let err = TraceWriter::create(paths, true).unwrap_err();
        assert!(matches!(err, LogError::Io { op: "create", .. }));
    }

    #[test]
    fn test_create_refuses_existing_trace() {
        let dir = tempfile::tempdir().unwrap();
        let first = writer(dir.path());
        first.write_init(&InitRecord::DeflateDefault { level: 9 }).unwrap();

        let err = TraceWriter::create(paths(dir.path()), false).unwrap_err();
        match err {
            LogError::Io { op, source, .. } => {
                assert_eq!(op, "create");
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read_to_string(&first.paths().metadata).unwrap(), "d 1 9\n");
    }

    #[test]
    fn test_close_with_and_without_sync() {
        let dir = tempfile::tempdir().unwrap();
        for (sequence, sync) in [(0, false), (1, true)] {
            let id = SessionId::new(StreamKind::Inflate, 2, sequence);
            let writer = TraceWriter::create(TracePaths::new(dir.path(), &id), sync).unwrap();
            writer.write_init(&InitRecord::InflateDefault).unwrap();
            writer.close().unwrap();
            assert_eq!(fs::read_to_string(&writer.paths().metadata).unwrap(), "i 1\n");
        }
    }
}
