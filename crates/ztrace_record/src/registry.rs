//! Live sessions, keyed by stream handle.

use crate::config::RecordConfig;
use crate::error::{RecordError, RecordResult};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use ztrace_core::{SessionId, StreamKind, TracePaths};
use ztrace_log::TraceWriter;

/// One live stream and its trace
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    writer: TraceWriter,
}

impl Session {
    /// Trace identity
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Direction
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.id.kind
    }

    /// The session's trace files
    #[must_use]
    pub fn writer(&self) -> &TraceWriter {
        &self.writer
    }
}

/// Map from stream handle to session.
///
/// The lock covers map mutation only. Trace files are created before an insert and
/// closed by the caller after a remove.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<usize, Arc<Session>>>,
    next_sequence: AtomicU64,
    dir: PathBuf,
    sync: bool,
}

impl SessionRegistry {
    /// Registry writing traces as `config` says
    #[must_use]
    pub fn new(config: &RecordConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            dir: config.output_dir.clone(),
            sync: config.sync,
        }
    }

    /// Start a session for `handle` and create its trace files
    ///
    /// Names carry the current pid, so a forked child never reuses its parent's names.
    ///
    /// # Errors
    ///
    /// Returns error if the files cannot be created (an existing trace of the same name
    /// included) or `handle` is already live
    pub fn register(&self, handle: usize, kind: StreamKind) -> RecordResult<Arc<Session>> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let id = SessionId::new(kind, std::process::id(), sequence);
        let writer = TraceWriter::create(TracePaths::new(&self.dir, &id), self.sync)?;
        let session = Arc::new(Session { id, writer });

        match self.lock().entry(handle) {
            Entry::Occupied(_) => return Err(RecordError::DuplicateSession { handle }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&session));
            }
        }
        tracing::info!(handle = format_args!("{handle:#x}"), session = %id, "session started");
        Ok(session)
    }

    /// The live session for `handle`, which must be of direction `kind`
    ///
    /// # Errors
    ///
    /// Returns error if `handle` is unknown or has the other direction
    pub fn lookup(&self, handle: usize, kind: StreamKind) -> RecordResult<Arc<Session>> {
        let session = self
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(RecordError::UnknownSession { handle })?;
        check_kind(handle, kind, &session)?;
        Ok(session)
    }

    /// End the session for `handle`
    ///
    /// # Errors
    ///
    /// Returns error if `handle` is unknown or has the other direction
    pub fn remove(&self, handle: usize, kind: StreamKind) -> RecordResult<Arc<Session>> {
        let session = match self.lock().entry(handle) {
            Entry::Vacant(_) => return Err(RecordError::UnknownSession { handle }),
            Entry::Occupied(entry) => {
                check_kind(handle, kind, entry.get())?;
                entry.remove()
            }
        };
        tracing::info!(handle = format_args!("{handle:#x}"), session = %session.id, "session ended");
        Ok(session)
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no session is live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<usize, Arc<Session>>> {
        // A panic elsewhere must not stop the host's other streams from being recorded.
        self.sessions
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn check_kind(handle: usize, expected: StreamKind, session: &Session) -> RecordResult<()> {
    if session.kind() == expected {
        Ok(())
    } else {
        Err(RecordError::KindMismatch {
            handle,
            expected,
            actual: session.kind(),
        })
    }
}
