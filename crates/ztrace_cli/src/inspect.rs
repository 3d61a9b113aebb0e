//! Human-readable and JSON views of a trace.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use ztrace_core::{CallKind, CallRecord, InitRecord, Status, flush_name};
use ztrace_log::{LogResult, TraceReader};

/// Everything parsed from one metadata log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    /// Metadata log
    pub path: PathBuf,
    /// How the session started
    pub init: InitRecord,
    /// Complete call records, in order
    pub calls: Vec<CallRecord>,
    /// The log ended in an incomplete record
    pub truncated: bool,
}

impl Inspection {
    /// Parse the trace at `metadata`
    ///
    /// # Errors
    ///
    /// Returns error if the trace cannot be read or a record is malformed
    pub fn load(metadata: &Path) -> LogResult<Self> {
        let mut reader = TraceReader::open(metadata)?;
        let init = reader.read_init()?;
        let mut calls = Vec::new();
        while let Some(call) = reader.next_call()? {
            calls.push(call);
        }
        Ok(Self {
            path: metadata.to_path_buf(),
            init,
            calls,
            truncated: reader.truncated(),
        })
    }
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "trace {}", self.path.display())?;
        writeln!(f, "init  {} ({})", self.init, self.init.kind())?;
        for (index, call) in self.calls.iter().enumerate() {
            let site = &call.site;
            let outcome = &call.outcome;
            writeln!(
                f,
                "{index:>5} {:<22} in {:#x}+{} out {:#x}+{} -> {}/{} {}",
                describe(&call.kind),
                site.next_in,
                site.avail_in,
                site.next_out,
                site.avail_out,
                outcome.consumed_in,
                outcome.consumed_out,
                Status(outcome.status),
            )?;
        }
        write!(f, "{} calls", self.calls.len())?;
        if self.truncated {
            write!(f, ", ends in an incomplete record")?;
        }
        writeln!(f)
    }
}

fn describe(call: &CallKind) -> String {
    match *call {
        CallKind::Step { flush } => match flush_name(flush) {
            Some(name) => format!("step {name}"),
            None => format!("step flush {flush}"),
        },
        CallKind::Params { level, strategy } => format!("params {level} {strategy}"),
        CallKind::Reset => "reset".to_string(),
    }
}
