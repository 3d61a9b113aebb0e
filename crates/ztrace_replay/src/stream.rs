//! An owned zlib stream driven by replay.

use crate::error::{ReplayError, ReplayResult};
use libz_sys::{Z_OK, z_stream, z_streamp};
use std::ffi::c_int;
use std::{fmt, ptr};
use ztrace_core::{CallKind, InitRecord, Outcome, Status, StreamKind, ZlibApi, new_stream};

/// A live stream. Torn down on drop unless [`ZStream::end`] already did.
pub struct ZStream {
    raw: Box<z_stream>,
    kind: StreamKind,
    api: ZlibApi,
    live: bool,
}

impl ZStream {
    /// Initialise a stream the way `record` says.
    ///
    /// Clone records need a source stream; use [`ZStream::fork`] for those.
    ///
    /// # Errors
    ///
    /// Returns error if zlib rejects the parameters
    pub fn open(api: ZlibApi, record: &InitRecord) -> ReplayResult<Self> {
        let mut raw = new_stream();
        let strm: z_streamp = &mut *raw;
        let size = size_of::<z_stream>() as c_int;
        // SAFETY: `strm` is a fresh boxed stream and `version` is zlib's own string.
        let status = unsafe {
            let version = libz_sys::zlibVersion();
            match *record {
                InitRecord::DeflateDefault { level } => (api.deflate_init)(strm, level, version, size),
                InitRecord::DeflateExplicit(p) => (api.deflate_init2)(
                    strm,
                    p.level,
                    p.method,
                    p.window_bits,
                    p.mem_level,
                    p.strategy,
                    version,
                    size,
                ),
                InitRecord::InflateDefault => (api.inflate_init)(strm, version, size),
                InitRecord::InflateExplicit { window_bits } => {
                    (api.inflate_init2)(strm, window_bits, version, size)
                }
                InitRecord::Clone { .. } => return Err(ReplayError::DetachedClone),
            }
        };
        if status != Z_OK {
            return Err(ReplayError::Init {
                status: Status(status),
            });
        }
        Ok(Self {
            raw,
            kind: record.kind(),
            api,
            live: true,
        })
    }

    /// Clone `source` with `deflateCopy`/`inflateCopy`
    ///
    /// # Errors
    ///
    /// Returns error if zlib cannot copy the stream
    pub fn fork(source: &mut ZStream) -> ReplayResult<Self> {
        let mut raw = new_stream();
        let copy = source.api.copy(source.kind);
        // SAFETY: `source` is live; `raw` is a fresh stream zlib fills in.
        let status = unsafe { copy(&mut *raw, &mut *source.raw) };
        if status != Z_OK {
            return Err(ReplayError::Copy {
                status: Status(status),
            });
        }
        Ok(Self {
            raw,
            kind: source.kind,
            api: source.api,
            live: true,
        })
    }

    /// Direction
    #[must_use]
    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    /// zlib's running count of consumed input
    #[must_use]
    pub fn total_in(&self) -> u64 {
        u64::from(self.raw.total_in)
    }

    /// zlib's running count of produced output
    #[must_use]
    pub fn total_out(&self) -> u64 {
        u64::from(self.raw.total_out)
    }

    /// Run one call over `input` and `output` and report what it did.
    ///
    /// The stream holds no buffer pointers once this returns.
    ///
    /// # Errors
    ///
    /// Returns error if `call` does not apply to this direction
    pub fn invoke(
        &mut self,
        call: &CallKind,
        input: &mut [u8],
        output: &mut [u8],
    ) -> ReplayResult<Outcome> {
        if matches!(call, CallKind::Params { .. }) && self.kind != StreamKind::Deflate {
            return Err(ReplayError::InvalidCall {
                call: *call,
                kind: self.kind,
            });
        }
        self.raw.next_in = input.as_mut_ptr();
        self.raw.avail_in = len32(input);
        self.raw.next_out = output.as_mut_ptr();
        self.raw.avail_out = len32(output);

        let strm: z_streamp = &mut *self.raw;
        // SAFETY: both buffers outlive the call and their lengths match `avail_*`.
        let status = unsafe {
            match *call {
                CallKind::Step { flush } => (self.api.step(self.kind))(strm, flush),
                CallKind::Params { level, strategy } => (self.api.deflate_params)(strm, level, strategy),
                CallKind::Reset => (self.api.reset(self.kind))(strm),
            }
        };

        let outcome = Outcome {
            consumed_in: moved(input.as_ptr() as usize, self.raw.next_in as usize),
            consumed_out: moved(output.as_ptr() as usize, self.raw.next_out as usize),
            status,
        };
        self.raw.next_in = ptr::null_mut();
        self.raw.avail_in = 0;
        self.raw.next_out = ptr::null_mut();
        self.raw.avail_out = 0;
        Ok(outcome)
    }

    /// Tear the stream down and return zlib's status
    pub fn end(mut self) -> Status {
        self.release()
    }

    fn release(&mut self) -> Status {
        if !self.live {
            return Status::OK;
        }
        self.live = false;
        // SAFETY: the stream was initialised and has not been ended.
        Status(unsafe { (self.api.end(self.kind))(&mut *self.raw) })
    }
}

impl fmt::Debug for ZStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZStream")
            .field("kind", &self.kind)
            .field("live", &self.live)
            .field("total_in", &self.total_in())
            .field("total_out", &self.total_out())
            .finish_non_exhaustive()
    }
}

impl Drop for ZStream {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

fn len32(buf: &[u8]) -> u32 {
    u32::try_from(buf.len()).unwrap_or(u32::MAX)
}

fn moved(before: usize, after: usize) -> u32 {
    u32::try_from(after.wrapping_sub(before)).unwrap_or(u32::MAX)
}
