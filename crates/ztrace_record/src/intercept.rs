//! Recording wrappers around every zlib entry point.
//!
//! Each wrapper has the exact signature of the function it stands in for, forwards to
//! the real one, and returns its status untouched. Only calls made directly by the host
//! are recorded; see [`CallDepth`].
//!
//! Any bookkeeping failure aborts the process through [`die`](crate::fatal::die).

use crate::config::RecordConfig;
use crate::error::RecordResult;
use crate::fatal::OrDie;
use crate::reentrancy::CallDepth;
use crate::registry::SessionRegistry;
use libz_sys::{Z_OK, z_streamp};
use std::ffi::{c_char, c_int};
use std::slice;
use ztrace_core::{
    CallKind, CallSite, DeflateParams, InitRecord, Lineage, Outcome, StreamKind, ZlibApi,
};

/// Forwards to a real [`ZlibApi`], recording each outermost call
#[derive(Debug)]
pub struct Interceptor {
    api: ZlibApi,
    registry: SessionRegistry,
}

impl Interceptor {
    /// Record into the directory `config` names, forwarding to `api`
    #[must_use]
    pub fn new(api: ZlibApi, config: &RecordConfig) -> Self {
        tracing::info!(dir = %config.output_dir.display(), sync = config.sync, "capture ready");
        Self {
            api,
            registry: SessionRegistry::new(config),
        }
    }

    /// Live sessions
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// `deflateInit_`
    ///
    /// # Safety
    ///
    /// Same contract as `deflateInit_`.
    pub unsafe fn deflate_init(
        &self,
        strm: z_streamp,
        level: c_int,
        version: *const c_char,
        stream_size: c_int,
    ) -> c_int {
        let depth = CallDepth::enter();
        let status = unsafe { (self.api.deflate_init)(strm, level, version, stream_size) };
        if status == Z_OK && depth.is_outermost() {
            self.start(strm, &InitRecord::DeflateDefault { level }).or_die();
        }
        status
    }

    /// `deflateInit2_`
    ///
    /// # Safety
    ///
    /// Same contract as `deflateInit2_`.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn deflate_init2(
        &self,
        strm: z_streamp,
        level: c_int,
        method: c_int,
        window_bits: c_int,
        mem_level: c_int,
        strategy: c_int,
        version: *const c_char,
        stream_size: c_int,
    ) -> c_int {
        let depth = CallDepth::enter();
        let status = unsafe {
            (self.api.deflate_init2)(
                strm,
                level,
                method,
                window_bits,
                mem_level,
                strategy,
                version,
                stream_size,
            )
        };
        if status == Z_OK && depth.is_outermost() {
            let params = DeflateParams {
                level,
                method,
                window_bits,
                mem_level,
                strategy,
            };
            self.start(strm, &InitRecord::DeflateExplicit(params)).or_die();
        }
        status
    }

    /// `inflateInit_`
    ///
    /// # Safety
    ///
    /// Same contract as `inflateInit_`.
    pub unsafe fn inflate_init(
        &self,
        strm: z_streamp,
        version: *const c_char,
        stream_size: c_int,
    ) -> c_int {
        let depth = CallDepth::enter();
        let status = unsafe { (self.api.inflate_init)(strm, version, stream_size) };
        if status == Z_OK && depth.is_outermost() {
            self.start(strm, &InitRecord::InflateDefault).or_die();
        }
        status
    }

    /// `inflateInit2_`
    ///
    /// # Safety
    ///
    /// Same contract as `inflateInit2_`.
    pub unsafe fn inflate_init2(
        &self,
        strm: z_streamp,
        window_bits: c_int,
        version: *const c_char,
        stream_size: c_int,
    ) -> c_int {
        let depth = CallDepth::enter();
        let status = unsafe { (self.api.inflate_init2)(strm, window_bits, version, stream_size) };
        if status == Z_OK && depth.is_outermost() {
            self.start(strm, &InitRecord::InflateExplicit { window_bits }).or_die();
        }
        status
    }

    /// `deflateCopy`
    ///
    /// # Safety
    ///
    /// Same contract as `deflateCopy`.
    pub unsafe fn deflate_copy(&self, dest: z_streamp, source: z_streamp) -> c_int {
        unsafe { self.copy(StreamKind::Deflate, dest, source) }
    }

    /// `inflateCopy`
    ///
    /// # Safety
    ///
    /// Same contract as `inflateCopy`.
    pub unsafe fn inflate_copy(&self, dest: z_streamp, source: z_streamp) -> c_int {
        unsafe { self.copy(StreamKind::Inflate, dest, source) }
    }

    /// `deflateParams`. A block flush zlib runs inside it is folded into this record.
    ///
    /// # Safety
    ///
    /// Same contract as `deflateParams`.
    pub unsafe fn deflate_params(&self, strm: z_streamp, level: c_int, strategy: c_int) -> c_int {
        let call = CallKind::Params { level, strategy };
        unsafe {
            self.recorded(strm, StreamKind::Deflate, call, |s| {
                (self.api.deflate_params)(s, level, strategy)
            })
        }
    }

    /// `deflate`
    ///
    /// # Safety
    ///
    /// Same contract as `deflate`.
    pub unsafe fn deflate(&self, strm: z_streamp, flush: c_int) -> c_int {
        unsafe { self.step(StreamKind::Deflate, strm, flush) }
    }

    /// `inflate`
    ///
    /// # Safety
    ///
    /// Same contract as `inflate`.
    pub unsafe fn inflate(&self, strm: z_streamp, flush: c_int) -> c_int {
        unsafe { self.step(StreamKind::Inflate, strm, flush) }
    }

    /// `deflateReset`
    ///
    /// # Safety
    ///
    /// Same contract as `deflateReset`.
    pub unsafe fn deflate_reset(&self, strm: z_streamp) -> c_int {
        unsafe { self.reset(StreamKind::Deflate, strm) }
    }

    /// `inflateReset`
    ///
    /// # Safety
    ///
    /// Same contract as `inflateReset`.
    pub unsafe fn inflate_reset(&self, strm: z_streamp) -> c_int {
        unsafe { self.reset(StreamKind::Inflate, strm) }
    }

    /// `deflateEnd`
    ///
    /// # Safety
    ///
    /// Same contract as `deflateEnd`.
    pub unsafe fn deflate_end(&self, strm: z_streamp) -> c_int {
        unsafe { self.end(StreamKind::Deflate, strm) }
    }

    /// `inflateEnd`
    ///
    /// # Safety
    ///
    /// Same contract as `inflateEnd`.
    pub unsafe fn inflate_end(&self, strm: z_streamp) -> c_int {
        unsafe { self.end(StreamKind::Inflate, strm) }
    }

    fn start(&self, strm: z_streamp, record: &InitRecord) -> RecordResult<()> {
        let session = self.registry.register(handle(strm), record.kind())?;
        session.writer().write_init(record)?;
        Ok(())
    }

    unsafe fn copy(&self, kind: StreamKind, dest: z_streamp, source: z_streamp) -> c_int {
        let depth = CallDepth::enter();
        let status = unsafe { (self.api.copy(kind))(dest, source) };
        if status == Z_OK && depth.is_outermost() {
            self.fork(kind, dest, source).or_die();
        }
        status
    }

    fn fork(&self, kind: StreamKind, dest: z_streamp, source: z_streamp) -> RecordResult<()> {
        let parent = self.registry.lookup(handle(source), kind)?;
        let child = self.registry.register(handle(dest), kind)?;
        let lineage = Lineage {
            source: parent.id().file_name(),
            offset: parent.writer().metadata_offset()?,
        };
        tracing::debug!(source = %parent.id(), clone = %child.id(), offset = lineage.offset, "stream cloned");
        child.writer().write_init(&InitRecord::Clone { kind, lineage })?;
        Ok(())
    }

    unsafe fn step(&self, kind: StreamKind, strm: z_streamp, flush: c_int) -> c_int {
        let step = self.api.step(kind);
        unsafe { self.recorded(strm, kind, CallKind::Step { flush }, |s| step(s, flush)) }
    }

    unsafe fn reset(&self, kind: StreamKind, strm: z_streamp) -> c_int {
        let reset = self.api.reset(kind);
        unsafe { self.recorded(strm, kind, CallKind::Reset, |s| reset(s)) }
    }

    unsafe fn end(&self, kind: StreamKind, strm: z_streamp) -> c_int {
        let depth = CallDepth::enter();
        if depth.is_outermost() && !strm.is_null() {
            let session = self.registry.remove(handle(strm), kind).or_die();
            session.writer().close().or_die();
        }
        unsafe { (self.api.end(kind))(strm) }
    }

    /// Snapshot, forward, then log the payload the call moved and its outcome
    unsafe fn recorded(
        &self,
        strm: z_streamp,
        kind: StreamKind,
        call: CallKind,
        forward: impl FnOnce(z_streamp) -> c_int,
    ) -> c_int {
        let depth = CallDepth::enter();
        if !depth.is_outermost() || strm.is_null() {
            return forward(strm);
        }
        let session = self.registry.lookup(handle(strm), kind).or_die();
        let site = unsafe { snapshot(strm) };
        session.writer().write_call_site(&call, &site).or_die();

        let status = forward(strm);

        let after = unsafe { snapshot(strm) };
        let outcome = Outcome {
            consumed_in: moved(site.next_in, after.next_in),
            consumed_out: moved(site.next_out, after.next_out),
            status,
        };
        let input = unsafe { payload(site.next_in, outcome.consumed_in) };
        let output = unsafe { payload(site.next_out, outcome.consumed_out) };
        tracing::debug!(session = %session.id(), %call, consumed_in = outcome.consumed_in, consumed_out = outcome.consumed_out, status, "call recorded");
        session.writer().write_outcome(&outcome, input, output).or_die();
        status
    }
}

fn handle(strm: z_streamp) -> usize {
    strm as usize
}

unsafe fn snapshot(strm: z_streamp) -> CallSite {
    let strm = unsafe { &*strm };
    CallSite {
        next_in: strm.next_in as usize,
        avail_in: strm.avail_in,
        next_out: strm.next_out as usize,
        avail_out: strm.avail_out,
    }
}

fn moved(before: usize, after: usize) -> u32 {
    u32::try_from(after.wrapping_sub(before)).unwrap_or(u32::MAX)
}

/// The `len` bytes a call consumed or produced, starting at the pointer it was offered
unsafe fn payload<'a>(start: usize, len: u32) -> &'a [u8] {
    if len == 0 || start == 0 {
        return &[];
    }
    unsafe { slice::from_raw_parts(start as *const u8, len as usize) }
}
