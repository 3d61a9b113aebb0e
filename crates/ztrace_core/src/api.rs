//! Table of zlib entry points.
//!
//! Capture forwards through a table resolved from the next object in the symbol
//! lookup order; replay drives the zlib it links against. Tests substitute fakes.

use crate::kind::StreamKind;
use libz_sys::{z_stream, z_streamp};
use std::ffi::{c_char, c_int, c_uint, c_void};
use std::ptr;

/// `deflateInit_`
pub type DeflateInitFn = unsafe extern "C" fn(z_streamp, c_int, *const c_char, c_int) -> c_int;
/// `deflateInit2_`
pub type DeflateInit2Fn = unsafe extern "C" fn(
    z_streamp,
    c_int,
    c_int,
    c_int,
    c_int,
    c_int,
    *const c_char,
    c_int,
) -> c_int;
/// `inflateInit_`
pub type InflateInitFn = unsafe extern "C" fn(z_streamp, *const c_char, c_int) -> c_int;
/// `inflateInit2_`
pub type InflateInit2Fn = unsafe extern "C" fn(z_streamp, c_int, *const c_char, c_int) -> c_int;
/// `deflateCopy`, `inflateCopy`
pub type CopyFn = unsafe extern "C" fn(z_streamp, z_streamp) -> c_int;
/// `deflateParams`
pub type ParamsFn = unsafe extern "C" fn(z_streamp, c_int, c_int) -> c_int;
/// `deflate`, `inflate`
pub type StepFn = unsafe extern "C" fn(z_streamp, c_int) -> c_int;
/// `deflateReset`, `inflateReset`, `deflateEnd`, `inflateEnd`
pub type StreamFn = unsafe extern "C" fn(z_streamp) -> c_int;

/// Every entry point the harness intercepts or drives
#[derive(Debug, Clone, Copy)]
pub struct ZlibApi {
    /// `deflateInit_`
    pub deflate_init: DeflateInitFn,
    /// `deflateInit2_`
    pub deflate_init2: DeflateInit2Fn,
    /// `deflateCopy`
    pub deflate_copy: CopyFn,
    /// `deflateParams`
    pub deflate_params: ParamsFn,
    /// `deflate`
    pub deflate: StepFn,
    /// `deflateReset`
    pub deflate_reset: StreamFn,
    /// `deflateEnd`
    pub deflate_end: StreamFn,
    /// `inflateInit_`
    pub inflate_init: InflateInitFn,
    /// `inflateInit2_`
    pub inflate_init2: InflateInit2Fn,
    /// `inflateCopy`
    pub inflate_copy: CopyFn,
    /// `inflate`
    pub inflate: StepFn,
    /// `inflateReset`
    pub inflate_reset: StreamFn,
    /// `inflateEnd`
    pub inflate_end: StreamFn,
}

impl ZlibApi {
    /// The zlib this binary is linked against.
    ///
    /// Never use this from inside the preload shim: there the symbols resolve to the
    /// shim's own exports.
    #[must_use]
    pub fn linked() -> Self {
        Self {
            deflate_init: libz_sys::deflateInit_,
            deflate_init2: libz_sys::deflateInit2_,
            deflate_copy: libz_sys::deflateCopy,
            deflate_params: libz_sys::deflateParams,
            deflate: libz_sys::deflate,
            deflate_reset: libz_sys::deflateReset,
            deflate_end: libz_sys::deflateEnd,
            inflate_init: libz_sys::inflateInit_,
            inflate_init2: libz_sys::inflateInit2_,
            inflate_copy: libz_sys::inflateCopy,
            inflate: libz_sys::inflate,
            inflate_reset: libz_sys::inflateReset,
            inflate_end: libz_sys::inflateEnd,
        }
    }

    /// `deflate` or `inflate`
    #[must_use]
    pub fn step(&self, kind: StreamKind) -> StepFn {
        match kind {
            StreamKind::Deflate => self.deflate,
            StreamKind::Inflate => self.inflate,
        }
    }

    /// `deflateReset` or `inflateReset`
    #[must_use]
    pub fn reset(&self, kind: StreamKind) -> StreamFn {
        match kind {
            StreamKind::Deflate => self.deflate_reset,
            StreamKind::Inflate => self.inflate_reset,
        }
    }

    /// `deflateCopy` or `inflateCopy`
    #[must_use]
    pub fn copy(&self, kind: StreamKind) -> CopyFn {
        match kind {
            StreamKind::Deflate => self.deflate_copy,
            StreamKind::Inflate => self.inflate_copy,
        }
    }

    /// `deflateEnd` or `inflateEnd`
    #[must_use]
    pub fn end(&self, kind: StreamKind) -> StreamFn {
        match kind {
            StreamKind::Deflate => self.deflate_end,
            StreamKind::Inflate => self.inflate_end,
        }
    }
}

unsafe extern "C" fn zalloc(_opaque: *mut c_void, items: c_uint, size: c_uint) -> *mut c_void {
    unsafe { libc::calloc(items as libc::size_t, size as libc::size_t) }
}

unsafe extern "C" fn zfree(_opaque: *mut c_void, address: *mut c_void) {
    unsafe { libc::free(address) }
}

/// A zeroed `z_stream` with malloc-backed allocators, boxed so its address stays
/// fixed; zlib keeps a back-pointer to it.
#[must_use]
pub fn new_stream() -> Box<z_stream> {
    Box::new(z_stream {
        next_in: ptr::null_mut(),
        avail_in: 0,
        total_in: 0,
        next_out: ptr::null_mut(),
        avail_out: 0,
        total_out: 0,
        msg: ptr::null_mut(),
        state: ptr::null_mut(),
        zalloc,
        zfree,
        opaque: ptr::null_mut(),
        data_type: 0,
        adler: 0,
        reserved: 0,
    })
}
