//! zlib interposition shim
//!
//! Build as a shared object and load it ahead of zlib:
//!
//! ```text
//! LD_PRELOAD=libztrace_preload.so ZTRACE_DIR=/tmp/traces some-program
//! ```
//!
//! Every symbol below shadows the zlib entry point of the same name. The real zlib is
//! resolved on first use; each export then forwards through the shared
//! [`Interceptor`], which records outermost calls and passes results back unmodified.
//!
//! ## Environment
//!
//! * `ZTRACE_DIR`: trace directory, default `.`
//! * `ZTRACE_SYNC`: `0` skips the fsync after each write
//! * `ZTRACE_LOG`: filter for the shim's stderr diagnostics, default `warn`

#![allow(non_snake_case)]
#![allow(clippy::missing_safety_doc)]

use libz_sys::z_streamp;
use once_cell::sync::Lazy;
use std::ffi::{c_char, c_int};
use ztrace_record::{Interceptor, OrDie, RecordConfig, init_logging, resolve_next};

static INTERCEPTOR: Lazy<Interceptor> = Lazy::new(|| {
    init_logging();
    let api = resolve_next().or_die();
    Interceptor::new(api, &RecordConfig::from_env())
});

#[unsafe(no_mangle)]
pub unsafe extern "C" fn deflateInit_(
    strm: z_streamp,
    level: c_int,
    version: *const c_char,
    stream_size: c_int,
) -> c_int {
    unsafe { INTERCEPTOR.deflate_init(strm, level, version, stream_size) }
}

#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn deflateInit2_(
    strm: z_streamp,
    level: c_int,
    method: c_int,
    window_bits: c_int,
    mem_level: c_int,
    strategy: c_int,
    version: *const c_char,
    stream_size: c_int,
) -> c_int {
    unsafe {
        INTERCEPTOR.deflate_init2(
            strm,
            level,
            method,
            window_bits,
            mem_level,
            strategy,
            version,
            stream_size,
        )
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn deflateCopy(dest: z_streamp, source: z_streamp) -> c_int {
    unsafe { INTERCEPTOR.deflate_copy(dest, source) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn deflateParams(strm: z_streamp, level: c_int, strategy: c_int) -> c_int {
    unsafe { INTERCEPTOR.deflate_params(strm, level, strategy) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn deflate(strm: z_streamp, flush: c_int) -> c_int {
    unsafe { INTERCEPTOR.deflate(strm, flush) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn deflateReset(strm: z_streamp) -> c_int {
    unsafe { INTERCEPTOR.deflate_reset(strm) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn deflateEnd(strm: z_streamp) -> c_int {
    unsafe { INTERCEPTOR.deflate_end(strm) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn inflateInit_(
    strm: z_streamp,
    version: *const c_char,
    stream_size: c_int,
) -> c_int {
    unsafe { INTERCEPTOR.inflate_init(strm, version, stream_size) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn inflateInit2_(
    strm: z_streamp,
    window_bits: c_int,
    version: *const c_char,
    stream_size: c_int,
) -> c_int {
    unsafe { INTERCEPTOR.inflate_init2(strm, window_bits, version, stream_size) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn inflateCopy(dest: z_streamp, source: z_streamp) -> c_int {
    unsafe { INTERCEPTOR.inflate_copy(dest, source) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn inflate(strm: z_streamp, flush: c_int) -> c_int {
    unsafe { INTERCEPTOR.inflate(strm, flush) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn inflateReset(strm: z_streamp) -> c_int {
    unsafe { INTERCEPTOR.inflate_reset(strm) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn inflateEnd(strm: z_streamp) -> c_int {
    unsafe { INTERCEPTOR.inflate_end(strm) }
}
