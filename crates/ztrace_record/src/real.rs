//! Locating the real zlib behind the shim.

use crate::error::{RecordError, RecordResult};
use std::ffi::{CStr, c_void};
use ztrace_core::ZlibApi;

/// Resolve every entry point from the next object in the lookup order after the
/// shim, i.e. the zlib the host would have called without it.
///
/// # Errors
///
/// Returns error naming the first symbol that cannot be found
pub fn resolve_next() -> RecordResult<ZlibApi> {
    // SAFETY: each symbol is looked up with the exact C signature the field declares.
    unsafe {
        Ok(ZlibApi {
            deflate_init: next(c"deflateInit_")?,
            deflate_init2: next(c"deflateInit2_")?,
            deflate_copy: next(c"deflateCopy")?,
            deflate_params: next(c"deflateParams")?,
            deflate: next(c"deflate")?,
            deflate_reset: next(c"deflateReset")?,
            deflate_end: next(c"deflateEnd")?,
            inflate_init: next(c"inflateInit_")?,
            inflate_init2: next(c"inflateInit2_")?,
            inflate_copy: next(c"inflateCopy")?,
            inflate: next(c"inflate")?,
            inflate_reset: next(c"inflateReset")?,
            inflate_end: next(c"inflateEnd")?,
        })
    }
}

/// # Safety
///
/// `F` must be the function pointer type matching `symbol`'s C definition.
unsafe fn next<F: Copy>(symbol: &'static CStr) -> RecordResult<F> {
    debug_assert_eq!(size_of::<F>(), size_of::<*mut c_void>());
    let address = unsafe { libc::dlsym(libc::RTLD_NEXT, symbol.as_ptr()) };
    if address.is_null() {
        return Err(RecordError::Unresolved {
            symbol: symbol.to_str().unwrap_or_default(),
            reason: last_loader_error(),
        });
    }
    tracing::debug!(symbol = ?symbol, ?address, "resolved");
    Ok(unsafe { std::mem::transmute_copy::<*mut c_void, F>(&address) })
}

fn last_loader_error() -> String {
    let message = unsafe { libc::dlerror() };
    if message.is_null() {
        return "symbol not found".to_string();
    }
    unsafe { CStr::from_ptr(message) }
        .to_string_lossy()
        .into_owned()
}
