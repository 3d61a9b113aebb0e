//! Per-thread call depth.
//!
//! zlib entry points call one another (`deflateParams` runs `deflate` to flush the
//! pending block). Only the call the host made is recorded; anything it triggers
//! underneath is forwarded untouched.

use std::cell::Cell;

thread_local! {
    static DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// RAII marker for one intercepted call on this thread
#[derive(Debug)]
pub struct CallDepth {
    outermost: bool,
}

impl CallDepth {
    /// Enter an intercepted call
    #[must_use = "the depth is released when the guard drops"]
    pub fn enter() -> Self {
        let previous = DEPTH.with(|depth| {
            let previous = depth.get();
            depth.set(previous + 1);
            previous
        });
        Self {
            outermost: previous == 0,
        }
    }

    /// Whether this call came straight from the host
    #[must_use]
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }

    /// Depth on the current thread
    #[must_use]
    pub fn current() -> u32 {
        DEPTH.with(Cell::get)
    }
}

impl Drop for CallDepth {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
