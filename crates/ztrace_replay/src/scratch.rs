//! Call-site buffer reconstruction.
//!
//! zlib's behaviour can depend on where its buffers sit relative to page boundaries,
//! so each replayed call gets input and output regions whose addresses have the same
//! low 12 bits as the pointers the host passed. Both regions live in one allocation
//! of `avail_in + avail_out + 2 * PAGE_SIZE` bytes, enough slack to slide each region
//! up to its offset.

use std::ops::Range;
use ztrace_core::{CallSite, PAGE_OFFSET_MASK, PAGE_SIZE};

/// Smallest address `>= address` whose page offset is `offset`
#[must_use]
pub const fn align_up_with_offset(address: usize, offset: usize) -> usize {
    let base = address.wrapping_sub(offset);
    let aligned = base.wrapping_add(PAGE_OFFSET_MASK) & !PAGE_OFFSET_MASK;
    aligned.wrapping_add(offset)
}

/// Input and output index ranges within a buffer starting at `base`
#[must_use]
pub fn layout(base: usize, site: &CallSite) -> (Range<usize>, Range<usize>) {
    let in_start = align_up_with_offset(base, site.in_page_offset()) - base;
    let in_end = in_start + site.avail_in as usize;
    let out_start = align_up_with_offset(base + in_end, site.out_page_offset()) - base;
    let out_end = out_start + site.avail_out as usize;
    (in_start..in_end, out_start..out_end)
}

/// Buffers for one replayed call
#[derive(Debug)]
pub struct Scratch {
    buf: Vec<u8>,
    input: Range<usize>,
    output: Range<usize>,
}

impl Scratch {
    /// Allocate regions matching `site`
    #[must_use]
    pub fn new(site: &CallSite) -> Self {
        let len = site.avail_in as usize + site.avail_out as usize + 2 * PAGE_SIZE;
        let buf = vec![0u8; len];
        let (input, output) = layout(buf.as_ptr() as usize, site);
        Self { buf, input, output }
    }

    /// The input and output regions
    pub fn regions_mut(&mut self) -> (&mut [u8], &mut [u8]) {
        let (head, tail) = self.buf.split_at_mut(self.output.start);
        (&mut head[self.input.clone()], &mut tail[..self.output.len()])
    }

    /// The output region
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.buf[self.output.clone()]
    }
}
