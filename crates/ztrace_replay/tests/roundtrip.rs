//! Capture through the interceptor, then replay the traces, both against the linked zlib.

use libz_sys::{Z_FINISH, Z_NO_FLUSH, Z_OK, Z_STREAM_END, z_stream, z_streamp};
use std::ffi::{c_char, c_int};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use ztrace_core::{Status, StreamKind, ZlibApi, new_stream};
use ztrace_record::{Interceptor, RecordConfig};
use ztrace_replay::{ReplayEngine, ReplayError};

fn interceptor(dir: &Path) -> Interceptor {
    let config = RecordConfig::default().with_output_dir(dir).with_sync(false);
    Interceptor::new(ZlibApi::linked(), &config)
}

fn trace(dir: &Path, kind: StreamKind, sequence: u64) -> PathBuf {
    dir.join(format!("{kind}.{}.{sequence}", std::process::id()))
}

fn version() -> *const c_char {
    unsafe { libz_sys::zlibVersion() }
}

fn stream_size() -> c_int {
    size_of::<z_stream>() as c_int
}

fn text(seed: usize, len: usize) -> Vec<u8> {
    let words: &[&[u8]] = &[b"zlib ", b"stream ", b"replay ", b"capture ", b"window ", b"deflate "];
    (0..)
        .flat_map(|i: usize| words[(i * 7 + seed + i / 5) % words.len()].iter().copied())
        .take(len)
        .collect()
}

/// Offer `input` to `call` until it is consumed, collecting everything produced
fn pump(
    strm: &mut z_stream,
    input: &mut [u8],
    output: &mut Vec<u8>,
    mut call: impl FnMut(z_streamp) -> c_int,
) -> c_int {
    let mut buf = vec![0u8; 1024];
    strm.next_in = input.as_mut_ptr();
    strm.avail_in = input.len() as u32;
    loop {
        strm.next_out = buf.as_mut_ptr();
        strm.avail_out = buf.len() as u32;
        let ptr: z_streamp = &mut *strm;
        let status = call(ptr);
        let produced = buf.len() - strm.avail_out as usize;
        output.extend_from_slice(&buf[..produced]);
        if status != Z_OK || (strm.avail_in == 0 && strm.avail_out != 0) {
            return status;
        }
    }
}

/// Compress `data` in 3000-byte chunks, returning the compressed stream
fn compress(interceptor: &Interceptor, data: &[u8]) -> Vec<u8> {
    let mut strm = new_stream();
    let mut input = data.to_vec();
    let mut compressed = Vec::new();
    unsafe {
        assert_eq!(interceptor.deflate_init(&mut *strm, 6, version(), stream_size()), Z_OK);
        for chunk in input.chunks_mut(3000) {
            pump(&mut strm, chunk, &mut compressed, |s| interceptor.deflate(s, Z_NO_FLUSH));
        }
        let status = pump(&mut strm, &mut [], &mut compressed, |s| interceptor.deflate(s, Z_FINISH));
        assert_eq!(status, Z_STREAM_END);
        assert_eq!(interceptor.deflate_end(&mut *strm), Z_OK);
    }
    compressed
}

#[test]
fn test_deflate_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(dir.path());
    let data = text(0, 20_000);
    let compressed = compress(&interceptor, &data);

    let report = ReplayEngine::new()
        .replay(&trace(dir.path(), StreamKind::Deflate, 0))
        .unwrap();
    assert!(report.calls >= 8);
    assert_eq!(report.total_in, data.len() as u64);
    assert_eq!(report.total_out, compressed.len() as u64);
    assert_eq!(report.teardown, Status::OK);
    assert!(!report.truncated);
}

#[test]
fn test_explicit_params_and_reset_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(dir.path());
    let mut strm = new_stream();
    let mut out = Vec::new();
    unsafe {
        let status = interceptor.deflate_init2(&mut *strm, 6, 8, -15, 8, 0, version(), stream_size());
        assert_eq!(status, Z_OK);
        pump(&mut strm, &mut text(1, 5000), &mut out, |s| interceptor.deflate(s, Z_NO_FLUSH));
        pump(&mut strm, &mut [], &mut out, |s| interceptor.deflate_params(s, 1, 0));
        pump(&mut strm, &mut text(2, 5000), &mut out, |s| interceptor.deflate(s, Z_NO_FLUSH));
        pump(&mut strm, &mut [], &mut out, |s| interceptor.deflate(s, Z_FINISH));
        assert_eq!(pump(&mut strm, &mut [], &mut out, |s| interceptor.deflate_reset(s)), Z_OK);
        let status = pump(&mut strm, &mut text(3, 700), &mut out, |s| interceptor.deflate(s, Z_FINISH));
        assert_eq!(status, Z_STREAM_END);
        assert_eq!(interceptor.deflate_end(&mut *strm), Z_OK);
    }

    let report = ReplayEngine::new()
        .replay(&trace(dir.path(), StreamKind::Deflate, 0))
        .unwrap();
    assert!(report.calls >= 6);
    assert_eq!(report.total_in, 700);
}

#[test]
fn test_inflate_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(dir.path());
    let original = text(4, 50_000);
    let mut compressed = vec![0u8; original.len() + 1024];
    let mut compressed_len = compressed.len() as libz_sys::uLongf;
    let status = unsafe {
        libz_sys::compress(
            compressed.as_mut_ptr(),
            &mut compressed_len,
            original.as_ptr(),
            original.len() as libz_sys::uLong,
        )
    };
    assert_eq!(status, Z_OK);
    compressed.truncate(compressed_len as usize);

    let mut strm = new_stream();
    let mut restored = Vec::new();
    unsafe {
        assert_eq!(interceptor.inflate_init(&mut *strm, version(), stream_size()), Z_OK);
        let mut status = Z_OK;
        for chunk in compressed.chunks_mut(100) {
            status = pump(&mut strm, chunk, &mut restored, |s| interceptor.inflate(s, Z_NO_FLUSH));
        }
        assert_eq!(status, Z_STREAM_END);
        assert_eq!(interceptor.inflate_end(&mut *strm), Z_OK);
    }
    assert_eq!(restored, original);

    let report = ReplayEngine::new()
        .replay(&trace(dir.path(), StreamKind::Inflate, 0))
        .unwrap();
    assert_eq!(report.kind, StreamKind::Inflate);
    assert_eq!(report.total_out, original.len() as u64);
}

#[test]
fn test_clone_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(dir.path());
    let mut source = new_stream();
    let mut clone = new_stream();
    let mut source_out = Vec::new();
    let mut clone_out = Vec::new();
    unsafe {
        assert_eq!(interceptor.deflate_init(&mut *source, 9, version(), stream_size()), Z_OK);
        pump(&mut source, &mut text(5, 4000), &mut source_out, |s| interceptor.deflate(s, Z_NO_FLUSH));
        assert_eq!(interceptor.deflate_copy(&mut *clone, &mut *source), Z_OK);

        pump(&mut source, &mut text(6, 1000), &mut source_out, |s| interceptor.deflate(s, Z_FINISH));
        pump(&mut clone, &mut text(7, 2500), &mut clone_out, |s| interceptor.deflate(s, Z_FINISH));
        assert_eq!(interceptor.deflate_end(&mut *source), Z_OK);
        assert_eq!(interceptor.deflate_end(&mut *clone), Z_OK);
    }

    let engine = ReplayEngine::new();
    let source_report = engine.replay(&trace(dir.path(), StreamKind::Deflate, 0)).unwrap();
    assert_eq!(source_report.lineage_depth, 0);

    let clone_report = engine.replay(&trace(dir.path(), StreamKind::Deflate, 1)).unwrap();
    assert_eq!(clone_report.lineage_depth, 1);
    assert_eq!(clone_report.total_in, 6500);
    assert_eq!(clone_report.teardown, Status::OK);
}

#[test]
fn test_concurrent_captures_replay_independently() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = Arc::new(interceptor(dir.path()));
    let workers: Vec<_> = (0..2)
        .map(|seed| {
            let interceptor = Arc::clone(&interceptor);
            thread::spawn(move || compress(&interceptor, &text(seed, 12_000 + seed * 1000)))
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let engine = ReplayEngine::new();
    let mut totals: Vec<u64> = (0..2)
        .map(|sequence| {
            engine
                .replay(&trace(dir.path(), StreamKind::Deflate, sequence))
                .unwrap()
                .total_in
        })
        .collect();
    totals.sort_unstable();
    assert_eq!(totals, vec![12_000, 13_000]);
}

#[test]
fn test_truncated_capture_replays_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(dir.path());
    compress(&interceptor, &text(8, 12_000));

    // Keep the init record, two complete calls, and the header of the third.
    let path = trace(dir.path(), StreamKind::Deflate, 0);
    let metadata = fs::read_to_string(&path).unwrap();
    let kept: String = metadata.split_inclusive('\n').take(1 + 2 * 3 + 1).collect();
    fs::write(&path, kept).unwrap();

    let report = ReplayEngine::new().replay(&path).unwrap();
    assert_eq!(report.calls, 2);
    assert!(report.truncated);
    assert_eq!(report.teardown, Status::DATA_ERROR);
}

#[test]
fn test_changed_level_diverges() {
    let dir = tempfile::tempdir().unwrap();
    let interceptor = interceptor(dir.path());
    compress(&interceptor, &text(9, 9000));

    let path = trace(dir.path(), StreamKind::Deflate, 0);
    let metadata = fs::read_to_string(&path).unwrap();
    fs::write(&path, metadata.replacen("d 1 6\n", "d 1 1\n", 1)).unwrap();

    let err = ReplayEngine::new().replay(&path).unwrap_err();
    assert!(matches!(err, ReplayError::Mismatch(_)), "{err}");
}
