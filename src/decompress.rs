// src/decompress.rs

//! Raw deflate decompression for RTPACK payloads.
//!
//! The RTPACK header is followed by a 2-byte zlib stream marker which the
//! container parser discards, so what reaches this module is a bare deflate
//! stream. We drive `flate2::Decompress` directly instead of wrapping a
//! reader: the reader adapters report a stream that simply stops early as a
//! clean EOF, and a cut-off payload has to surface as an error here.

use std::io;

use flate2::{Decompress, FlushDecompress, Status};
use log::trace;

use crate::error::{DecodeError, DecodeResult};

const CHUNK: usize = 64 * 1024;
/// Upper bound on the up-front reservation; larger outputs grow in `CHUNK`s.
const MAX_PREALLOC: usize = 16 * 1024 * 1024;

/// Inflates `compressed` until the deflate stream signals its end.
///
/// The initial capacity is derived from the compressed length only; headers
/// that declare a decompressed size are never trusted for allocation. Bytes
/// after the end of the deflate stream (the zlib adler32 trailer) are ignored.
pub fn inflate_raw(compressed: &[u8]) -> DecodeResult<Vec<u8>> {
    let capacity = compressed
        .len()
        .saturating_mul(4)
        .clamp(CHUNK, MAX_PREALLOC);
    let mut out = Vec::with_capacity(capacity);
    let mut inflater = Decompress::new(false);

    loop {
        if out.len() == out.capacity() {
            out.reserve(CHUNK);
        }
        let in_before = inflater.total_in();
        let out_before = inflater.total_out();
        let consumed = in_before as usize;

        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
            .map_err(|err| {
                DecodeError::DecompressionFailure(io::Error::new(io::ErrorKind::InvalidData, err))
            })?;

        if status == Status::StreamEnd {
            break;
        }

        let input_exhausted = inflater.total_in() as usize >= compressed.len();
        let output_has_room = out.len() < out.capacity();
        let stalled = inflater.total_in() == in_before && inflater.total_out() == out_before;
        if output_has_room && (input_exhausted || stalled) {
            return Err(DecodeError::DecompressionFailure(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "deflate stream ended without a final block after {} bytes of output",
                    out.len()
                ),
            )));
        }
    }

    trace!(
        "inflate_raw: {} of {} compressed bytes -> {} bytes",
        inflater.total_in(),
        compressed.len(),
        out.len()
    );
    Ok(out)
}
