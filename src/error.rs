// src/error.rs

//! Error taxonomy for the asset decoders.
//!
//! Every fatal variant aborts decoding of the current file only. The batch
//! driver in `crate::convert` catches them at the single-file boundary.
//! `GlyphOutOfBounds` is the one non-fatal kind: the glyph extractor collects
//! it per glyph and keeps going.

use std::fmt;

use crate::raster::Rect;
use crate::texture::PixelFormat;

/// Errors produced while decoding an RTPACK / RTTXTR / RTFONT buffer.
#[derive(Debug)]
pub enum DecodeError {
    /// A read or skip would run past the end of the buffer.
    TruncatedData {
        /// Cursor position at which the read was attempted.
        offset: usize,
        /// Number of bytes the read needed.
        needed: usize,
        /// Number of bytes that were left.
        available: usize,
    },
    /// The 6-byte tag is not one we can decode at this point in the stream.
    UnrecognizedFormat {
        /// The raw tag bytes as found.
        tag: [u8; 6],
    },
    /// The texture declares a pixel format other than RGBA-8888.
    UnsupportedPixelFormat(PixelFormat),
    /// Header fields are internally inconsistent.
    MalformedHeader(String),
    /// The raw deflate stream is corrupt or ends early.
    DecompressionFailure(std::io::Error),
    /// A glyph rectangle does not fit inside the atlas.
    GlyphOutOfBounds {
        /// Position of the record in the glyph table.
        index: usize,
        /// Character code the record describes.
        char_code: i32,
        /// The requested crop.
        rect: Rect,
        /// Atlas dimensions as (width, height).
        atlas: (u32, u32),
    },
}

impl DecodeError {
    /// Short, stable name of the error kind. Used in per-file failure lines.
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeError::TruncatedData { .. } => "TruncatedData",
            DecodeError::UnrecognizedFormat { .. } => "UnrecognizedFormat",
            DecodeError::UnsupportedPixelFormat(_) => "UnsupportedPixelFormat",
            DecodeError::MalformedHeader(_) => "MalformedHeader",
            DecodeError::DecompressionFailure(_) => "DecompressionFailure",
            DecodeError::GlyphOutOfBounds { .. } => "GlyphOutOfBounds",
        }
    }

    /// `true` for every kind except `GlyphOutOfBounds`.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DecodeError::GlyphOutOfBounds { .. })
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::TruncatedData {
                offset,
                needed,
                available,
            } => write!(
                f,
                "truncated data at offset {}: needed {} bytes, {} available",
                offset, needed, available
            ),
            DecodeError::UnrecognizedFormat { tag } => {
                write!(f, "unrecognized format tag {:?}", String::from_utf8_lossy(tag))
            }
            DecodeError::UnsupportedPixelFormat(format) => write!(
                f,
                "unsupported pixel format {} ({}), only RGBA-8888 is supported",
                format,
                format.raw()
            ),
            DecodeError::MalformedHeader(reason) => write!(f, "malformed header: {}", reason),
            DecodeError::DecompressionFailure(err) => write!(f, "decompression failed: {}", err),
            DecodeError::GlyphOutOfBounds {
                index,
                char_code,
                rect,
                atlas,
            } => write!(
                f,
                "glyph #{} (char {}) rect {}x{} at ({}, {}) is outside the {}x{} atlas",
                index, char_code, rect.width, rect.height, rect.x, rect.y, atlas.0, atlas.1
            ),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::DecompressionFailure(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias used by all decoder modules.
pub type DecodeResult<T> = Result<T, DecodeError>;
