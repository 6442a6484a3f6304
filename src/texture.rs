// src/texture.rs

//! RTTXTR texture decoding.
//!
//! An RTTXTR body is a fixed 118-byte header followed by the level-0 pixel
//! block. Pixels are stored bottom row first; `TextureAsset::decode` flips
//! them so row 0 of the resulting `RasterImage` is the top of the image.

use std::fmt;

use log::{debug, trace};

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};
use crate::raster::{RasterImage, Rgba};

/// Bytes between the tag and the `height` field.
const HEADER_LEAD_IN: usize = 2;
/// Reserved `i32` slots after the mipmap count.
const RESERVED_SLOTS: usize = 16;
/// Reserved tail of the header, right before the pixel block.
const HEADER_TAIL: usize = 24;

/// GL pixel format codes a texture header can declare.
///
/// Only `Rgba8888` is decodable; the others are named so error messages can
/// say what the file actually contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// `GL_UNSIGNED_BYTE`, 4 bytes per pixel.
    Rgba8888,
    /// `GL_UNSIGNED_SHORT_4_4_4_4`.
    Rgba4444,
    /// `GL_UNSIGNED_SHORT_5_6_5`.
    Rgb565,
    PvrtcRgb4Bpp,
    PvrtcRgb2Bpp,
    PvrtcRgba4Bpp,
    PvrtcRgba2Bpp,
    /// The body is an embedded file (jpg/png) rather than raw pixels.
    EmbeddedFile,
    Unknown(i32),
}

impl PixelFormat {
    pub const RGBA_8888: i32 = 5121;
    pub const RGBA_4444: i32 = 32819;
    pub const RGB_565: i32 = 33635;
    pub const PVRTC_RGB_4BPP: i32 = 0x8C00;
    pub const PVRTC_RGB_2BPP: i32 = 0x8C01;
    pub const PVRTC_RGBA_4BPP: i32 = 0x8C02;
    pub const PVRTC_RGBA_2BPP: i32 = 0x8C03;
    pub const EMBEDDED_FILE: i32 = 20_000_000;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::RGBA_8888 => PixelFormat::Rgba8888,
            Self::RGBA_4444 => PixelFormat::Rgba4444,
            Self::RGB_565 => PixelFormat::Rgb565,
            Self::PVRTC_RGB_4BPP => PixelFormat::PvrtcRgb4Bpp,
            Self::PVRTC_RGB_2BPP => PixelFormat::PvrtcRgb2Bpp,
            Self::PVRTC_RGBA_4BPP => PixelFormat::PvrtcRgba4Bpp,
            Self::PVRTC_RGBA_2BPP => PixelFormat::PvrtcRgba2Bpp,
            Self::EMBEDDED_FILE => PixelFormat::EmbeddedFile,
            other => PixelFormat::Unknown(other),
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            PixelFormat::Rgba8888 => Self::RGBA_8888,
            PixelFormat::Rgba4444 => Self::RGBA_4444,
            PixelFormat::Rgb565 => Self::RGB_565,
            PixelFormat::PvrtcRgb4Bpp => Self::PVRTC_RGB_4BPP,
            PixelFormat::PvrtcRgb2Bpp => Self::PVRTC_RGB_2BPP,
            PixelFormat::PvrtcRgba4Bpp => Self::PVRTC_RGBA_4BPP,
            PixelFormat::PvrtcRgba2Bpp => Self::PVRTC_RGBA_2BPP,
            PixelFormat::EmbeddedFile => Self::EMBEDDED_FILE,
            PixelFormat::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Rgba8888 => "RGBA-8888",
            PixelFormat::Rgba4444 => "RGBA-4444",
            PixelFormat::Rgb565 => "RGB-565",
            PixelFormat::PvrtcRgb4Bpp => "PVRTC RGB 4bpp",
            PixelFormat::PvrtcRgb2Bpp => "PVRTC RGB 2bpp",
            PixelFormat::PvrtcRgba4Bpp => "PVRTC RGBA 4bpp",
            PixelFormat::PvrtcRgba2Bpp => "PVRTC RGBA 2bpp",
            PixelFormat::EmbeddedFile => "embedded file",
            PixelFormat::Unknown(_) => "unknown",
        };
        f.write_str(name)
    }
}

/// A decoded RTTXTR texture: header fields plus the level-0 raster.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub height: i32,
    pub width: i32,
    pub format: PixelFormat,
    /// Size before the texture was padded/scaled for upload.
    pub original_height: i32,
    pub original_width: i32,
    pub uses_alpha: bool,
    pub is_compressed: bool,
    pub reserved_flags: i16,
    /// Declared mip levels. Only the base level is decoded.
    pub mipmap_count: i32,
    pub image: RasterImage,
}

impl TextureAsset {
    /// Decodes a texture body. `cursor` must sit right after the 6-byte tag.
    ///
    /// The format check happens before any pixel byte is read.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let header_start = cursor.position();
        cursor.skip(HEADER_LEAD_IN)?;

        let height = cursor.read_i32()?;
        let width = cursor.read_i32()?;
        let raw_format = cursor.read_i32()?;
        debug!("Texture: {}x{} (w x h), format {}", width, height, raw_format);

        let format = PixelFormat::from_raw(raw_format);
        if format != PixelFormat::Rgba8888 {
            return Err(DecodeError::UnsupportedPixelFormat(format));
        }

        let original_height = cursor.read_i32()?;
        let original_width = cursor.read_i32()?;
        let uses_alpha = cursor.read_u8()? == 1;
        let is_compressed = cursor.read_u8()? == 1;
        let reserved_flags = cursor.read_i16()?;
        let mipmap_count = cursor.read_i32()?;
        cursor.skip(RESERVED_SLOTS * 4)?;
        cursor.skip(HEADER_TAIL)?;

        debug!(
            "Texture: original {}x{}, alpha {}, compressed {}, {} mip level(s)",
            original_width, original_height, uses_alpha, is_compressed, mipmap_count
        );
        trace!(
            "Texture: header occupied {} bytes",
            cursor.position() - header_start
        );

        if width <= 0 || height <= 0 {
            return Err(DecodeError::MalformedHeader(format!(
                "texture dimensions {}x{} must both be positive",
                width, height
            )));
        }

        let image = read_pixels(cursor, width as u32, height as u32, uses_alpha)?;

        Ok(TextureAsset {
            height,
            width,
            format,
            original_height,
            original_width,
            uses_alpha,
            is_compressed,
            reserved_flags,
            mipmap_count,
            image,
        })
    }
}

/// Reads `width * height` pixels stored bottom-up and returns them top-down.
fn read_pixels(
    cursor: &mut ByteCursor<'_>,
    width: u32,
    height: u32,
    uses_alpha: bool,
) -> DecodeResult<RasterImage> {
    let bytes_per_pixel: usize = if uses_alpha { 4 } else { 3 };
    let row_bytes = width as usize * bytes_per_pixel;
    let total = row_bytes
        .checked_mul(height as usize)
        .ok_or_else(|| {
            DecodeError::MalformedHeader(format!("texture {}x{} is too large", width, height))
        })?;

    // Bounds-check the whole block before allocating the raster.
    let block = cursor.read_bytes(total)?;
    let mut image = RasterImage::new(width, height);

    // On disk the first row is the bottom one.
    for (disk_row, src) in block.chunks_exact(row_bytes).enumerate() {
        let y = height - 1 - disk_row as u32;
        let dst = image.row_mut(y);
        for (out, px) in dst.iter_mut().zip(src.chunks_exact(bytes_per_pixel)) {
            let color = if uses_alpha {
                Rgba::new(px[0], px[1], px[2], px[3])
            } else {
                Rgba::opaque(px[0], px[1], px[2])
            };
            *out = color.to_argb();
        }
    }

    Ok(image)
}

#[cfg(test)]
mod tests;
