// src/container.rs

//! Top-level dispatch on the 6-byte format tag.
//!
//! A file is either a bare asset (`RTTXTR` texture, `RTFONT` font) or an
//! `RTPACK` container wrapping exactly one of them, optionally deflated:
//!
//! ```text
//! "RTPACK" version u8, reserved u8,
//!          compressed_size u32, decompressed_size u32,
//!          compression u8 (0 = none, 1 = zlib), 15 reserved bytes,
//!          2-byte zlib stream marker (discarded)
//! payload  "RTTXTR"... | "RTFONT"...   (raw deflate when compression = 1)
//! ```

use std::fmt;

use log::{debug, warn};

use crate::cursor::ByteCursor;
use crate::decompress::inflate_raw;
use crate::error::{DecodeError, DecodeResult};
use crate::font::FontAsset;
use crate::texture::TextureAsset;

const PACK_RESERVED: usize = 15;
/// zlib CMF/FLG bytes in front of the deflate stream. Never handed to the inflater.
const STREAM_MARKER: usize = 2;

/// The recognised 6-byte tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetTag {
    Texture,
    Font,
    Pack,
}

impl AssetTag {
    pub const LEN: usize = 6;

    pub fn from_bytes(tag: &[u8]) -> Option<Self> {
        match tag {
            b"RTTXTR" => Some(AssetTag::Texture),
            b"RTFONT" => Some(AssetTag::Font),
            b"RTPACK" => Some(AssetTag::Pack),
            _ => None,
        }
    }

    pub fn as_bytes(self) -> &'static [u8; 6] {
        match self {
            AssetTag::Texture => b"RTTXTR",
            AssetTag::Font => b"RTFONT",
            AssetTag::Pack => b"RTPACK",
        }
    }

    /// Reads a tag, failing with `UnrecognizedFormat` for anything unknown.
    fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let raw = cursor.read_tag()?;
        AssetTag::from_bytes(&raw).ok_or(DecodeError::UnrecognizedFormat { tag: raw })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Zlib,
}

impl CompressionType {
    fn from_raw(raw: u8) -> DecodeResult<Self> {
        match raw {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zlib),
            other => Err(DecodeError::MalformedHeader(format!(
                "unknown compression type {}",
                other
            ))),
        }
    }
}

impl fmt::Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionType::None => f.write_str("none"),
            CompressionType::Zlib => f.write_str("zlib"),
        }
    }
}

/// Fields of the RTPACK header. The two sizes are informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    pub version: u8,
    pub compressed_size: u32,
    pub decompressed_size: u32,
    pub compression: CompressionType,
}

impl PackHeader {
    /// Reads the header and the stream marker. `cursor` must sit right after
    /// the tag; on return it points at the first payload byte.
    fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let version = cursor.read_u8()?;
        let _reserved = cursor.read_u8()?;
        let compressed_size = cursor.read_u32()?;
        let decompressed_size = cursor.read_u32()?;
        let compression = CompressionType::from_raw(cursor.read_u8()?)?;
        cursor.skip(PACK_RESERVED)?;
        cursor.skip(STREAM_MARKER)?;

        debug!("-> Compressed Size : {}", format_byte_size(u64::from(compressed_size)));
        debug!("-> Decompressed Size : {}", format_byte_size(u64::from(decompressed_size)));
        debug!("-> Compression Type : {}", compression);

        Ok(PackHeader {
            version,
            compressed_size,
            decompressed_size,
            compression,
        })
    }
}

/// A decoded asset, whichever kind the tag selected.
#[derive(Debug, Clone)]
pub enum Asset {
    Texture(TextureAsset),
    Font(FontAsset),
}

impl Asset {
    pub fn kind(&self) -> &'static str {
        match self {
            Asset::Texture(_) => "texture",
            Asset::Font(_) => "font",
        }
    }
}

/// The result of decoding one file.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub asset: Asset,
    /// Present when the file was an RTPACK container.
    pub pack: Option<PackHeader>,
    /// The inflated payload of a compressed container, kept only on request.
    pub inflated: Option<Vec<u8>>,
}

/// Decodes a whole file buffer: bare asset or RTPACK container.
pub fn decode(bytes: &[u8]) -> DecodeResult<DecodedFile> {
    decode_with(bytes, false)
}

/// Like [`decode`], but hands back the inflated payload of a compressed pack
/// in `DecodedFile::inflated` when `keep_inflated` is set. Otherwise the
/// payload is dropped as soon as the asset is decoded.
pub fn decode_with(bytes: &[u8], keep_inflated: bool) -> DecodeResult<DecodedFile> {
    let mut cursor = ByteCursor::new(bytes);
    match AssetTag::read(&mut cursor)? {
        AssetTag::Pack => {
            let header = PackHeader::read(&mut cursor)?;
            match header.compression {
                CompressionType::None => {
                    debug!("Uncompressed pack, payload is {} bytes", cursor.remaining());
                    let asset = decode_packed_asset(cursor.remaining_slice())?;
                    Ok(DecodedFile {
                        asset,
                        pack: Some(header),
                        inflated: None,
                    })
                }
                CompressionType::Zlib => {
                    debug!("Decompressing..");
                    let payload = inflate_raw(cursor.remaining_slice())?;
                    if payload.len() != header.decompressed_size as usize {
                        warn!(
                            "Pack declares {} decompressed bytes but the stream produced {}",
                            header.decompressed_size,
                            payload.len()
                        );
                    }
                    let asset = decode_packed_asset(&payload)?;
                    Ok(DecodedFile {
                        asset,
                        pack: Some(header),
                        inflated: keep_inflated.then_some(payload),
                    })
                }
            }
        }
        tag => {
            debug!("Uncompressed {} file detected.", tag_name(tag));
            let asset = decode_tagged_body(tag, &mut cursor)?;
            Ok(DecodedFile {
                asset,
                pack: None,
                inflated: None,
            })
        }
    }
}

/// Decodes the payload of a pack. Nested packs are not a defined case.
fn decode_packed_asset(payload: &[u8]) -> DecodeResult<Asset> {
    let mut cursor = ByteCursor::new(payload);
    let tag = AssetTag::read(&mut cursor)?;
    debug!("{} detected inside pack.", tag_name(tag));
    decode_tagged_body(tag, &mut cursor)
}

fn decode_tagged_body(tag: AssetTag, cursor: &mut ByteCursor<'_>) -> DecodeResult<Asset> {
    match tag {
        AssetTag::Texture => Ok(Asset::Texture(TextureAsset::decode(cursor)?)),
        AssetTag::Font => Ok(Asset::Font(FontAsset::decode(cursor)?)),
        AssetTag::Pack => Err(DecodeError::UnrecognizedFormat {
            tag: *AssetTag::Pack.as_bytes(),
        }),
    }
}

fn tag_name(tag: AssetTag) -> &'static str {
    match tag {
        AssetTag::Texture => "Texture (RTTXTR/rttex)",
        AssetTag::Font => "Font (RTFONT/rtfont)",
        AssetTag::Pack => "Pack (RTPACK)",
    }
}

/// Formats a byte count with binary units and one decimal: `1536` -> `1.5KB`.
pub fn format_byte_size(bytes: u64) -> String {
    const SUFFIXES: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut place = 0;
    while place + 1 < SUFFIXES.len() && bytes >> (10 * (place + 1)) > 0 {
        place += 1;
    }
    let scaled = bytes as f64 / (1u64 << (10 * place)) as f64;
    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}{}", rounded as u64, SUFFIXES[place])
    } else {
        format!("{:.1}{}", rounded, SUFFIXES[place])
    }
}

#[cfg(test)]
mod tests;
