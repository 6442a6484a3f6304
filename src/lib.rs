// src/lib.rs

//! Decoders for the RTPACK game-asset container and the RTTXTR textures and
//! RTFONT bitmap fonts it wraps, plus the file-level driver that turns them
//! into PNG images.
//!
//! ```text
//! bytes -> container::decode -> Asset::Texture(TextureAsset)
//!                             -> Asset::Font(FontAsset) -> glyphs::extract_glyphs
//! ```

pub mod config;
pub mod container;
pub mod convert;
pub mod cursor;
pub mod decompress;
pub mod error;
pub mod font;
pub mod glyphs;
pub mod raster;
pub mod texture;

#[cfg(test)]
mod test_support;
