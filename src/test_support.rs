// src/test_support.rs

//! Builders for synthetic RTTXTR / RTFONT / RTPACK buffers used by the tests.

use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::texture::PixelFormat;

/// Describes a texture to serialise. `rows` are given top-down, the way the
/// decoded raster should look; `body()` writes them bottom-up like the format.
pub struct TextureSpec {
    pub width: i32,
    pub height: i32,
    pub format: i32,
    pub uses_alpha: bool,
    pub mipmap_count: i32,
    /// Top-down rows of RGBA quadruples.
    pub rows: Vec<Vec<[u8; 4]>>,
}

impl TextureSpec {
    pub fn rgba(rows: Vec<Vec<[u8; 4]>>) -> Self {
        TextureSpec {
            width: rows.first().map_or(0, |r| r.len() as i32),
            height: rows.len() as i32,
            format: PixelFormat::RGBA_8888,
            uses_alpha: true,
            mipmap_count: 1,
            rows,
        }
    }

    /// RTTXTR body without the 6-byte tag.
    pub fn body(&self) -> Vec<u8> {
        let mut out = vec![0u8; 2];
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.format.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.width.to_le_bytes());
        out.push(self.uses_alpha as u8);
        out.push(0);
        out.extend_from_slice(&0i16.to_le_bytes());
        out.extend_from_slice(&self.mipmap_count.to_le_bytes());
        out.extend_from_slice(&[0u8; 16 * 4]);
        out.extend_from_slice(&[0u8; 24]);
        for row in self.rows.iter().rev() {
            for px in row {
                if self.uses_alpha {
                    out.extend_from_slice(px);
                } else {
                    out.extend_from_slice(&px[..3]);
                }
            }
        }
        out
    }

    /// Full RTTXTR file.
    pub fn file(&self) -> Vec<u8> {
        let mut out = b"RTTXTR".to_vec();
        out.extend(self.body());
        out
    }
}

/// One glyph table entry.
#[derive(Clone, Copy, Default)]
pub struct GlyphSpec {
    pub x: i16,
    pub y: i16,
    pub w: i16,
    pub h: i16,
    pub x_advance: i16,
}

impl GlyphSpec {
    pub fn at(x: i16, y: i16, w: i16, h: i16) -> Self {
        GlyphSpec {
            x,
            y,
            w,
            h,
            x_advance: w,
        }
    }
}

pub struct FontSpec {
    pub first_char: i16,
    pub glyphs: Vec<GlyphSpec>,
    pub kerning: Vec<(i16, i16, u8)>,
    /// (r, g, b, a, trigger)
    pub states: Vec<([u8; 4], u8)>,
    pub atlas: TextureSpec,
    /// Extra bytes inserted between the colour states and the atlas tag.
    pub misalign: usize,
}

impl FontSpec {
    pub fn new(first_char: i16, glyphs: Vec<GlyphSpec>, atlas: TextureSpec) -> Self {
        FontSpec {
            first_char,
            glyphs,
            kerning: Vec::new(),
            states: Vec::new(),
            atlas,
            misalign: 0,
        }
    }

    pub fn last_char(&self) -> i16 {
        self.first_char + self.glyphs.len() as i16
    }

    /// Everything from the version byte up to (not including) the colour states.
    pub fn header_and_tables(&self) -> Vec<u8> {
        let mut out = vec![1u8, 0];
        let fields: [i16; 10] = [
            2,  // char spacing
            16, // line height
            18, // line spacing
            1,  // shadow x
            1,  // shadow y
            self.first_char,
            self.last_char(),
            4, // blank char width
            self.states.len() as i16,
            self.kerning.len() as i16,
        ];
        for f in fields {
            out.extend_from_slice(&f.to_le_bytes());
        }
        out.extend_from_slice(&[0u8; 124]);
        for g in &self.glyphs {
            for v in [g.x, g.y, g.w, g.h, 0, 0] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            for v in [0.0f32, 0.0, 0.5, 0.5] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            out.extend_from_slice(&g.x_advance.to_le_bytes());
            out.extend_from_slice(&[0u8; 2]);
        }
        for &(first, second, amount) in &self.kerning {
            out.extend_from_slice(&first.to_le_bytes());
            out.extend_from_slice(&second.to_le_bytes());
            out.push(amount);
            out.push(0);
        }
        out
    }

    /// RTFONT body without the leading 6-byte tag.
    pub fn body(&self) -> Vec<u8> {
        let mut out = self.header_and_tables();
        for &(rgba, trigger) in &self.states {
            out.extend_from_slice(&rgba);
            out.push(trigger);
            out.extend_from_slice(&[0u8; 3]);
        }
        out.extend(std::iter::repeat(0xAAu8).take(self.misalign));
        out.extend(self.atlas.file());
        out
    }

    pub fn file(&self) -> Vec<u8> {
        let mut out = b"RTFONT".to_vec();
        out.extend(self.body());
        out
    }
}

/// Wraps `payload` (a complete RTTXTR/RTFONT file) in an RTPACK container.
pub fn rtpack(payload: &[u8], compression: u8) -> Vec<u8> {
    let body = if compression == 1 {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(payload).unwrap();
        encoder.finish().unwrap()
    } else {
        payload.to_vec()
    };

    let mut out = b"RTPACK".to_vec();
    out.push(0); // version
    out.push(0); // reserved
    out.extend_from_slice(&((body.len() + 2) as u32).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.push(compression);
    out.extend_from_slice(&[0u8; 15]);
    out.extend_from_slice(&[0x78, 0x9c]);
    out.extend(body);
    out
}

/// Four distinct pixels in a 2x2 grid, top-down.
pub fn two_by_two() -> Vec<Vec<[u8; 4]>> {
    vec![
        vec![[0x10, 0x20, 0x30, 0x40], [0x50, 0x60, 0x70, 0x80]],
        vec![[0x90, 0xa0, 0xb0, 0xc0], [0xd0, 0xe0, 0xf0, 0xff]],
    ]
}

/// Packs an RGBA quadruple into the raster's ARGB word.
pub fn argb(px: [u8; 4]) -> u32 {
    crate::raster::Rgba::new(px[0], px[1], px[2], px[3]).to_argb()
}
