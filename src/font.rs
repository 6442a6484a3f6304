// src/font.rs

//! RTFONT bitmap font decoding.
//!
//! Layout after the 6-byte tag:
//!
//! ```text
//! version u8, reserved u8
//! 10 x i16 layout fields
//! 124 reserved bytes
//! (last_char - first_char) glyph records   32 bytes each (30 + 2 pad)
//! kerning_pair_count kerning pairs         6 bytes each  (5 + 1 pad)
//! font_state_count colour states           8 bytes each  (5 + 3 pad)
//! "RTTXTR" + texture body                  the glyph atlas
//! ```
//!
//! The glyph atlas is decoded with `TextureAsset::decode`; slicing it into
//! per-glyph rasters lives in `crate::glyphs`.

use log::{debug, trace};
use serde::{Serialize, Serializer};

use crate::container::AssetTag;
use crate::cursor::ByteCursor;
use crate::error::{DecodeError, DecodeResult};
use crate::raster::{Rect, Rgba};
use crate::texture::TextureAsset;

const HEADER_RESERVED: usize = 124;
const GLYPH_PAD: usize = 2;
const KERNING_PAD: usize = 1;
const STATE_PAD: usize = 3;
/// How far past the expected atlas offset we look for the tag when it is not
/// where the tables say it should be. Only used to make the error useful.
const ANCHOR_SEARCH_WINDOW: usize = 64;

/// One entry of the glyph table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlyphRecord {
    /// Top-left corner of the glyph cell in the atlas.
    pub bmp_pos_x: i16,
    pub bmp_pos_y: i16,
    /// Glyph cell size. `0 x 0` means the character has no bitmap.
    pub size_x: i16,
    pub size_y: i16,
    /// Offset to apply when drawing the cell relative to the pen position.
    pub bmp_offset_x: i16,
    pub bmp_offset_y: i16,
    /// Normalised atlas coordinates of the cell.
    pub u: f32,
    pub v: f32,
    pub u2: f32,
    pub v2: f32,
    pub x_advance: i16,
}

impl GlyphRecord {
    fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let record = GlyphRecord {
            bmp_pos_x: cursor.read_i16()?,
            bmp_pos_y: cursor.read_i16()?,
            size_x: cursor.read_i16()?,
            size_y: cursor.read_i16()?,
            bmp_offset_x: cursor.read_i16()?,
            bmp_offset_y: cursor.read_i16()?,
            u: cursor.read_f32()?,
            v: cursor.read_f32()?,
            u2: cursor.read_f32()?,
            v2: cursor.read_f32()?,
            x_advance: cursor.read_i16()?,
        };
        cursor.skip(GLYPH_PAD)?;
        Ok(record)
    }

    /// `true` for records without a visual glyph (space and friends).
    pub fn is_blank(&self) -> bool {
        self.size_x == 0 && self.size_y == 0
    }

    /// The glyph cell in atlas pixel space.
    pub fn atlas_rect(&self) -> Rect {
        Rect::new(
            self.bmp_pos_x.into(),
            self.bmp_pos_y.into(),
            self.size_x.into(),
            self.size_y.into(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KerningPair {
    pub first: i16,
    pub second: i16,
    /// Stored as a raw byte in the file.
    pub amount: u8,
}

impl KerningPair {
    fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let pair = KerningPair {
            first: cursor.read_i16()?,
            second: cursor.read_i16()?,
            amount: cursor.read_u8()?,
        };
        cursor.skip(KERNING_PAD)?;
        Ok(pair)
    }
}

/// A colour the renderer switches to when it meets `trigger` in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FontColorState {
    /// Packed ARGB word.
    #[serde(serialize_with = "serialize_argb")]
    pub color: u32,
    pub trigger: char,
}

impl FontColorState {
    fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let [r, g, b, a] = cursor.read_array::<4>()?;
        let trigger_byte = cursor.read_u8()?;
        cursor.skip(STATE_PAD)?;
        // Non-ASCII bytes decode to '?', as an ASCII text decoder would.
        let trigger = if trigger_byte.is_ascii() {
            trigger_byte as char
        } else {
            '?'
        };
        Ok(FontColorState {
            color: Rgba::new(r, g, b, a).to_argb(),
            trigger,
        })
    }

    pub fn rgba(&self) -> Rgba {
        Rgba::from_argb(self.color)
    }
}

fn serialize_argb<S: Serializer>(color: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("#{:08X}", color))
}

/// A decoded RTFONT: layout metrics, glyph/kerning/colour tables and the atlas.
#[derive(Debug, Clone)]
pub struct FontAsset {
    pub version: u8,
    pub char_spacing: i16,
    pub line_height: i16,
    pub line_spacing: i16,
    pub shadow_x_offset: i16,
    pub shadow_y_offset: i16,
    pub first_char: i16,
    pub last_char: i16,
    pub blank_char_width: i16,
    /// One record per character code in `first_char..last_char`.
    pub glyphs: Vec<GlyphRecord>,
    pub kerning_pairs: Vec<KerningPair>,
    pub color_states: Vec<FontColorState>,
    pub atlas: TextureAsset,
}

/// Everything in a `FontAsset` except the atlas pixels, for the JSON sidecar.
#[derive(Debug, Serialize)]
pub struct FontMetadata<'a> {
    pub version: u8,
    pub char_spacing: i16,
    pub line_height: i16,
    pub line_spacing: i16,
    pub shadow_x_offset: i16,
    pub shadow_y_offset: i16,
    pub first_char: i16,
    pub last_char: i16,
    pub blank_char_width: i16,
    pub atlas_width: i32,
    pub atlas_height: i32,
    pub glyphs: &'a [GlyphRecord],
    pub kerning_pairs: &'a [KerningPair],
    pub color_states: &'a [FontColorState],
}

/// Counts read from the RTFONT header, validated before any table is read.
struct TableCounts {
    glyphs: usize,
    kerning_pairs: usize,
    color_states: usize,
}

impl TableCounts {
    fn validate(
        first_char: i16,
        last_char: i16,
        font_state_count: i16,
        kerning_pair_count: i16,
    ) -> DecodeResult<Self> {
        let glyphs = i32::from(last_char) - i32::from(first_char);
        if glyphs < 0 {
            return Err(DecodeError::MalformedHeader(format!(
                "last char {} precedes first char {}",
                last_char, first_char
            )));
        }
        if font_state_count < 0 {
            return Err(DecodeError::MalformedHeader(format!(
                "negative font state count {}",
                font_state_count
            )));
        }
        if kerning_pair_count < 0 {
            return Err(DecodeError::MalformedHeader(format!(
                "negative kerning pair count {}",
                kerning_pair_count
            )));
        }
        Ok(TableCounts {
            glyphs: glyphs as usize,
            kerning_pairs: kerning_pair_count as usize,
            color_states: font_state_count as usize,
        })
    }
}

impl FontAsset {
    /// Decodes a font body. `cursor` must sit right after the 6-byte tag.
    pub fn decode(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let version = cursor.read_u8()?;
        let _reserved = cursor.read_u8()?;

        let char_spacing = cursor.read_i16()?;
        let line_height = cursor.read_i16()?;
        let line_spacing = cursor.read_i16()?;
        let shadow_x_offset = cursor.read_i16()?;
        let shadow_y_offset = cursor.read_i16()?;
        let first_char = cursor.read_i16()?;
        let last_char = cursor.read_i16()?;
        let blank_char_width = cursor.read_i16()?;
        let font_state_count = cursor.read_i16()?;
        let kerning_pair_count = cursor.read_i16()?;
        cursor.skip(HEADER_RESERVED)?;

        debug!(
            "Font v{}: chars {}..{}, line height {}, {} kerning pair(s), {} colour state(s)",
            version, first_char, last_char, line_height, kerning_pair_count, font_state_count
        );

        let counts =
            TableCounts::validate(first_char, last_char, font_state_count, kerning_pair_count)?;

        let glyphs = read_table(cursor, counts.glyphs, GlyphRecord::read)?;
        debug!("Parsed {} characters.", glyphs.len());

        let kerning_pairs = read_table(cursor, counts.kerning_pairs, KerningPair::read)?;
        let color_states = read_table(cursor, counts.color_states, FontColorState::read)?;
        for state in &color_states {
            let c = state.rgba();
            debug!(
                "Colour state {}|A:{},R:{},G:{},B:{}",
                state.trigger, c.a, c.r, c.g, c.b
            );
        }

        expect_atlas_tag(cursor)?;
        let atlas = TextureAsset::decode(cursor)?;

        Ok(FontAsset {
            version,
            char_spacing,
            line_height,
            line_spacing,
            shadow_x_offset,
            shadow_y_offset,
            first_char,
            last_char,
            blank_char_width,
            glyphs,
            kerning_pairs,
            color_states,
            atlas,
        })
    }

    /// Character code described by the glyph record at `index`.
    pub fn char_code(&self, index: usize) -> i32 {
        i32::from(self.first_char) + index as i32
    }

    pub fn metadata(&self) -> FontMetadata<'_> {
        FontMetadata {
            version: self.version,
            char_spacing: self.char_spacing,
            line_height: self.line_height,
            line_spacing: self.line_spacing,
            shadow_x_offset: self.shadow_x_offset,
            shadow_y_offset: self.shadow_y_offset,
            first_char: self.first_char,
            last_char: self.last_char,
            blank_char_width: self.blank_char_width,
            atlas_width: self.atlas.width,
            atlas_height: self.atlas.height,
            glyphs: &self.glyphs,
            kerning_pairs: &self.kerning_pairs,
            color_states: &self.color_states,
        }
    }
}

/// Reads `count` fixed-size entries. Capacity is capped by the bytes left so
/// a corrupt count can't reserve more than the input could hold.
fn read_table<'a, T>(
    cursor: &mut ByteCursor<'a>,
    count: usize,
    read: impl Fn(&mut ByteCursor<'a>) -> DecodeResult<T>,
) -> DecodeResult<Vec<T>> {
    let mut out = Vec::with_capacity(count.min(cursor.remaining()));
    for _ in 0..count {
        out.push(read(cursor)?);
    }
    trace!("read_table: {} entries, cursor now at {}", count, cursor.position());
    Ok(out)
}

/// Consumes the `RTTXTR` tag that must follow the colour-state table.
///
/// The fixed-size tables are the only thing locating the atlas, so a missing
/// tag means the tables were mis-sized. Fail loudly instead of decoding the
/// atlas from the wrong offset.
fn expect_atlas_tag(cursor: &mut ByteCursor<'_>) -> DecodeResult<()> {
    let expected_at = cursor.position();
    let tag = cursor.read_tag()?;
    if AssetTag::from_bytes(&tag) == Some(AssetTag::Texture) {
        return Ok(());
    }

    let window_start = expected_at + 1;
    let window = &cursor.remaining_slice()[..cursor.remaining().min(ANCHOR_SEARCH_WINDOW)];
    let mut haystack = tag[1..].to_vec();
    haystack.extend_from_slice(window);
    let found = haystack
        .windows(AssetTag::LEN)
        .position(|w| w == AssetTag::Texture.as_bytes())
        .map(|delta| window_start + delta);

    Err(DecodeError::MalformedHeader(match found {
        Some(at) => format!(
            "atlas tag expected at offset {} but found at offset {} ({} byte(s) later)",
            expected_at,
            at,
            at - expected_at
        ),
        None => format!(
            "atlas tag expected at offset {}, found {:?} and no tag within the next {} bytes",
            expected_at,
            String::from_utf8_lossy(&tag),
            ANCHOR_SEARCH_WINDOW
        ),
    }))
}
