// src/glyphs.rs

//! Slicing a decoded font atlas into one raster per glyph.

use log::debug;

use crate::error::DecodeError;
use crate::font::FontAsset;
use crate::raster::RasterImage;

/// One glyph cropped out of the atlas.
#[derive(Debug, Clone)]
pub struct ExtractedGlyph {
    /// 1-based count of emitted glyphs; used for output naming.
    pub ordinal: usize,
    /// Position of the record in the glyph table.
    pub index: usize,
    pub char_code: i32,
    pub image: RasterImage,
}

/// Result of slicing an atlas. Failures don't stop extraction, so both lists
/// can be non-empty.
#[derive(Debug, Default)]
pub struct GlyphExtraction {
    pub glyphs: Vec<ExtractedGlyph>,
    /// Every entry is a `DecodeError::GlyphOutOfBounds`.
    pub failures: Vec<DecodeError>,
    /// Records skipped because they have no bitmap (0 x 0).
    pub blank: usize,
}

/// Crops every non-blank glyph of `font` out of its atlas, in table order.
pub fn extract_glyphs(font: &FontAsset) -> GlyphExtraction {
    let atlas = &font.atlas.image;
    let mut out = GlyphExtraction::default();

    for (index, record) in font.glyphs.iter().enumerate() {
        if record.is_blank() {
            out.blank += 1;
            continue;
        }

        let rect = record.atlas_rect();
        let char_code = font.char_code(index);
        match atlas.crop(rect) {
            Some(image) => out.glyphs.push(ExtractedGlyph {
                ordinal: out.glyphs.len() + 1,
                index,
                char_code,
                image,
            }),
            None => {
                let err = DecodeError::GlyphOutOfBounds {
                    index,
                    char_code,
                    rect,
                    atlas: (atlas.width(), atlas.height()),
                };
                debug!("Skipping glyph: {}", err);
                out.failures.push(err);
            }
        }
    }

    debug!(
        "Extracted {} glyph(s), {} blank, {} out of bounds",
        out.glyphs.len(),
        out.blank,
        out.failures.len()
    );
    out
}
