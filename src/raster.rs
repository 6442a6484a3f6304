// src/raster.rs

//! Owned RGBA rasters produced by the decoders.
//!
//! Pixels are kept as packed 32-bit ARGB words (alpha in the high byte, then
//! red, green, blue), row-major with the origin at the top-left. The buffer is
//! fully materialised by the decoder; conversion into an `image::RgbaImage`
//! happens only at the output boundary, right before encoding to PNG.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;

/// RGBA color in 32-bit format (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Packs into an ARGB word: bits [31:24]=A, [23:16]=R, [15:8]=G, [7:0]=B.
    pub const fn to_argb(self) -> u32 {
        (self.a as u32) << 24 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    pub const fn from_argb(word: u32) -> Self {
        Self {
            a: (word >> 24) as u8,
            r: (word >> 16) as u8,
            g: (word >> 8) as u8,
            b: word as u8,
        }
    }

    /// Convert to RGBA byte array
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// An axis-aligned rectangle in atlas pixel space, as stored in glyph records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `true` when the rectangle has positive area and lies entirely within
    /// a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (i64::from(width), i64::from(height));
        self.x >= 0
            && self.y >= 0
            && self.width > 0
            && self.height > 0
            && i64::from(self.x) + i64::from(self.width) <= w
            && i64::from(self.y) + i64::from(self.height) <= h
    }
}

/// A decoded image: dimensions plus one packed ARGB word per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl RasterImage {
    /// Creates a fully transparent black raster. Both dimensions must be
    /// non-zero; callers validate this before allocating.
    pub fn new(width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Wraps an existing buffer. Returns `None` if its length does not match
    /// the dimensions.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Packed ARGB word at (x, y). Panics on out-of-range coordinates.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.index(x, y)]
    }

    /// Mutable view of one row, used by the texture decoder to fill rows in
    /// on-disk order.
    pub fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let start = self.index(0, y);
        let end = start + self.width as usize;
        &mut self.pixels[start..end]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside {}x{} raster",
            x,
            y,
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    /// Copies `rect` into a new raster. Returns `None` when the rectangle is
    /// empty or does not fit.
    pub fn crop(&self, rect: Rect) -> Option<Self> {
        if !rect.fits_within(self.width, self.height) {
            return None;
        }
        let (x0, y0) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        let stride = self.width as usize;

        let mut pixels = Vec::with_capacity(w * h);
        for row in y0..y0 + h {
            let start = row * stride + x0;
            pixels.extend_from_slice(&self.pixels[start..start + w]);
        }
        Some(Self {
            width: rect.width as u32,
            height: rect.height as u32,
            pixels,
        })
    }

    /// Unpacks into an `image` crate buffer with R, G, B, A byte order.
    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let bytes: Vec<u8> = self
            .pixels
            .iter()
            .flat_map(|&word| Rgba::from_argb(word).to_bytes())
            .collect();
        RgbaImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{}", self.width, self.height))
    }

    /// Encodes the raster as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.to_rgba_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write PNG {}", path.display()))
    }
}
