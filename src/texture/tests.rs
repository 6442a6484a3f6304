// src/texture/tests.rs

use super::*;
use crate::test_support::{argb, two_by_two, TextureSpec};

fn decode_body(body: &[u8]) -> DecodeResult<(TextureAsset, usize)> {
    let mut cursor = ByteCursor::new(body);
    let tex = TextureAsset::decode(&mut cursor)?;
    Ok((tex, cursor.position()))
}

#[test_log::test]
fn decodes_header_fields() {
    let mut spec = TextureSpec::rgba(two_by_two());
    spec.mipmap_count = 3;
    let (tex, _) = decode_body(&spec.body()).unwrap();

    assert_eq!(tex.width, 2);
    assert_eq!(tex.height, 2);
    assert_eq!(tex.original_width, 2);
    assert_eq!(tex.original_height, 2);
    assert_eq!(tex.format, PixelFormat::Rgba8888);
    assert!(tex.uses_alpha);
    assert!(!tex.is_compressed);
    assert_eq!(tex.mipmap_count, 3);
}

#[test_log::test]
fn pixels_keep_their_channels_and_rows_are_flipped() {
    let rows = two_by_two();
    let spec = TextureSpec::rgba(rows.clone());
    let (tex, _) = decode_body(&spec.body()).unwrap();

    for (y, row) in rows.iter().enumerate() {
        for (x, px) in row.iter().enumerate() {
            assert_eq!(
                tex.image.pixel(x as u32, y as u32),
                argb(*px),
                "pixel ({}, {})",
                x,
                y
            );
        }
    }
}

#[test_log::test]
fn row_zero_is_the_last_row_on_disk() {
    // 1 pixel wide, 3 rows; on-disk order is bottom-up.
    let rows = vec![
        vec![[1, 1, 1, 1]],
        vec![[2, 2, 2, 2]],
        vec![[3, 3, 3, 3]],
    ];
    let body = TextureSpec::rgba(rows).body();
    let pixel_block = &body[body.len() - 12..];
    assert_eq!(&pixel_block[..4], &[3, 3, 3, 3], "first on-disk row is the bottom one");

    let (tex, _) = decode_body(&body).unwrap();
    assert_eq!(tex.image.pixel(0, 0), argb([1, 1, 1, 1]));
    assert_eq!(tex.image.pixel(0, 2), argb([3, 3, 3, 3]));
}

#[test_log::test]
fn rgb_textures_are_fully_opaque() {
    let mut spec = TextureSpec::rgba(vec![
        vec![[9, 8, 7, 0x00], [6, 5, 4, 0x12]],
        vec![[3, 2, 1, 0x34], [0, 0, 0, 0x56]],
    ]);
    spec.uses_alpha = false;
    let body = spec.body();
    let (tex, consumed) = decode_body(&body).unwrap();

    assert_eq!(consumed, body.len(), "3 bytes per pixel");
    for &word in tex.image.pixels() {
        assert_eq!(word >> 24, 0xff);
    }
    assert_eq!(tex.image.pixel(0, 0), argb([9, 8, 7, 0xff]));
    assert_eq!(tex.image.pixel(1, 1), argb([0, 0, 0, 0xff]));
}

#[test_log::test]
fn unsupported_format_fails_before_reading_pixels() {
    let mut spec = TextureSpec::rgba(two_by_two());
    spec.format = PixelFormat::RGBA_4444;
    let body = spec.body();

    let mut cursor = ByteCursor::new(&body);
    match TextureAsset::decode(&mut cursor) {
        Err(DecodeError::UnsupportedPixelFormat(format)) => {
            assert_eq!(format, PixelFormat::Rgba4444);
            assert_eq!(format.raw(), 32819);
        }
        other => panic!("expected UnsupportedPixelFormat, got {:?}", other),
    }
    // Lead-in + height + width + format only.
    assert_eq!(cursor.position(), 2 + 4 * 3);
}

#[test_log::test]
fn unknown_format_value_is_reported_raw() {
    let mut spec = TextureSpec::rgba(two_by_two());
    spec.format = 12345;
    let err = decode_body(&spec.body()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnsupportedPixelFormat(PixelFormat::Unknown(12345))
    ));
    assert!(err.to_string().contains("12345"));
}

#[test_log::test]
fn truncated_pixel_block_fails() {
    let body = TextureSpec::rgba(two_by_two()).body();
    let err = decode_body(&body[..body.len() - 1]).unwrap_err();
    assert!(matches!(err, DecodeError::TruncatedData { .. }));
}

#[test_log::test]
fn non_positive_dimensions_are_malformed() {
    let mut spec = TextureSpec::rgba(two_by_two());
    spec.width = 0;
    let err = decode_body(&spec.body()).unwrap_err();
    assert!(matches!(err, DecodeError::MalformedHeader(_)));
}

#[test_log::test]
fn trailing_mip_levels_are_not_consumed() {
    let spec = TextureSpec::rgba(two_by_two());
    let mut body = spec.body();
    let base_len = body.len();
    body.extend_from_slice(&[0xEE; 4]); // a 1x1 mip level
    let (_, consumed) = decode_body(&body).unwrap();
    assert_eq!(consumed, base_len);
}
