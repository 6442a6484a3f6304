// src/container/tests.rs

use super::*;
use crate::test_support::{argb, rtpack, two_by_two, FontSpec, GlyphSpec, TextureSpec};

fn expect_texture(decoded: DecodedFile) -> TextureAsset {
    match decoded.asset {
        Asset::Texture(tex) => tex,
        other => panic!("expected a texture, got a {}", other.kind()),
    }
}

fn assert_two_by_two(tex: &TextureAsset) {
    let rows = two_by_two();
    assert_eq!(tex.image.width(), 2);
    assert_eq!(tex.image.height(), 2);
    assert_eq!(tex.image.pixel(0, 0), argb(rows[0][0]));
    assert_eq!(tex.image.pixel(1, 0), argb(rows[0][1]));
    assert_eq!(tex.image.pixel(0, 1), argb(rows[1][0]));
    assert_eq!(tex.image.pixel(1, 1), argb(rows[1][1]));
}

#[test_log::test]
fn bare_texture_decodes() {
    let file = TextureSpec::rgba(two_by_two()).file();
    let decoded = decode(&file).unwrap();
    assert!(decoded.pack.is_none());
    assert_two_by_two(&expect_texture(decoded));
}

#[test_log::test]
fn uncompressed_pack_decodes_with_flip() {
    let inner = TextureSpec::rgba(two_by_two()).file();
    let file = rtpack(&inner, 0);
    let decoded = decode(&file).unwrap();

    let header = decoded.pack.unwrap();
    assert_eq!(header.compression, CompressionType::None);
    assert!(decoded.inflated.is_none());
    assert_two_by_two(&expect_texture(decoded));
}

#[test_log::test]
fn zlib_pack_decodes_like_the_uncompressed_one() {
    let inner = TextureSpec::rgba(two_by_two()).file();
    let plain = expect_texture(decode(&rtpack(&inner, 0)).unwrap());

    let decoded = decode(&rtpack(&inner, 1)).unwrap();
    assert_eq!(decoded.pack.unwrap().compression, CompressionType::Zlib);
    assert!(decoded.inflated.is_none(), "payload is dropped unless asked for");

    let packed = expect_texture(decoded);
    assert_eq!(packed.image, plain.image);
    assert_two_by_two(&packed);
}

#[test_log::test]
fn inflated_payload_is_kept_on_request() {
    let inner = TextureSpec::rgba(two_by_two()).file();
    let decoded = decode_with(&rtpack(&inner, 1), true).unwrap();
    assert_eq!(decoded.inflated.as_deref(), Some(inner.as_slice()));

    let uncompressed = decode_with(&rtpack(&inner, 0), true).unwrap();
    assert!(uncompressed.inflated.is_none());
}

#[test_log::test]
fn declared_decompressed_size_is_not_trusted() {
    let inner = TextureSpec::rgba(two_by_two()).file();
    let mut file = rtpack(&inner, 1);
    // decompressed_size lives at tag(6) + version(1) + reserved(1) + compressed_size(4).
    file[12..16].copy_from_slice(&8u32.to_le_bytes());
    let tex = expect_texture(decode(&file).unwrap());
    assert_two_by_two(&tex);

    file[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
    let decoded = decode_with(&file, true).unwrap();
    let payload = decoded.inflated.as_ref().unwrap();
    assert_eq!(payload.as_slice(), inner.as_slice());
    assert!(
        payload.capacity() < 1024 * 1024,
        "a lying header reserved {} bytes",
        payload.capacity()
    );
}

#[test_log::test]
fn font_inside_pack_decodes() {
    let atlas = TextureSpec::rgba(two_by_two());
    let font = FontSpec::new(65, vec![GlyphSpec::at(0, 0, 1, 1)], atlas);
    let decoded = decode(&rtpack(&font.file(), 1)).unwrap();
    match decoded.asset {
        Asset::Font(font) => {
            assert_eq!(font.glyphs.len(), 1);
            assert_eq!(font.atlas.image.width(), 2);
        }
        other => panic!("expected a font, got a {}", other.kind()),
    }
}

#[test_log::test]
fn unknown_tag_is_unrecognized() {
    let mut file = TextureSpec::rgba(two_by_two()).file();
    file[..6].copy_from_slice(b"RIFF00");
    match decode(&file) {
        Err(DecodeError::UnrecognizedFormat { tag }) => assert_eq!(&tag, b"RIFF00"),
        other => panic!("expected UnrecognizedFormat, got {:?}", other),
    }
}

#[test_log::test]
fn nested_pack_is_unrecognized() {
    let inner = rtpack(&TextureSpec::rgba(two_by_two()).file(), 0);
    let file = rtpack(&inner, 0);
    assert!(matches!(
        decode(&file),
        Err(DecodeError::UnrecognizedFormat { tag }) if &tag == b"RTPACK"
    ));
}

#[test_log::test]
fn unknown_compression_type_is_malformed() {
    let inner = TextureSpec::rgba(two_by_two()).file();
    let mut file = rtpack(&inner, 0);
    file[16] = 7;
    assert!(matches!(decode(&file), Err(DecodeError::MalformedHeader(_))));
}

#[test_log::test]
fn corrupt_deflate_payload_fails() {
    let inner = TextureSpec::rgba(two_by_two()).file();
    let mut file = rtpack(&inner, 1);
    // Keep the 34-byte pack header and half of the deflate stream.
    let body_len = file.len() - 34;
    file.truncate(34 + body_len / 2);
    assert!(matches!(
        decode(&file),
        Err(DecodeError::DecompressionFailure(_))
    ));
}

#[test_log::test]
fn short_file_is_truncated() {
    assert!(matches!(
        decode(b"RTP"),
        Err(DecodeError::TruncatedData { .. })
    ));
    assert!(matches!(
        decode(b"RTPACK\x00\x00"),
        Err(DecodeError::TruncatedData { .. })
    ));
}

#[test_log::test]
fn byte_sizes_are_human_readable() {
    assert_eq!(format_byte_size(0), "0B");
    assert_eq!(format_byte_size(512), "512B");
    assert_eq!(format_byte_size(1024), "1KB");
    assert_eq!(format_byte_size(1536), "1.5KB");
    assert_eq!(format_byte_size(3 * 1024 * 1024), "3MB");
}
