//! Orientation integration tests.
//!
//! Tests verify:
//! - Every EXIF orientation code is read back from a real JPEG stream
//! - Malformed orientation tags fall back to upright
//! - Decoded pixels end up upright for rotated and mirrored codes

use jpegmeta::format::exif::{orientation_code, read_orientation};
use jpegmeta::format::jpeg::app1_segments;
use jpegmeta::{Decoder, DecoderOptions, OrientationFlags, PixelBuffer};

use super::test_utils::{
    create_oriented_jpeg, create_split_jpeg, is_close, splice_app1, ByteOrderType, ExifBuilder,
    Value, BLUE, RED,
};

const WIDTH: u32 = 32;
const HEIGHT: u32 = 16;

fn decode_upright(jpeg: &[u8]) -> PixelBuffer {
    let mut decoder = Decoder::new(DecoderOptions::new().with_orientation(true)).unwrap();
    decoder.decode(jpeg).unwrap().pixels
}

fn px(pixels: &PixelBuffer, x: usize, y: usize) -> &[u8] {
    pixels.pixel(x, y).unwrap()
}

// =============================================================================
// Reading The Tag
// =============================================================================

#[test]
fn test_all_codes_read_back() {
    for code in 1..=8u16 {
        let jpeg = create_oriented_jpeg(WIDTH, HEIGHT, code);
        assert_eq!(orientation_code(app1_segments(&jpeg)), code);
        assert_eq!(read_orientation(&jpeg).code(), code);
    }
}

#[test]
fn test_big_endian_code() {
    let segment = ExifBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .ifd0(0x0110, Value::Ascii("Camera".to_string()))
        .ifd0(0x0112, Value::Short(vec![8]))
        .build();
    let jpeg = splice_app1(&create_split_jpeg(WIDTH, HEIGHT), &segment);

    let flags = read_orientation(&jpeg);
    assert_eq!(flags, OrientationFlags::TRANSPOSE | OrientationFlags::FLIP_HORIZONTAL);
}

#[test]
fn test_no_exif_is_upright() {
    let jpeg = create_split_jpeg(WIDTH, HEIGHT);
    assert_eq!(orientation_code(app1_segments(&jpeg)), 1);
    assert!(read_orientation(&jpeg).is_empty());
}

#[test]
fn test_out_of_range_code_is_upright() {
    let jpeg = create_oriented_jpeg(WIDTH, HEIGHT, 9);
    assert_eq!(orientation_code(app1_segments(&jpeg)), 9);
    assert!(read_orientation(&jpeg).is_empty());
}

#[test]
fn test_wrong_type_is_ignored() {
    let segment = ExifBuilder::new()
        .ifd0(0x0112, Value::Long(vec![6]))
        .build();
    let jpeg = splice_app1(&create_split_jpeg(WIDTH, HEIGHT), &segment);
    assert_eq!(orientation_code(app1_segments(&jpeg)), 1);
}

#[test]
fn test_wrong_count_is_ignored() {
    let segment = ExifBuilder::new()
        .ifd0(0x0112, Value::Short(vec![6, 6]))
        .build();
    let jpeg = splice_app1(&create_split_jpeg(WIDTH, HEIGHT), &segment);
    assert_eq!(orientation_code(app1_segments(&jpeg)), 1);
}

#[test]
fn test_corrupt_segment_is_upright() {
    let mut segment = ExifBuilder::new()
        .ifd0(0x0112, Value::Short(vec![6]))
        .build();
    // First IFD offset past the end
    segment[6 + 4] = 0xf0;
    let jpeg = splice_app1(&create_split_jpeg(WIDTH, HEIGHT), &segment);

    assert_eq!(orientation_code(app1_segments(&jpeg)), 1);
}

// =============================================================================
// Upright Pixels
// =============================================================================

#[test]
fn test_code_1_unchanged() {
    let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, 1));
    assert_eq!((pixels.width(), pixels.height()), (32, 16));
    assert!(is_close(px(&pixels, 4, 8), RED, 24));
    assert!(is_close(px(&pixels, 28, 8), BLUE, 24));
}

#[test]
fn test_code_2_mirrors_horizontally() {
    let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, 2));
    assert_eq!((pixels.width(), pixels.height()), (32, 16));
    assert!(is_close(px(&pixels, 4, 8), BLUE, 24));
    assert!(is_close(px(&pixels, 28, 8), RED, 24));
}

#[test]
fn test_code_3_rotates_180() {
    let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, 3));
    assert_eq!((pixels.width(), pixels.height()), (32, 16));
    assert!(is_close(px(&pixels, 4, 2), BLUE, 24));
    assert!(is_close(px(&pixels, 28, 13), RED, 24));
}

#[test]
fn test_code_4_mirrors_vertically() {
    // Left/right split is unaffected by a vertical mirror
    let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, 4));
    assert_eq!((pixels.width(), pixels.height()), (32, 16));
    assert!(is_close(px(&pixels, 4, 8), RED, 24));
    assert!(is_close(px(&pixels, 28, 8), BLUE, 24));
}

#[test]
fn test_code_6_rotates_clockwise() {
    let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, 6));
    assert_eq!((pixels.width(), pixels.height()), (16, 32));
    // The stored left half ends up on top
    assert!(is_close(px(&pixels, 8, 4), RED, 24));
    assert!(is_close(px(&pixels, 8, 28), BLUE, 24));
}

#[test]
fn test_code_8_rotates_counter_clockwise() {
    let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, 8));
    assert_eq!((pixels.width(), pixels.height()), (16, 32));
    assert!(is_close(px(&pixels, 8, 4), BLUE, 24));
    assert!(is_close(px(&pixels, 8, 28), RED, 24));
}

#[test]
fn test_transposing_codes_swap_dimensions() {
    for code in 5..=8u16 {
        let pixels = decode_upright(&create_oriented_jpeg(WIDTH, HEIGHT, code));
        assert_eq!((pixels.width(), pixels.height()), (16, 32), "code {code}");
        assert_eq!(pixels.stride(), 16 * 3);
    }
}

#[test]
fn test_orientation_ignored_unless_requested() {
    let jpeg = create_oriented_jpeg(WIDTH, HEIGHT, 6);
    let mut decoder = Decoder::new(DecoderOptions::new()).unwrap();
    let pixels = decoder.decode(&jpeg).unwrap().pixels;

    assert_eq!((pixels.width(), pixels.height()), (32, 16));
    assert!(is_close(px(&pixels, 4, 8), RED, 24));
}

#[test]
fn test_decoder_reused_across_orientations() {
    let mut decoder = Decoder::new(DecoderOptions::new().with_orientation(true)).unwrap();

    let rotated = decoder.decode(&create_oriented_jpeg(WIDTH, HEIGHT, 6)).unwrap();
    let upright = decoder.decode(&create_oriented_jpeg(WIDTH, HEIGHT, 1)).unwrap();
    let rotated_again = decoder.decode(&create_oriented_jpeg(WIDTH, HEIGHT, 8)).unwrap();

    assert_eq!(rotated.pixels.width(), 16);
    assert_eq!(upright.pixels.width(), 32);
    assert_eq!(rotated_again.pixels.width(), 16);
    assert!(is_close(px(&rotated_again.pixels, 8, 4), BLUE, 24));
}
