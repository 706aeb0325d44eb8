//! EXIF parsing integration tests.
//!
//! Tests verify:
//! - Both byte orders decode to the same tree
//! - Nested Exif and GPS directories land under their own keys
//! - Embedded thumbnails are sliced out intact
//! - Corrupt segments fail with errors rather than panics

use jpegmeta::format::exif::{parse_segment, read_metadata};
use jpegmeta::format::jpeg::app1_segments;
use jpegmeta::{ExifError, MetadataValue, Rational};

use super::test_utils::{
    create_solid_jpeg, create_split_jpeg, ifd_size, is_valid_jpeg, splice_app1, ByteOrderType,
    ExifBuilder, Value,
};

fn camera_segment(order: ByteOrderType) -> Vec<u8> {
    ExifBuilder::new()
        .with_byte_order(order)
        .ifd0(0x010f, Value::Ascii("Acme".to_string()))
        .ifd0(0x0110, Value::Ascii("Model 9000 Pro".to_string()))
        .ifd0(0x0112, Value::Short(vec![6]))
        .ifd0(0x011a, Value::Rational(vec![(72, 1)]))
        .exif(0x829a, Value::Rational(vec![(1, 250)]))
        .exif(0x8827, Value::Short(vec![400]))
        .exif(0x9003, Value::Ascii("2024:05:06 07:08:09".to_string()))
        .exif(0x9204, Value::SRational(vec![(-1, 3)]))
        .exif(0x9000, Value::Undefined(b"0231".to_vec()))
        .gps(0x0000, Value::Byte(vec![2, 3, 0, 0]))
        .gps(0x0001, Value::Ascii("N".to_string()))
        .gps(0x0002, Value::Rational(vec![(48, 1), (51, 1), (2967, 100)]))
        .build()
}

// =============================================================================
// Full Tree
// =============================================================================

#[test]
fn test_little_endian_tree() {
    let tree = parse_segment(&camera_segment(ByteOrderType::LittleEndian)).unwrap();

    assert_eq!(tree.get("make").and_then(MetadataValue::as_str), Some("Acme"));
    assert_eq!(
        tree.get("model").and_then(MetadataValue::as_str),
        Some("Model 9000 Pro")
    );
    assert_eq!(tree.get("orientation"), Some(&MetadataValue::Integer(6)));
    assert_eq!(
        tree.get("x_resolution"),
        Some(&MetadataValue::Rational(Rational::new(72, 1)))
    );

    // Pointer tags never show up as leaves
    assert!(tree.get("tag_8769").is_none());
    assert!(tree.get("tag_8825").is_none());

    let exif = tree.exif().expect("exif directory");
    assert_eq!(
        exif.get("exposure_time"),
        Some(&MetadataValue::Rational(Rational::new(1, 250)))
    );
    assert_eq!(exif.get("iso_speed_ratings"), Some(&MetadataValue::Integer(400)));
    assert_eq!(
        exif.get("date_time_original").and_then(MetadataValue::as_str),
        Some("2024:05:06 07:08:09")
    );
    assert_eq!(
        exif.get("exposure_bias_value"),
        Some(&MetadataValue::Rational(Rational::new(-1, 3)))
    );
    assert_eq!(
        exif.get("exif_version")
            .and_then(MetadataValue::as_bytes)
            .map(|b| b.as_ref()),
        Some(&b"0231"[..])
    );

    let gps = tree.gps().expect("gps directory");
    assert_eq!(
        gps.get("version_id"),
        Some(&MetadataValue::Integers(vec![2, 3, 0, 0]))
    );
    assert_eq!(gps.get("latitude_ref").and_then(MetadataValue::as_str), Some("N"));
    assert_eq!(
        gps.get("latitude"),
        Some(&MetadataValue::Rationals(vec![
            Rational::new(48, 1),
            Rational::new(51, 1),
            Rational::new(2967, 100),
        ]))
    );
}

#[test]
fn test_byte_orders_agree() {
    let le = parse_segment(&camera_segment(ByteOrderType::LittleEndian)).unwrap();
    let be = parse_segment(&camera_segment(ByteOrderType::BigEndian)).unwrap();
    assert_eq!(le, be);
}

#[test]
fn test_tree_serializes_to_json() {
    let tree = parse_segment(&camera_segment(ByteOrderType::BigEndian)).unwrap();
    let json = serde_json::to_value(&tree).unwrap();

    assert_eq!(json["make"], "Acme");
    assert_eq!(json["orientation"], 6);
    assert_eq!(json["exif"]["exposure_time"], "1/250");
    assert_eq!(json["exif"]["exif_version"], "30323331");
    assert_eq!(json["gps"]["latitude"][2], "2967/100");
}

#[test]
fn test_read_metadata_from_jpeg() {
    let segment = camera_segment(ByteOrderType::LittleEndian);
    let jpeg = splice_app1(&create_split_jpeg(16, 16), &segment);

    assert!(is_valid_jpeg(&jpeg));
    assert_eq!(app1_segments(&jpeg).len(), 1);

    let tree = read_metadata(&jpeg).unwrap();
    assert_eq!(tree.get("make").and_then(MetadataValue::as_str), Some("Acme"));
    assert!(tree.exif().is_some());
}

#[test]
fn test_jpeg_without_exif_gives_empty_tree() {
    let jpeg = create_split_jpeg(16, 16);
    let tree = read_metadata(&jpeg).unwrap();
    assert!(tree.is_empty());
    assert!(tree.thumbnail().is_none());
}

#[test]
fn test_non_exif_app1_is_skipped() {
    let xmp = b"http://ns.adobe.com/xap/1.0/\0<x:xmpmeta/>".to_vec();
    let exif = ExifBuilder::new()
        .ifd0(0x0110, Value::Ascii("Second".to_string()))
        .build();

    let jpeg = splice_app1(&splice_app1(&create_split_jpeg(16, 16), &exif), &xmp);
    assert_eq!(app1_segments(&jpeg).len(), 2);

    let tree = read_metadata(&jpeg).unwrap();
    assert_eq!(tree.get("model").and_then(MetadataValue::as_str), Some("Second"));
}

// =============================================================================
// Thumbnail
// =============================================================================

#[test]
fn test_thumbnail_extraction() {
    let thumb = create_solid_jpeg(8, 8, [0, 200, 0]);
    let segment = ExifBuilder::new()
        .ifd0(0x010f, Value::Ascii("Acme".to_string()))
        .with_thumbnail(thumb.clone())
        .build();
    let jpeg = splice_app1(&create_split_jpeg(32, 16), &segment);

    let tree = read_metadata(&jpeg).unwrap();
    let thumbnail = tree.thumbnail().expect("thumbnail");

    assert_eq!(thumbnail.jpeg.as_ref(), thumb.as_slice());
    assert!(is_valid_jpeg(&thumbnail.jpeg));
    assert_eq!(
        thumbnail
            .tags
            .get("jpeg_interchange_format_length")
            .and_then(MetadataValue::as_integer),
        Some(thumb.len() as i64)
    );
}

#[test]
fn test_thumbnail_serializes_as_hex() {
    let thumb = create_solid_jpeg(8, 8, [10, 20, 30]);
    let segment = ExifBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .ifd0(0x0112, Value::Short(vec![1]))
        .with_thumbnail(thumb.clone())
        .build();

    let tree = parse_segment(&segment).unwrap();
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["thumbnail"]["jpeg_interchange"], hex::encode(&thumb));
}

// =============================================================================
// Corrupt Segments
// =============================================================================

#[test]
fn test_truncated_segment() {
    let segment = camera_segment(ByteOrderType::LittleEndian);

    // Cut inside the 0th IFD entry table
    let cut = 6 + 8 + 2 + 12 * 2;
    let result = parse_segment(&segment[..cut]);
    assert!(result.is_err());
}

#[test]
fn test_every_prefix_fails_cleanly() {
    let segment = camera_segment(ByteOrderType::BigEndian);
    for len in 0..segment.len() {
        // Errors or partial trees are fine, panics are not
        let _ = parse_segment(&segment[..len]);
    }
}

#[test]
fn test_bad_identifier() {
    let mut segment = camera_segment(ByteOrderType::LittleEndian);
    segment[0] = b'J';
    assert!(matches!(
        parse_segment(&segment),
        Err(ExifError::MalformedIdentifier)
    ));
}

#[test]
fn test_value_offset_past_end() {
    // One ASCII entry whose data offset points far outside the segment
    let mut segment = b"Exif\0\0".to_vec();
    segment.extend_from_slice(&[0x49, 0x49, 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00]);
    segment.extend_from_slice(&1u16.to_le_bytes());
    segment.extend_from_slice(&0x010fu16.to_le_bytes());
    segment.extend_from_slice(&2u16.to_le_bytes());
    segment.extend_from_slice(&20u32.to_le_bytes());
    segment.extend_from_slice(&0x1000u32.to_le_bytes());
    segment.extend_from_slice(&0u32.to_le_bytes());
    assert_eq!(segment.len(), 6 + 8 + ifd_size(1));

    assert!(matches!(
        parse_segment(&segment),
        Err(ExifError::TruncatedValue { .. })
    ));
}

#[test]
fn test_self_referencing_exif_pointer() {
    // Exif pointer back at the 0th IFD
    let segment = ExifBuilder::new()
        .ifd0(0x8769, Value::Long(vec![8]))
        .build();

    assert_eq!(
        parse_segment(&segment),
        Err(ExifError::InvalidDirectoryOffset(8))
    );
}
