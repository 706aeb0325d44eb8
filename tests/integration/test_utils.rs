//! Test utilities for integration tests.
//!
//! This module provides builders for synthetic EXIF segments and helpers that
//! produce real JPEG streams (via the `image` crate) with those segments
//! spliced in.

use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};

// =============================================================================
// Test JPEG Creation
// =============================================================================

pub const RED: [u8; 3] = [255, 0, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];

/// Create a test JPEG whose left half is red and right half is blue.
///
/// Both halves are whole MCUs wide so the colours stay clean after
/// compression.
pub fn create_split_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb(RED)
        } else {
            Rgb(BLUE)
        }
    });
    encode_rgb(&img, 95)
}

/// Create a small solid-colour JPEG, used as an embedded thumbnail.
pub fn create_solid_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    encode_rgb(&img, 90)
}

fn encode_rgb(img: &RgbImage, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(img).unwrap();
    buf
}

/// Insert an APP1 segment right after SOI.
pub fn splice_app1(jpeg: &[u8], payload: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG stream");

    let length = (payload.len() + 2) as u16;
    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE1]);
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Split test JPEG carrying an EXIF orientation code.
pub fn create_oriented_jpeg(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let segment = ExifBuilder::new()
        .ifd0(0x0112, Value::Short(vec![orientation]))
        .build();
    splice_app1(&create_split_jpeg(width, height), &segment)
}

/// Whether `pixel` is within `tolerance` of `expected` on every channel.
pub fn is_close(pixel: &[u8], expected: [u8; 3], tolerance: u8) -> bool {
    pixel
        .iter()
        .zip(expected)
        .all(|(&a, b)| a.abs_diff(b) <= tolerance)
}

// =============================================================================
// EXIF Segment Builder
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

/// A typed entry value.
#[derive(Clone, Debug)]
pub enum Value {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<(u32, u32)>),
    Undefined(Vec<u8>),
    SLong(Vec<i32>),
    SRational(Vec<(i32, i32)>),
}

impl Value {
    fn field_type(&self) -> u16 {
        match self {
            Value::Byte(_) => 1,
            Value::Ascii(_) => 2,
            Value::Short(_) => 3,
            Value::Long(_) => 4,
            Value::Rational(_) => 5,
            Value::Undefined(_) => 7,
            Value::SLong(_) => 9,
            Value::SRational(_) => 10,
        }
    }

    fn count(&self) -> u32 {
        match self {
            Value::Byte(v) | Value::Undefined(v) => v.len() as u32,
            Value::Ascii(s) => s.len() as u32 + 1,
            Value::Short(v) => v.len() as u32,
            Value::Long(v) => v.len() as u32,
            Value::Rational(v) => v.len() as u32,
            Value::SLong(v) => v.len() as u32,
            Value::SRational(v) => v.len() as u32,
        }
    }

    fn encode(&self, order: ByteOrderType) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Value::Byte(v) | Value::Undefined(v) => out.extend_from_slice(v),
            Value::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            Value::Short(v) => v.iter().for_each(|x| write_u16(&mut out, *x, order)),
            Value::Long(v) => v.iter().for_each(|x| write_u32(&mut out, *x, order)),
            Value::Rational(v) => v.iter().for_each(|(n, d)| {
                write_u32(&mut out, *n, order);
                write_u32(&mut out, *d, order);
            }),
            Value::SLong(v) => v.iter().for_each(|x| write_u32(&mut out, *x as u32, order)),
            Value::SRational(v) => v.iter().for_each(|(n, d)| {
                write_u32(&mut out, *n as u32, order);
                write_u32(&mut out, *d as u32, order);
            }),
        }
        out
    }
}

/// Builder for a complete `Exif\0\0` APP1 payload.
///
/// Layout: TIFF header, 0th IFD, Exif IFD, GPS IFD, 1st (thumbnail) IFD,
/// then every out-of-line value and the thumbnail bytes.
pub struct ExifBuilder {
    byte_order: ByteOrderType,
    ifd0: Vec<(u16, Value)>,
    exif: Vec<(u16, Value)>,
    gps: Vec<(u16, Value)>,
    thumbnail: Option<Vec<u8>>,
}

impl ExifBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            ifd0: Vec::new(),
            exif: Vec::new(),
            gps: Vec::new(),
            thumbnail: None,
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn ifd0(mut self, tag: u16, value: Value) -> Self {
        self.ifd0.push((tag, value));
        self
    }

    pub fn exif(mut self, tag: u16, value: Value) -> Self {
        self.exif.push((tag, value));
        self
    }

    pub fn gps(mut self, tag: u16, value: Value) -> Self {
        self.gps.push((tag, value));
        self
    }

    pub fn with_thumbnail(mut self, jpeg: Vec<u8>) -> Self {
        self.thumbnail = Some(jpeg);
        self
    }

    /// Build the APP1 payload, `Exif\0\0` identifier included.
    pub fn build(self) -> Vec<u8> {
        let order = self.byte_order;

        let pointer_count = (!self.exif.is_empty()) as usize + (!self.gps.is_empty()) as usize;
        let ifd0_size = ifd_size(self.ifd0.len() + pointer_count);
        let exif_size = if self.exif.is_empty() {
            0
        } else {
            ifd_size(self.exif.len())
        };
        let gps_size = if self.gps.is_empty() {
            0
        } else {
            ifd_size(self.gps.len())
        };
        let ifd1_size = if self.thumbnail.is_some() {
            ifd_size(2)
        } else {
            0
        };

        let ifd0_offset = 8;
        let exif_offset = ifd0_offset + ifd0_size;
        let gps_offset = exif_offset + exif_size;
        let ifd1_offset = gps_offset + gps_size;
        let data_offset = ifd1_offset + ifd1_size;

        let mut tiff = Vec::new();
        match order {
            ByteOrderType::LittleEndian => tiff.extend_from_slice(b"II"),
            ByteOrderType::BigEndian => tiff.extend_from_slice(b"MM"),
        }
        write_u16(&mut tiff, 42, order);
        write_u32(&mut tiff, ifd0_offset as u32, order);

        let mut data = Vec::new();

        let mut ifd0 = self.ifd0;
        if !self.exif.is_empty() {
            ifd0.push((0x8769, Value::Long(vec![exif_offset as u32])));
        }
        if !self.gps.is_empty() {
            ifd0.push((0x8825, Value::Long(vec![gps_offset as u32])));
        }

        let next = if self.thumbnail.is_some() {
            ifd1_offset
        } else {
            0
        };
        write_ifd(&mut tiff, &mut data, data_offset, &ifd0, next, order);

        if !self.exif.is_empty() {
            write_ifd(&mut tiff, &mut data, data_offset, &self.exif, 0, order);
        }
        if !self.gps.is_empty() {
            write_ifd(&mut tiff, &mut data, data_offset, &self.gps, 0, order);
        }

        if let Some(thumbnail) = &self.thumbnail {
            // Both entries are inline, so the thumbnail lands at the current end of data
            let thumb_offset = data_offset + data.len();
            let entries = [
                (0x0201, Value::Long(vec![thumb_offset as u32])),
                (0x0202, Value::Long(vec![thumbnail.len() as u32])),
            ];
            write_ifd(&mut tiff, &mut data, data_offset, &entries, 0, order);
            data.extend_from_slice(thumbnail);
        }

        assert_eq!(tiff.len(), data_offset);
        tiff.extend_from_slice(&data);

        let mut segment = b"Exif\0\0".to_vec();
        segment.extend_from_slice(&tiff);
        segment
    }
}

impl Default for ExifBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Size of an IFD with `entries` entries: count + entries + next offset.
pub fn ifd_size(entries: usize) -> usize {
    2 + entries * 12 + 4
}

fn write_ifd(
    tiff: &mut Vec<u8>,
    data: &mut Vec<u8>,
    data_offset: usize,
    entries: &[(u16, Value)],
    next: usize,
    order: ByteOrderType,
) {
    write_u16(tiff, entries.len() as u16, order);
    for (tag, value) in entries {
        write_u16(tiff, *tag, order);
        write_u16(tiff, value.field_type(), order);
        write_u32(tiff, value.count(), order);

        let bytes = value.encode(order);
        if bytes.len() <= 4 {
            // Inline values are left-justified
            let mut field = [0u8; 4];
            field[..bytes.len()].copy_from_slice(&bytes);
            tiff.extend_from_slice(&field);
        } else {
            write_u32(tiff, (data_offset + data.len()) as u32, order);
            data.extend_from_slice(&bytes);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    write_u32(tiff, next as u32, order);
}

fn write_u16(out: &mut Vec<u8>, value: u16, order: ByteOrderType) {
    match order {
        ByteOrderType::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrderType::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
    }
}

fn write_u32(out: &mut Vec<u8>, value: u32, order: ByteOrderType) {
    match order {
        ByteOrderType::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrderType::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
    }
}

// =============================================================================
// Validation Helpers
// =============================================================================

/// Check if data is a decodable JPEG.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }

    if data[0] != 0xFF || data[1] != 0xD8 {
        return false;
    }

    if data[data.len() - 2] != 0xFF || data[data.len() - 1] != 0xD9 {
        return false;
    }

    image::load_from_memory_with_format(data, image::ImageFormat::Jpeg).is_ok()
}
