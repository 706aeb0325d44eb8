//! JPEG marker scanning.
//!
//! The codec decodes pixels; this module only walks the marker segments in
//! front of the entropy-coded data. That is enough to collect APP1 payloads
//! for EXIF parsing and to read the frame header without decoding.
//!
//! # Stream Layout
//!
//! ```text
//! SOI  (FFD8)
//! FFxx len:u16 payload[len-2]   ← repeated: APPn, DQT, DHT, SOFn, ...
//! SOS  (FFDA) ...entropy-coded data...
//! EOI  (FFD9)
//! ```
//!
//! Lengths are big-endian and include the two length bytes themselves.

use tracing::debug;

// =============================================================================
// JPEG Markers
// =============================================================================

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Start Of Scan marker code
pub const MARKER_SOS: u8 = 0xDA;

/// End Of Image marker code
pub const MARKER_EOI: u8 = 0xD9;

/// Define Huffman Table marker code
pub const MARKER_DHT: u8 = 0xC4;

/// JPEG extensions marker code (reserved inside the SOF range)
pub const MARKER_JPG: u8 = 0xC8;

/// Define Arithmetic Coding conditioning marker code
pub const MARKER_DAC: u8 = 0xCC;

/// Define Quantization Table marker code
pub const MARKER_DQT: u8 = 0xDB;

/// Application segment 0 (JFIF) marker code
pub const MARKER_APP0: u8 = 0xE0;

/// Application segment 1 (EXIF / XMP) marker code
pub const MARKER_APP1: u8 = 0xE1;

/// Comment marker code
pub const MARKER_COM: u8 = 0xFE;

/// Size of the big-endian segment length field
const LENGTH_SIZE: usize = 2;

/// Whether a marker stands alone without a length field.
#[inline]
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD7)
}

/// Whether a marker starts a frame (SOF0..SOF15 minus DHT, JPG and DAC).
#[inline]
pub fn is_start_of_frame(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, MARKER_DHT | MARKER_JPG | MARKER_DAC)
}

/// Check for the SOI signature.
#[inline]
pub fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&SOI)
}

// =============================================================================
// MarkerSegment
// =============================================================================

/// One length-prefixed marker segment, borrowed from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSegment<'a> {
    /// Marker code (the byte after 0xFF)
    pub marker: u8,

    /// Absolute offset of the 0xFF byte
    pub offset: usize,

    /// Stored big-endian length, which counts its own two bytes
    pub length: u16,

    /// Segment payload without marker and length bytes
    pub payload: &'a [u8],
}

/// Iterator over the marker segments between SOI and SOS.
///
/// Stops quietly at SOS, at EOI, or at the first sign of a truncated or
/// malformed segment.
#[derive(Debug, Clone)]
pub struct MarkerSegments<'a> {
    data: &'a [u8],
    position: usize,
    done: bool,
}

impl<'a> MarkerSegments<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: SOI.len(),
            done: !is_jpeg(data),
        }
    }

    fn finish(&mut self) -> Option<MarkerSegment<'a>> {
        self.done = true;
        None
    }

    fn abort(&mut self, reason: &'static str) -> Option<MarkerSegment<'a>> {
        debug!(position = self.position, reason, "Stopped marker scan");
        self.finish()
    }
}

impl<'a> Iterator for MarkerSegments<'a> {
    type Item = MarkerSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            let offset = self.position;
            if self.data.get(offset) != Some(&0xFF) {
                return self.abort("expected marker");
            }

            // Any number of 0xFF fill bytes may precede the marker code
            let mut code_at = offset + 1;
            while self.data.get(code_at) == Some(&0xFF) {
                code_at += 1;
            }
            let marker = match self.data.get(code_at) {
                Some(&marker) => marker,
                None => return self.abort("truncated marker"),
            };

            if marker == MARKER_SOS || marker == MARKER_EOI {
                return self.finish();
            }

            let length_at = code_at + 1;
            if is_standalone(marker) {
                self.position = length_at;
                continue;
            }

            let length = match self.data.get(length_at..length_at + LENGTH_SIZE) {
                Some(b) => u16::from_be_bytes([b[0], b[1]]),
                None => return self.abort("truncated length"),
            };
            if (length as usize) < LENGTH_SIZE {
                return self.abort("bad segment length");
            }

            let end = length_at + length as usize;
            let payload = match self.data.get(length_at + LENGTH_SIZE..end) {
                Some(payload) => payload,
                None => return self.abort("truncated segment"),
            };

            self.position = end;
            return Some(MarkerSegment {
                marker,
                offset,
                length,
                payload,
            });
        }
    }
}

/// Iterate the marker segments of a JPEG stream.
pub fn marker_segments(data: &[u8]) -> MarkerSegments<'_> {
    MarkerSegments::new(data)
}

/// Payloads of all APP1 segments, in stream order.
pub fn app1_segments(data: &[u8]) -> Vec<&[u8]> {
    marker_segments(data)
        .filter(|segment| segment.marker == MARKER_APP1)
        .map(|segment| segment.payload)
        .collect()
}

// =============================================================================
// FrameHeader
// =============================================================================

/// Fields of the SOFn segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// SOF marker code (0xC0 baseline, 0xC2 progressive, ...)
    pub marker: u8,

    /// Sample precision in bits
    pub precision: u8,

    /// Image width in pixels
    pub width: u16,

    /// Image height in pixels
    pub height: u16,

    /// Number of colour components
    pub components: u8,
}

impl FrameHeader {
    const MIN_PAYLOAD: usize = 6;

    fn parse(marker: u8, payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::MIN_PAYLOAD {
            return None;
        }

        Some(Self {
            marker,
            precision: payload[0],
            height: u16::from_be_bytes([payload[1], payload[2]]),
            width: u16::from_be_bytes([payload[3], payload[4]]),
            components: payload[5],
        })
    }

    pub fn is_progressive(&self) -> bool {
        matches!(self.marker, 0xC2 | 0xC6 | 0xCA | 0xCE)
    }
}

/// Find and parse the frame header.
pub fn frame_header(data: &[u8]) -> Option<FrameHeader> {
    marker_segments(data)
        .find(|segment| is_start_of_frame(segment.marker))
        .and_then(|segment| FrameHeader::parse(segment.marker, segment.payload))
}

// =============================================================================
// Tests
// =============================================================================
