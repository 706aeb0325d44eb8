//! EXIF metadata parsing.
//!
//! An EXIF APP1 segment is the identifier `Exif\0\0` followed by a complete
//! TIFF structure: an 8-byte header, then a chain of Image File Directories
//! (IFDs). All offsets inside the segment are relative to the TIFF header,
//! and the header's byte order governs every multi-byte value.
//!
//! # Layout
//!
//! - [`tags`] - Field types, tag constants and the symbolic name tables
//! - [`parser`] - Byte order, TIFF header and the bounds-checked IFD cursor
//! - [`values`] - Directory entries and typed value decoding
//! - [`ifd`] - Directory walker producing a [`MetadataTree`]
//! - [`orientation`] - Fast path reading only the orientation tag
//!
//! # Example
//!
//! ```rust,no_run
//! use jpegmeta::format::exif::{extract_orientation, read_metadata};
//!
//! let jpeg = std::fs::read("photo.jpg").unwrap();
//! let tree = read_metadata(&jpeg).unwrap();
//! if let Some(model) = tree.get("model").and_then(|v| v.as_str()) {
//!     println!("taken with {model}");
//! }
//! let flags = extract_orientation(jpegmeta::format::jpeg::app1_segments(&jpeg));
//! println!("needs transpose: {}", flags.swaps_dimensions());
//! ```

pub mod ifd;
pub mod orientation;
pub mod parser;
pub mod tags;
pub mod values;

pub use ifd::{
    parse_app1_segments, parse_segment, MetadataTree, SubDirectory, Thumbnail, MAX_IFD_DEPTH,
};
pub use orientation::{extract_orientation, orientation_code, OrientationFlags};
pub use parser::{ByteOrder, TiffHeader};
pub use tags::{FieldType, TagName, TagTable};
pub use values::{MetadataValue, Rational};

use crate::error::ExifError;

use super::jpeg::app1_segments;

/// Parse the EXIF metadata of a complete JPEG stream.
///
/// Returns an empty tree when the stream carries no EXIF segment.
pub fn read_metadata(jpeg: &[u8]) -> Result<MetadataTree, ExifError> {
    parse_app1_segments(app1_segments(jpeg))
}

/// Orientation flags of a complete JPEG stream.
pub fn read_orientation(jpeg: &[u8]) -> OrientationFlags {
    extract_orientation(app1_segments(jpeg))
}
