//! Orientation extraction.
//!
//! Looks for tag 0x0112 in the 0th IFD of the first EXIF segment that has a
//! usable one, without building a metadata tree. Orientation is best effort:
//! malformed segments are skipped and anything unexpected falls back to the
//! identity transform.

use bitflags::bitflags;
use tracing::warn;

use crate::error::ExifError;

use super::parser::{
    is_exif_segment, tiff_region, IfdCursor, TiffHeader, IFD_COUNT_SIZE, IFD_ENTRY_SIZE,
};
use super::tags::{FieldType, TagTable, TAG_ORIENTATION};
use super::values::IfdEntry;

bitflags! {
    /// Geometry operations needed to display an image upright.
    ///
    /// Applied in the order transpose, flip vertical, flip horizontal.
    /// `FLIP_VERTICAL` reverses the whole pixel sequence, which is the same
    /// as a 180° rotation; combined with `FLIP_HORIZONTAL` it leaves a plain
    /// top-to-bottom mirror.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OrientationFlags: u8 {
        const FLIP_HORIZONTAL = 0b001;
        const FLIP_VERTICAL = 0b010;
        const TRANSPOSE = 0b100;
    }
}

impl OrientationFlags {
    /// Flags for an EXIF orientation code.
    ///
    /// Codes 1..=8 map to `code - 1`; anything else is the identity.
    pub fn from_code(code: u16) -> Self {
        if (1..=8).contains(&code) {
            Self::from_bits_truncate((code - 1) as u8)
        } else {
            Self::empty()
        }
    }

    /// EXIF orientation code these flags represent.
    pub fn code(self) -> u16 {
        self.bits() as u16 + 1
    }

    /// Whether width and height trade places.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        self.contains(Self::TRANSPOSE)
    }
}

/// Raw orientation code from the first segment carrying a well-formed tag.
///
/// Returns 1 (upright) if no segment has one.
pub fn orientation_code<'a, I>(payloads: I) -> u16
where
    I: IntoIterator<Item = &'a [u8]>,
{
    for payload in payloads {
        if !is_exif_segment(payload) {
            continue;
        }

        match scan_segment(payload) {
            Ok(Some(code)) => return code,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable EXIF segment"),
        }
    }

    1
}

/// Orientation flags from a set of APP1 payloads.
pub fn extract_orientation<'a, I>(payloads: I) -> OrientationFlags
where
    I: IntoIterator<Item = &'a [u8]>,
{
    OrientationFlags::from_code(orientation_code(payloads))
}

/// Scan the 0th IFD of one segment for a SHORT x1 orientation tag.
fn scan_segment(segment: &[u8]) -> Result<Option<u16>, ExifError> {
    let tiff = tiff_region(segment)?;
    let header = TiffHeader::parse(tiff)?;
    let mut cursor = IfdCursor::new(
        tiff,
        header.byte_order,
        header.first_ifd_offset,
        TagTable::Tiff,
    )?;

    let count = cursor.read_u16(0)?;
    cursor.advance(IFD_COUNT_SIZE);

    for _ in 0..count {
        let entry = IfdEntry::read(&cursor)?;

        if entry.tag == TAG_ORIENTATION {
            if entry.field_type == Some(FieldType::Short) && entry.count == 1 {
                return cursor.read_u16(8).map(Some);
            }
            warn!(
                field_type = entry.field_type_raw,
                count = entry.count,
                "Ignoring orientation tag with unexpected shape"
            );
        }

        cursor.advance(IFD_ENTRY_SIZE);
    }

    Ok(None)
}

// =============================================================================
// Tests
// =============================================================================
