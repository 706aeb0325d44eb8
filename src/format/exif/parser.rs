//! EXIF segment framing, TIFF header parsing and the bounds-checked cursor.
//!
//! # Segment Layout
//!
//! ```text
//! Bytes 0-5:   "Exif\0\0" identifier
//! Bytes 6-7:   Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 8-9:   TIFF magic (42 = 0x002A)
//! Bytes 10-13: Offset to the 0th IFD, relative to byte 6
//! ```
//!
//! Every offset inside the segment is relative to the TIFF header (byte 6),
//! and every one of them is attacker-controlled. [`IfdCursor`] is the only
//! way the walker touches segment bytes, and it validates each read against
//! the end of the segment before slicing.

use crate::error::ExifError;

use super::tags::TagTable;

// =============================================================================
// Constants
// =============================================================================

/// APP1 identifier that marks an EXIF payload
pub const EXIF_IDENTIFIER: &[u8; 6] = b"Exif\0\0";

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: [u8; 2] = *b"II";

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: [u8; 2] = *b"MM";

/// TIFF magic number
const TIFF_MAGIC: u16 = 0x002a;

/// Size of the TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Smallest segment that can hold an identifier and a TIFF header
pub const MIN_SEGMENT_SIZE: usize = EXIF_IDENTIFIER.len() + TIFF_HEADER_SIZE;

/// Size of one directory entry (tag, type, count, value/offset)
pub const IFD_ENTRY_SIZE: usize = 12;

/// Size of the entry count that opens a directory
pub const IFD_COUNT_SIZE: usize = 2;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) declared by the TIFF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    #[inline]
    pub fn read_u16(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn read_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
        }
    }

    #[inline]
    pub fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            ByteOrder::LittleEndian => i32::from_le_bytes(bytes),
            ByteOrder::BigEndian => i32::from_be_bytes(bytes),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF header of an EXIF segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the segment
    pub byte_order: ByteOrder,

    /// Offset to the 0th IFD, relative to the TIFF header
    pub first_ifd_offset: u32,
}

impl TiffHeader {
    /// Parse the TIFF header at the start of `tiff`.
    ///
    /// `tiff` is the segment payload following the `Exif\0\0` identifier.
    ///
    /// # Errors
    /// - `MalformedTiffHeader` for a short buffer, bad byte order or bad magic
    /// - `InvalidDirectoryOffset` unless `8 <= offset < tiff.len()`
    pub fn parse(tiff: &[u8]) -> Result<Self, ExifError> {
        if tiff.len() < TIFF_HEADER_SIZE {
            return Err(ExifError::MalformedTiffHeader {
                reason: format!("need {} bytes, got {}", TIFF_HEADER_SIZE, tiff.len()),
            });
        }

        let byte_order = match [tiff[0], tiff[1]] {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            other => {
                return Err(ExifError::MalformedTiffHeader {
                    reason: format!("bad byte order marker 0x{:02x}{:02x}", other[0], other[1]),
                })
            }
        };

        let magic = byte_order.read_u16([tiff[2], tiff[3]]);
        if magic != TIFF_MAGIC {
            return Err(ExifError::MalformedTiffHeader {
                reason: format!("bad magic 0x{:04x}", magic),
            });
        }

        let first_ifd_offset = byte_order.read_u32([tiff[4], tiff[5], tiff[6], tiff[7]]);
        if (first_ifd_offset as usize) < TIFF_HEADER_SIZE
            || first_ifd_offset as usize >= tiff.len()
        {
            return Err(ExifError::InvalidDirectoryOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            first_ifd_offset,
        })
    }
}

/// Strip the `Exif\0\0` identifier from an APP1 payload.
///
/// Returns the TIFF region that all in-segment offsets are relative to.
pub fn tiff_region(segment: &[u8]) -> Result<&[u8], ExifError> {
    segment
        .strip_prefix(EXIF_IDENTIFIER.as_slice())
        .ok_or(ExifError::MalformedIdentifier)
}

/// Check whether an APP1 payload looks like an EXIF segment at all.
#[inline]
pub fn is_exif_segment(segment: &[u8]) -> bool {
    segment.len() >= MIN_SEGMENT_SIZE && segment.starts_with(EXIF_IDENTIFIER)
}

// =============================================================================
// IfdCursor
// =============================================================================

/// Read-only, bounds-checked view over one directory of a TIFF region.
///
/// Borrows the segment; never owns it. Child and chained directories get a
/// fresh cursor over the same region via [`IfdCursor::child`].
#[derive(Debug, Clone)]
pub struct IfdCursor<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
    position: usize,
    table: TagTable,
    depth: usize,
}

impl<'a> IfdCursor<'a> {
    /// Position a cursor at a directory `offset` within `data`.
    ///
    /// Fails with `InvalidDirectoryOffset` if the entry count itself
    /// would lie outside the region.
    pub fn new(
        data: &'a [u8],
        byte_order: ByteOrder,
        offset: u32,
        table: TagTable,
    ) -> Result<Self, ExifError> {
        let start = offset as usize;
        if start
            .checked_add(IFD_COUNT_SIZE)
            .map_or(true, |end| end > data.len())
        {
            return Err(ExifError::InvalidDirectoryOffset(offset));
        }

        Ok(Self {
            data,
            byte_order,
            position: start,
            table,
            depth: 0,
        })
    }

    /// Cursor for a directory referenced from this one.
    pub fn child(&self, offset: u32, table: TagTable) -> Result<Self, ExifError> {
        let mut child = Self::new(self.data, self.byte_order, offset, table)?;
        child.depth = self.depth + 1;
        Ok(child)
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    #[inline]
    pub fn table(&self) -> TagTable {
        self.table
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// How many directory levels below the 0th IFD this cursor sits.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Bytes left between the cursor and the end of the region.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// The whole TIFF region this cursor walks.
    #[inline]
    pub fn region(&self) -> &'a [u8] {
        self.data
    }

    /// Move the cursor forward. Saturates at the end of the region.
    #[inline]
    pub fn advance(&mut self, size: usize) {
        self.position = self.position.saturating_add(size).min(self.data.len());
    }

    /// Borrow `size` bytes at an absolute offset from the TIFF header.
    pub fn bytes_at(&self, offset: usize, size: usize) -> Result<&'a [u8], ExifError> {
        let end = offset.checked_add(size).ok_or(ExifError::TruncatedValue {
            offset,
            size,
            available: self.data.len(),
        })?;

        self.data
            .get(offset..end)
            .ok_or(ExifError::TruncatedValue {
                offset,
                size,
                available: self.data.len(),
            })
    }

    /// Borrow `size` bytes at the cursor position plus `delta`.
    #[inline]
    pub fn bytes_here(&self, delta: usize, size: usize) -> Result<&'a [u8], ExifError> {
        self.bytes_at(self.position.saturating_add(delta), size)
    }

    pub fn read_u16_at(&self, offset: usize) -> Result<u16, ExifError> {
        let b = self.bytes_at(offset, 2)?;
        Ok(self.byte_order.read_u16([b[0], b[1]]))
    }

    pub fn read_u32_at(&self, offset: usize) -> Result<u32, ExifError> {
        let b = self.bytes_at(offset, 4)?;
        Ok(self.byte_order.read_u32([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_i32_at(&self, offset: usize) -> Result<i32, ExifError> {
        let b = self.bytes_at(offset, 4)?;
        Ok(self.byte_order.read_i32([b[0], b[1], b[2], b[3]]))
    }

    /// Read a u16 at the cursor position plus `delta`.
    #[inline]
    pub fn read_u16(&self, delta: usize) -> Result<u16, ExifError> {
        self.read_u16_at(self.position.saturating_add(delta))
    }

    /// Read a u32 at the cursor position plus `delta`.
    #[inline]
    pub fn read_u32(&self, delta: usize) -> Result<u32, ExifError> {
        self.read_u32_at(self.position.saturating_add(delta))
    }
}

// =============================================================================
// Tests
// =============================================================================
