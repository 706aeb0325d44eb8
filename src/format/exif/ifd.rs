//! IFD walker and the metadata tree it builds.
//!
//! A directory is an entry count, `count` 12-byte entries, and a trailing
//! 4-byte offset to the next directory. Three tags are pointers rather than
//! values (Exif, GPS, Interoperability); the walker follows them into a child
//! directory with the matching tag table. The 0th IFD may chain to a 1st IFD
//! describing the embedded thumbnail.
//!
//! Parsing is all-or-nothing per segment: a broken nested directory fails the
//! whole extraction instead of leaving a partial tree behind.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use bytes::Bytes;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::error::ExifError;

use super::parser::{
    is_exif_segment, tiff_region, IfdCursor, TiffHeader, IFD_COUNT_SIZE, IFD_ENTRY_SIZE,
};
use super::tags::{
    TagTable, TAG_EXIF_IFD_POINTER, TAG_GPS_IFD_POINTER, TAG_INTEROPERABILITY_IFD_POINTER,
    TAG_JPEG_INTERCHANGE_FORMAT, TAG_JPEG_INTERCHANGE_FORMAT_LENGTH,
};
use super::values::{IfdEntry, MetadataValue, ValueReader};

/// Deepest nesting of pointer directories below the 0th IFD.
///
/// Real files nest at most two levels (0th → Exif → Interoperability).
pub const MAX_IFD_DEPTH: usize = 4;

/// Key under which the thumbnail JPEG bytes are reported.
pub const THUMBNAIL_JPEG_KEY: &str = "jpeg_interchange";

// =============================================================================
// SubDirectory
// =============================================================================

/// Nested directories reachable through pointer tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubDirectory {
    Exif,
    Gps,
    Interoperability,
}

impl SubDirectory {
    /// Map a pointer tag to the directory it points at.
    pub fn from_pointer_tag(tag: u16) -> Option<Self> {
        match tag {
            TAG_EXIF_IFD_POINTER => Some(SubDirectory::Exif),
            TAG_GPS_IFD_POINTER => Some(SubDirectory::Gps),
            TAG_INTEROPERABILITY_IFD_POINTER => Some(SubDirectory::Interoperability),
            _ => None,
        }
    }

    /// Key of the sub-tree in the parent.
    pub const fn key(self) -> &'static str {
        match self {
            SubDirectory::Exif => "exif",
            SubDirectory::Gps => "gps",
            SubDirectory::Interoperability => "interoperability",
        }
    }

    pub const fn table(self) -> TagTable {
        match self {
            SubDirectory::Exif => TagTable::Exif,
            SubDirectory::Gps => TagTable::Gps,
            SubDirectory::Interoperability => TagTable::Interoperability,
        }
    }
}

// =============================================================================
// MetadataTree
// =============================================================================

/// Symbolic tag name → value, plus nested directories and the thumbnail.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataTree {
    fields: BTreeMap<Cow<'static, str>, MetadataValue>,
    children: BTreeMap<SubDirectory, MetadataTree>,
    thumbnail: Option<Box<Thumbnail>>,
}

impl MetadataTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no tag, sub-directory or thumbnail was found.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.children.is_empty() && self.thumbnail.is_none()
    }

    /// Number of leaf values at this level.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, name: &str) -> Option<&MetadataValue> {
        self.fields.get(name)
    }

    /// Store a value. A later entry with the same name replaces the earlier.
    pub fn insert(&mut self, name: impl Into<Cow<'static, str>>, value: MetadataValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.fields.iter().map(|(k, v)| (k.as_ref(), v))
    }

    pub fn child(&self, directory: SubDirectory) -> Option<&MetadataTree> {
        self.children.get(&directory)
    }

    pub fn exif(&self) -> Option<&MetadataTree> {
        self.child(SubDirectory::Exif)
    }

    pub fn gps(&self) -> Option<&MetadataTree> {
        self.child(SubDirectory::Gps)
    }

    pub fn interoperability(&self) -> Option<&MetadataTree> {
        self.child(SubDirectory::Interoperability)
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        self.thumbnail.as_deref()
    }

    fn serialize_entries<M: SerializeMap>(&self, map: &mut M) -> Result<(), M::Error> {
        for (name, value) in &self.fields {
            map.serialize_entry(name.as_ref(), value)?;
        }
        for (directory, tree) in &self.children {
            map.serialize_entry(directory.key(), tree)?;
        }
        if let Some(thumbnail) = &self.thumbnail {
            map.serialize_entry("thumbnail", &**thumbnail)?;
        }
        Ok(())
    }
}

impl Serialize for MetadataTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.serialize_entries(&mut map)?;
        map.end()
    }
}

// =============================================================================
// Thumbnail
// =============================================================================

/// The chained 1st IFD together with the JPEG bytes it points at.
#[derive(Debug, Clone, PartialEq)]
pub struct Thumbnail {
    /// Tags of the 1st IFD
    pub tags: MetadataTree,

    /// Embedded JPEG stream
    pub jpeg: Bytes,
}

impl Thumbnail {
    /// Slice the thumbnail out of the TIFF region.
    ///
    /// Returns `Ok(None)` unless both `jpeg_interchange_format` and
    /// `jpeg_interchange_format_length` are single integers.
    fn resolve(tiff: &[u8], tags: MetadataTree) -> Result<Option<Self>, ExifError> {
        let integer = |tag: u16| {
            TagTable::Tiff
                .lookup(tag)
                .into_key()
                .and_then(|name| tags.get(&name))
                .and_then(MetadataValue::as_integer)
        };
        let offset = integer(TAG_JPEG_INTERCHANGE_FORMAT);
        let length = integer(TAG_JPEG_INTERCHANGE_FORMAT_LENGTH);

        let (offset, length) = match (offset, length) {
            (Some(offset), Some(length)) => (offset as usize, length as usize),
            _ => return Ok(None),
        };

        let jpeg = offset
            .checked_add(length)
            .and_then(|end| tiff.get(offset..end))
            .ok_or(ExifError::TruncatedValue {
                offset,
                size: length,
                available: tiff.len(),
            })?;

        Ok(Some(Self {
            tags,
            jpeg: Bytes::copy_from_slice(jpeg),
        }))
    }
}

impl Serialize for Thumbnail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.tags.serialize_entries(&mut map)?;
        map.serialize_entry(THUMBNAIL_JPEG_KEY, &hex::encode(&self.jpeg))?;
        map.end()
    }
}

// =============================================================================
// Walker
// =============================================================================

/// One walked directory and the offset of the directory chained after it.
#[derive(Debug)]
struct Directory {
    tree: MetadataTree,
    next_ifd: Option<u32>,
}

/// Walk the directory under `cursor`, recursing into pointer tags.
///
/// `visited` holds every directory offset already walked in this segment.
/// Each directory is walked at most once, which keeps the total work linear
/// in the segment size no matter how many pointers share a target.
fn walk(
    mut cursor: IfdCursor<'_>,
    visited: &mut BTreeSet<u32>,
) -> Result<Directory, ExifError> {
    if cursor.depth() > MAX_IFD_DEPTH {
        return Err(ExifError::NestingTooDeep(MAX_IFD_DEPTH));
    }

    let offset = cursor.position() as u32;
    if !visited.insert(offset) {
        debug!(offset, "IFD already walked in this segment");
        return Err(ExifError::InvalidDirectoryOffset(offset));
    }

    let count = cursor.read_u16(0)?;
    debug!(
        offset = cursor.position(),
        entries = count,
        table = ?cursor.table(),
        "Reading IFD"
    );
    cursor.advance(IFD_COUNT_SIZE);

    let mut tree = MetadataTree::new();

    for _ in 0..count {
        let entry = IfdEntry::read(&cursor)?;

        match SubDirectory::from_pointer_tag(entry.tag) {
            Some(directory) => {
                let child = cursor.child(entry.value_offset, directory.table())?;
                let walked = walk(child, visited)?;
                tree.children.insert(directory, walked.tree);
            }
            None => {
                let value = ValueReader::new(&cursor).read(&entry)?;
                if let Some(name) = cursor.table().lookup(entry.tag).into_key() {
                    tree.insert(name, value);
                }
            }
        }

        cursor.advance(IFD_ENTRY_SIZE);
    }

    // A missing trailer just means nothing is chained after this directory
    let next_ifd = match cursor.read_u32(0) {
        Ok(0) => None,
        Ok(offset) => Some(offset),
        Err(_) => {
            debug!(position = cursor.position(), "IFD has no next-offset trailer");
            None
        }
    };

    Ok(Directory { tree, next_ifd })
}

// =============================================================================
// Entry Points
// =============================================================================

/// Parse one APP1 payload (starting with `Exif\0\0`) into a metadata tree.
///
/// Walks the 0th IFD and its nested directories, then the chained 1st IFD if
/// there is one. The thumbnail is attached only when its offset and length
/// both resolve to integers.
///
/// # Errors
/// - `MalformedIdentifier` if the payload is not EXIF
/// - `MalformedTiffHeader` for a bad byte order or magic number
/// - `InvalidDirectoryOffset` for any directory outside the segment, or one
///   reached a second time
/// - `UnsupportedValueType`, `TruncatedValue`, `NestingTooDeep` from the walk
pub fn parse_segment(segment: &[u8]) -> Result<MetadataTree, ExifError> {
    let tiff = tiff_region(segment)?;
    let header = TiffHeader::parse(tiff)?;

    let cursor = IfdCursor::new(
        tiff,
        header.byte_order,
        header.first_ifd_offset,
        TagTable::Tiff,
    )?;
    let mut visited = BTreeSet::new();
    let Directory { mut tree, next_ifd } = walk(cursor, &mut visited)?;

    if let Some(offset) = next_ifd {
        debug!(offset, "Following chained IFD");
        let chained = IfdCursor::new(tiff, header.byte_order, offset, TagTable::Tiff)?;
        let walked = walk(chained, &mut visited)?;

        if let Some(thumbnail) = Thumbnail::resolve(tiff, walked.tree)? {
            debug!(size = thumbnail.jpeg.len(), "Found embedded thumbnail");
            tree.thumbnail = Some(Box::new(thumbnail));
        }
    }

    Ok(tree)
}

/// Parse the first EXIF segment among APP1 payloads.
///
/// Payloads that are too short or lack the `Exif\0\0` identifier are skipped
/// (APP1 also carries XMP). Returns an empty tree if none is EXIF.
pub fn parse_app1_segments<'a, I>(payloads: I) -> Result<MetadataTree, ExifError>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    for payload in payloads {
        if is_exif_segment(payload) {
            return parse_segment(payload);
        }
    }

    Ok(MetadataTree::new())
}

// =============================================================================
// Tests
// =============================================================================
