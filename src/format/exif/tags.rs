//! EXIF field types and the symbolic tag catalog.
//!
//! This module defines the vocabulary for EXIF parsing:
//! - Field types that determine how entry values are encoded
//! - Four static tag tables (0th IFD, Exif IFD, GPS IFD, Interoperability IFD)
//!   mapping a 16-bit tag ID to a symbolic name
//!
//! Every table is sorted strictly ascending by tag ID so lookups can binary
//! search. Unknown IDs never fail: they get a synthesized `tag_xxxx` name.

use std::borrow::Cow;

// =============================================================================
// Well-known Tag IDs
// =============================================================================

/// Orientation (0th IFD)
pub const TAG_ORIENTATION: u16 = 0x0112;

/// Offset of the embedded JPEG thumbnail (1st IFD)
pub const TAG_JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;

/// Length of the embedded JPEG thumbnail (1st IFD)
pub const TAG_JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

/// Pointer to the Exif IFD
pub const TAG_EXIF_IFD_POINTER: u16 = 0x8769;

/// Pointer to the GPS IFD
pub const TAG_GPS_IFD_POINTER: u16 = 0x8825;

/// Pointer to the Interoperability IFD
pub const TAG_INTEROPERABILITY_IFD_POINTER: u16 = 0xa005;

// =============================================================================
// EXIF Field Types
// =============================================================================

/// EXIF field types that determine how values are encoded.
///
/// SBYTE, SSHORT, FLOAT and DOUBLE are valid TIFF types but are not used by
/// EXIF writers in practice; entries carrying them are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two LONGs: numerator and denominator (8 bytes)
    Rational = 5,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Signed 32-bit integer (4 bytes)
    SLong = 9,

    /// Two SLONGs: numerator and denominator (8 bytes)
    SRational = 10,
}

impl FieldType {
    /// Size of the value/offset field of a directory entry.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long | FieldType::SLong => 4,
            FieldType::Rational | FieldType::SRational => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unsupported or unknown type values.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            _ => None,
        }
    }

    /// Check if `count` values of this type fit in the 4-byte value field.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        (self.size_in_bytes() as u64) * (count as u64) <= Self::INLINE_THRESHOLD as u64
    }
}

// =============================================================================
// Tag Catalog
// =============================================================================

/// One row of a tag table.
///
/// `name` is `None` for IFD pointer tags, which carry structure rather than a
/// leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagEntry {
    pub tag: u16,
    pub name: Option<&'static str>,
}

const fn named(tag: u16, name: &'static str) -> TagEntry {
    TagEntry {
        tag,
        name: Some(name),
    }
}

const fn pointer(tag: u16) -> TagEntry {
    TagEntry { tag, name: None }
}

/// Result of looking up a tag ID in a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagName {
    /// Tag found with a symbolic name
    Known(&'static str),

    /// Tag found but it is an IFD pointer, not a leaf value
    Structural,

    /// Tag not in the table; carries the synthesized `tag_xxxx` name
    Unknown(String),
}

impl TagName {
    /// The key under which a leaf value is stored, if this is not a pointer.
    pub fn into_key(self) -> Option<Cow<'static, str>> {
        match self {
            TagName::Known(name) => Some(Cow::Borrowed(name)),
            TagName::Unknown(name) => Some(Cow::Owned(name)),
            TagName::Structural => None,
        }
    }
}

/// The four directory vocabularies found in an EXIF segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagTable {
    /// 0th and 1st IFD (TIFF baseline tags)
    Tiff,
    /// Exif private IFD
    Exif,
    /// GPS IFD
    Gps,
    /// Interoperability IFD
    Interoperability,
}

impl TagTable {
    /// The sorted entries of this table.
    pub const fn entries(self) -> &'static [TagEntry] {
        match self {
            TagTable::Tiff => TIFF_TAGS,
            TagTable::Exif => EXIF_TAGS,
            TagTable::Gps => GPS_TAGS,
            TagTable::Interoperability => INTEROPERABILITY_TAGS,
        }
    }

    /// Look up a tag ID.
    ///
    /// Binary search over the sorted table. Unknown IDs synthesize
    /// `tag_xxxx` (lowercase hex, zero-padded to four digits).
    pub fn lookup(self, tag: u16) -> TagName {
        let entries = self.entries();
        match entries.binary_search_by_key(&tag, |entry| entry.tag) {
            Ok(index) => match entries[index].name {
                Some(name) => TagName::Known(name),
                None => TagName::Structural,
            },
            Err(_) => TagName::Unknown(format!("tag_{:04x}", tag)),
        }
    }
}

static TIFF_TAGS: &[TagEntry] = &[
    named(0x0100, "image_width"),
    named(0x0101, "image_length"),
    named(0x0102, "bits_per_sample"),
    named(0x0103, "compression"),
    named(0x0106, "photometric_interpretation"),
    named(0x010e, "image_description"),
    named(0x010f, "make"),
    named(0x0110, "model"),
    named(0x0111, "strip_offsets"),
    named(0x0112, "orientation"),
    named(0x0115, "samples_per_pixel"),
    named(0x0116, "rows_per_strip"),
    named(0x0117, "strip_byte_counts"),
    named(0x011a, "x_resolution"),
    named(0x011b, "y_resolution"),
    named(0x011c, "planar_configuration"),
    named(0x0128, "resolution_unit"),
    named(0x012d, "transfer_function"),
    named(0x0131, "software"),
    named(0x0132, "date_time"),
    named(0x013b, "artist"),
    named(0x013e, "white_point"),
    named(0x013f, "primary_chromaticities"),
    named(0x0201, "jpeg_interchange_format"),
    named(0x0202, "jpeg_interchange_format_length"),
    named(0x0211, "ycbcr_coefficients"),
    named(0x0212, "ycbcr_sub_sampling"),
    named(0x0213, "ycbcr_positioning"),
    named(0x0214, "reference_black_white"),
    named(0x8298, "copyright"),
    pointer(TAG_EXIF_IFD_POINTER),
    pointer(TAG_GPS_IFD_POINTER),
    named(0xc4a5, "print_im"),
];

static EXIF_TAGS: &[TagEntry] = &[
    named(0x829a, "exposure_time"),
    named(0x829d, "f_number"),
    named(0x8822, "exposure_program"),
    named(0x8824, "spectral_sensitivity"),
    named(0x8827, "iso_speed_ratings"),
    named(0x8828, "oecf"),
    named(0x882a, "time_zone_offset"),
    named(0x882b, "self_timer_mode"),
    named(0x8830, "sensitivity_type"),
    named(0x8831, "standard_output_sensitivity"),
    named(0x8832, "recommended_exposure_index"),
    named(0x9000, "exif_version"),
    named(0x9003, "date_time_original"),
    named(0x9004, "date_time_digitized"),
    named(0x9010, "offset_time"),
    named(0x9011, "offset_time_original"),
    named(0x9012, "offset_time_digitized"),
    named(0x9101, "components_configuration"),
    named(0x9102, "compressed_bits_per_pixel"),
    named(0x9201, "shutter_speed_value"),
    named(0x9202, "aperture_value"),
    named(0x9203, "brightness_value"),
    named(0x9204, "exposure_bias_value"),
    named(0x9205, "max_aperture_value"),
    named(0x9206, "subject_distance"),
    named(0x9207, "metering_mode"),
    named(0x9208, "light_source"),
    named(0x9209, "flash"),
    named(0x920a, "focal_length"),
    named(0x927c, "maker_note"),
    named(0x9286, "user_comment"),
    named(0x9290, "sub_sec_time"),
    named(0x9291, "sub_sec_time_original"),
    named(0x9292, "sub_sec_time_digitized"),
    named(0xa000, "flash_pix_version"),
    named(0xa001, "color_space"),
    named(0xa002, "pixel_x_dimension"),
    named(0xa003, "pixel_y_dimension"),
    named(0xa004, "related_sound_file"),
    pointer(TAG_INTEROPERABILITY_IFD_POINTER),
    named(0xa20b, "flash_energy"),
    named(0xa20c, "spatial_frequency_response"),
    named(0xa20e, "focal_plane_x_resolution"),
    named(0xa20f, "focal_plane_y_resolution"),
    named(0xa210, "focal_plane_resolution_unit"),
    named(0xa214, "subject_location"),
    named(0xa215, "exposure_index"),
    named(0xa217, "sensing_method"),
    named(0xa300, "file_source"),
    named(0xa301, "scene_type"),
    named(0xa302, "cfa_pattern"),
    named(0xa401, "custom_rendered"),
    named(0xa402, "exposure_mode"),
    named(0xa403, "white_balance"),
    named(0xa404, "digital_zoom_ratio"),
    named(0xa405, "focal_length_in_35mm_film"),
    named(0xa406, "scene_capture_type"),
    named(0xa407, "gain_control"),
    named(0xa408, "contrast"),
    named(0xa409, "saturation"),
    named(0xa40a, "sharpness"),
    named(0xa40b, "device_setting_description"),
    named(0xa40c, "subject_distance_range"),
    named(0xa420, "image_unique_id"),
    named(0xa430, "owner_name"),
    named(0xa431, "serial_number"),
    named(0xa432, "lens_info"),
    named(0xa433, "lens_make"),
    named(0xa434, "lens_model"),
    named(0xa435, "lens_serial_number"),
];

static GPS_TAGS: &[TagEntry] = &[
    named(0x0000, "version_id"),
    named(0x0001, "latitude_ref"),
    named(0x0002, "latitude"),
    named(0x0003, "longitude_ref"),
    named(0x0004, "longitude"),
    named(0x0005, "altitude_ref"),
    named(0x0006, "altitude"),
    named(0x0007, "timestamp"),
    named(0x0008, "satellites"),
    named(0x0009, "status"),
    named(0x000a, "measure_mode"),
    named(0x000b, "dop"),
    named(0x000c, "speed_ref"),
    named(0x000d, "speed"),
    named(0x000e, "track_ref"),
    named(0x000f, "track"),
    named(0x0010, "img_direction_ref"),
    named(0x0011, "img_direction"),
    named(0x0012, "map_datum"),
    named(0x0013, "dest_latitude_ref"),
    named(0x0014, "dest_latitude"),
    named(0x0015, "dest_longitude_ref"),
    named(0x0016, "dest_longitude"),
    named(0x0017, "bearing_ref"),
    named(0x0018, "bearing"),
    named(0x0019, "dest_distance_ref"),
    named(0x001a, "dest_distance"),
    named(0x001b, "processing_method"),
    named(0x001c, "area_information"),
    named(0x001d, "date_stamp"),
    named(0x001e, "differential"),
];

static INTEROPERABILITY_TAGS: &[TagEntry] = &[
    named(0x0001, "interoperability_index"),
    named(0x0002, "interoperability_version"),
    named(0x1000, "related_image_file_format"),
    named(0x1001, "related_image_width"),
];

// =============================================================================
// Tests
// =============================================================================
