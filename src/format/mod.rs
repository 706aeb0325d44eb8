//! Container-level parsing: JPEG marker segments and the EXIF metadata
//! carried in APP1.

pub mod exif;
pub mod jpeg;
