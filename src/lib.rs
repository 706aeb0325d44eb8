//! # jpegmeta
//!
//! A JPEG decode/encode front end with a bounds-checked EXIF reader and
//! orientation-aware pixel transforms.
//!
//! The entropy codec is the `image` crate's. Everything around it lives here:
//! reading EXIF metadata out of APP1 segments, turning the EXIF orientation
//! tag into flip/transpose operations, and converting between the pixel
//! layouts callers hand in or ask for.
//!
//! ## Features
//!
//! - **EXIF parsing**: Every IFD (TIFF, Exif, GPS, Interoperability) decoded
//!   into a named [`MetadataTree`], including the embedded thumbnail
//! - **Orientation**: All eight EXIF orientations applied to decoded pixels,
//!   with the dimensions reported accordingly
//! - **Pixel formats**: YUV422, RGB565, grayscale, YUV/YVU, RGB/BGR and their
//!   32-bit padded variants
//! - **Safety**: Malformed segments produce errors, never out-of-bounds reads
//!
//! ## Architecture
//!
//! - [`mod@format`] - JPEG marker scanning and the EXIF parser
//! - [`pixel`] - Pixel buffers, geometry transforms and format converters
//! - [`codec`] - Decoder and encoder front ends
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use jpegmeta::{Decoder, DecoderOptions, PixelFormat};
//!
//! let jpeg = std::fs::read("photo.jpg").unwrap();
//! let options = DecoderOptions::new()
//!     .with_pixel_format(PixelFormat::Bgr)
//!     .with_orientation(true)
//!     .with_exif(true);
//!
//! let mut decoder = Decoder::new(options).unwrap();
//! let decoded = decoder.decode(&jpeg).unwrap();
//! if let Some(meta) = decoded.meta {
//!     println!("{}x{} ({})", meta.width, meta.height, meta.original_colorspace);
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod pixel;

// Re-export commonly used types
pub use codec::{
    is_broken, Decoded, Decoder, DecoderOptions, Encoder, EncoderOptions, Meta,
    DEFAULT_JPEG_QUALITY,
};
pub use config::{Cli, Command};
pub use error::{CodecError, ExifError, PixelError};
pub use format::exif::{
    extract_orientation, orientation_code, read_metadata, read_orientation, MetadataTree,
    MetadataValue, OrientationFlags, Rational, Thumbnail,
};
pub use format::jpeg::{app1_segments, frame_header, FrameHeader};
pub use pixel::{ColorSpace, Colormap, GeometryEngine, PixelBuffer, PixelFormat};
