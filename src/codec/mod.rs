//! JPEG decode and encode front ends.
//!
//! The entropy codec itself comes from the `image` crate. This module wraps
//! it with the pixel layouts, EXIF orientation handling and metadata that
//! callers see.
//!
//! - [`Decoder`] - JPEG to raw pixels, optionally upright and with EXIF tags
//! - [`Encoder`] - raw pixels in any supported layout to JPEG

mod decoder;
mod encoder;

pub use decoder::{is_broken, Decoded, Decoder, DecoderOptions, Meta};
pub use encoder::{
    clamp_quality, is_valid_quality, Encoder, EncoderOptions, DEFAULT_JPEG_QUALITY,
    MAX_DIMENSION, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
