//! JPEG decoder front end.
//!
//! The `image` crate does the actual decompression. This module wraps it with
//! the pieces the codec does not provide:
//!
//! - Output layout selection (RGB, BGR, RGBX, YCbCr, YCrCb, grayscale)
//! - EXIF parsing of the APP1 segments into a [`MetadataTree`]
//! - Orientation correction through a [`GeometryEngine`]
//! - Header-only metadata reads

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use serde::Serialize;
use tracing::debug;

use crate::error::CodecError;
use crate::format::exif::{
    extract_orientation, parse_app1_segments, MetadataTree, OrientationFlags,
};
use crate::format::jpeg::{app1_segments, frame_header};
use crate::pixel::convert::{rgb_to_ycbcr, swap_cbcr};
use crate::pixel::{ColorSpace, GeometryEngine, PixelBuffer, PixelFormat};

// =============================================================================
// Options
// =============================================================================

/// Decoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Layout of the returned pixels
    pub pixel_format: PixelFormat,

    /// Parse EXIF tags into the metadata
    pub with_exif: bool,

    /// Rotate/flip the output according to the EXIF orientation
    pub apply_orientation: bool,

    /// Attach [`Meta`] to decode results
    pub need_meta: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Rgb,
            with_exif: false,
            apply_orientation: false,
            need_meta: true,
        }
    }
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    pub fn with_exif(mut self, enabled: bool) -> Self {
        self.with_exif = enabled;
        self
    }

    pub fn with_orientation(mut self, enabled: bool) -> Self {
        self.apply_orientation = enabled;
        self
    }

    pub fn without_meta(mut self) -> Self {
        self.need_meta = false;
        self
    }

    /// Reject pixel formats the decoder cannot produce.
    pub fn validate(&self) -> Result<(), CodecError> {
        if !self.pixel_format.is_decodable() {
            return Err(CodecError::UnsupportedPixelFormat {
                format: self.pixel_format.name(),
                operation: "decode",
            });
        }
        Ok(())
    }

    /// Whether APP1 segments have to be looked at.
    fn needs_app1(&self) -> bool {
        self.with_exif || self.apply_orientation
    }
}

// =============================================================================
// Meta / Decoded
// =============================================================================

/// Image properties reported alongside decoded pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Meta {
    /// Output width (after orientation)
    pub width: usize,

    /// Output height (after orientation)
    pub height: usize,

    /// Bytes per output row
    pub stride: usize,

    /// Colour space stored in the JPEG
    pub original_colorspace: ColorSpace,

    /// Colour space of the returned pixels
    pub output_colorspace: ColorSpace,

    /// Bytes per output pixel
    pub num_components: usize,

    /// EXIF tags, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif_tags: Option<MetadataTree>,
}

/// Result of a full decode.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub pixels: PixelBuffer,
    pub meta: Option<Meta>,
}

impl Decoded {
    pub fn into_parts(self) -> (PixelBuffer, Option<Meta>) {
        (self.pixels, self.meta)
    }
}

// =============================================================================
// Decoder
// =============================================================================

/// Decodes JPEG data into caller-side pixel layouts.
///
/// Holds a [`GeometryEngine`], so repeated decodes of same-sized rotated
/// frames reuse the transpose buffer. Not meant to be shared between threads.
#[derive(Debug)]
pub struct Decoder {
    options: DecoderOptions,
    engine: GeometryEngine,
}

impl Decoder {
    /// # Errors
    /// `UnsupportedPixelFormat` for encode-only formats.
    pub fn new(options: DecoderOptions) -> Result<Self, CodecError> {
        options.validate()?;
        Ok(Self {
            options,
            engine: GeometryEngine::new(),
        })
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Reconfigure the decoder between calls.
    ///
    /// The geometry engine and its cached transpose buffer are kept. On
    /// error the previous options stay in effect.
    ///
    /// # Errors
    /// `UnsupportedPixelFormat` for encode-only formats.
    pub fn set_options(&mut self, options: DecoderOptions) -> Result<(), CodecError> {
        options.validate()?;
        debug!(format = options.pixel_format.name(), "Decoder reconfigured");
        self.options = options;
        Ok(())
    }

    /// Read image properties without decoding pixel data.
    ///
    /// # Errors
    /// - `Decode` if the codec cannot parse the header
    /// - `Exif` if EXIF parsing was requested and the segment is corrupt
    pub fn read_header(&self, jpeg: &[u8]) -> Result<Meta, CodecError> {
        let (width, height) = jpeg_reader(jpeg)
            .into_dimensions()
            .map_err(|e| CodecError::Decode {
                message: e.to_string(),
            })?;

        let segments = self.app1(jpeg);
        let flags = self.orientation(&segments);

        self.build_meta(jpeg, width as usize, height as usize, flags, &segments)
    }

    /// Decode pixels, applying orientation and attaching metadata as configured.
    ///
    /// # Errors
    /// - `Decode` if the codec rejects the data
    /// - `Exif` if EXIF parsing was requested and the segment is corrupt
    /// - `Pixel` if the orientation transform fails
    pub fn decode(&mut self, jpeg: &[u8]) -> Result<Decoded, CodecError> {
        let image = jpeg_reader(jpeg)
            .decode()
            .map_err(|e| CodecError::Decode {
                message: e.to_string(),
            })?;

        let (width, height) = (image.width() as usize, image.height() as usize);
        let format = self.options.pixel_format;
        let data = to_output_layout(format, image)?;
        let mut pixels = PixelBuffer::new(width, height, format.bytes_per_pixel(), data)?;

        let segments = self.app1(jpeg);
        let flags = self.orientation(&segments);

        debug!(
            width,
            height,
            format = format.name(),
            orientation = flags.code(),
            "Decoded JPEG"
        );

        if !flags.is_empty() {
            pixels = self.engine.transform_into_new_buffer(pixels, flags)?;
        }

        let meta = if self.options.need_meta {
            Some(self.build_meta(jpeg, width, height, flags, &segments)?)
        } else {
            None
        };

        Ok(Decoded { pixels, meta })
    }

    fn app1<'a>(&self, jpeg: &'a [u8]) -> Vec<&'a [u8]> {
        if self.options.needs_app1() {
            app1_segments(jpeg)
        } else {
            Vec::new()
        }
    }

    fn orientation(&self, segments: &[&[u8]]) -> OrientationFlags {
        if self.options.apply_orientation {
            extract_orientation(segments.iter().copied())
        } else {
            OrientationFlags::empty()
        }
    }

    /// `width`/`height` are the stored (pre-orientation) dimensions.
    fn build_meta(
        &self,
        jpeg: &[u8],
        width: usize,
        height: usize,
        flags: OrientationFlags,
        segments: &[&[u8]],
    ) -> Result<Meta, CodecError> {
        let format = self.options.pixel_format;

        let (width, height) = if flags.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        };

        let original_colorspace = frame_header(jpeg)
            .map(|header| ColorSpace::from_components(header.components))
            .unwrap_or(ColorSpace::Unknown);

        let exif_tags = if self.options.with_exif {
            Some(parse_app1_segments(segments.iter().copied())?)
        } else {
            None
        };

        Ok(Meta {
            width,
            height,
            stride: width * format.bytes_per_pixel(),
            original_colorspace,
            output_colorspace: format.output_color_space(),
            num_components: format.bytes_per_pixel(),
            exif_tags,
        })
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

fn jpeg_reader(jpeg: &[u8]) -> ImageReader<Cursor<&[u8]>> {
    ImageReader::with_format(Cursor::new(jpeg), ImageFormat::Jpeg)
}

/// True when the codec cannot even read the header.
pub fn is_broken(jpeg: &[u8]) -> bool {
    jpeg_reader(jpeg).into_dimensions().is_err()
}

/// Convert codec output into the requested layout.
fn to_output_layout(format: PixelFormat, image: DynamicImage) -> Result<Vec<u8>, CodecError> {
    if format == PixelFormat::Grayscale {
        if let DynamicImage::ImageLuma8(gray) = image {
            return Ok(gray.into_raw());
        }
    }

    let rgb = image.into_rgb8().into_raw();

    let data = match format {
        PixelFormat::Rgb => rgb,
        PixelFormat::Bgr => rgb_pixels(&rgb).flat_map(|[r, g, b]| [b, g, r]).collect(),
        PixelFormat::Rgb32 => rgb_pixels(&rgb)
            .flat_map(|[r, g, b]| [r, g, b, 0xff])
            .collect(),
        PixelFormat::Bgr32 => rgb_pixels(&rgb)
            .flat_map(|[r, g, b]| [b, g, r, 0xff])
            .collect(),
        PixelFormat::Grayscale => rgb_pixels(&rgb).map(|p| rgb_to_ycbcr(p)[0]).collect(),
        PixelFormat::Yuv => rgb_pixels(&rgb).flat_map(rgb_to_ycbcr).collect(),
        PixelFormat::Yvu => {
            let mut data: Vec<u8> = rgb_pixels(&rgb).flat_map(rgb_to_ycbcr).collect();
            swap_cbcr(&mut data);
            data
        }
        PixelFormat::Yuv422 | PixelFormat::Rgb565 => {
            return Err(CodecError::UnsupportedPixelFormat {
                format: format.name(),
                operation: "decode",
            })
        }
    };

    Ok(data)
}

fn rgb_pixels(raw: &[u8]) -> impl Iterator<Item = [u8; 3]> + '_ {
    raw.chunks_exact(3).map(|p| [p[0], p[1], p[2]])
}

// =============================================================================
// Tests
// =============================================================================
