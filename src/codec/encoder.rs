//! JPEG encoder front end.
//!
//! Raw caller pixels go through the packers [`UNIT_LINES`] scanlines at a
//! time, then into the `image` crate's JPEG encoder as RGB8 (or L8 for
//! grayscale).

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tracing::debug;

use crate::error::{CodecError, PixelError};
use crate::pixel::convert::{pack_rows, ycbcr_to_rgb};
use crate::pixel::{ColorSpace, PixelFormat, UNIT_LINES};

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Largest dimension a baseline JPEG frame can declare.
pub const MAX_DIMENSION: usize = u16::MAX as usize;

// =============================================================================
// Options
// =============================================================================

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Layout of the raw input
    pub pixel_format: PixelFormat,

    /// Compression quality, 1-100
    pub quality: u8,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            pixel_format: PixelFormat::Yuv422,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }

    /// Set the quality, clamped to 1-100.
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = clamp_quality(quality);
        self
    }

    /// Check the options against the image size they will encode.
    pub fn validate(&self, width: usize, height: usize) -> Result<(), CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidOptions(format!(
                "image size must be non-zero, got {}x{}",
                width, height
            )));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CodecError::InvalidOptions(format!(
                "image size {}x{} exceeds {}",
                width, height, MAX_DIMENSION
            )));
        }
        if self.pixel_format == PixelFormat::Yuv422 && width % 2 != 0 {
            return Err(CodecError::InvalidOptions(format!(
                "YUV422 needs an even width, got {}",
                width
            )));
        }
        if !is_valid_quality(self.quality) {
            return Err(CodecError::InvalidOptions(format!(
                "quality must be between {} and {}, got {}",
                MIN_JPEG_QUALITY, MAX_JPEG_QUALITY, self.quality
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Encoder
// =============================================================================

/// Encodes raw frames of a fixed size and format.
///
/// The packing buffer for one unit of scanlines is allocated once and reused
/// across [`Encoder::encode`] calls.
#[derive(Debug)]
pub struct Encoder {
    width: usize,
    height: usize,
    options: EncoderOptions,
    rows: Vec<u8>,
}

impl Encoder {
    /// # Errors
    /// `InvalidOptions` for an empty or oversized frame, an odd YUV422
    /// width, or an out-of-range quality.
    pub fn new(width: usize, height: usize, options: EncoderOptions) -> Result<Self, CodecError> {
        options.validate(width, height)?;

        let rows = vec![0; width * options.pixel_format.components() * UNIT_LINES];

        Ok(Self {
            width,
            height,
            options,
            rows,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    /// Raw input size one frame must have.
    pub fn frame_size(&self) -> usize {
        self.width * self.height * self.options.pixel_format.bytes_per_pixel()
    }

    /// Compress one frame.
    ///
    /// # Errors
    /// - `Pixel(BufferSizeMismatch)` if `raw` is not exactly [`Encoder::frame_size`] bytes
    /// - `Encode` if the codec fails
    pub fn encode(&mut self, raw: &[u8]) -> Result<Bytes, CodecError> {
        let expected = self.frame_size();
        if raw.len() != expected {
            return Err(PixelError::BufferSizeMismatch {
                expected,
                actual: raw.len(),
            }
            .into());
        }

        let format = self.options.pixel_format;
        let grayscale = format == PixelFormat::Grayscale;
        let src_stride = self.width * format.bytes_per_pixel();

        let mut codec_input =
            Vec::with_capacity(self.width * self.height * if grayscale { 1 } else { 3 });

        let mut line = 0;
        while line < self.height {
            let nrow = UNIT_LINES.min(self.height - line);
            let chunk = &raw[line * src_stride..(line + nrow) * src_stride];

            pack_rows(format, chunk, self.width, nrow, &mut self.rows)?;
            let packed = &self.rows[..self.width * nrow * format.components()];
            append_codec_rows(format.color_space(), packed, &mut codec_input);

            line += nrow;
        }

        let color_type = if grayscale {
            ExtendedColorType::L8
        } else {
            ExtendedColorType::Rgb8
        };

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.options.quality)
            .encode(
                &codec_input,
                self.width as u32,
                self.height as u32,
                color_type,
            )
            .map_err(|e| CodecError::Encode {
                message: e.to_string(),
            })?;

        debug!(
            width = self.width,
            height = self.height,
            format = format.name(),
            size = output.len(),
            "Encoded JPEG"
        );

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Validate JPEG quality parameter.
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

/// Reorder packed components into what the codec takes: RGB8, or L8 for gray.
fn append_codec_rows(space: ColorSpace, packed: &[u8], out: &mut Vec<u8>) {
    match space {
        ColorSpace::Grayscale | ColorSpace::Rgb => out.extend_from_slice(packed),
        ColorSpace::YCbCr => {
            for ycc in packed.chunks_exact(3) {
                out.extend_from_slice(&ycbcr_to_rgb([ycc[0], ycc[1], ycc[2]]));
            }
        }
        ColorSpace::Bgr => {
            for bgr in packed.chunks_exact(3) {
                out.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
            }
        }
        ColorSpace::Rgbx => {
            for rgbx in packed.chunks_exact(4) {
                out.extend_from_slice(&rgbx[..3]);
            }
        }
        ColorSpace::Bgrx => {
            for bgrx in packed.chunks_exact(4) {
                out.extend_from_slice(&[bgrx[2], bgrx[1], bgrx[0]]);
            }
        }
        // Packers never emit these
        ColorSpace::YCrCb | ColorSpace::Cmyk | ColorSpace::Ycck | ColorSpace::Unknown => {}
    }
}

// =============================================================================
// Tests
// =============================================================================
