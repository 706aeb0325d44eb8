//! Pixel buffers, pixel formats and the routines that reshape them.
//!
//! - [`transform`] - Orientation-driven transpose and flips
//! - [`convert`] - Packers, colormap expansion and colour-space conversion

pub mod convert;
pub mod transform;

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::PixelError;

pub use convert::{Colormap, UNIT_LINES};
pub use transform::GeometryEngine;

// =============================================================================
// PixelBuffer
// =============================================================================

/// A tightly packed, row-major image owned by the caller.
///
/// Rows are contiguous with no padding: `stride == width * bytes_per_pixel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap `data` as a `width × height` image.
    ///
    /// # Errors
    /// `BufferSizeMismatch` if `data` is not exactly `width * height * bytes_per_pixel` long.
    pub fn new(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        data: Vec<u8>,
    ) -> Result<Self, PixelError> {
        let expected = width
            .saturating_mul(height)
            .saturating_mul(bytes_per_pixel);
        if data.len() != expected {
            return Err(PixelError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            data,
        })
    }

    /// A zero-filled image.
    ///
    /// # Errors
    /// `BufferSizeMismatch` if the frame size overflows `usize`.
    pub fn zeroed(
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
    ) -> Result<Self, PixelError> {
        let len = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
            .ok_or(PixelError::BufferSizeMismatch {
                expected: usize::MAX,
                actual: 0,
            })?;

        Ok(Self {
            width,
            height,
            bytes_per_pixel,
            data: vec![0; len],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width * self.bytes_per_pixel
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Bytes of pixel `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = y * self.stride() + x * self.bytes_per_pixel;
        self.data.get(start..start + self.bytes_per_pixel)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Swap width and height over a replacement buffer of the same size.
    pub(crate) fn transposed_with(&self, data: Vec<u8>) -> Self {
        Self {
            width: self.height,
            height: self.width,
            bytes_per_pixel: self.bytes_per_pixel,
            data,
        }
    }
}

// =============================================================================
// ColorSpace
// =============================================================================

/// Colour space names reported in decode metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Grayscale,
    Rgb,
    YCbCr,
    YCrCb,
    Cmyk,
    Ycck,
    Rgbx,
    Bgr,
    Bgrx,
    Unknown,
}

impl ColorSpace {
    /// Colour space of a JPEG frame, guessed from its component count.
    pub fn from_components(components: u8) -> Self {
        match components {
            1 => ColorSpace::Grayscale,
            3 => ColorSpace::YCbCr,
            4 => ColorSpace::Cmyk,
            _ => ColorSpace::Unknown,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ColorSpace::Grayscale => "GRAYSCALE",
            ColorSpace::Rgb => "RGB",
            ColorSpace::YCbCr => "YCbCr",
            ColorSpace::YCrCb => "YCrCb",
            ColorSpace::Cmyk => "CMYK",
            ColorSpace::Ycck => "YCCK",
            ColorSpace::Rgbx => "RGBX",
            ColorSpace::Bgr => "BGR",
            ColorSpace::Bgrx => "BGRX",
            ColorSpace::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for ColorSpace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// =============================================================================
// PixelFormat
// =============================================================================

/// Layout of the raw pixels handed to the encoder or returned by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// YUYV: `Y0 Cb Y1 Cr` per pixel pair (encode only)
    Yuv422,
    /// Little-endian 5-6-5 RGB words (encode only)
    Rgb565,
    Grayscale,
    /// YCbCr 4:4:4, three bytes per pixel
    Yuv,
    /// YCrCb 4:4:4, chroma swapped
    Yvu,
    #[default]
    Rgb,
    Bgr,
    /// RGBX, the fourth byte is padding
    Rgb32,
    /// BGRX, the fourth byte is padding
    Bgr32,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 9] = [
        PixelFormat::Yuv422,
        PixelFormat::Rgb565,
        PixelFormat::Grayscale,
        PixelFormat::Yuv,
        PixelFormat::Yvu,
        PixelFormat::Rgb,
        PixelFormat::Bgr,
        PixelFormat::Rgb32,
        PixelFormat::Bgr32,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Yuv422 => "YUV422",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Grayscale => "GRAYSCALE",
            PixelFormat::Yuv => "YUV",
            PixelFormat::Yvu => "YVU",
            PixelFormat::Rgb => "RGB",
            PixelFormat::Bgr => "BGR",
            PixelFormat::Rgb32 => "RGB32",
            PixelFormat::Bgr32 => "BGR32",
        }
    }

    /// Bytes per pixel of the raw caller-side layout.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Grayscale => 1,
            PixelFormat::Yuv422 | PixelFormat::Rgb565 => 2,
            PixelFormat::Yuv | PixelFormat::Yvu | PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgb32 | PixelFormat::Bgr32 => 4,
        }
    }

    /// Components per pixel on the codec side of the packers.
    pub const fn components(self) -> usize {
        match self {
            PixelFormat::Grayscale => 1,
            PixelFormat::Rgb32 | PixelFormat::Bgr32 => 4,
            _ => 3,
        }
    }

    /// Colour space of the packed components.
    pub const fn color_space(self) -> ColorSpace {
        match self {
            PixelFormat::Grayscale => ColorSpace::Grayscale,
            PixelFormat::Yuv422 | PixelFormat::Yuv | PixelFormat::Yvu => ColorSpace::YCbCr,
            PixelFormat::Rgb565 | PixelFormat::Rgb => ColorSpace::Rgb,
            PixelFormat::Bgr => ColorSpace::Bgr,
            PixelFormat::Rgb32 => ColorSpace::Rgbx,
            PixelFormat::Bgr32 => ColorSpace::Bgrx,
        }
    }

    /// Colour space of decoded output as reported to the caller.
    pub const fn output_color_space(self) -> ColorSpace {
        match self {
            PixelFormat::Yvu => ColorSpace::YCrCb,
            other => other.color_space(),
        }
    }

    /// Whether the decoder can produce this layout.
    pub const fn is_decodable(self) -> bool {
        !matches!(self, PixelFormat::Yuv422 | PixelFormat::Rgb565)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    /// Case-insensitive, accepting the usual aliases (`YUYV`, `RGB24`, `BGRX`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "YUV422" | "YUYV" => Ok(PixelFormat::Yuv422),
            "RGB565" => Ok(PixelFormat::Rgb565),
            "GRAYSCALE" | "GRAY" => Ok(PixelFormat::Grayscale),
            "YUV" | "YUV444" | "YCBCR" => Ok(PixelFormat::Yuv),
            "YVU" | "YVU444" | "YCRCB" => Ok(PixelFormat::Yvu),
            "RGB" | "RGB24" => Ok(PixelFormat::Rgb),
            "BGR" | "BGR24" => Ok(PixelFormat::Bgr),
            "RGB32" | "RGBX" => Ok(PixelFormat::Rgb32),
            "BGR32" | "BGRX" => Ok(PixelFormat::Bgr32),
            _ => Err(format!("unsupported pixel format: {}", s)),
        }
    }
}

impl Serialize for PixelFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// =============================================================================
// Tests
// =============================================================================
