//! Pixel format converters.
//!
//! Encode side: packers turning caller layouts (YUYV, RGB565, 3- and 4-byte
//! interleaved, grayscale) into the component-per-byte rows the codec takes,
//! a bounded number of scanlines at a time.
//!
//! Decode side: colormap expansion of palette indices and the Cb/Cr swap that
//! turns YCbCr output into YCrCb.

use crate::error::PixelError;

use super::PixelFormat;

/// Scanlines handed to the packers per step.
pub const UNIT_LINES: usize = 10;

// =============================================================================
// Packers
// =============================================================================

/// Pack `rows` scanlines of `format` pixels from `src` into `dst`.
///
/// `dst` receives `width * rows * format.components()` bytes. Returns the
/// number of source bytes consumed.
///
/// # Errors
/// `BufferSizeMismatch` if either buffer is too short for `rows` scanlines,
/// or the scanline size overflows `usize`.
pub fn pack_rows(
    format: PixelFormat,
    src: &[u8],
    width: usize,
    rows: usize,
    dst: &mut [u8],
) -> Result<usize, PixelError> {
    let overflow = || PixelError::BufferSizeMismatch {
        expected: usize::MAX,
        actual: src.len(),
    };
    let pixels = width.checked_mul(rows).ok_or_else(overflow)?;
    let src_len = pixels
        .checked_mul(format.bytes_per_pixel())
        .ok_or_else(overflow)?;
    let dst_len = pixels
        .checked_mul(format.components())
        .ok_or_else(overflow)?;

    if src.len() < src_len {
        return Err(PixelError::BufferSizeMismatch {
            expected: src_len,
            actual: src.len(),
        });
    }
    if dst.len() < dst_len {
        return Err(PixelError::BufferSizeMismatch {
            expected: dst_len,
            actual: dst.len(),
        });
    }

    let src = &src[..src_len];
    let dst = &mut dst[..dst_len];

    match format {
        PixelFormat::Yuv422 => pack_yuv422(src, dst),
        PixelFormat::Rgb565 => pack_rgb565(src, dst),
        PixelFormat::Yvu => {
            dst.copy_from_slice(src);
            swap_cbcr(dst);
        }
        PixelFormat::Grayscale
        | PixelFormat::Yuv
        | PixelFormat::Rgb
        | PixelFormat::Bgr
        | PixelFormat::Rgb32
        | PixelFormat::Bgr32 => dst.copy_from_slice(src),
    }

    Ok(src_len)
}

/// `Y0 Cb Y1 Cr` → `Y0 Cb Cr`, `Y1 Cb Cr`.
///
/// Pairs run over the flattened scanlines; a trailing unpaired pixel is
/// left untouched.
fn pack_yuv422(src: &[u8], dst: &mut [u8]) {
    for (yuyv, out) in src.chunks_exact(4).zip(dst.chunks_exact_mut(6)) {
        out.copy_from_slice(&[yuyv[0], yuyv[1], yuyv[3], yuyv[2], yuyv[1], yuyv[3]]);
    }
}

/// Little-endian `RRRRRGGG GGGBBBBB` → `R G B`, low bits zero.
fn pack_rgb565(src: &[u8], dst: &mut [u8]) {
    for (word, out) in src.chunks_exact(2).zip(dst.chunks_exact_mut(3)) {
        let (lo, hi) = (word[0], word[1]);
        out[0] = hi & 0xf8;
        out[1] = ((hi << 5) & 0xe0) | ((lo >> 3) & 0x1c);
        out[2] = (lo << 3) & 0xf8;
    }
}

// =============================================================================
// Chroma
// =============================================================================

/// Exchange the 2nd and 3rd byte of every 3-byte pixel (YCbCr ↔ YCrCb).
pub fn swap_cbcr(data: &mut [u8]) {
    for pixel in data.chunks_exact_mut(3) {
        pixel.swap(1, 2);
    }
}

#[inline]
fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Full-range (JFIF) RGB → YCbCr.
#[inline]
pub fn rgb_to_ycbcr(rgb: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (rgb[0] as f32, rgb[1] as f32, rgb[2] as f32);
    [
        clamp_u8(0.299 * r + 0.587 * g + 0.114 * b),
        clamp_u8(-0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0),
        clamp_u8(0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0),
    ]
}

/// Full-range (JFIF) YCbCr → RGB.
#[inline]
pub fn ycbcr_to_rgb(ycc: [u8; 3]) -> [u8; 3] {
    let y = ycc[0] as f32;
    let cb = ycc[1] as f32 - 128.0;
    let cr = ycc[2] as f32 - 128.0;
    [
        clamp_u8(y + 1.402 * cr),
        clamp_u8(y - 0.344_136 * cb - 0.714_136 * cr),
        clamp_u8(y + 1.772 * cb),
    ]
}

// =============================================================================
// Colormap
// =============================================================================

/// Palette for quantized output: one plane per colour component.
///
/// `planes[c][i]` is component `c` of palette entry `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    planes: Vec<Vec<u8>>,
}

impl Colormap {
    /// # Errors
    /// - `UnsupportedComponentCount` unless there are 1, 2 or 3 planes
    /// - `BufferSizeMismatch` if the planes differ in length
    pub fn new(planes: Vec<Vec<u8>>) -> Result<Self, PixelError> {
        if !(1..=3).contains(&planes.len()) {
            return Err(PixelError::UnsupportedComponentCount(planes.len()));
        }

        let entries = planes[0].len();
        if let Some(plane) = planes.iter().find(|p| p.len() != entries) {
            return Err(PixelError::BufferSizeMismatch {
                expected: entries,
                actual: plane.len(),
            });
        }

        Ok(Self { planes })
    }

    /// Build from interleaved entries, e.g. `[(r, g, b), ...]` as `[[r, g, b], ...]`.
    pub fn from_entries<const C: usize>(entries: &[[u8; C]]) -> Result<Self, PixelError> {
        let planes = (0..C)
            .map(|c| entries.iter().map(|entry| entry[c]).collect())
            .collect();
        Self::new(planes)
    }

    /// Components per entry.
    pub fn components(&self) -> usize {
        self.planes.len()
    }

    /// Number of palette entries.
    pub fn len(&self) -> usize {
        self.planes[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every index byte with its palette entry.
    pub fn expand(&self, indices: &[u8]) -> Result<Vec<u8>, PixelError> {
        let entries = self.len();
        let mut out = Vec::with_capacity(indices.len() * self.components());

        for &index in indices {
            let i = index as usize;
            if i >= entries {
                return Err(PixelError::ColormapIndexOutOfRange { index, entries });
            }
            out.extend(self.planes.iter().map(|plane| plane[i]));
        }

        Ok(out)
    }

    /// Each entry packed into one integer, first component most significant.
    pub fn packed_entries(&self) -> Vec<u32> {
        (0..self.len())
            .map(|i| {
                self.planes
                    .iter()
                    .fold(0u32, |acc, plane| (acc << 8) | plane[i] as u32)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
