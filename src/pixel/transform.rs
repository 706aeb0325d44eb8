//! Orientation geometry: transpose, flip vertical, flip horizontal.
//!
//! Flips work in place. Transpose cannot (the row length changes), so it
//! always writes a second buffer; the two entry points on [`GeometryEngine`]
//! make that split explicit:
//!
//! - [`GeometryEngine::transform_in_place`] - flips only, rejects `TRANSPOSE`
//! - [`GeometryEngine::transform_into_new_buffer`] - any flag set, consumes
//!   the input and may hand back a different allocation
//!
//! Every routine has a dedicated path for 1, 2, 3 and 4 bytes per pixel.

use tracing::debug;

use crate::error::PixelError;
use crate::format::exif::OrientationFlags;

use super::PixelBuffer;

// =============================================================================
// GeometryEngine
// =============================================================================

/// Applies orientation flags to pixel buffers.
///
/// Keeps the last buffer released by a transpose so the next transpose of
/// the same size can write into it instead of allocating. The cache makes the
/// engine stateful; use one engine per decode pipeline.
#[derive(Debug, Default)]
pub struct GeometryEngine {
    spare: Option<Vec<u8>>,
}

impl GeometryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Size of the cached transpose buffer, if any.
    pub fn cached_len(&self) -> Option<usize> {
        self.spare.as_ref().map(Vec::len)
    }

    /// Drop the cached transpose buffer.
    pub fn clear_cache(&mut self) {
        self.spare = None;
    }

    /// Apply the flip flags to `buffer` without reallocating.
    ///
    /// # Errors
    /// - `TransposeNeedsNewBuffer` if `flags` contains `TRANSPOSE`
    /// - `UnsupportedBytesPerPixel` outside 1..=4
    pub fn transform_in_place(
        &self,
        buffer: &mut PixelBuffer,
        flags: OrientationFlags,
    ) -> Result<(), PixelError> {
        if flags.contains(OrientationFlags::TRANSPOSE) {
            return Err(PixelError::TransposeNeedsNewBuffer);
        }
        check_bytes_per_pixel(buffer.bytes_per_pixel())?;

        if flags.contains(OrientationFlags::FLIP_VERTICAL) {
            flip_vertical(buffer)?;
        }
        if flags.contains(OrientationFlags::FLIP_HORIZONTAL) {
            flip_horizontal(buffer)?;
        }

        Ok(())
    }

    /// Apply all flags, transposing into a fresh (or recycled) buffer first.
    ///
    /// The returned buffer has width and height swapped when `TRANSPOSE` is
    /// set. The input allocation is kept as the next transpose destination.
    pub fn transform_into_new_buffer(
        &mut self,
        buffer: PixelBuffer,
        flags: OrientationFlags,
    ) -> Result<PixelBuffer, PixelError> {
        check_bytes_per_pixel(buffer.bytes_per_pixel())?;

        let mut buffer = if flags.contains(OrientationFlags::TRANSPOSE) {
            self.transpose(buffer)?
        } else {
            buffer
        };

        self.transform_in_place(&mut buffer, flags - OrientationFlags::TRANSPOSE)?;
        Ok(buffer)
    }

    fn transpose(&mut self, source: PixelBuffer) -> Result<PixelBuffer, PixelError> {
        let size = source.as_bytes().len();

        let mut destination = match self.spare.take() {
            Some(spare) if spare.len() == size => {
                debug!(size, "Reusing cached transpose buffer");
                spare
            }
            _ => vec![0; size],
        };

        transpose_into(&source, &mut destination)?;

        let transposed = source.transposed_with(destination);
        self.spare = Some(source.into_vec());
        Ok(transposed)
    }
}

// =============================================================================
// Operations
// =============================================================================

#[inline]
fn check_bytes_per_pixel(bytes_per_pixel: usize) -> Result<(), PixelError> {
    match bytes_per_pixel {
        1..=4 => Ok(()),
        other => Err(PixelError::UnsupportedBytesPerPixel(other)),
    }
}

/// Transpose into a newly allocated buffer with width and height swapped.
pub fn transpose(source: &PixelBuffer) -> Result<PixelBuffer, PixelError> {
    let mut destination = vec![0; source.as_bytes().len()];
    transpose_into(source, &mut destination)?;
    Ok(source.transposed_with(destination))
}

/// Write the transpose of `source` into `destination`.
///
/// Pixel `(x, y)` of the source lands at `(y, x)`, so the destination rows
/// are `source.height()` pixels long.
pub fn transpose_into(source: &PixelBuffer, destination: &mut [u8]) -> Result<(), PixelError> {
    let expected = source.as_bytes().len();
    if destination.len() != expected {
        return Err(PixelError::BufferSizeMismatch {
            expected,
            actual: destination.len(),
        });
    }

    check_bytes_per_pixel(source.bytes_per_pixel())?;
    if expected == 0 {
        return Ok(());
    }

    let (width, height) = (source.width(), source.height());
    let src = source.as_bytes();

    match source.bytes_per_pixel() {
        1 => transpose_px::<1>(src, width, height, destination),
        2 => transpose_px::<2>(src, width, height, destination),
        3 => transpose_px::<3>(src, width, height, destination),
        4 => transpose_px::<4>(src, width, height, destination),
        other => return Err(PixelError::UnsupportedBytesPerPixel(other)),
    }

    Ok(())
}

/// Reverse the order of all pixels, turning the image by 180°.
///
/// Rows are contiguous, so this reverses both the row order and each row.
pub fn flip_vertical(buffer: &mut PixelBuffer) -> Result<(), PixelError> {
    let bytes_per_pixel = buffer.bytes_per_pixel();
    let data = buffer.as_bytes_mut();

    match bytes_per_pixel {
        1 => data.reverse(),
        2 => reverse_px::<2>(data),
        3 => reverse_px::<3>(data),
        4 => reverse_px::<4>(data),
        other => return Err(PixelError::UnsupportedBytesPerPixel(other)),
    }

    Ok(())
}

/// Mirror each row left to right.
pub fn flip_horizontal(buffer: &mut PixelBuffer) -> Result<(), PixelError> {
    let bytes_per_pixel = buffer.bytes_per_pixel();
    let stride = buffer.stride();
    if stride == 0 {
        return check_bytes_per_pixel(bytes_per_pixel);
    }
    let rows = buffer.as_bytes_mut().chunks_exact_mut(stride);

    match bytes_per_pixel {
        1 => rows.for_each(<[u8]>::reverse),
        2 => rows.for_each(reverse_px::<2>),
        3 => rows.for_each(reverse_px::<3>),
        4 => rows.for_each(reverse_px::<4>),
        other => return Err(PixelError::UnsupportedBytesPerPixel(other)),
    }

    Ok(())
}

// =============================================================================
// Per-width Kernels
// =============================================================================

fn transpose_px<const N: usize>(src: &[u8], width: usize, height: usize, dst: &mut [u8]) {
    for (y, row) in src.chunks_exact(width * N).enumerate() {
        for (x, pixel) in row.chunks_exact(N).enumerate() {
            let at = (x * height + y) * N;
            dst[at..at + N].copy_from_slice(pixel);
        }
    }
}

/// Swap pixel `i` with pixel `count - 1 - i`, two pointers converging.
fn reverse_px<const N: usize>(data: &mut [u8]) {
    let count = data.len() / N;
    let mut front = 0;
    let mut back = count;

    while front + 1 < back {
        back -= 1;
        let (head, tail) = data.split_at_mut(back * N);
        head[front * N..front * N + N].swap_with_slice(&mut tail[..N]);
        front += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
