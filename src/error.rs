use thiserror::Error;

/// Errors raised while parsing an EXIF APP1 segment.
///
/// Any of these aborts metadata extraction for the whole segment; a broken
/// nested directory is never silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExifError {
    /// Segment does not start with `Exif\0\0`
    #[error("invalid exif identifier")]
    MalformedIdentifier,

    /// Bad byte-order marker or TIFF magic number
    #[error("invalid tiff header: {reason}")]
    MalformedTiffHeader { reason: String },

    /// IFD offset points outside the segment
    #[error("invalid IFD offset: {0}")]
    InvalidDirectoryOffset(u32),

    /// Directory entry uses a value type this reader does not decode
    #[error("unsupported tag data type: {0}")]
    UnsupportedValueType(u16),

    /// Entry table or value data runs past the end of the segment
    #[error("truncated exif data: {size} bytes at offset {offset}, segment has {available}")]
    TruncatedValue {
        offset: usize,
        size: usize,
        available: usize,
    },

    /// Nested IFD pointers chain deeper than the walker allows
    #[error("nested IFD depth exceeds {0}")]
    NestingTooDeep(usize),
}

/// Errors from the geometry engine and pixel format converters.
///
/// These indicate a caller/configuration mismatch rather than bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PixelError {
    /// Only 1, 2, 3 and 4 bytes per pixel are supported
    #[error("unsupported bytes per pixel: {0}")]
    UnsupportedBytesPerPixel(usize),

    /// Colormaps carry 1, 2 or 3 component planes
    #[error("this number of components is not implemented: {0}")]
    UnsupportedComponentCount(usize),

    /// Buffer length does not match the declared geometry
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Palette index has no entry in the colormap
    #[error("colormap index {index} out of range ({entries} entries)")]
    ColormapIndexOutOfRange { index: u8, entries: usize },

    /// Transposition cannot be performed in place
    #[error("transpose requires a new destination buffer")]
    TransposeNeedsNewBuffer,
}

/// Errors surfaced by the decoder and encoder entry points.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// The JPEG codec rejected the input
    #[error("decode error: {message}")]
    Decode { message: String },

    /// The JPEG codec failed to compress
    #[error("encode error: {message}")]
    Encode { message: String },

    /// Pixel format is not available for this direction
    #[error("pixel format {format} is not supported for {operation}")]
    UnsupportedPixelFormat {
        format: &'static str,
        operation: &'static str,
    },

    /// Options failed validation
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Metadata in the stream is corrupt
    #[error("exif error: {0}")]
    Exif(#[from] ExifError),

    /// Pixel transform or conversion failed
    #[error("pixel error: {0}")]
    Pixel(#[from] PixelError),
}
