//! Command-line configuration for the `jpegmeta` binary.
//!
//! Every option can also come from an environment variable with the
//! `JPEGMETA_` prefix:
//!
//! - `JPEGMETA_FORMAT` - Pixel format for `decode` and `encode`
//! - `JPEGMETA_QUALITY` - JPEG quality for `encode` (default: 75)
//! - `JPEGMETA_WITH_EXIF` - Include the EXIF tree in the metadata
//! - `JPEGMETA_ORIENTATION` - Apply the EXIF orientation
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use jpegmeta::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! match cli.command {
//!     Command::Info(config) => println!("{}", config.input.display()),
//!     _ => {}
//! }
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::codec::{DecoderOptions, EncoderOptions, DEFAULT_JPEG_QUALITY, MAX_DIMENSION};
use crate::pixel::PixelFormat;

// =============================================================================
// CLI Arguments
// =============================================================================

/// jpegmeta - JPEG decode/encode with EXIF metadata and orientation.
#[derive(Parser, Debug, Clone)]
#[command(name = "jpegmeta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the header metadata of a JPEG file as JSON.
    Info(InfoConfig),

    /// Decode a JPEG file to raw pixels.
    Decode(DecodeConfig),

    /// Encode raw pixels to a JPEG file.
    Encode(EncodeConfig),

    /// Extract the embedded EXIF thumbnail.
    Thumbnail(ThumbnailConfig),
}

// =============================================================================
// Info
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct InfoConfig {
    /// JPEG file to inspect.
    pub input: PathBuf,

    /// Include the EXIF tree.
    #[arg(long = "exif", default_value_t = false, env = "JPEGMETA_WITH_EXIF")]
    pub with_exif: bool,

    /// Report dimensions after applying the EXIF orientation.
    #[arg(long, default_value_t = false, env = "JPEGMETA_ORIENTATION")]
    pub orientation: bool,
}

impl InfoConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_input(&self.input)
    }

    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions::new()
            .with_exif(self.with_exif)
            .with_orientation(self.orientation)
    }
}

// =============================================================================
// Decode
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct DecodeConfig {
    /// JPEG file to decode.
    pub input: PathBuf,

    /// Where to write the raw pixels.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output pixel format (GRAYSCALE, YUV, YVU, RGB, BGR, RGB32, BGR32).
    #[arg(long, default_value_t = PixelFormat::Rgb, env = "JPEGMETA_FORMAT")]
    pub format: PixelFormat,

    /// Include the EXIF tree in the printed metadata.
    #[arg(long = "exif", default_value_t = false, env = "JPEGMETA_WITH_EXIF")]
    pub with_exif: bool,

    /// Rotate/flip the pixels upright per the EXIF orientation.
    #[arg(long, default_value_t = false, env = "JPEGMETA_ORIENTATION")]
    pub orientation: bool,
}

impl DecodeConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_input(&self.input)?;

        if !self.format.is_decodable() {
            return Err(format!("{} can only be used for encoding", self.format));
        }

        if self.output == self.input {
            return Err("output must differ from input".to_string());
        }

        Ok(())
    }

    pub fn decoder_options(&self) -> DecoderOptions {
        DecoderOptions::new()
            .with_pixel_format(self.format)
            .with_exif(self.with_exif)
            .with_orientation(self.orientation)
    }
}

// =============================================================================
// Encode
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct EncodeConfig {
    /// Raw pixel file to encode.
    pub input: PathBuf,

    /// Where to write the JPEG.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Image width in pixels.
    #[arg(long)]
    pub width: usize,

    /// Image height in pixels.
    #[arg(long)]
    pub height: usize,

    /// Input pixel format (YUV422, RGB565, GRAYSCALE, YUV, YVU, RGB, BGR, RGB32, BGR32).
    #[arg(long, default_value_t = PixelFormat::Yuv422, env = "JPEGMETA_FORMAT")]
    pub format: PixelFormat,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "JPEGMETA_QUALITY")]
    pub quality: u8,
}

impl EncodeConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_input(&self.input)?;

        if self.width == 0 || self.height == 0 {
            return Err("width and height must be greater than 0".to_string());
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(format!("width and height must be at most {}", MAX_DIMENSION));
        }

        if self.format == PixelFormat::Yuv422 && self.width % 2 != 0 {
            return Err("YUV422 input needs an even width".to_string());
        }

        if self.quality == 0 || self.quality > 100 {
            return Err("quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Raw input size implied by the dimensions and format.
    pub fn expected_input_size(&self) -> usize {
        self.width * self.height * self.format.bytes_per_pixel()
    }

    pub fn encoder_options(&self) -> EncoderOptions {
        EncoderOptions::new()
            .with_pixel_format(self.format)
            .with_quality(self.quality)
    }
}

// =============================================================================
// Thumbnail
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ThumbnailConfig {
    /// JPEG file carrying the thumbnail.
    pub input: PathBuf,

    /// Where to write the thumbnail JPEG.
    #[arg(short, long)]
    pub output: PathBuf,
}

impl ThumbnailConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_input(&self.input)?;

        if self.output == self.input {
            return Err("output must differ from input".to_string());
        }

        Ok(())
    }
}

fn validate_input(input: &std::path::Path) -> Result<(), String> {
    if input.as_os_str().is_empty() {
        return Err("input path is required".to_string());
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
