//! jpegmeta - JPEG decode/encode with EXIF metadata and orientation.
//!
//! This binary wires the CLI subcommands to the library.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jpegmeta::{
    codec::{Decoder, Encoder},
    config::{Cli, Command, DecodeConfig, EncodeConfig, InfoConfig, ThumbnailConfig},
    format::exif::read_metadata,
};

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Command::Info(config) => run_info(config),
        Command::Decode(config) => run_decode(config),
        Command::Encode(config) => run_encode(config),
        Command::Thumbnail(config) => run_thumbnail(config),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "jpegmeta=debug"
    } else {
        "jpegmeta=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Read a whole input file, logging the failure.
fn read_input(path: &std::path::Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => Some(data),
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

fn write_output(path: &std::path::Path, data: &[u8]) -> bool {
    match fs::write(path, data) {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to write {}: {}", path.display(), e);
            false
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            true
        }
        Err(e) => {
            error!("Failed to serialize output: {}", e);
            false
        }
    }
}

// =============================================================================
// Info Command
// =============================================================================

fn run_info(config: InfoConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(jpeg) = read_input(&config.input) else {
        return ExitCode::FAILURE;
    };

    let decoder = match Decoder::new(config.decoder_options()) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let meta = match decoder.read_header(&jpeg) {
        Ok(meta) => meta,
        Err(e) => {
            error!("Failed to read header of {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if print_json(&meta) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// =============================================================================
// Decode Command
// =============================================================================

fn run_decode(config: DecodeConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(jpeg) = read_input(&config.input) else {
        return ExitCode::FAILURE;
    };

    let mut decoder = match Decoder::new(config.decoder_options()) {
        Ok(decoder) => decoder,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (pixels, meta) = match decoder.decode(&jpeg) {
        Ok(decoded) => decoded.into_parts(),
        Err(e) => {
            error!("Failed to decode {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if !write_output(&config.output, pixels.as_bytes()) {
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {}x{} {} pixels to {}",
        pixels.width(),
        pixels.height(),
        config.format,
        config.output.display()
    );

    match meta {
        Some(meta) if !print_json(&meta) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

// =============================================================================
// Encode Command
// =============================================================================

fn run_encode(config: EncodeConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(raw) = read_input(&config.input) else {
        return ExitCode::FAILURE;
    };

    let expected = config.expected_input_size();
    if raw.len() != expected {
        error!(
            "{} holds {} bytes, a {}x{} {} frame needs {}",
            config.input.display(),
            raw.len(),
            config.width,
            config.height,
            config.format,
            expected
        );
        return ExitCode::FAILURE;
    }

    let mut encoder = match Encoder::new(config.width, config.height, config.encoder_options()) {
        Ok(encoder) => encoder,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let jpeg = match encoder.encode(&raw) {
        Ok(jpeg) => jpeg,
        Err(e) => {
            error!("Failed to encode {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    if !write_output(&config.output, &jpeg) {
        return ExitCode::FAILURE;
    }

    info!("Wrote {} bytes to {}", jpeg.len(), config.output.display());
    ExitCode::SUCCESS
}

// =============================================================================
// Thumbnail Command
// =============================================================================

fn run_thumbnail(config: ThumbnailConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(jpeg) = read_input(&config.input) else {
        return ExitCode::FAILURE;
    };

    let tree = match read_metadata(&jpeg) {
        Ok(tree) => tree,
        Err(e) => {
            error!("Failed to parse EXIF in {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let Some(thumbnail) = tree.thumbnail() else {
        warn!("{} has no embedded thumbnail", config.input.display());
        return ExitCode::FAILURE;
    };

    if !write_output(&config.output, &thumbnail.jpeg) {
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {} byte thumbnail to {}",
        thumbnail.jpeg.len(),
        config.output.display()
    );
    ExitCode::SUCCESS
}
