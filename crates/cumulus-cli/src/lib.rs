//! Cumulus CLI library
//!
//! This module contains the core CLI logic for the Cumulus word-cloud tool.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::fs;

use log::info;

use cumulus::{CloudBuilder, CumulusError};

use config::SurfaceOverrides;

/// Run the Cumulus CLI application
///
/// This function replays the transcript through the Cumulus engine and
/// writes the resulting snapshot as JSON to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CumulusError` for:
/// - File I/O errors
/// - Configuration loading and validation errors
/// - Transcript syntax errors
/// - Snapshot serialization errors
pub fn run(args: &Args) -> Result<(), CumulusError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing transcript"
    );

    // Load configuration and apply surface overrides
    let app_config = config::load_config(args.config.as_ref())?;
    let app_config = config::apply_overrides(
        app_config,
        SurfaceOverrides {
            width: args.width,
            height: args.height,
            density: args.density,
        },
    )?;

    // Read input file
    let source = fs::read_to_string(&args.input)?;

    // Replay the transcript using the CloudBuilder API
    let builder = CloudBuilder::new(app_config);
    let commands = builder.parse(&source)?;
    let snapshot = builder.replay(&commands)?;

    // Write output file
    fs::write(&args.output, snapshot.to_json_pretty()?)?;

    info!(
        output_file = args.output,
        words = snapshot.words.len();
        "Snapshot exported successfully"
    );

    Ok(())
}
