//! Command-line argument definitions for the Cumulus CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the transcript and snapshot paths,
//! configuration file selection, surface overrides, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the Cumulus word-cloud tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input transcript
    #[arg(help = "Path to the transcript file")]
    pub input: String,

    /// Path to the output JSON snapshot
    #[arg(short, long, default_value = "cloud.json")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Surface width in physical pixels, overriding the configuration
    #[arg(long)]
    pub width: Option<f32>,

    /// Surface height in physical pixels, overriding the configuration
    #[arg(long)]
    pub height: Option<f32>,

    /// Physical pixels per logical unit, overriding the configuration
    #[arg(long)]
    pub density: Option<f32>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
