//! Error types for Cumulus operations.
//!
//! This module provides the main error type [`CumulusError`] which wraps
//! the failures of the outer surfaces: reading files, loading
//! configuration, parsing transcripts and writing snapshots. Layout
//! operations themselves never fail; rejected words are reported through
//! [`WordUpdate`](crate::engine::WordUpdate).

use std::io;

use thiserror::Error;

use cumulus_core::units::UnitError;

use crate::transcript::TranscriptError;

/// The main error type for Cumulus operations.
///
/// # Diagnostic Variants
///
/// The `Transcript` variant keeps the transcript source next to the parse
/// error so that callers can render the offending span.
#[derive(Debug, Error)]
pub enum CumulusError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{err}")]
    Transcript { err: TranscriptError, src: String },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("Unit error: {0}")]
    Units(#[from] UnitError),
}

impl CumulusError {
    /// Create a new `Transcript` error with the associated source text.
    pub fn new_transcript_error(err: TranscriptError, src: impl Into<String>) -> Self {
        Self::Transcript {
            err,
            src: src.into(),
        }
    }
}
