//! Error adapter for converting CumulusError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Transcript
//! errors are rendered with the offending span of the transcript; every
//! other error is rendered as a plain message with an error code.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use cumulus::{CumulusError, transcript::TranscriptError};

/// Adapter for a transcript syntax error.
///
/// This adapter wraps a [`TranscriptError`] together with the transcript
/// text and implements [`MietteDiagnostic`] to point at the bad input.
pub struct TranscriptAdapter<'a> {
    /// The wrapped error
    err: &'a TranscriptError,
    /// Transcript text for displaying snippets
    src: &'a str,
}

impl<'a> TranscriptAdapter<'a> {
    /// Create a new transcript adapter.
    pub fn new(err: &'a TranscriptError, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for TranscriptAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptAdapter")
            .field("err", &self.err)
            .finish()
    }
}

impl fmt::Display for TranscriptAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transcript: {}", self.err.message())
    }
}

impl std::error::Error for TranscriptAdapter<'_> {}

impl MietteDiagnostic for TranscriptAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("cumulus::transcript"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(concat!(
            "items are `word`, `word*N` or `-word`; ",
            "directives are `!clear`, `!exclude` and `!include`"
        )))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.err.span();
        let span = SourceSpan::new(span.start.into(), span.len());
        let label = LabeledSpan::new_primary_with_span(Some(self.err.message().to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Adapter for non-transcript [`CumulusError`] variants.
///
/// This adapter handles errors that don't have source locations, such as
/// I/O errors, configuration errors and snapshot errors.
pub struct ErrorAdapter<'a>(pub &'a CumulusError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CumulusError::Io(_) => "cumulus::io",
            CumulusError::Config(_) => "cumulus::config",
            CumulusError::Transcript { .. } => return None,
            CumulusError::Snapshot(_) => "cumulus::snapshot",
            CumulusError::Units(_) => "cumulus::units",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            CumulusError::Config(_) => Some(Box::new(
                "check the [surface], [layout] and [typography] sections of the configuration",
            )),
            CumulusError::Io(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Some(Box::new(
                    "pass the path of an existing transcript, e.g. `cumulus session.txt -o cloud.json`",
                ))
            }
            _ => None,
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}

/// A reportable error that can be rendered by miette.
///
/// This enum wraps either a transcript diagnostic or a plain error,
/// providing a uniform interface for error rendering.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A transcript error with source location information.
    Transcript(TranscriptAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Transcript(t) => fmt::Display::fmt(t, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Transcript(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Transcript(t) => t.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Transcript(t) => t.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Transcript(t) => t.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Transcript(t) => t.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`CumulusError`] into a list of reportable errors.
pub fn to_reportables(err: &CumulusError) -> Vec<Reportable<'_>> {
    match err {
        CumulusError::Transcript { err, src } => {
            vec![Reportable::Transcript(TranscriptAdapter::new(err, src))]
        }
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}
