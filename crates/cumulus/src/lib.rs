//! Cumulus - an incremental word-cloud layout engine.
//!
//! Words arrive one at a time, grow, shrink and disappear. Cumulus keeps
//! them in a two-level layout: words are packed into clusters of about
//! `sqrt(n)` words, and clusters are packed around the center of the
//! surface. Every change moves as little as possible of what is already on
//! screen.
//!
//! The [`CloudEngine`] does the layout and talks to a [`RenderSurface`] for
//! measuring and drawing. [`CloudBuilder`] wires an engine to a transcript
//! of word events and exports the result as a [`CloudSnapshot`].

pub mod config;
pub mod surface;
pub mod transcript;
pub mod words;

mod arena;
mod clock;
mod engine;
mod entity;
mod error;
mod free_list;
mod packing;
mod session;
mod snapshot;
mod tree;

pub use cumulus_core::{geometry, units};

pub use arena::EntityId;
pub use clock::Timestamp;
pub use engine::{CloudEngine, IgnoreReason, InvariantViolation, WordUpdate, WordView};
pub use entity::{Entity, GroupEntity, Spatial, WordEntity, WordState};
pub use error::CumulusError;
pub use free_list::FreeGroups;
pub use packing::{PackingParams, Placement, find_center};
pub use session::CloudSession;
pub use snapshot::{BoundsRecord, CloudSnapshot, LayoutRecord, WordRecord};
pub use surface::{HeadlessSurface, RenderSurface};
pub use tree::CloudTree;

use log::{debug, info, trace};

use cumulus_core::geometry::Size;

use config::AppConfig;
use transcript::Command;

/// Builder for replaying transcripts into word clouds.
///
/// # Examples
///
/// ```rust
/// use cumulus::{CloudBuilder, config::AppConfig};
///
/// let builder = CloudBuilder::new(AppConfig::default());
///
/// let commands = builder.parse("hello world hello\n")
///     .expect("Failed to parse");
///
/// let snapshot = builder.replay(&commands)
///     .expect("Failed to lay out");
///
/// assert_eq!(snapshot.word("hello").map(|word| word.count), Some(2));
/// ```
#[derive(Default)]
pub struct CloudBuilder {
    config: AppConfig,
}

impl CloudBuilder {
    /// Create a new cloud builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse a transcript into commands.
    ///
    /// # Errors
    ///
    /// Returns [`CumulusError::Transcript`] carrying the source text, so
    /// the offending span can be shown.
    pub fn parse(&self, source: &str) -> Result<Vec<Command>, CumulusError> {
        info!("Parsing transcript");

        let commands = transcript::parse(source)
            .map_err(|err| CumulusError::new_transcript_error(err, source))?;

        debug!(commands = commands.len(); "Transcript parsed successfully");
        trace!(commands:?; "Parsed transcript");

        Ok(commands)
    }

    /// Create an engine on the configured surface size.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn build_engine<S: RenderSurface>(
        &self,
        surface: S,
    ) -> Result<CloudEngine<S>, CumulusError> {
        self.build_engine_with_size(self.config.surface().size(), surface)
    }

    /// Create an engine on a surface of `surface_size_px`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn build_engine_with_size<S: RenderSurface>(
        &self,
        surface_size_px: Size,
        surface: S,
    ) -> Result<CloudEngine<S>, CumulusError> {
        CloudEngine::from_config(surface_size_px, surface, &self.config)
    }

    /// Replay commands into a fresh headless cloud and export it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn replay(&self, commands: &[Command]) -> Result<CloudSnapshot, CumulusError> {
        let surface = HeadlessSurface::new(*self.config.typography());
        let mut engine = self.build_engine(surface)?;
        engine.replay(commands);

        info!(words = engine.len(); "Cloud laid out");
        Ok(engine.snapshot())
    }
}
