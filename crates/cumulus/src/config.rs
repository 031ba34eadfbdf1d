//! Configuration types for the cloud engine.
//!
//! This module provides configuration structures that control the surface
//! the cloud is laid out on, the packing parameters, and the typography
//! used by [`HeadlessSurface`](crate::surface::HeadlessSurface). All types
//! implement [`serde::Deserialize`] for loading from external sources; any
//! missing field falls back to its default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`SurfaceConfig`] - Physical size and pixel density of the surface.
//! - [`LayoutConfig`] - Spacing and search limits of the packing routine.
//! - [`TypographyConfig`] - Font sizing used to measure words.
//!
//! # Example
//!
//! ```
//! # use cumulus::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.surface().width(), 1080.0);
//! ```

use serde::Deserialize;

use cumulus_core::geometry::Size;

use crate::packing::PackingParams;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Surface configuration section.
    #[serde(default)]
    surface: SurfaceConfig,

    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Typography configuration section.
    #[serde(default)]
    typography: TypographyConfig,

    /// Words ignored by the engine from the start.
    #[serde(default)]
    exclusions: Vec<String>,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        surface: SurfaceConfig,
        layout: LayoutConfig,
        typography: TypographyConfig,
        exclusions: Vec<String>,
    ) -> Self {
        Self {
            surface,
            layout,
            typography,
            exclusions,
        }
    }

    pub fn surface(&self) -> &SurfaceConfig {
        &self.surface
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub fn typography(&self) -> &TypographyConfig {
        &self.typography
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    /// Returns a copy with the surface section replaced.
    pub fn with_surface(mut self, surface: SurfaceConfig) -> Self {
        self.surface = surface;
        self
    }

    /// Checks every section for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        self.surface.validate()?;
        self.layout.validate()?;
        self.typography.validate()
    }
}

/// Physical surface the cloud is laid out on.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Width in physical pixels.
    width: f32,
    /// Height in physical pixels.
    height: f32,
    /// Physical pixels per logical unit.
    density: f32,
}

impl SurfaceConfig {
    pub fn new(width: f32, height: f32, density: f32) -> Self {
        Self {
            width,
            height,
            density,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Surface size in physical pixels.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(format!("surface.width must be positive, got {}", self.width));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(format!(
                "surface.height must be positive, got {}",
                self.height
            ));
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(format!(
                "surface.density must be positive, got {}",
                self.density
            ));
        }
        Ok(())
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::new(1080.0, 1920.0, 1.0)
    }
}

/// Packing parameters, in logical units.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum gap between words of the same cluster.
    word_spacing: f32,
    /// Minimum gap between clusters.
    cluster_spacing: f32,
    /// Distance between search rings.
    search_step: f32,
    /// Rings explored before a side placement is used.
    max_search_rings: usize,
}

impl LayoutConfig {
    pub fn new(
        word_spacing: f32,
        cluster_spacing: f32,
        search_step: f32,
        max_search_rings: usize,
    ) -> Self {
        Self {
            word_spacing,
            cluster_spacing,
            search_step,
            max_search_rings,
        }
    }

    pub fn word_spacing(&self) -> f32 {
        self.word_spacing
    }

    pub fn cluster_spacing(&self) -> f32 {
        self.cluster_spacing
    }

    pub fn search_step(&self) -> f32 {
        self.search_step
    }

    pub fn max_search_rings(&self) -> usize {
        self.max_search_rings
    }

    /// Packing parameters for words inside a cluster.
    pub fn word_packing(&self) -> PackingParams {
        PackingParams::new(self.word_spacing, self.search_step, self.max_search_rings)
    }

    /// Packing parameters for clusters inside the root.
    pub fn cluster_packing(&self) -> PackingParams {
        PackingParams::new(
            self.cluster_spacing,
            self.search_step,
            self.max_search_rings,
        )
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.word_spacing.is_finite() && self.word_spacing >= 0.0) {
            return Err(format!(
                "layout.word_spacing must not be negative, got {}",
                self.word_spacing
            ));
        }
        if !(self.cluster_spacing.is_finite() && self.cluster_spacing >= 0.0) {
            return Err(format!(
                "layout.cluster_spacing must not be negative, got {}",
                self.cluster_spacing
            ));
        }
        if !(self.search_step.is_finite() && self.search_step > 0.0) {
            return Err(format!(
                "layout.search_step must be positive, got {}",
                self.search_step
            ));
        }
        if self.max_search_rings == 0 {
            return Err("layout.max_search_rings must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(2.0, 8.0, 2.0, 500)
    }
}

/// Font sizing rules for measuring words.
///
/// The font size grows linearly with the count and is capped. Text is
/// measured as a single line of fixed-advance glyphs.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TypographyConfig {
    /// Font size of a word seen once, in physical pixels.
    base_font_size: f32,
    /// Font size added per extra occurrence.
    font_step: f32,
    /// Upper bound on the font size.
    max_font_size: f32,
    /// Glyph advance as a fraction of the font size.
    char_width: f32,
    /// Line height as a multiple of the font size.
    line_height: f32,
}

impl TypographyConfig {
    pub fn new(
        base_font_size: f32,
        font_step: f32,
        max_font_size: f32,
        char_width: f32,
        line_height: f32,
    ) -> Self {
        Self {
            base_font_size,
            font_step,
            max_font_size,
            char_width,
            line_height,
        }
    }

    /// Font size in pixels for a word with `count` occurrences.
    pub fn font_size(&self, count: i64) -> f32 {
        let extra = count.saturating_sub(1).max(0) as f32;
        (self.base_font_size + self.font_step * extra).min(self.max_font_size)
    }

    /// Pixel size of `name` drawn at the font size for `count`.
    pub fn measure(&self, name: &str, count: i64) -> Size {
        let font_size = self.font_size(count);
        let glyphs = name.chars().count() as f32;
        Size::new(
            glyphs * font_size * self.char_width,
            font_size * self.line_height,
        )
    }

    fn validate(&self) -> Result<(), String> {
        let fields = [
            ("base_font_size", self.base_font_size),
            ("max_font_size", self.max_font_size),
            ("char_width", self.char_width),
            ("line_height", self.line_height),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("typography.{name} must be positive, got {value}"));
            }
        }
        if !(self.font_step.is_finite() && self.font_step >= 0.0) {
            return Err(format!(
                "typography.font_step must not be negative, got {}",
                self.font_step
            ));
        }
        if self.max_font_size < self.base_font_size {
            return Err(format!(
                "typography.max_font_size ({}) is below base_font_size ({})",
                self.max_font_size, self.base_font_size
            ));
        }
        Ok(())
    }
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self::new(14.0, 4.0, 72.0, 0.6, 1.25)
    }
}
