//! Conversion between physical pixels and logical layout units.
//!
//! The layout engine stores and compares every coordinate in logical
//! (density-independent) units. Render surfaces measure and draw in
//! physical pixels. [`UnitConverter`] is the single place where the two
//! meet.

use thiserror::Error;

use crate::geometry::{Bounds, Size};

/// Errors raised when constructing a [`UnitConverter`].
#[derive(Debug, Error, PartialEq)]
pub enum UnitError {
    #[error("Pixel density must be a positive finite number, got {0}")]
    InvalidDensity(f32),
}

/// Maps physical pixels to logical units using a fixed pixel density.
///
/// A density of `2.0` means one logical unit covers two physical pixels.
///
/// # Examples
///
/// ```
/// # use cumulus_core::{geometry::Size, units::UnitConverter};
/// let units = UnitConverter::new(2.0).unwrap();
/// assert_eq!(units.size_to_logical(Size::new(100.0, 40.0)), Size::new(50.0, 20.0));
/// assert_eq!(units.size_to_physical(Size::new(50.0, 20.0)), Size::new(100.0, 40.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    density: f32,
}

impl UnitConverter {
    /// Creates a converter for the given pixel density.
    ///
    /// # Errors
    ///
    /// Returns [`UnitError::InvalidDensity`] if `density` is zero, negative,
    /// or not finite.
    pub fn new(density: f32) -> Result<Self, UnitError> {
        if !density.is_finite() || density <= 0.0 {
            return Err(UnitError::InvalidDensity(density));
        }
        Ok(Self { density })
    }

    /// Returns the physical pixels per logical unit.
    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn size_to_logical(&self, size: Size) -> Size {
        size.scale(1.0 / self.density)
    }

    pub fn size_to_physical(&self, size: Size) -> Size {
        size.scale(self.density)
    }

    pub fn bounds_to_logical(&self, bounds: Bounds) -> Bounds {
        bounds.scale(1.0 / self.density)
    }

    pub fn bounds_to_physical(&self, bounds: Bounds) -> Bounds {
        bounds.scale(self.density)
    }
}

impl Default for UnitConverter {
    /// Identity mapping: one pixel per logical unit.
    fn default() -> Self {
        Self { density: 1.0 }
    }
}
