//! Rendering collaborator contract.
//!
//! The engine never draws anything itself. It asks a [`RenderSurface`] to
//! measure words, create their visual elements, show them at a position and
//! destroy them again. All sizes and bounds crossing this boundary are in
//! physical pixels.

use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

use cumulus_core::geometry::{Bounds, Size};

use crate::config::TypographyConfig;

/// Failure reported by a surface when creating an element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurfaceError {
    #[error("surface rejected element `{name}`: {reason}")]
    Rejected { name: String, reason: String },
}

/// The visual side of the cloud.
pub trait RenderSurface {
    /// Pixel size of `name` when drawn for `count` occurrences.
    fn measure(&self, name: &str, count: i64) -> Size;

    /// Creates the visual element of a word.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError`] if the element cannot be created; the word
    /// then stays unattached.
    fn create_element(&mut self, name: &str, count: i64) -> Result<(), SurfaceError>;

    /// Moves the element of `name` to `bounds` and redraws it for `count`.
    fn show_element(&mut self, name: &str, count: i64, bounds: Bounds);

    /// Removes the element of `name`. Unknown names are ignored.
    fn destroy_element(&mut self, name: &str);
}

/// Recorded state of one element on a [`HeadlessSurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct ElementState {
    count: i64,
    bounds: Option<Bounds>,
    shows: usize,
}

impl ElementState {
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Last bounds the element was shown at, in pixels.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Number of times the element was shown.
    pub fn shows(&self) -> usize {
        self.shows
    }
}

/// A surface that draws nothing and records what it was asked to do.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    typography: TypographyConfig,
    elements: BTreeMap<String, ElementState>,
    capacity: Option<usize>,
}

impl HeadlessSurface {
    pub fn new(typography: TypographyConfig) -> Self {
        Self {
            typography,
            elements: BTreeMap::new(),
            capacity: None,
        }
    }

    /// Rejects element creation once `capacity` elements exist.
    pub fn with_capacity_limit(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn element(&self, name: &str) -> Option<&ElementState> {
        self.elements.get(name)
    }

    /// Live elements by name.
    pub fn elements(&self) -> impl Iterator<Item = (&str, &ElementState)> {
        self.elements
            .iter()
            .map(|(name, state)| (name.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl RenderSurface for HeadlessSurface {
    fn measure(&self, name: &str, count: i64) -> Size {
        self.typography.measure(name, count)
    }

    fn create_element(&mut self, name: &str, count: i64) -> Result<(), SurfaceError> {
        if let Some(capacity) = self.capacity {
            if self.elements.len() >= capacity && !self.elements.contains_key(name) {
                return Err(SurfaceError::Rejected {
                    name: name.to_string(),
                    reason: format!("capacity of {capacity} elements reached"),
                });
            }
        }

        debug!(name, count; "Creating element");
        self.elements.insert(
            name.to_string(),
            ElementState {
                count,
                bounds: None,
                shows: 0,
            },
        );
        Ok(())
    }

    fn show_element(&mut self, name: &str, count: i64, bounds: Bounds) {
        if let Some(element) = self.elements.get_mut(name) {
            element.count = count;
            element.bounds = Some(bounds);
            element.shows += 1;
        }
    }

    fn destroy_element(&mut self, name: &str) {
        if self.elements.remove(name).is_some() {
            debug!(name; "Destroyed element");
        }
    }
}

#[cfg(test)]
mod tests {
    use cumulus_core::geometry::Point;

    use super::*;

    #[test]
    fn test_element_lifecycle() {
        let mut surface = HeadlessSurface::default();
        surface.create_element("hello", 1).unwrap();
        assert_eq!(surface.element("hello").unwrap().bounds(), None);

        let bounds = Point::new(10.0, 10.0).to_bounds(Size::new(4.0, 2.0));
        surface.show_element("hello", 2, bounds);
        let element = surface.element("hello").unwrap();
        assert_eq!(element.bounds(), Some(bounds));
        assert_eq!(element.count(), 2);
        assert_eq!(element.shows(), 1);

        surface.destroy_element("hello");
        assert!(surface.is_empty());
        surface.destroy_element("hello");
    }

    #[test]
    fn test_capacity_limit_rejects_new_elements() {
        let mut surface = HeadlessSurface::default().with_capacity_limit(1);
        surface.create_element("a", 1).unwrap();

        let err = surface.create_element("b", 1).unwrap_err();
        assert!(matches!(err, SurfaceError::Rejected { ref name, .. } if name == "b"));
        assert_eq!(surface.len(), 1);
    }

    #[test]
    fn test_measure_grows_with_count() {
        let surface = HeadlessSurface::new(TypographyConfig::default());

        let small = surface.measure("word", 1);
        let large = surface.measure("word", 5);
        assert!(large.width() > small.width());
        assert!(large.height() > small.height());
    }
}
