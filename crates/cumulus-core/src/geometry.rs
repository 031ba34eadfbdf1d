//! Geometric primitives for word-cloud layout.
//!
//! This module provides the geometric types used throughout Cumulus to
//! size, place, and compare the bounding boxes of words and clusters.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in layout space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned rectangle defined by minimum and maximum coordinates
//!
//! # Coordinate System
//!
//! Cumulus uses screen coordinates:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner of the render surface at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward
//!
//! All values stored by the layout engine are in logical units; see
//! [`UnitConverter`](crate::units::UnitConverter) for the physical mapping.

/// A 2D point representing a position in layout space.
///
/// # Examples
///
/// ```
/// # use cumulus_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let offset = p1.sub_point(p2);
/// assert_eq!(offset.x(), 5.0);
/// assert_eq!(offset.y(), 15.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Returns true if both coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Adds another point's coordinates to this point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point's coordinates from this point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Length of the vector from the origin to this point.
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance between two points.
    pub fn distance(self, other: Point) -> f32 {
        self.sub_point(other).hypot()
    }

    /// Returns a point offset by polar coordinates (`radius`, `angle` in radians).
    pub fn offset_polar(self, radius: f32, angle: f32) -> Self {
        Self {
            x: self.x + radius * angle.cos(),
            y: self.y + radius * angle.sin(),
        }
    }

    /// Creates bounds of the given size centered on this point
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// A width and height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns the area covered by this size
    pub fn area(self) -> f32 {
        self.width * self.height
    }

    /// Scales both dimensions by a factor
    pub fn scale(self, factor: f32) -> Self {
        Self {
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    /// Returns true if either dimension is zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }
}

/// An axis-aligned rectangle with minimum and maximum coordinates.
///
/// Bounds are closed on the minimum edges and open on the maximum edges
/// for the purpose of [`Bounds::intersects`]: two rectangles that only
/// share an edge do not intersect.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Creates bounds from its four edges.
    pub fn new_from_edges(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            min_x: left,
            min_y: top,
            max_x: right,
            max_y: bottom,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Converts bounds to a Size object
    pub fn to_size(self) -> Size {
        Size {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Returns the area covered by the bounds
    pub fn area(self) -> f32 {
        self.width() * self.height()
    }

    /// Merges two bounds to create the smallest bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cumulus_core::geometry::{Bounds, Point, Size};
    /// let hello = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(100.0, 30.0));
    /// let world = Bounds::new_from_top_left(Point::new(10.0, 40.0), Size::new(120.0, 80.0));
    ///
    /// let combined = hello.merge(&world);
    /// assert_eq!(combined.min_x(), 0.0);
    /// assert_eq!(combined.min_y(), 0.0);
    /// assert_eq!(combined.width(), 130.0);
    /// assert_eq!(combined.height(), 120.0);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Merges every bounds yielded by the iterator.
    ///
    /// Returns `None` for an empty iterator, which is how an empty group
    /// reports its extent.
    pub fn merge_all<I>(bounds: I) -> Option<Self>
    where
        I: IntoIterator<Item = Bounds>,
    {
        bounds
            .into_iter()
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Returns true if the interiors of the two bounds overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cumulus_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
    /// let touching = Bounds::new_from_top_left(Point::new(10.0, 0.0), Size::new(10.0, 10.0));
    /// let overlapping = Bounds::new_from_top_left(Point::new(5.0, 5.0), Size::new(10.0, 10.0));
    ///
    /// assert!(!a.intersects(&touching));
    /// assert!(a.intersects(&overlapping));
    /// ```
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns true if `other` lies entirely within these bounds.
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Moves the bounds by the specified offset.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cumulus_core::geometry::{Bounds, Point, Size};
    /// let bounds = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(50.0, 30.0));
    ///
    /// let moved = bounds.translate(Point::new(100.0, 50.0));
    /// assert_eq!(moved.min_x(), 110.0);
    /// assert_eq!(moved.min_y(), 70.0);
    /// assert_eq!(moved.width(), 50.0);
    /// ```
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Grows the bounds by `amount` on every side.
    pub fn inflate(&self, amount: f32) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    /// Returns bounds of a new size sharing this center.
    pub fn resize_around_center(&self, size: Size) -> Self {
        Self::new_from_center(self.center(), size)
    }

    /// Multiplies every coordinate by `factor`.
    pub fn scale(&self, factor: f32) -> Self {
        Self {
            min_x: self.min_x * factor,
            min_y: self.min_y * factor,
            max_x: self.max_x * factor,
            max_y: self.max_y * factor,
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_top_left(Point::new(x, y), Size::new(w, h)))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Merging should be commutative.
    fn check_bounds_merge_is_commutative(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        let merged1 = b1.merge(&b2);
        let merged2 = b2.merge(&b1);

        prop_assert!(approx_eq!(f32, merged1.min_x(), merged2.min_x()));
        prop_assert!(approx_eq!(f32, merged1.min_y(), merged2.min_y()));
        prop_assert!(approx_eq!(f32, merged1.max_x(), merged2.max_x()));
        prop_assert!(approx_eq!(f32, merged1.max_y(), merged2.max_y()));
        Ok(())
    }

    /// The merged bounds must contain both inputs.
    fn check_bounds_merge_contains_both(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        let merged = b1.merge(&b2);

        prop_assert!(merged.contains(&b1));
        prop_assert!(merged.contains(&b2));
        Ok(())
    }

    /// Intersection must not depend on argument order.
    fn check_intersects_is_symmetric(b1: Bounds, b2: Bounds) -> Result<(), TestCaseError> {
        prop_assert_eq!(b1.intersects(&b2), b2.intersects(&b1));
        Ok(())
    }

    /// Translating keeps the size and moves the center by the offset.
    fn check_translate_preserves_size(bounds: Bounds, offset: Point) -> Result<(), TestCaseError> {
        let moved = bounds.translate(offset);

        prop_assert!(approx_eq!(f32, moved.width(), bounds.width(), epsilon = 0.01));
        prop_assert!(approx_eq!(f32, moved.height(), bounds.height(), epsilon = 0.01));
        prop_assert!(approx_eq!(
            f32,
            moved.center().x(),
            bounds.center().x() + offset.x(),
            epsilon = 0.01
        ));
        prop_assert!(approx_eq!(
            f32,
            moved.center().y(),
            bounds.center().y() + offset.y(),
            epsilon = 0.01
        ));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn bounds_merge_is_commutative(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_bounds_merge_is_commutative(b1, b2)?;
        }

        #[test]
        fn bounds_merge_contains_both(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_bounds_merge_contains_both(b1, b2)?;
        }

        #[test]
        fn intersects_is_symmetric(b1 in bounds_strategy(), b2 in bounds_strategy()) {
            check_intersects_is_symmetric(b1, b2)?;
        }

        #[test]
        fn translate_preserves_size(bounds in bounds_strategy(), offset in point_strategy()) {
            check_translate_preserves_size(bounds, offset)?;
        }
    }
}
