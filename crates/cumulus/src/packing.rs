//! Ring search for non-overlapping placements.
//!
//! Given the bounds of an entity's siblings, [`find_center`] picks where the
//! entity's center should go. The search walks concentric rings around a
//! start point: the group origin for an initial placement, or the entity's
//! current center for a settled one. The first ring that contains a valid
//! candidate wins; inside it, the candidate that keeps the union with the
//! siblings smallest is chosen, ties going to the earlier sample.

use std::f32::consts::TAU;

use log::{trace, warn};

use cumulus_core::geometry::{Bounds, Point, Size};

/// Minimum angular samples per ring, so small rings still look around.
const MIN_RING_SAMPLES: usize = 8;

/// Tunables for the ring search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackingParams {
    /// Minimum gap kept between the entity and every sibling.
    spacing: f32,
    /// Distance between consecutive rings and between samples on a ring.
    step: f32,
    /// Rings explored before falling back to a side placement.
    max_rings: usize,
}

impl PackingParams {
    pub fn new(spacing: f32, step: f32, max_rings: usize) -> Self {
        Self {
            spacing: spacing.max(0.0),
            step: step.max(0.1),
            max_rings: max_rings.max(1),
        }
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn max_rings(&self) -> usize {
        self.max_rings
    }
}

/// Where the search starts and how much freedom it has.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Free placement around the group origin.
    Initial { origin: Point },
    /// Keep the current center when valid, otherwise move as little as possible.
    Settled { current: Point },
}

impl Placement {
    fn start(self) -> Point {
        match self {
            Placement::Initial { origin } => origin,
            Placement::Settled { current } => current,
        }
    }
}

/// Returns the center for an entity of `size` among `siblings`.
///
/// The returned center never produces bounds closer than the configured
/// spacing to any sibling. When the start point is already valid it is
/// returned unchanged, which makes re-running a settled placement a no-op.
pub fn find_center(
    size: Size,
    siblings: &[Bounds],
    placement: Placement,
    params: &PackingParams,
) -> Point {
    let start = placement.start();
    if fits(start, size, siblings, params) {
        return start;
    }

    let Some(union) = Bounds::merge_all(siblings.iter().copied()) else {
        return start;
    };

    for ring in 1..=params.max_rings {
        let best = ring_candidates(start, ring, params.step)
            .filter(|&center| fits(center, size, siblings, params))
            .map(|center| (center, union.merge(&center.to_bounds(size)).area()))
            .min_by(|(_, a), (_, b)| a.total_cmp(b));

        if let Some((center, area)) = best {
            trace!(
                ring,
                area,
                moved = center.distance(start),
                x = center.x(),
                y = center.y();
                "Placement found"
            );
            return center;
        }
    }

    warn!(
        max_rings = params.max_rings,
        siblings = siblings.len();
        "Ring search exhausted, placing beside siblings"
    );
    Point::new(
        union.max_x() + params.spacing + params.step + size.width() / 2.0,
        start.y(),
    )
}

/// True if an entity centered at `center` keeps its distance from all siblings.
pub fn fits(center: Point, size: Size, siblings: &[Bounds], params: &PackingParams) -> bool {
    let candidate = center.to_bounds(size).inflate(params.spacing);
    siblings.iter().all(|sibling| !candidate.intersects(sibling))
}

/// Candidate centers on ring number `ring` around `start`, in angular order.
fn ring_candidates(start: Point, ring: usize, step: f32) -> impl Iterator<Item = Point> {
    let radius = ring as f32 * step;
    let samples = ((TAU * radius / step).ceil() as usize).max(MIN_RING_SAMPLES);

    (0..samples).map(move |sample| {
        let angle = TAU * sample as f32 / samples as f32;
        start.offset_polar(radius, angle)
    })
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn size_strategy() -> impl Strategy<Value = Size> {
        (2.0f32..40.0, 2.0f32..20.0).prop_map(|(w, h)| Size::new(w, h))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-50.0f32..50.0, -50.0f32..50.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// Places entities one after another and checks that none overlap.
    fn check_sequential_placements_never_overlap(
        sizes: Vec<Size>,
        origin: Point,
    ) -> Result<(), TestCaseError> {
        let params = PackingParams::new(1.0, 2.0, 400);
        let mut placed: Vec<Bounds> = Vec::new();

        for size in sizes {
            let center = find_center(size, &placed, Placement::Initial { origin }, &params);
            let bounds = center.to_bounds(size);

            for sibling in &placed {
                prop_assert!(
                    !bounds.intersects(sibling),
                    "{bounds:?} overlaps {sibling:?}"
                );
            }
            placed.push(bounds);
        }
        Ok(())
    }

    /// A settled placement must always be valid and must be a fixed point.
    fn check_settled_is_fixed_point(
        sizes: Vec<Size>,
        current: Point,
    ) -> Result<(), TestCaseError> {
        let params = PackingParams::new(1.0, 2.0, 400);
        let mut placed: Vec<Bounds> = Vec::new();
        for size in &sizes[1..] {
            let center = find_center(
                *size,
                &placed,
                Placement::Initial {
                    origin: Point::default(),
                },
                &params,
            );
            placed.push(center.to_bounds(*size));
        }

        let size = sizes[0];
        let first = find_center(size, &placed, Placement::Settled { current }, &params);
        prop_assert!(fits(first, size, &placed, &params));

        let second = find_center(size, &placed, Placement::Settled { current: first }, &params);
        prop_assert_eq!(first, second);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sequential_placements_never_overlap(
            sizes in prop::collection::vec(size_strategy(), 1..16),
            origin in point_strategy(),
        ) {
            check_sequential_placements_never_overlap(sizes, origin)?;
        }

        #[test]
        fn settled_is_fixed_point(
            sizes in prop::collection::vec(size_strategy(), 1..12),
            current in point_strategy(),
        ) {
            check_settled_is_fixed_point(sizes, current)?;
        }
    }
}
