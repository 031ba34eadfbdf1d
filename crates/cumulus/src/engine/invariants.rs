//! Structural invariants of a [`CloudEngine`].

use std::collections::HashSet;

use thiserror::Error;

use cumulus_core::geometry::Bounds;

use crate::{arena::EntityId, entity::Entity, surface::RenderSurface};

use super::CloudEngine;

/// A broken invariant, reported by [`CloudEngine::check_invariants`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("index and tree disagree: {0}")]
    IndexTreeMismatch(String),

    #[error("group {group} has bounds {actual:?}, its children span {expected:?}")]
    BoundsInconsistency {
        group: EntityId,
        expected: Option<Bounds>,
        actual: Option<Bounds>,
    },

    #[error(
        "cluster {group} holds {len} words with group size {group_size} (queued: {queued})"
    )]
    CapacityInvariantViolation {
        group: EntityId,
        len: usize,
        group_size: usize,
        queued: bool,
    },

    #[error("word `{name}` is tracked with count {count}")]
    NonPositiveCount { name: String, count: i64 },

    #[error("siblings {first} and {second} overlap")]
    Overlap { first: EntityId, second: EntityId },
}

impl<S: RenderSurface> CloudEngine<S> {
    /// Checks the whole structure and returns the first broken invariant.
    ///
    /// Runs in time quadratic in the size of the largest group; debug
    /// builds call it after every mutation.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.check_index()?;
        self.check_tree()?;
        self.check_capacity()
    }

    fn check_index(&self) -> Result<(), InvariantViolation> {
        let mismatch = |detail: String| Err(InvariantViolation::IndexTreeMismatch(detail));

        for (name, &id) in &self.index {
            let Some(word) = self.tree.word(id) else {
                return mismatch(format!("`{name}` points at missing word {id}"));
            };
            if word.name() != name {
                return mismatch(format!("`{name}` points at word `{}`", word.name()));
            }
            if word.count() <= 0 {
                return Err(InvariantViolation::NonPositiveCount {
                    name: name.clone(),
                    count: word.count(),
                });
            }

            let spatial = word.spatial();
            let placed = spatial.parent().is_some() && spatial.bounds().is_some();
            if word.is_attached() != placed {
                return mismatch(format!(
                    "`{name}` is {:?} with parent {:?} and bounds {:?}",
                    word.state(),
                    spatial.parent(),
                    spatial.bounds()
                ));
            }
        }

        let words = self
            .tree
            .entities()
            .filter(|(_, entity)| matches!(entity, Entity::Word(_)))
            .count();
        if words != self.index.len() {
            return mismatch(format!(
                "{words} words in the tree, {} in the index",
                self.index.len()
            ));
        }
        Ok(())
    }

    fn check_tree(&self) -> Result<(), InvariantViolation> {
        let root = self.tree.root();
        let mut seen_clusters = 0usize;

        for (cluster, group) in self.tree.clusters() {
            seen_clusters += 1;
            if group.spatial().parent() != Some(root) {
                return Err(InvariantViolation::IndexTreeMismatch(format!(
                    "cluster {cluster} does not point back at the root"
                )));
            }
            for &child in group.children() {
                let Some(word) = self.tree.word(child) else {
                    return Err(InvariantViolation::IndexTreeMismatch(format!(
                        "cluster {cluster} holds {child}, which is not a word"
                    )));
                };
                if word.spatial().parent() != Some(cluster) {
                    return Err(InvariantViolation::IndexTreeMismatch(format!(
                        "word `{}` does not point back at cluster {cluster}",
                        word.name()
                    )));
                }
            }
            self.check_group(cluster)?;
        }

        if seen_clusters != self.tree.root_group().len() {
            return Err(InvariantViolation::IndexTreeMismatch(
                "the root holds an entity that is not a cluster".to_string(),
            ));
        }
        self.check_group(root)
    }

    /// Bounds are the union of the children, and children do not overlap.
    fn check_group(&self, group: EntityId) -> Result<(), InvariantViolation> {
        let Some(entity) = self.tree.group(group) else {
            return Ok(());
        };

        let children: Vec<(EntityId, Bounds)> = entity
            .children()
            .iter()
            .filter_map(|&id| self.tree.get(id).and_then(Entity::bounds).map(|b| (id, b)))
            .collect();

        let expected = Bounds::merge_all(children.iter().map(|&(_, bounds)| bounds));
        let actual = entity.spatial().bounds();
        if expected != actual {
            return Err(InvariantViolation::BoundsInconsistency {
                group,
                expected,
                actual,
            });
        }

        for (i, &(first, a)) in children.iter().enumerate() {
            for &(second, b) in &children[i + 1..] {
                if a.intersects(&b) {
                    return Err(InvariantViolation::Overlap { first, second });
                }
            }
        }
        Ok(())
    }

    /// Clusters never exceed the group size, and exactly the clusters with
    /// spare room are queued, each once.
    fn check_capacity(&self) -> Result<(), InvariantViolation> {
        let mut clusters = HashSet::new();

        for (cluster, group) in self.tree.clusters() {
            clusters.insert(cluster);
            let queued = self.free_groups.contains(cluster);
            let has_room = group.len() < self.group_size;
            if group.len() > self.group_size || queued != has_room {
                return Err(InvariantViolation::CapacityInvariantViolation {
                    group: cluster,
                    len: group.len(),
                    group_size: self.group_size,
                    queued,
                });
            }
        }

        if let Some(stray) = self.free_groups.iter().find(|id| !clusters.contains(id)) {
            return Err(InvariantViolation::IndexTreeMismatch(format!(
                "free queue holds {stray}, which is not a cluster"
            )));
        }
        Ok(())
    }
}
