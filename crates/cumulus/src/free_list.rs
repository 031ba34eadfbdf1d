//! Clusters that still have room for another word.

use std::collections::{HashSet, VecDeque};

use crate::arena::EntityId;

/// Queue of clusters below capacity, without duplicates.
///
/// The front is served first. A cluster that keeps room after receiving a
/// word goes back to the front, so it fills up before the next one is used.
#[derive(Debug, Default)]
pub struct FreeGroups {
    queue: VecDeque<EntityId>,
    queued: HashSet<EntityId>,
}

impl FreeGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `group` at the front. Returns `false` if it was already queued.
    pub(crate) fn push_front(&mut self, group: EntityId) -> bool {
        if !self.queued.insert(group) {
            return false;
        }
        self.queue.push_front(group);
        true
    }

    /// Queues `group` at the back. Returns `false` if it was already queued.
    pub(crate) fn push_back(&mut self, group: EntityId) -> bool {
        if !self.queued.insert(group) {
            return false;
        }
        self.queue.push_back(group);
        true
    }

    pub(crate) fn pop_front(&mut self) -> Option<EntityId> {
        let group = self.queue.pop_front()?;
        self.queued.remove(&group);
        Some(group)
    }

    pub fn contains(&self, group: EntityId) -> bool {
        self.queued.contains(&group)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued clusters, front first.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.queue.iter().copied()
    }
}
