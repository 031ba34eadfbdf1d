//! Words and groups stored in the cloud tree.
//!
//! Both kinds of node share a [`Spatial`] part (bounds and parent link)
//! and are stored side by side in the arena as the tagged [`Entity`]
//! variant. Words are always leaves; groups hold an ordered list of
//! children whose insertion order is the tie-break order for layout.

use cumulus_core::geometry::{Bounds, Point};

use crate::{arena::EntityId, clock::Timestamp};

/// Position and ownership data shared by every entity.
#[derive(Debug, Clone, Default)]
pub struct Spatial {
    bounds: Option<Bounds>,
    parent: Option<EntityId>,
}

impl Spatial {
    /// Bounds in logical units, `None` until the entity has been positioned.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Handle of the owning group, `None` for detached words and the root.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub(crate) fn set_bounds(&mut self, bounds: Option<Bounds>) {
        self.bounds = bounds;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<EntityId>) {
        self.parent = parent;
    }
}

/// Attachment state of a word.
///
/// ```text
/// Unattached ──attach──► Placed ──reposition──► Settled
/// ```
///
/// Removal discards the entity from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordState {
    /// Tracked in the index but without a visual element or position.
    Unattached,
    /// Given its first position inside a cluster.
    Placed,
    /// Repositioned in place at least once after the initial placement.
    Settled,
}

/// A tracked word: the leaf of the cloud tree.
#[derive(Debug, Clone)]
pub struct WordEntity {
    spatial: Spatial,
    name: String,
    count: i64,
    timestamp: Timestamp,
    state: WordState,
}

impl WordEntity {
    pub(crate) fn new(name: String, count: i64, timestamp: Timestamp) -> Self {
        Self {
            spatial: Spatial::default(),
            name,
            count,
            timestamp,
            state: WordState::Unattached,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// Instant of the last mutation of this word.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn state(&self) -> WordState {
        self.state
    }

    /// True once the word has a visual element and a position.
    pub fn is_attached(&self) -> bool {
        self.state != WordState::Unattached
    }

    pub fn spatial(&self) -> &Spatial {
        &self.spatial
    }

    /// Applies `delta` to the count and returns the new count.
    pub(crate) fn increment(&mut self, delta: i64, timestamp: Timestamp) -> i64 {
        self.count = self.count.saturating_add(delta);
        self.timestamp = timestamp;
        self.count
    }

    pub(crate) fn set_state(&mut self, state: WordState) {
        self.state = state;
    }

    pub(crate) fn spatial_mut(&mut self) -> &mut Spatial {
        &mut self.spatial
    }
}

/// An internal node: the root or a cluster of words.
#[derive(Debug, Clone)]
pub struct GroupEntity {
    spatial: Spatial,
    children: Vec<EntityId>,
    anchor: Point,
}

impl GroupEntity {
    pub(crate) fn new(anchor: Point) -> Self {
        Self {
            spatial: Spatial::default(),
            children: Vec::new(),
            anchor,
        }
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The group's previous center, used as the origin for placement.
    pub fn anchor(&self) -> Point {
        self.anchor
    }

    pub fn spatial(&self) -> &Spatial {
        &self.spatial
    }

    pub(crate) fn push_child(&mut self, child: EntityId) {
        self.children.push(child);
    }

    /// Removes `child`, keeping the order of the remaining children.
    pub(crate) fn remove_child(&mut self, child: EntityId) -> bool {
        match self.children.iter().position(|&id| id == child) {
            Some(position) => {
                self.children.remove(position);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_anchor(&mut self, anchor: Point) {
        self.anchor = anchor;
    }

    pub(crate) fn spatial_mut(&mut self) -> &mut Spatial {
        &mut self.spatial
    }
}

/// A node of the cloud tree.
#[derive(Debug, Clone)]
pub enum Entity {
    Word(WordEntity),
    Group(GroupEntity),
}

impl Entity {
    pub fn spatial(&self) -> &Spatial {
        match self {
            Entity::Word(word) => word.spatial(),
            Entity::Group(group) => group.spatial(),
        }
    }

    pub(crate) fn spatial_mut(&mut self) -> &mut Spatial {
        match self {
            Entity::Word(word) => word.spatial_mut(),
            Entity::Group(group) => group.spatial_mut(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.spatial().bounds()
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.spatial().parent()
    }

    pub fn as_word(&self) -> Option<&WordEntity> {
        match self {
            Entity::Word(word) => Some(word),
            Entity::Group(_) => None,
        }
    }

    pub(crate) fn as_word_mut(&mut self) -> Option<&mut WordEntity> {
        match self {
            Entity::Word(word) => Some(word),
            Entity::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupEntity> {
        match self {
            Entity::Group(group) => Some(group),
            Entity::Word(_) => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut GroupEntity> {
        match self {
            Entity::Group(group) => Some(group),
            Entity::Word(_) => None,
        }
    }
}
