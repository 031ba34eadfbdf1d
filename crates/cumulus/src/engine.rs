//! The incremental word-cloud engine.
//!
//! [`CloudEngine`] tracks every word by name, assigns words to clusters of
//! roughly `sqrt(n)` words each, and keeps both levels of the layout packed
//! as words arrive, grow, shrink and disappear. Positions are kept in
//! logical units; the [`RenderSurface`] only ever sees physical pixels.
//!
//! # Example
//!
//! ```
//! # use cumulus::{CloudEngine, WordUpdate, config::AppConfig, surface::HeadlessSurface};
//! let config = AppConfig::default();
//! let surface = HeadlessSurface::new(*config.typography());
//! let mut engine = CloudEngine::from_config(config.surface().size(), surface, &config).unwrap();
//!
//! engine.add_word("Hello");
//! engine.add_word("world!");
//! engine.add_word("hello");
//!
//! assert_eq!(engine.word("hello").map(|word| word.count()), Some(2));
//! assert_eq!(engine.len(), 2);
//! ```

mod invariants;

pub use invariants::InvariantViolation;

use std::collections::BTreeMap;

use log::{debug, info, trace, warn};

use cumulus_core::{
    geometry::{Bounds, Point, Size},
    units::UnitConverter,
};

use crate::{
    arena::EntityId,
    clock::{Clock, Timestamp},
    config::{AppConfig, LayoutConfig},
    entity::{Entity, GroupEntity, WordEntity, WordState},
    error::CumulusError,
    free_list::FreeGroups,
    snapshot::{BoundsRecord, CloudSnapshot, LayoutRecord, WordRecord},
    surface::RenderSurface,
    transcript::Command,
    tree::CloudTree,
    words::{ExclusionList, normalize_word},
};

/// Why an addition was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Nothing was left after normalization.
    EmptyName,
    /// The word is on the exclusion list.
    Excluded,
    /// A new word needs a positive weight.
    InvalidWeight,
}

/// Outcome of [`CloudEngine::add_word_weighted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordUpdate {
    /// A new word was tracked. `attached` is false if the surface refused it.
    Inserted { id: EntityId, attached: bool },
    /// An existing word changed count.
    Updated {
        id: EntityId,
        count: i64,
        attached: bool,
    },
    /// The count dropped to zero or below and the word is gone.
    Removed,
    Ignored(IgnoreReason),
}

/// Read-only view of a tracked word.
#[derive(Debug, Clone, Copy)]
pub struct WordView<'a> {
    id: EntityId,
    word: &'a WordEntity,
}

impl<'a> WordView<'a> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.word.name()
    }

    pub fn count(&self) -> i64 {
        self.word.count()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.word.timestamp()
    }

    /// Bounds in logical units, `None` while unattached.
    pub fn bounds(&self) -> Option<Bounds> {
        self.word.spatial().bounds()
    }

    /// Owning cluster, `None` while unattached.
    pub fn cluster(&self) -> Option<EntityId> {
        self.word.spatial().parent()
    }

    pub fn is_attached(&self) -> bool {
        self.word.is_attached()
    }

    pub fn state(&self) -> WordState {
        self.word.state()
    }
}

/// Two-level word-cloud layout engine.
///
/// All mutation goes through `&mut self`; a host sharing an engine between
/// threads wraps it (or its [`CloudSession`](crate::CloudSession)) in a lock.
#[derive(Debug)]
pub struct CloudEngine<S: RenderSurface> {
    index: BTreeMap<String, EntityId>,
    tree: CloudTree,
    free_groups: FreeGroups,
    group_size: usize,
    timestamp: Timestamp,
    clock: Clock,
    units: UnitConverter,
    /// Surface size in logical units.
    surface_size: Size,
    layout: LayoutConfig,
    exclusions: ExclusionList,
    surface: S,
}

impl<S: RenderSurface> CloudEngine<S> {
    /// Creates an empty cloud centered on a surface of `surface_size_px`.
    pub fn new(
        surface_size_px: Size,
        surface: S,
        units: UnitConverter,
        layout: LayoutConfig,
        exclusions: ExclusionList,
    ) -> Self {
        let surface_size = units.size_to_logical(surface_size_px);
        let center = Point::new(surface_size.width() / 2.0, surface_size.height() / 2.0);
        let mut clock = Clock::new();
        let timestamp = clock.tick();

        info!(
            width = surface_size.width(),
            height = surface_size.height(),
            density = units.density();
            "Created cloud engine"
        );

        Self {
            index: BTreeMap::new(),
            tree: CloudTree::new(center),
            free_groups: FreeGroups::new(),
            group_size: 0,
            timestamp,
            clock,
            units,
            surface_size,
            layout,
            exclusions,
            surface,
        }
    }

    /// Creates an engine from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CumulusError::Config`] if the configuration does not
    /// validate, or [`CumulusError::Units`] for an unusable density.
    pub fn from_config(
        surface_size_px: Size,
        surface: S,
        config: &AppConfig,
    ) -> Result<Self, CumulusError> {
        config.validate().map_err(CumulusError::Config)?;
        let units = UnitConverter::new(config.surface().density())?;
        let exclusions = config.exclusions().iter().collect();

        Ok(Self::new(
            surface_size_px,
            surface,
            units,
            *config.layout(),
            exclusions,
        ))
    }

    /// Adds one occurrence of `name`.
    pub fn add_word(&mut self, name: &str) -> WordUpdate {
        self.add_word_weighted(name, 1)
    }

    /// Adds `delta` occurrences of `name`; a negative `delta` shrinks it.
    ///
    /// A word whose count drops to zero or below is removed.
    pub fn add_word_weighted(&mut self, name: &str, delta: i64) -> WordUpdate {
        let Some(name) = normalize_word(name) else {
            return WordUpdate::Ignored(IgnoreReason::EmptyName);
        };
        if self.exclusions.contains(&name) {
            debug!(name; "Ignoring excluded word");
            return WordUpdate::Ignored(IgnoreReason::Excluded);
        }

        let update = match self.index.get(&name).copied() {
            None => self.insert_word(name, delta),
            Some(id) => self.update_word(id, delta),
        };
        self.debug_check_invariants();
        update
    }

    fn insert_word(&mut self, name: String, delta: i64) -> WordUpdate {
        if delta <= 0 {
            debug!(name, delta; "Ignoring new word without positive weight");
            return WordUpdate::Ignored(IgnoreReason::InvalidWeight);
        }

        let timestamp = self.clock.tick();
        let id = self
            .tree
            .insert_word(WordEntity::new(name.clone(), delta, timestamp));
        debug!(name, count = delta, id:% = id; "Inserted word");
        self.index.insert(name, id);

        let attached = self.try_attach(id);
        WordUpdate::Inserted { id, attached }
    }

    fn update_word(&mut self, id: EntityId, delta: i64) -> WordUpdate {
        let timestamp = self.clock.tick();
        let Some(word) = self.tree.word_mut(id) else {
            return WordUpdate::Removed;
        };
        let was_attached = word.is_attached();
        let count = word.increment(delta, timestamp);
        trace!(name = word.name(), count, delta; "Updated word count");

        if count <= 0 {
            self.remove_word(id);
            return WordUpdate::Removed;
        }

        let attached = if was_attached {
            self.resize_word(id);
            self.reposition_word(id, false);
            true
        } else {
            self.try_attach(id)
        };
        WordUpdate::Updated {
            id,
            count,
            attached,
        }
    }

    /// Creates the visual element of a tracked word and lays it out.
    ///
    /// On surface failure the word stays unattached and the tree is not
    /// touched.
    fn try_attach(&mut self, id: EntityId) -> bool {
        let Some(word) = self.tree.word(id) else {
            return false;
        };
        let name = word.name().to_string();
        let count = word.count();

        if let Err(err) = self.surface.create_element(&name, count) {
            warn!(name, err:%; "Surface rejected word, leaving it unattached");
            return false;
        }

        let size = self
            .units
            .size_to_logical(self.surface.measure(&name, count));
        let cluster = self.attach(id, size);
        if let Some(word) = self.tree.word_mut(id) {
            word.set_state(WordState::Placed);
        }
        trace!(name, cluster:% = cluster; "Attached word");

        self.reposition_word(id, true);
        true
    }

    /// Assigns `word` to a cluster with spare room and returns the cluster.
    ///
    /// The word is given bounds of `size` at the cluster anchor; the
    /// following reposition moves it to a free spot.
    fn attach(&mut self, word: EntityId, size: Size) -> EntityId {
        let total = self.index.len();
        let new_size = 1 + total.saturating_sub(1).isqrt();
        if new_size > self.group_size {
            debug!(from = self.group_size, to = new_size, words = total; "Raising group size");
            self.group_size = new_size;
            for (id, group) in self.tree.clusters() {
                if group.len() < new_size {
                    self.free_groups.push_back(id);
                }
            }
        }

        let cluster = match self.free_groups.pop_front() {
            Some(cluster) => cluster,
            None => {
                let root = self.tree.root();
                let anchor = self.tree.root_group().anchor();
                let cluster = self.tree.insert_group(anchor);
                self.tree.add_child(root, cluster);
                debug!(cluster:% = cluster, group_size = self.group_size; "Created cluster");
                cluster
            }
        };

        let anchor = self
            .tree
            .group(cluster)
            .map(GroupEntity::anchor)
            .unwrap_or_default();
        self.tree.set_bounds(word, Some(anchor.to_bounds(size)));
        self.tree.add_child(cluster, word);

        if self.cluster_len(cluster) < self.group_size {
            self.free_groups.push_front(cluster);
        }
        cluster
    }

    /// Re-measures an attached word around its current center.
    fn resize_word(&mut self, id: EntityId) {
        let Some(word) = self.tree.word(id) else {
            return;
        };
        let Some(bounds) = word.spatial().bounds() else {
            return;
        };
        let size = self
            .units
            .size_to_logical(self.surface.measure(word.name(), word.count()));
        self.tree
            .set_bounds(id, Some(bounds.resize_around_center(size)));
    }

    /// Repositions a word inside its cluster, then the cluster inside the
    /// root, and shows the cluster's words where they ended up.
    fn reposition_word(&mut self, id: EntityId, initial: bool) {
        let Some(cluster) = self.tree.get(id).and_then(|entity| entity.parent()) else {
            return;
        };

        self.tree
            .reposition_child(cluster, id, initial, &self.layout.word_packing());
        if !initial {
            if let Some(word) = self.tree.word_mut(id) {
                word.set_state(WordState::Settled);
            }
        }

        let root = self.tree.root();
        let cluster_initial = self.cluster_len(cluster) <= 1;
        self.tree.reposition_child(
            root,
            cluster,
            cluster_initial,
            &self.layout.cluster_packing(),
        );

        self.show_cluster(cluster);
    }

    fn show_cluster(&mut self, cluster: EntityId) {
        let Some(group) = self.tree.group(cluster) else {
            return;
        };
        let visible = Bounds::new_from_edges(
            0.0,
            0.0,
            self.surface_size.width(),
            self.surface_size.height(),
        );
        for &child in group.children() {
            let Some(word) = self.tree.word(child) else {
                continue;
            };
            if let Some(bounds) = word.spatial().bounds() {
                if !visible.contains(&bounds) {
                    debug!(
                        name = word.name(),
                        cluster:% = cluster;
                        "Word extends past the surface"
                    );
                }
                let bounds_px = self.units.bounds_to_physical(bounds);
                self.surface
                    .show_element(word.name(), word.count(), bounds_px);
            }
        }
    }

    fn cluster_len(&self, cluster: EntityId) -> usize {
        self.tree.group(cluster).map_or(0, GroupEntity::len)
    }

    /// Unlinks a word from its cluster and frees it. Returns its name.
    ///
    /// The cluster is kept even when it becomes empty, and goes back to the
    /// front of the free queue if it has room.
    fn detach_word(&mut self, id: EntityId) -> Option<String> {
        let cluster = self.tree.get(id).and_then(|entity| entity.parent());
        if let Some(cluster) = cluster {
            let root = self.tree.root();
            self.tree.detach_child(cluster, id);
            self.tree.refresh_bounds(root);
            if self.cluster_len(cluster) < self.group_size {
                self.free_groups.push_front(cluster);
            }
        }

        match self.tree.remove(id)? {
            Entity::Word(word) => Some(word.name().to_string()),
            Entity::Group(_) => None,
        }
    }

    /// Removes a word by handle.
    ///
    /// Returns `false` for unknown or stale handles.
    pub fn remove_word(&mut self, id: EntityId) -> bool {
        let Some(word) = self.tree.word(id) else {
            return false;
        };
        if self.index.get(word.name()) != Some(&id) {
            return false;
        }

        let Some(name) = self.detach_word(id) else {
            return false;
        };
        self.index.remove(&name);
        self.surface.destroy_element(&name);
        debug!(name, id:% = id; "Removed word");

        self.debug_check_invariants();
        true
    }

    /// Removes a word by name. Returns `false` if it is not tracked.
    pub fn remove_word_named(&mut self, name: &str) -> bool {
        let id = normalize_word(name).and_then(|name| self.index.get(&name).copied());
        id.is_some_and(|id| self.remove_word(id))
    }

    /// Removes every word. Clusters are kept, empty, for reuse.
    pub fn clear(&mut self) {
        let index = std::mem::take(&mut self.index);
        let removed = index.len();

        for (name, id) in index {
            self.detach_word(id);
            self.surface.destroy_element(&name);
        }

        self.timestamp = self.clock.tick();
        info!(removed, clusters = self.tree.root_group().len(); "Cleared cloud");
        self.debug_check_invariants();
    }

    /// Adds a word to the exclusion list. Tracked words are not affected.
    pub fn exclude(&mut self, word: &str) -> bool {
        self.exclusions.exclude(word)
    }

    /// Removes a word from the exclusion list.
    pub fn include(&mut self, word: &str) -> bool {
        self.exclusions.include(word)
    }

    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    /// Executes one transcript command.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::Add { word, delta } => {
                self.add_word_weighted(word, *delta);
            }
            Command::Remove(word) => {
                if !self.remove_word_named(word) {
                    debug!(word; "Ignoring removal of untracked word");
                }
            }
            Command::Clear => self.clear(),
            Command::Exclude(words) => {
                for word in words {
                    self.exclude(word);
                }
            }
            Command::Include(words) => {
                for word in words {
                    self.include(word);
                }
            }
        }
    }

    /// Executes commands in order.
    pub fn replay<'c>(&mut self, commands: impl IntoIterator<Item = &'c Command>) {
        let mut applied = 0usize;
        for command in commands {
            self.apply(command);
            applied += 1;
        }
        info!(
            commands = applied,
            words = self.len(),
            clusters = self.tree.root_group().len();
            "Replayed transcript"
        );
    }

    pub fn word(&self, name: &str) -> Option<WordView<'_>> {
        let name = normalize_word(name)?;
        let id = *self.index.get(&name)?;
        self.view(id)
    }

    /// Looks a word up by handle. Stale handles resolve to `None`.
    pub fn word_by_id(&self, id: EntityId) -> Option<WordView<'_>> {
        self.view(id)
    }

    fn view(&self, id: EntityId) -> Option<WordView<'_>> {
        self.tree.word(id).map(|word| WordView { id, word })
    }

    pub fn contains_word(&self, name: &str) -> bool {
        self.word(name).is_some()
    }

    /// Tracked words in name order.
    pub fn words(&self) -> impl Iterator<Item = WordView<'_>> {
        self.index.values().filter_map(|&id| self.view(id))
    }

    /// Number of tracked words, attached or not.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current cluster capacity. Never decreases.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    /// Instant of the last bulk change: construction or [`clear`](Self::clear).
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Clusters under the root, in creation order, including empty ones.
    pub fn clusters(&self) -> impl Iterator<Item = (EntityId, &GroupEntity)> {
        self.tree.clusters()
    }

    pub fn tree(&self) -> &CloudTree {
        &self.tree
    }

    pub fn free_groups(&self) -> &FreeGroups {
        &self.free_groups
    }

    /// Surface size in logical units.
    pub fn surface_size(&self) -> Size {
        self.surface_size
    }

    pub fn units(&self) -> &UnitConverter {
        &self.units
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Exports the cloud in name order.
    pub fn snapshot(&self) -> CloudSnapshot {
        CloudSnapshot {
            layout: LayoutRecord {
                width: self.surface_size.width(),
                height: self.surface_size.height(),
                timestamp: self.timestamp.to_string(),
            },
            words: self
                .words()
                .map(|word| WordRecord {
                    name: word.name().to_string(),
                    count: word.count(),
                    timestamp: word.timestamp().to_string(),
                    bounds: word.bounds().map(BoundsRecord::from),
                })
                .collect(),
        }
    }

    /// Full invariant walk after each mutation; unit tests only, the walk is
    /// quadratic in the cluster size.
    fn debug_check_invariants(&self) {
        #[cfg(test)]
        if let Err(violation) = self.check_invariants() {
            panic!("cloud invariant violated: {violation}");
        }
    }
}
