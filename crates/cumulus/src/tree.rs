//! The two-level cloud tree.
//!
//! [`CloudTree`] owns the entity arena and the root group. The root's
//! children are clusters; a cluster's children are words. All structural
//! edits go through this type so that group bounds are refreshed as the
//! union of their children after every change.

use log::trace;

use cumulus_core::geometry::{Bounds, Point};

use crate::{
    arena::{Arena, EntityId},
    entity::{Entity, GroupEntity, WordEntity},
    packing::{self, PackingParams, Placement},
};

/// Arena-backed tree of words and groups.
#[derive(Debug)]
pub struct CloudTree {
    arena: Arena<Entity>,
    root: EntityId,
}

impl CloudTree {
    /// Creates a tree whose root is anchored at `center`.
    pub(crate) fn new(center: Point) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Entity::Group(GroupEntity::new(center)));
        Self { arena, root }
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    /// The root group.
    pub fn root_group(&self) -> &GroupEntity {
        self.group(self.root)
            .expect("root group lives as long as the tree")
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    pub fn word(&self, id: EntityId) -> Option<&WordEntity> {
        self.get(id).and_then(Entity::as_word)
    }

    pub fn group(&self, id: EntityId) -> Option<&GroupEntity> {
        self.get(id).and_then(Entity::as_group)
    }

    /// Clusters under the root, in insertion order.
    pub fn clusters(&self) -> impl Iterator<Item = (EntityId, &GroupEntity)> {
        self.root_group()
            .children()
            .iter()
            .filter_map(|&id| self.group(id).map(|group| (id, group)))
    }

    /// Every live entity, including the root and detached words.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.arena.iter()
    }

    /// Number of live entities, including the root.
    pub fn entity_count(&self) -> usize {
        self.arena.len()
    }

    pub(crate) fn word_mut(&mut self, id: EntityId) -> Option<&mut WordEntity> {
        self.arena.get_mut(id).and_then(Entity::as_word_mut)
    }

    fn group_mut(&mut self, id: EntityId) -> Option<&mut GroupEntity> {
        self.arena.get_mut(id).and_then(Entity::as_group_mut)
    }

    /// Stores a detached word and returns its handle.
    pub(crate) fn insert_word(&mut self, word: WordEntity) -> EntityId {
        self.arena.insert(Entity::Word(word))
    }

    /// Creates a detached, empty cluster anchored at `anchor`.
    pub(crate) fn insert_group(&mut self, anchor: Point) -> EntityId {
        self.arena.insert(Entity::Group(GroupEntity::new(anchor)))
    }

    /// Frees a detached entity, invalidating its handle.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        debug_assert!(
            self.get(id).is_some_and(|entity| entity.parent().is_none()),
            "only detached entities can be freed"
        );
        self.arena.remove(id)
    }

    /// Sets the bounds of an entity without touching its parent.
    pub(crate) fn set_bounds(&mut self, id: EntityId, bounds: Option<Bounds>) {
        if let Some(entity) = self.arena.get_mut(id) {
            entity.spatial_mut().set_bounds(bounds);
        }
    }

    /// Appends `child` to `group` and merges its bounds into the group's.
    ///
    /// A child without bounds leaves the group bounds untouched; the
    /// following reposition establishes them.
    pub(crate) fn add_child(&mut self, group: EntityId, child: EntityId) {
        let child_bounds = match self.arena.get_mut(child) {
            Some(entity) => {
                entity.spatial_mut().set_parent(Some(group));
                entity.bounds()
            }
            None => return,
        };

        if let Some(group_entity) = self.group_mut(group) {
            group_entity.push_child(child);
            if let Some(child_bounds) = child_bounds {
                let merged = match group_entity.spatial().bounds() {
                    Some(bounds) => bounds.merge(&child_bounds),
                    None => child_bounds,
                };
                group_entity.spatial_mut().set_bounds(Some(merged));
            }
        }
    }

    /// Unlinks `child` from `group` and refreshes the group bounds.
    ///
    /// Returns `false` if `child` was not a child of `group`.
    pub(crate) fn detach_child(&mut self, group: EntityId, child: EntityId) -> bool {
        let removed = self
            .group_mut(group)
            .is_some_and(|group_entity| group_entity.remove_child(child));

        if removed {
            if let Some(entity) = self.arena.get_mut(child) {
                entity.spatial_mut().set_parent(None);
            }
            self.refresh_bounds(group);
        }
        removed
    }

    /// Recomputes the bounds of `group` as the union of its children.
    ///
    /// Clusters also move their anchor to the new center; the root keeps
    /// its anchor so the cloud stays balanced around the surface center.
    pub(crate) fn refresh_bounds(&mut self, group: EntityId) -> Option<Bounds> {
        let bounds = self.children_union(group, None);
        let is_root = group == self.root;

        if let Some(group_entity) = self.group_mut(group) {
            group_entity.spatial_mut().set_bounds(bounds);
            if let (Some(bounds), false) = (bounds, is_root) {
                group_entity.set_anchor(bounds.center());
            }
        }
        bounds
    }

    /// Union of the bounds of the children of `group`, skipping `except`.
    fn children_union(&self, group: EntityId, except: Option<EntityId>) -> Option<Bounds> {
        Bounds::merge_all(self.sibling_bounds(group, except))
    }

    fn sibling_bounds(&self, group: EntityId, except: Option<EntityId>) -> Vec<Bounds> {
        self.group(group)
            .map(|group_entity| {
                group_entity
                    .children()
                    .iter()
                    .filter(|&&id| Some(id) != except)
                    .filter_map(|&id| self.get(id).and_then(Entity::bounds))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Moves `child` inside `group` to a valid, compact position.
    ///
    /// With `initial` the search starts from the group origin (the root
    /// anchor, or the center of the siblings for a cluster); otherwise it
    /// starts from the child's current center and keeps it if nothing
    /// overlaps. The group bounds are refreshed in every case.
    ///
    /// Returns `true` if the child moved.
    pub(crate) fn reposition_child(
        &mut self,
        group: EntityId,
        child: EntityId,
        initial: bool,
        params: &PackingParams,
    ) -> bool {
        let Some(child_bounds) = self.get(child).and_then(Entity::bounds) else {
            self.refresh_bounds(group);
            return false;
        };

        let siblings = self.sibling_bounds(group, Some(child));
        let placement = if initial {
            Placement::Initial {
                origin: self.placement_origin(group, &siblings),
            }
        } else {
            Placement::Settled {
                current: child_bounds.center(),
            }
        };

        let center = packing::find_center(child_bounds.to_size(), &siblings, placement, params);
        let offset = center.sub_point(child_bounds.center());
        let moved = !offset.is_zero();
        if moved {
            trace!(
                child:% = child,
                group:% = group,
                dx = offset.x(),
                dy = offset.y();
                "Moving child"
            );
            self.translate(child, offset);
        }

        self.refresh_bounds(group);
        moved
    }

    fn placement_origin(&self, group: EntityId, siblings: &[Bounds]) -> Point {
        let anchor = self
            .group(group)
            .map(GroupEntity::anchor)
            .unwrap_or_default();

        if group == self.root {
            return anchor;
        }
        Bounds::merge_all(siblings.iter().copied())
            .map(Bounds::center)
            .unwrap_or(anchor)
    }

    /// Moves an entity, and for groups every descendant, by `offset`.
    fn translate(&mut self, id: EntityId, offset: Point) {
        let children = match self.arena.get_mut(id) {
            Some(Entity::Word(word)) => {
                let bounds = word.spatial().bounds().map(|bounds| bounds.translate(offset));
                word.spatial_mut().set_bounds(bounds);
                return;
            }
            Some(Entity::Group(group)) => group.children().to_vec(),
            None => return,
        };

        for child in children {
            self.translate(child, offset);
        }
        if let Some(group) = self.group_mut(id) {
            let anchor = group.anchor().add_point(offset);
            group.set_anchor(anchor);
        }
        self.refresh_bounds(id);
    }
}

#[cfg(test)]
mod tests {
    use cumulus_core::geometry::Size;

    use super::*;
    use crate::clock::Timestamp;

    fn params() -> PackingParams {
        PackingParams::new(2.0, 2.0, 300)
    }

    fn word(tree: &mut CloudTree, name: &str, size: Size) -> EntityId {
        let id = tree.insert_word(WordEntity::new(
            name.to_string(),
            1,
            Timestamp::from_millis(0),
        ));
        tree.set_bounds(id, Some(Point::default().to_bounds(size)));
        id
    }

    fn assert_bounds_are_union(tree: &CloudTree, group: EntityId) {
        let expected = tree.children_union(group, None);
        assert_eq!(tree.group(group).unwrap().spatial().bounds(), expected);
    }

    #[test]
    fn test_new_tree_has_empty_root() {
        let tree = CloudTree::new(Point::new(50.0, 80.0));

        assert!(tree.root_group().is_empty());
        assert_eq!(tree.root_group().anchor(), Point::new(50.0, 80.0));
        assert_eq!(tree.root_group().spatial().bounds(), None);
        assert_eq!(tree.entity_count(), 1);
    }

    #[test]
    fn test_add_child_sets_parent_and_merges_bounds() {
        let mut tree = CloudTree::new(Point::default());
        let cluster = tree.insert_group(Point::default());
        let a = word(&mut tree, "a", Size::new(10.0, 4.0));

        tree.add_child(cluster, a);

        assert_eq!(tree.get(a).unwrap().parent(), Some(cluster));
        assert_eq!(tree.group(cluster).unwrap().children(), &[a]);
        assert_bounds_are_union(&tree, cluster);
    }

    #[test]
    fn test_add_child_without_bounds_keeps_group_bounds() {
        let mut tree = CloudTree::new(Point::default());
        let cluster = tree.insert_group(Point::default());
        let a = tree.insert_word(WordEntity::new("a".into(), 1, Timestamp::default()));

        tree.add_child(cluster, a);

        assert_eq!(tree.group(cluster).unwrap().spatial().bounds(), None);
    }

    #[test]
    fn test_detach_child_refreshes_bounds() {
        let mut tree = CloudTree::new(Point::default());
        let cluster = tree.insert_group(Point::default());
        let a = word(&mut tree, "a", Size::new(10.0, 4.0));
        let b = word(&mut tree, "b", Size::new(10.0, 4.0));
        tree.add_child(cluster, a);
        tree.add_child(cluster, b);
        tree.reposition_child(cluster, b, true, &params());

        assert!(tree.detach_child(cluster, b));
        assert!(!tree.detach_child(cluster, b));
        assert_eq!(tree.get(b).unwrap().parent(), None);
        assert_eq!(
            tree.group(cluster).unwrap().spatial().bounds(),
            tree.get(a).unwrap().bounds()
        );

        assert!(tree.detach_child(cluster, a));
        assert_eq!(tree.group(cluster).unwrap().spatial().bounds(), None);
    }

    #[test]
    fn test_reposition_separates_siblings() {
        let mut tree = CloudTree::new(Point::default());
        let cluster = tree.insert_group(Point::default());
        let ids: Vec<_> = (0..6)
            .map(|i| word(&mut tree, &format!("w{i}"), Size::new(20.0, 8.0)))
            .collect();

        for &id in &ids {
            tree.add_child(cluster, id);
            tree.reposition_child(cluster, id, true, &params());
            assert_bounds_are_union(&tree, cluster);
        }

        for (i, &a) in ids.iter().enumerate() {
            for &b in &ids[i + 1..] {
                let a_bounds = tree.get(a).unwrap().bounds().unwrap();
                let b_bounds = tree.get(b).unwrap().bounds().unwrap();
                assert!(!a_bounds.intersects(&b_bounds));
            }
        }
    }

    #[test]
    fn test_settled_reposition_is_idempotent() {
        let mut tree = CloudTree::new(Point::default());
        let cluster = tree.insert_group(Point::default());
        let a = word(&mut tree, "a", Size::new(20.0, 8.0));
        let b = word(&mut tree, "b", Size::new(20.0, 8.0));
        tree.add_child(cluster, a);
        tree.add_child(cluster, b);
        tree.reposition_child(cluster, a, true, &params());
        tree.reposition_child(cluster, b, true, &params());

        let before = tree.get(b).unwrap().bounds();
        assert!(!tree.reposition_child(cluster, b, false, &params()));
        assert!(!tree.reposition_child(cluster, b, false, &params()));
        assert_eq!(tree.get(b).unwrap().bounds(), before);
    }

    #[test]
    fn test_moving_cluster_translates_words() {
        let mut tree = CloudTree::new(Point::default());
        let root = tree.root();
        let first = tree.insert_group(Point::default());
        let second = tree.insert_group(Point::default());
        let a = word(&mut tree, "a", Size::new(20.0, 8.0));
        let b = word(&mut tree, "b", Size::new(20.0, 8.0));

        tree.add_child(first, a);
        tree.add_child(root, first);
        tree.reposition_child(root, first, true, &params());

        tree.add_child(second, b);
        tree.add_child(root, second);
        let before = tree.get(b).unwrap().bounds().unwrap();
        assert!(tree.reposition_child(root, second, true, &params()));

        let after = tree.get(b).unwrap().bounds().unwrap();
        assert_ne!(before, after);
        assert_eq!(tree.group(second).unwrap().spatial().bounds(), Some(after));
        assert_eq!(tree.group(second).unwrap().anchor(), after.center());
        assert!(!after.intersects(&tree.get(a).unwrap().bounds().unwrap()));
        assert_bounds_are_union(&tree, root);
    }

    #[test]
    fn test_root_anchor_is_fixed() {
        let mut tree = CloudTree::new(Point::new(100.0, 100.0));
        let root = tree.root();
        let cluster = tree.insert_group(Point::new(100.0, 100.0));
        let a = word(&mut tree, "a", Size::new(20.0, 8.0));
        tree.add_child(cluster, a);
        tree.add_child(root, cluster);
        tree.reposition_child(root, cluster, true, &params());

        assert_eq!(tree.root_group().anchor(), Point::new(100.0, 100.0));
        assert_eq!(
            tree.group(cluster).unwrap().spatial().bounds().map(Bounds::center),
            Some(Point::new(100.0, 100.0))
        );
    }

    #[test]
    fn test_remove_invalidates_handle() {
        let mut tree = CloudTree::new(Point::default());
        let a = word(&mut tree, "a", Size::new(1.0, 1.0));

        assert!(tree.remove(a).is_some());
        assert!(tree.get(a).is_none());
        assert_eq!(tree.entity_count(), 1);
    }
}
