// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology and enablement.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::fmt;

use understory_dirty::{CycleHandling, DirtyTracker};

use super::id::{INVALID, NodeId};
use super::kind::NodeKind;
use super::traverse::{Children, Descendants};
use crate::dirty;
use crate::effect::BlurNode;
use crate::error::SceneError;
use crate::layer::Layer;
use crate::output::{OutputEntry, OutputId};
use crate::region::Region;
use crate::update::{DamageEvent, ListenerId, RootUpdate, UpdateFlags};
use crate::view::{SurfaceNode, ViewNode};

pub(crate) type UpdateListener = Box<dyn FnMut(&RootUpdate)>;

/// Struct-of-arrays storage for the whole scene.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled via a free list and
/// generation counters make stale handles fail loudly.
///
/// [`new`](Self::new) builds the fixed skeleton: a root with one
/// structure-flagged child per [`Layer`]. Everything else is created detached
/// and attached by the caller.
pub struct SceneGraph {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Node state --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) enabled: Vec<i32>,
    pub(crate) structure: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Notifications --
    pub(crate) listeners: Vec<(ListenerId, UpdateListener)>,
    pub(crate) next_listener: u32,
    pub(crate) pending_damage: Vec<DamageEvent>,

    // -- Skeleton and registries --
    pub(crate) root: u32,
    pub(crate) layers: [u32; Layer::COUNT],
    pub(crate) outputs: BTreeMap<OutputId, OutputEntry>,
    pub(crate) next_output: u32,
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("outputs", &self.outputs.len())
            .field("listeners", &self.listeners.len())
            .field("pending_damage", &self.pending_damage.len())
            .finish_non_exhaustive()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates a graph holding only the root and its layer nodes.
    #[must_use]
    pub fn new() -> Self {
        let mut graph = Self {
            parent: Vec::new(),
            children: Vec::new(),
            kind: Vec::new(),
            enabled: Vec::new(),
            structure: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            listeners: Vec::new(),
            next_listener: 0,
            pending_damage: Vec::new(),
            root: INVALID,
            layers: [INVALID; Layer::COUNT],
            outputs: BTreeMap::new(),
            next_output: 0,
        };

        let root = graph.alloc(NodeKind::Root, true);
        graph.root = root.idx;

        // Children are stored front-most first, so the top layer goes first.
        let mut skeleton = Vec::with_capacity(Layer::COUNT);
        for layer in Layer::ALL.iter().rev() {
            let node = graph.alloc(NodeKind::Layer(*layer), true);
            graph.layers[layer.index()] = node.idx;
            skeleton.push(node);
        }
        graph.set_children_unchecked(root, skeleton);
        // Building the skeleton is not a change anyone needs to hear about.
        graph.pending_damage.clear();
        let _ = graph.drain_updates(UpdateFlags::all());
        graph
    }

    // -- Allocation API --

    /// Creates a detached grouping node.
    ///
    /// Structure nodes form the fixed skeleton of a subtree; see
    /// [`set_children_list`](Self::set_children_list).
    pub fn create_inner(&mut self, structure: bool) -> NodeId {
        self.alloc(NodeKind::Inner, structure)
    }

    /// Creates a detached view node.
    pub fn create_view(&mut self, view: ViewNode) -> NodeId {
        self.alloc(NodeKind::View(view), false)
    }

    /// Creates a detached surface node.
    pub fn create_surface(&mut self, surface: SurfaceNode) -> NodeId {
        self.alloc(NodeKind::Surface(surface), false)
    }

    /// Creates a detached blur node.
    pub fn create_blur(&mut self, blur: BlurNode) -> NodeId {
        self.alloc(NodeKind::Blur(blur), false)
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, structure: bool) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.kind[i] = kind;
            self.enabled[i] = 1;
            self.structure[i] = structure;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.kind.push(kind);
            self.enabled.push(1);
            self.structure.push(structure);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.handle(idx)
    }

    /// Destroys a detached node and its whole subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, if the node is still attached to a
    /// parent, or if it is part of the root skeleton.
    pub fn destroy_subtree(&mut self, node: NodeId) {
        self.validate(node);
        assert!(
            self.parent[node.idx as usize] == INVALID,
            "cannot destroy an attached node"
        );
        assert!(
            !matches!(
                self.kind[node.idx as usize],
                NodeKind::Root | NodeKind::Layer(_)
            ),
            "cannot destroy the scene skeleton"
        );

        let doomed: Vec<u32> = Descendants::new(self, node.idx)
            .map(|id| id.idx)
            .collect();
        for idx in doomed {
            let i = idx as usize;
            self.dirty.remove_key(idx);
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.kind[i] = NodeKind::Inner;
            self.alive[i] = false;
            // Bump generation so old handles immediately fail validation.
            self.generation[i] += 1;
            self.free_list.push(idx);
        }
        let pending = core::mem::take(&mut self.pending_damage);
        self.pending_damage = pending
            .into_iter()
            .filter(|ev| self.is_alive(ev.node))
            .collect();
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    // -- Topology API --

    /// Attaches `child` as the front-most child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `child` already has a parent.
    pub fn add_front(&mut self, parent: NodeId, child: NodeId) {
        self.attach_at(parent, child, 0);
    }

    /// Attaches `child` as the back-most child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale or if `child` already has a parent.
    pub fn add_back(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        let at = self.children[parent.idx as usize].len();
        self.attach_at(parent, child, at);
    }

    fn attach_at(&mut self, parent: NodeId, child: NodeId, at: usize) {
        self.validate(parent);
        self.validate(child);
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "node already has a parent: {child:?}"
        );
        assert!(parent.idx != c, "cannot attach a node to itself");

        self.link(parent.idx, c);
        self.children[parent.idx as usize].insert(at, c);

        let bbox = self.bounding_box(child);
        self.damage(parent, Region::from(bbox));
        self.update(parent, UpdateFlags::CHILDREN_LIST);
    }

    /// Detaches `child` from its parent. The child stays alive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_child(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "node has no parent: {child:?}");
        let parent = self.handle(p);

        let bbox = self.bounding_box(child);
        self.children[p as usize].retain(|&x| x != c);
        self.unlink(p, c);

        self.damage(parent, Region::from(bbox));
        self.update(parent, UpdateFlags::CHILDREN_LIST);
    }

    /// Moves `child` to the front of its parent's child list.
    ///
    /// Does nothing if the node is already front-most.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn raise_to_front(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "node has no parent: {child:?}");
        let list = &mut self.children[p as usize];
        if list.first() == Some(&c) {
            return;
        }
        list.retain(|&x| x != c);
        list.insert(0, c);

        let parent = self.handle(p);
        let bbox = self.bounding_box(child);
        self.damage(parent, Region::from(bbox));
        self.update(parent, UpdateFlags::CHILDREN_LIST);
    }

    /// Replaces the child list of `parent`.
    ///
    /// The ordered subsequence of structure nodes must be the same in the old
    /// and the new list; floating children may be added, dropped or
    /// reordered freely. On mismatch nothing is changed.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StructureMismatch`] if the structure subsequence
    /// differs.
    ///
    /// # Panics
    ///
    /// Panics on stale handles, or if a new child is already parented
    /// elsewhere.
    pub fn set_children_list(
        &mut self,
        parent: NodeId,
        list: Vec<NodeId>,
    ) -> Result<(), SceneError> {
        self.validate(parent);
        for id in &list {
            self.validate(*id);
        }

        let old = self.children[parent.idx as usize]
            .iter()
            .copied()
            .filter(|&c| self.structure[c as usize]);
        let new = list
            .iter()
            .map(|id| id.idx)
            .filter(|&c| self.structure[c as usize]);
        if !old.eq(new) {
            tracing::debug!(?parent, "rejected child list: structure nodes differ");
            return Err(SceneError::StructureMismatch);
        }

        self.set_children_unchecked(parent, list);
        Ok(())
    }

    /// Replaces the child list of `parent` without checking structure nodes.
    ///
    /// Damages the union of the old and new content boxes on `parent` and
    /// emits a [`CHILDREN_LIST`](UpdateFlags::CHILDREN_LIST) update.
    ///
    /// # Panics
    ///
    /// Panics on stale handles, or if a node in `list` already has a parent
    /// other than `parent` (or appears twice).
    pub fn set_children_unchecked(&mut self, parent: NodeId, list: Vec<NodeId>) {
        self.validate(parent);
        let p = parent.idx;
        let before = self.content_bounding_box(parent);

        let old = core::mem::take(&mut self.children[p as usize]);
        for c in old {
            self.unlink(p, c);
        }

        let mut slots = Vec::with_capacity(list.len());
        for child in list {
            self.validate(child);
            assert!(
                self.parent[child.idx as usize] == INVALID,
                "node already has a parent: {child:?}"
            );
            assert!(child.idx != p, "cannot attach a node to itself");
            self.link(p, child.idx);
            slots.push(child.idx);
        }
        self.children[p as usize] = slots;

        let after = self.content_bounding_box(parent);
        let mut damage = Region::from(before);
        damage.add_geometry(after);
        self.damage(parent, damage);
        self.update(parent, UpdateFlags::CHILDREN_LIST);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the direct children, front-most first.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, &self.children[id.idx as usize])
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.children[id.idx as usize].len()
    }

    /// Returns a pre-order walk of the subtree rooted at `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    /// Returns whether the node is part of a fixed skeleton.
    #[must_use]
    pub fn is_structure(&self, id: NodeId) -> bool {
        self.validate(id);
        self.structure[id.idx as usize]
    }

    /// Returns the kind tag and per-kind data of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the scene root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.handle(self.root)
    }

    /// Returns the nearest view node at or above `id`.
    #[must_use]
    pub fn ancestor_view(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let mut cur = id.idx;
        while cur != INVALID {
            if matches!(self.kind[cur as usize], NodeKind::View(_)) {
                return Some(self.handle(cur));
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    // -- Enablement --

    /// Enables (`+1`) or disables (`-1`) a node.
    ///
    /// The counter nests: a node disabled twice needs two enables to become
    /// active again. When the effective state flips, the node's bounding box
    /// is damaged on its parent and an [`ENABLED`](UpdateFlags::ENABLED)
    /// update is emitted.
    pub fn set_enabled(&mut self, node: NodeId, enabled: bool) {
        self.validate(node);
        let was = self.is_enabled(node);
        self.enabled[node.idx as usize] += if enabled { 1 } else { -1 };
        if was == self.is_enabled(node) {
            return;
        }

        if let Some(parent) = self.parent(node) {
            let bbox = self.bounding_box(node);
            self.damage(parent, Region::from(bbox));
        }
        self.update(node, UpdateFlags::ENABLED);
    }

    /// Returns whether the node is active (its counter is positive).
    #[must_use]
    pub fn is_enabled(&self, node: NodeId) -> bool {
        self.enabled_counter(node) > 0
    }

    /// Returns the raw enablement counter.
    #[must_use]
    pub fn enabled_counter(&self, node: NodeId) -> i32 {
        self.validate(node);
        self.enabled[node.idx as usize]
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Builds a handle for a live slot.
    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Sets the parent link and the dirty edges; the child list is the
    /// caller's business.
    fn link(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        // Parent depends on child: a change below propagates upwards.
        for channel in dirty::ALL {
            let _ = self.dirty.add_dependency(p, c, channel);
        }
    }

    fn unlink(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = INVALID;
        for channel in dirty::ALL {
            self.dirty.remove_dependency(p, c, channel);
        }
    }
}
