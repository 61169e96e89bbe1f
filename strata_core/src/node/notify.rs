// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Update propagation and the damage queue.

use alloc::boxed::Box;
use alloc::vec::Vec;

use understory_dirty::EagerPolicy;

use super::id::{INVALID, NodeId};
use super::store::SceneGraph;
use crate::region::Region;
use crate::update::{DamageEvent, ListenerId, RootUpdate, UpdateFlags};

impl SceneGraph {
    /// Reports a structural change on `node`.
    ///
    /// Marks the matching dirty channels on the node and, through the
    /// parent-to-child dependency edges, on all of its ancestors. If the node
    /// is reachable from the root, every root listener is invoked once with
    /// the normalized flags.
    pub fn update(&mut self, node: NodeId, flags: UpdateFlags) {
        self.validate(node);
        let flags = flags.normalized();
        for channel in flags.channels() {
            self.dirty.mark_with(node.idx, channel, &EagerPolicy);
        }

        let mut top = node.idx;
        while self.parent[top as usize] != INVALID {
            top = self.parent[top as usize];
        }
        if top != self.root {
            return;
        }

        let event = RootUpdate {
            flags,
            origin: node,
        };
        let mut listeners = core::mem::take(&mut self.listeners);
        for (_, listener) in &mut listeners {
            listener(&event);
        }
        self.listeners = listeners;
    }

    /// Registers a listener for changes that reach the root.
    pub fn connect_update(&mut self, listener: impl FnMut(&RootUpdate) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: ListenerId) {
        self.listeners.retain(|(l, _)| *l != id);
    }

    /// Drains the dirty channels selected by `flags`.
    ///
    /// Returns every live node that was marked since the last drain, directly
    /// or through a descendant, sorted and without duplicates.
    #[must_use]
    pub fn drain_updates(&mut self, flags: UpdateFlags) -> Vec<NodeId> {
        let mut slots: Vec<u32> = Vec::new();
        for channel in flags.channels() {
            slots.extend(
                self.dirty
                    .drain(channel)
                    .affected()
                    .deterministic()
                    .run(),
            );
        }
        slots.sort_unstable();
        slots.dedup();
        slots
            .into_iter()
            .filter(|&idx| idx < self.len && self.alive[idx as usize])
            .map(|idx| self.handle(idx))
            .collect()
    }

    /// Queues damage on `node`, expressed in its content space.
    ///
    /// Empty regions are dropped.
    pub fn damage(&mut self, node: NodeId, region: Region) {
        self.validate(node);
        if region.is_empty() {
            return;
        }
        self.pending_damage.push(DamageEvent { node, region });
    }

    /// Takes every queued damage event, oldest first.
    #[must_use]
    pub fn take_damage(&mut self) -> Vec<DamageEvent> {
        core::mem::take(&mut self.pending_damage)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::layer::Layer;

    #[test]
    fn update_reaches_root_listener_once() {
        let mut graph = SceneGraph::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        graph.connect_update(move |u| sink.borrow_mut().push(*u));

        let workspace = graph.layer(Layer::Workspace);
        let group = graph.create_inner(false);
        graph.add_back(workspace, group);
        let leaf = graph.create_inner(false);
        graph.add_back(group, leaf);

        seen.borrow_mut().clear();
        graph.set_enabled(leaf, false);
        let events = seen.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin, leaf);
        assert_eq!(
            events[0].flags,
            UpdateFlags::ENABLED | UpdateFlags::INPUT_STATE
        );
    }

    #[test]
    fn detached_updates_are_not_broadcast() {
        let mut graph = SceneGraph::new();
        let count = Rc::new(RefCell::new(0_u32));
        let sink = Rc::clone(&count);
        graph.connect_update(move |_| *sink.borrow_mut() += 1);

        let floating = graph.create_inner(false);
        let leaf = graph.create_inner(false);
        graph.add_back(floating, leaf);
        graph.set_enabled(leaf, false);
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn disconnect_stops_delivery() {
        let mut graph = SceneGraph::new();
        let count = Rc::new(RefCell::new(0_u32));
        let sink = Rc::clone(&count);
        let id = graph.connect_update(move |_| *sink.borrow_mut() += 1);
        let root = graph.root();
        graph.update(root, UpdateFlags::INPUT_STATE);
        graph.disconnect(id);
        graph.update(root, UpdateFlags::INPUT_STATE);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn drained_updates_include_ancestors() {
        let mut graph = SceneGraph::new();
        let workspace = graph.layer(Layer::Workspace);
        let group = graph.create_inner(false);
        graph.add_back(workspace, group);
        let leaf = graph.create_inner(false);
        graph.add_back(group, leaf);
        let _ = graph.drain_updates(UpdateFlags::all());

        graph.set_enabled(leaf, false);
        let changed = graph.drain_updates(UpdateFlags::ENABLED);
        assert!(changed.contains(&leaf));
        assert!(changed.contains(&group));
        assert!(changed.contains(&workspace));
        assert!(changed.contains(&graph.root()));
        assert!(!changed.contains(&graph.layer(Layer::Background)));

        // Drained channels start empty again.
        assert!(graph.drain_updates(UpdateFlags::ENABLED).is_empty());
    }

    #[test]
    fn empty_damage_is_dropped() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.damage(root, Region::new());
        assert!(graph.take_damage().is_empty());
    }
}
