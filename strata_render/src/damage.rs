// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing node damage to render instances.
//!
//! The scene graph queues damage events in each node's content space. Every
//! render instance that draws a node registers a [`DamageCallback`] for it
//! when it is generated. [`DamageRouter::route`] maps each event into the
//! node's parent space and hands it to those callbacks, which normally park
//! it in the instance's [`PendingDamage`] until the next collect phase.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use strata_core::node::{NodeId, SceneGraph};
use strata_core::region::Region;
use strata_core::update::DamageEvent;

/// Receives damage in the parent space of the node it was registered for.
pub type DamageCallback = Rc<dyn Fn(&Region)>;

/// Damage reported to one instance and not yet collected.
///
/// Cloning shares the same storage, so the callback and the instance can
/// each hold a handle.
#[derive(Clone, Debug, Default)]
pub struct PendingDamage(Rc<RefCell<Region>>);

impl PendingDamage {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds to the pending damage.
    pub fn add(&self, region: &Region) {
        self.0.borrow_mut().union_assign(region);
    }

    /// Returns and clears the pending damage.
    #[must_use]
    pub fn take(&self) -> Region {
        self.0.borrow_mut().take()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Builds a callback that adds to this accumulator and raises `wake`.
    #[must_use]
    pub fn callback(&self, wake: &Rc<Cell<bool>>) -> DamageCallback {
        let pending = self.clone();
        let wake = Rc::clone(wake);
        Rc::new(move |region: &Region| {
            if !region.is_empty() {
                pending.add(region);
                wake.set(true);
            }
        })
    }
}

/// Delivers node damage to the callbacks registered for each node.
#[derive(Default)]
pub struct DamageRouter {
    callbacks: BTreeMap<NodeId, Vec<DamageCallback>>,
}

impl fmt::Debug for DamageRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DamageRouter")
            .field("nodes", &self.callbacks.len())
            .finish_non_exhaustive()
    }
}

impl DamageRouter {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `callback` for damage on `node`.
    pub fn connect(&mut self, node: NodeId, callback: DamageCallback) {
        self.callbacks.entry(node).or_default().push(callback);
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// Returns `true` if some instance listens to `node`.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.callbacks.contains_key(&node)
    }

    /// Maps `event` into the parent space of its node and delivers it.
    ///
    /// Events for nodes without listeners, or for nodes destroyed since the
    /// event was queued, are dropped.
    pub fn route(&self, graph: &SceneGraph, event: &DamageEvent) {
        let Some(callbacks) = self.callbacks.get(&event.node) else {
            return;
        };
        if !graph.is_alive(event.node) {
            return;
        }
        let mapped = graph.region_to_parent(event.node, &event.region);
        for cb in callbacks {
            cb(&mapped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::geometry::Geometry;
    use strata_core::layer::Layer;
    use strata_core::output::OutputDesc;

    #[test]
    fn routed_damage_is_mapped_to_parent_space() {
        let mut graph = SceneGraph::new();
        let out = graph.add_output(OutputDesc::new("DP-1", Geometry::new(100, 0, 50, 50)));
        let node = graph
            .output_layer_node(out, Layer::Workspace)
            .expect("registered");

        let wake = Rc::new(Cell::new(false));
        let pending = PendingDamage::new();
        let mut router = DamageRouter::new();
        router.connect(node, pending.callback(&wake));

        router.route(
            &graph,
            &DamageEvent {
                node,
                region: Region::from(Geometry::new(0, 0, 10, 10)),
            },
        );
        assert!(wake.get());
        assert_eq!(pending.take(), Region::from(Geometry::new(100, 0, 10, 10)));
        assert!(pending.is_empty());
    }

    #[test]
    fn unconnected_nodes_are_ignored() {
        let graph = SceneGraph::new();
        let router = DamageRouter::new();
        router.route(
            &graph,
            &DamageEvent {
                node: graph.root(),
                region: Region::from(Geometry::new(0, 0, 1, 1)),
            },
        );
        assert!(!router.is_connected(graph.root()));
    }
}
