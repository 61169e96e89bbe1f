// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outputs and their per-layer subtrees.
//!
//! Every registered output owns one [`OutputNode`] in each [`Layer`]. An
//! output node maps the global layout into output-local coordinates (its
//! content space starts at the output's layout origin) and may carry a limit
//! region, in global coordinates, outside of which it neither renders nor
//! receives input.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::SceneError;
use crate::geometry::{Geometry, Offset};
use crate::layer::Layer;
use crate::node::{INVALID, NodeId, NodeKind, SceneGraph};
use crate::region::Region;
use crate::update::UpdateFlags;

/// Identifies a registered output.
///
/// Assigned by [`SceneGraph::add_output`]; never reused within one graph.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OutputId(pub u32);

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputId({})", self.0)
    }
}

/// Rotation and reflection applied to a buffer before display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BufferTransform {
    /// No transform.
    #[default]
    Normal,
    /// Rotated 90° counter-clockwise.
    Rotate90,
    /// Rotated 180°.
    Rotate180,
    /// Rotated 270° counter-clockwise.
    Rotate270,
    /// Mirrored horizontally.
    Flipped,
    /// Mirrored, then rotated 90°.
    Flipped90,
    /// Mirrored, then rotated 180°.
    Flipped180,
    /// Mirrored, then rotated 270°.
    Flipped270,
}

/// Static description of an output.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputDesc {
    /// Connector name, for logs and dumps.
    pub name: String,
    /// Position and logical size in the global layout.
    pub layout: Geometry,
    /// Pixels per logical unit.
    pub scale: f64,
    /// Transform of the scanout buffer.
    pub transform: BufferTransform,
}

impl OutputDesc {
    /// Describes an untransformed output at scale 1.
    #[must_use]
    pub fn new(name: impl Into<String>, layout: Geometry) -> Self {
        Self {
            name: name.into(),
            layout,
            scale: 1.0,
            transform: BufferTransform::Normal,
        }
    }

    /// The output's own rectangle in output-local coordinates.
    #[must_use]
    pub const fn relative_geometry(&self) -> Geometry {
        Geometry::new(0, 0, self.layout.width, self.layout.height)
    }
}

/// Per-layer subtree of one output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNode {
    /// Output this subtree belongs to.
    pub output: OutputId,
    /// Layer the node lives in.
    pub layer: Layer,
    /// Layout origin of the output; subtracted when entering the subtree.
    pub origin: Offset,
    /// Area, in global coordinates, that the subtree may draw to and receive
    /// input in. `None` means unlimited.
    pub limit_region: Option<Region>,
}

/// Result of trying to put a client buffer directly on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DirectScanout {
    /// The buffer was submitted; composition is skipped for this frame.
    Success,
    /// This node does not cover the output; ask the next one below.
    Skip,
    /// This node is visible but cannot be scanned out; compose the frame.
    Occlusion,
}

#[derive(Debug)]
pub(crate) struct OutputEntry {
    pub(crate) desc: OutputDesc,
    pub(crate) nodes: [u32; Layer::COUNT],
}

impl SceneGraph {
    /// Registers an output and creates its node in every layer.
    ///
    /// The limit region of each new node is the output's layout geometry.
    pub fn add_output(&mut self, desc: OutputDesc) -> OutputId {
        let id = OutputId(self.next_output);
        self.next_output += 1;

        let mut nodes = [INVALID; Layer::COUNT];
        for layer in Layer::ALL {
            let kind = NodeKind::Output(OutputNode {
                output: id,
                layer,
                origin: desc.layout.origin(),
                limit_region: Some(Region::from(desc.layout)),
            });
            let node = self.alloc(kind, false);
            nodes[layer.index()] = node.idx;
            let layer_node = self.layer(layer);
            self.add_back(layer_node, node);
        }

        tracing::debug!(?id, name = %desc.name, "output added");
        self.outputs.insert(id, OutputEntry { desc, nodes });
        id
    }

    /// Unregisters an output, destroying its nodes and everything below them.
    ///
    /// Views that should survive must be moved to another output first.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownOutput`] if the id is not registered.
    pub fn remove_output(&mut self, id: OutputId) -> Result<OutputDesc, SceneError> {
        let entry = self
            .outputs
            .remove(&id)
            .ok_or(SceneError::UnknownOutput(id))?;
        for idx in entry.nodes {
            let node = self.handle(idx);
            self.remove_child(node);
            self.destroy_subtree(node);
        }
        tracing::debug!(?id, "output removed");
        Ok(entry.desc)
    }

    /// Moves or resizes an output in the global layout.
    ///
    /// Resets the limit regions to the new layout geometry and damages the
    /// old and new areas.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownOutput`] if the id is not registered.
    pub fn set_output_layout(&mut self, id: OutputId, layout: Geometry) -> Result<(), SceneError> {
        let entry = self
            .outputs
            .get_mut(&id)
            .ok_or(SceneError::UnknownOutput(id))?;
        let old = entry.desc.layout;
        entry.desc.layout = layout;
        let nodes = entry.nodes;

        for (layer, idx) in Layer::ALL.into_iter().zip(nodes) {
            let before = self.bounding_box(self.handle(idx));
            if let Some(o) = self.kind[idx as usize].as_output_mut() {
                o.origin = layout.origin();
                o.limit_region = Some(Region::from(layout));
            }
            let after = self.bounding_box(self.handle(idx));
            let layer_node = self.layer(layer);
            let mut damage = Region::from(old);
            damage.add_geometry(layout);
            damage.add_geometry(before);
            damage.add_geometry(after);
            self.damage(layer_node, damage);
            // Overlap between outputs may have changed, so every render tree
            // must be rebuilt.
            self.update(layer_node, UpdateFlags::CHILDREN_LIST);
        }
        Ok(())
    }

    /// Replaces the limit region of every node of an output.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::UnknownOutput`] if the id is not registered.
    pub fn set_output_limit_region(
        &mut self,
        id: OutputId,
        limit: Option<Region>,
    ) -> Result<(), SceneError> {
        let entry = self
            .outputs
            .get(&id)
            .ok_or(SceneError::UnknownOutput(id))?;
        let nodes = entry.nodes;
        for (layer, idx) in Layer::ALL.into_iter().zip(nodes) {
            let mut damage = Region::new();
            if let Some(o) = self.kind[idx as usize].as_output_mut() {
                if let Some(old) = &o.limit_region {
                    damage.union_assign(old);
                }
                if let Some(new) = &limit {
                    damage.union_assign(new);
                }
                o.limit_region.clone_from(&limit);
            }
            let layer_node = self.layer(layer);
            self.damage(layer_node, damage);
            self.update(layer_node, UpdateFlags::CHILDREN_LIST);
        }
        Ok(())
    }

    /// Returns the description of a registered output.
    #[must_use]
    pub fn output(&self, id: OutputId) -> Option<&OutputDesc> {
        self.outputs.get(&id).map(|e| &e.desc)
    }

    /// Returns the node of `id` in `layer`.
    #[must_use]
    pub fn output_layer_node(&self, id: OutputId, layer: Layer) -> Option<NodeId> {
        self.outputs
            .get(&id)
            .map(|e| self.handle(e.nodes[layer.index()]))
    }

    /// Iterates over registered outputs in id order.
    pub fn outputs(&self) -> impl Iterator<Item = OutputId> + '_ {
        self.outputs.keys().copied()
    }

    /// Returns the output whose subtree contains `node`.
    #[must_use]
    pub fn output_of(&self, node: NodeId) -> Option<OutputId> {
        self.validate(node);
        let mut cur = node.idx;
        while cur != INVALID {
            if let NodeKind::Output(o) = &self.kind[cur as usize] {
                return Some(o.output);
            }
            cur = self.parent[cur as usize];
        }
        None
    }

    /// Returns the output node data of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotAnOutput`] for other kinds.
    pub fn output_node(&self, node: NodeId) -> Result<&OutputNode, SceneError> {
        self.kind(node)
            .as_output()
            .ok_or(SceneError::NotAnOutput(node))
    }

    /// Returns all output nodes, in layer order then output order.
    #[must_use]
    pub fn output_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for layer in Layer::ALL {
            for entry in self.outputs.values() {
                out.push(self.handle(entry.nodes[layer.index()]));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Point;

    use super::*;

    #[test]
    fn add_output_creates_node_per_layer() {
        let mut graph = SceneGraph::new();
        let id = graph.add_output(OutputDesc::new("DP-1", Geometry::new(0, 0, 1920, 1080)));
        for layer in Layer::ALL {
            let node = graph.output_layer_node(id, layer).expect("registered");
            assert_eq!(graph.parent(node), Some(graph.layer(layer)));
            let data = graph.output_node(node).expect("output kind");
            assert_eq!(data.layer, layer);
            assert_eq!(graph.output_of(node), Some(id));
        }
        assert_eq!(graph.output_nodes().len(), Layer::COUNT);
    }

    #[test]
    fn output_translates_by_layout_origin() {
        let mut graph = SceneGraph::new();
        let id = graph.add_output(OutputDesc::new("HDMI-A-1", Geometry::new(1920, 0, 1280, 1024)));
        let node = graph
            .output_layer_node(id, Layer::Workspace)
            .expect("registered");
        let local = graph.to_local(node, Point::new(2000.0, 10.0));
        assert_eq!(local, Point::new(80.0, 10.0));
        assert_eq!(graph.to_global(node, local), Point::new(2000.0, 10.0));
    }

    #[test]
    fn remove_output_destroys_subtree() {
        let mut graph = SceneGraph::new();
        let id = graph.add_output(OutputDesc::new("DP-1", Geometry::new(0, 0, 100, 100)));
        let node = graph
            .output_layer_node(id, Layer::Workspace)
            .expect("registered");
        let child = graph.create_inner(false);
        graph.add_back(node, child);

        let desc = graph.remove_output(id).expect("registered");
        assert_eq!(desc.name, "DP-1");
        assert!(!graph.is_alive(node));
        assert!(!graph.is_alive(child));
        assert!(graph.output(id).is_none());
        assert_eq!(graph.remove_output(id), Err(SceneError::UnknownOutput(id)));
    }

    #[test]
    fn layout_change_moves_origin_and_limit() {
        let mut graph = SceneGraph::new();
        let id = graph.add_output(OutputDesc::new("DP-1", Geometry::new(0, 0, 100, 100)));
        graph
            .set_output_layout(id, Geometry::new(100, 0, 100, 100))
            .expect("registered");
        let node = graph
            .output_layer_node(id, Layer::Top)
            .expect("registered");
        let data = graph.output_node(node).expect("output kind");
        assert_eq!(data.origin, Offset::new(100, 0));
        assert_eq!(
            data.limit_region,
            Some(Region::from(Geometry::new(100, 0, 100, 100)))
        );
    }
}
