// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render instances for each node kind.
//!
//! [`gen_render_instances`] turns a node and its enabled subtree into
//! instances, dispatching on [`NodeKind`]:
//!
//! | kind | instance |
//! |---|---|
//! | root, layer, inner | [`ContainerInstance`] |
//! | output | [`OutputInstance`] |
//! | view | [`ViewInstance`] |
//! | surface | [`SurfaceInstance`] |
//! | blur | [`BlurInstance`] |

mod blur;
mod container;
mod output;
mod surface;
mod view;

use alloc::boxed::Box;
use alloc::vec::Vec;

use strata_core::geometry::{Geometry, Offset};
use strata_core::node::{NodeId, NodeKind, SceneGraph, SurfaceId};
use strata_core::output::{DirectScanout, OutputDesc, OutputId};
use strata_core::region::Region;
use strata_core::view::ViewRole;

use crate::instance::{GenContext, InstanceId, PassContext, RenderInstruction};
use crate::target::RenderTarget;

pub use blur::BlurInstance;
pub use container::ContainerInstance;
pub use output::OutputInstance;
pub use surface::SurfaceInstance;
pub use view::ViewInstance;

/// Generates the instances for `node` and appends them to `out`.
///
/// Produces nothing for output nodes whose limit region misses the
/// viewport hint, and for sticky desktop-environment views assigned to a
/// different output.
pub fn gen_render_instances(cx: &mut GenContext<'_>, node: NodeId, out: &mut Vec<InstanceId>) {
    let graph = cx.graph;
    match graph.kind(node) {
        NodeKind::Root | NodeKind::Layer(_) | NodeKind::Inner => {
            let id = cx.reserve();
            let pending = cx.pending_for(node);
            let children = gen_children(cx, node);
            cx.fill(id, Box::new(ContainerInstance::new(node, pending, children)));
            out.push(id);
        }
        NodeKind::Output(o) => {
            if let (Some(viewport), Some(limit)) = (cx.viewport, &o.limit_region) {
                if !limit.intersects_geometry(viewport) {
                    return;
                }
            }
            let id = cx.reserve();
            let pending = cx.pending_for(node);
            let children = gen_children(cx, node);
            cx.fill(
                id,
                Box::new(OutputInstance::new(id, node, o.output, pending, children)),
            );
            out.push(id);
        }
        NodeKind::View(v) => {
            if v.role == ViewRole::DesktopEnvironment
                && v.sticky
                && v.output.is_some_and(|o| o != cx.output)
            {
                return;
            }
            let id = cx.reserve();
            let pending = cx.pending_for(node);
            let children = gen_children(cx, node);
            cx.fill(id, Box::new(ViewInstance::new(id, node, pending, children)));
            out.push(id);
        }
        NodeKind::Surface(_) => {
            let id = cx.reserve();
            let pending = cx.pending_for(node);
            let children = gen_children(cx, node);
            cx.fill(id, Box::new(SurfaceInstance::new(id, node, pending, children)));
            out.push(id);
        }
        NodeKind::Blur(b) => {
            cx.note_effect();
            let id = cx.reserve();
            let pending = cx.pending_for(node);
            let children = gen_children(cx, node);
            let bbox = graph.bounding_box(node);
            cx.fill(
                id,
                Box::new(BlurInstance::new(id, node, b.effect, pending, children, bbox)),
            );
            out.push(id);
        }
    }
}

/// Generates instances for the enabled children of `node`, front first.
fn gen_children(cx: &mut GenContext<'_>, node: NodeId) -> Vec<InstanceId> {
    let graph = cx.graph;
    let mut children = Vec::new();
    for child in graph.children(node) {
        if graph.is_enabled(child) {
            gen_render_instances(cx, child, &mut children);
        }
    }
    children
}

/// Collects `children` into a fresh accumulator in the caller's content
/// space.
fn collect_children(cx: &mut PassContext<'_>, children: &[InstanceId]) -> Region {
    let mut acc = Region::new();
    for &child in children {
        cx.collect(child, &mut acc);
    }
    acc
}

/// Schedules `children` in a content space whose origin sits at `offset` in
/// the caller's frame. Damage and target are moved in and back out.
fn schedule_children_at(
    cx: &mut PassContext<'_>,
    children: &[InstanceId],
    instructions: &mut Vec<RenderInstruction>,
    target: &RenderTarget,
    damage: &mut Region,
    offset: Offset,
) {
    if children.is_empty() {
        return;
    }
    let inner = target.translated(offset.neg());
    damage.translate(offset.neg());
    for &child in children {
        cx.schedule(child, instructions, &inner, damage);
    }
    damage.translate(offset);
}

/// Area of `desc` in the frame `node`'s bounding box is measured in.
///
/// Nodes under an output node live in output-local coordinates.
pub(crate) fn scanout_screen(graph: &SceneGraph, node: NodeId, desc: &OutputDesc) -> Geometry {
    if graph.output_of(node).is_some() {
        desc.relative_geometry()
    } else {
        desc.layout
    }
}

/// Scanout answer for content that can never stand in for the framebuffer:
/// it blocks scanout wherever it shows on `output`.
pub(crate) fn occludes(graph: &SceneGraph, node: NodeId, output: OutputId) -> DirectScanout {
    let Some(desc) = graph.output(output) else {
        return DirectScanout::Skip;
    };
    if graph
        .bounding_box(node)
        .intersects(scanout_screen(graph, node, desc))
    {
        DirectScanout::Occlusion
    } else {
        DirectScanout::Skip
    }
}

/// A client buffer that shows exactly what a node draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DirectSource {
    pub(crate) surface: SurfaceId,
    /// Area covered by the buffer, in the node's parent space.
    pub(crate) geometry: Geometry,
    /// Buffer texels per logical unit.
    pub(crate) texel_scale: f64,
}

/// Returns the only child of `node` if it has exactly one and it is enabled.
pub(crate) fn only_child(graph: &SceneGraph, node: NodeId) -> Option<NodeId> {
    let mut kids = graph.children(node);
    match (kids.next(), kids.next()) {
        (Some(child), None) if graph.is_enabled(child) => Some(child),
        _ => None,
    }
}

/// Finds the client buffer that can stand in for `node`, if any.
///
/// Surfaces carrying sub-surfaces never qualify since the buffer alone
/// would drop them.
pub(crate) fn direct_source(graph: &SceneGraph, node: NodeId) -> Option<DirectSource> {
    let surface = graph.direct_texture(node)?;
    let (surface_node, origin) = match graph.kind(node) {
        NodeKind::Surface(_) => (node, Offset::ZERO),
        NodeKind::View(v) => (graph.children(node).next()?, v.geometry.origin()),
        _ => return None,
    };
    if graph.child_count(surface_node) != 0 {
        return None;
    }
    let s = graph.surface(surface_node).ok()?;
    Some(DirectSource {
        surface,
        geometry: s.geometry().translate(origin),
        texel_scale: f64::from(s.buffer_scale.max(1)),
    })
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use strata_core::geometry::{Geometry, Offset};
    use strata_core::node::{SceneGraph, SurfaceId};
    use strata_core::region::Region;
    use strata_core::view::{SurfaceNode, ViewNode};

    use super::*;
    use crate::config::RenderConfig;
    use crate::damage::PendingDamage;
    use crate::effects::EffectRegistry;
    use crate::instance::{InstanceArena, PassContext, RenderInstruction};
    use crate::target::{BufferId, RenderTarget};
    use crate::testing::RecordingBackend;

    #[test]
    #[should_panic(expected = "rendering an inner node")]
    fn rendering_a_container_panics() {
        let graph = SceneGraph::new();
        let mut backend = RecordingBackend::default();
        let effects = EffectRegistry::new();
        let config = RenderConfig::DEFAULT;
        let mut arena = InstanceArena::new();
        let id = arena.insert(Box::new(ContainerInstance::new(
            graph.root(),
            PendingDamage::new(),
            Vec::new(),
        )));
        let mut cx = PassContext::new(&graph, &mut backend, &effects, &config, &mut arena);
        let area = Geometry::new(0, 0, 10, 10);
        cx.execute(&RenderInstruction {
            instance: id,
            target: RenderTarget::new(BufferId(1), area, 1.0),
            damage: Region::from(area),
        });
    }

    #[test]
    fn view_with_one_plain_surface_has_a_direct_source() {
        let mut graph = SceneGraph::new();
        let view = graph.create_view(ViewNode::new(Geometry::new(30, 40, 20, 10)));
        let surface = graph.create_surface(SurfaceNode {
            buffer_scale: 2,
            ..SurfaceNode::new(SurfaceId(4), 20, 10)
        });
        graph.add_front(view, surface);

        let src = direct_source(&graph, view).expect("single surface at the origin");
        assert_eq!(src.surface, SurfaceId(4));
        assert_eq!(src.geometry, Geometry::new(30, 40, 20, 10));
        assert_eq!(src.texel_scale, 2.0);

        // A sub-surface would be lost.
        let sub = graph.create_surface(SurfaceNode::new(SurfaceId(5), 4, 4));
        graph.add_front(surface, sub);
        assert_eq!(direct_source(&graph, view), None);
        assert_eq!(direct_source(&graph, sub).map(|s| s.geometry.origin()), Some(Offset::ZERO));
    }
}
