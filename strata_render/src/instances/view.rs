// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use kurbo::{Affine, Vec2};
use strata_core::geometry::{Geometry, Offset, wrap_offset};
use strata_core::node::{NodeId, SceneGraph};
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;
use strata_core::view::ViewNode;

use super::{collect_children, direct_source, only_child, scanout_screen, schedule_children_at};
use crate::backend::{GpuBackend, OffscreenBuffer};
use crate::damage::PendingDamage;
use crate::instance::{InstanceId, PassContext, RenderInstance, RenderInstruction};
use crate::pass::{RenderPassParams, run_render_pass};
use crate::target::{Color, RenderTarget, Texture, TexturePlacement, scaled_size};

/// Instance of a toplevel or popup view.
///
/// Untransformed views are transparent to scheduling: their children are
/// scheduled in view-local coordinates and draw themselves. A transformed
/// view pushes a single instruction and draws its contents through the
/// transform, either straight from the client buffer or from an offscreen
/// capture kept up to date with `cached_damage`.
#[derive(Debug)]
pub struct ViewInstance {
    id: InstanceId,
    node: NodeId,
    pending: PendingDamage,
    children: Vec<InstanceId>,
    /// Damage of the offscreen capture, in view-local coordinates.
    cached_damage: Region,
    offscreen: OffscreenBuffer,
}

impl ViewInstance {
    pub(crate) fn new(
        id: InstanceId,
        node: NodeId,
        pending: PendingDamage,
        children: Vec<InstanceId>,
    ) -> Self {
        Self {
            id,
            node,
            pending,
            children,
            cached_damage: Region::new(),
            offscreen: OffscreenBuffer::new(),
        }
    }

    /// Returns the client buffer to draw from when the view holds a single
    /// plain surface, as `(texture, origin in view space, texel scale)`.
    fn direct(&self, graph: &SceneGraph) -> Option<(Texture, Offset, f64)> {
        if self.children.len() != 1 {
            return None;
        }
        let src = direct_source(graph, only_child(graph, self.node)?)?;
        Some((
            Texture::Surface(src.surface),
            src.geometry.origin(),
            src.texel_scale,
        ))
    }

    /// Brings the offscreen capture up to date and returns it.
    fn captured(&mut self, cx: &mut PassContext<'_>, scale: f64) -> Option<(Texture, Offset, f64)> {
        let graph = cx.graph;
        let Ok(view) = graph.view(self.node) else {
            return None;
        };
        let local = Geometry::new(0, 0, view.geometry.width, view.geometry.height)
            .union_bounds(graph.content_bounding_box(self.node));
        let (width, height) = scaled_size(local, scale);
        match self.offscreen.ensure(cx.backend, width, height) {
            Ok(true) => self.cached_damage.add_geometry(local),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(node = ?self.node, %err, "cannot allocate view capture");
                return None;
            }
        }
        let buffer = self.offscreen.buffer()?;
        let damage = self.cached_damage.take().clipped(local);
        if !damage.is_empty() {
            let params = RenderPassParams {
                target: RenderTarget::new(buffer, local, scale),
                damage,
                clear: Some(Color::TRANSPARENT),
            };
            run_render_pass(cx, &self.children, params);
        }
        Some((Texture::Buffer(buffer), local.origin(), scale))
    }
}

impl RenderInstance for ViewInstance {
    fn collect_damage(&mut self, cx: &mut PassContext<'_>, acc: &mut Region) {
        acc.union_assign(&self.pending.take());
        let inner = collect_children(cx, &self.children);
        if inner.is_empty() {
            return;
        }
        if cx.graph.view(self.node).is_ok_and(ViewNode::has_transform) {
            if self.direct(cx.graph).is_some() {
                // The client buffer is drawn as is; a capture would be stale.
                self.offscreen.release(cx.backend);
                self.cached_damage.clear();
            } else {
                self.cached_damage.union_assign(&inner);
            }
        }
        acc.union_assign(&cx.graph.region_to_parent(self.node, &inner));
    }

    fn schedule_instructions(
        &mut self,
        cx: &mut PassContext<'_>,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        let graph = cx.graph;
        let Ok(view) = graph.view(self.node) else {
            return;
        };
        if !view.mapped {
            return;
        }

        // Sticky views stay put while the target scrolls over workspaces.
        let mut our_target = *target;
        let mut shift = Offset::ZERO;
        if view.sticky {
            if let Some(desc) = graph.output_of(self.node).and_then(|o| graph.output(o)) {
                let origin = target.geometry.origin();
                let wrapped = wrap_offset(origin, desc.layout.width, desc.layout.height);
                our_target.geometry.x = wrapped.x;
                our_target.geometry.y = wrapped.y;
                shift = Offset::new(origin.x - wrapped.x, origin.y - wrapped.y);
            }
        }
        damage.translate(shift.neg());

        let ours = damage.clipped(graph.bounding_box(self.node));
        if !ours.is_empty() {
            if view.has_transform() {
                instructions.push(RenderInstruction {
                    instance: self.id,
                    target: our_target,
                    damage: ours,
                });
                damage.subtract_assign_region(&graph.opaque_region(self.node));
            } else {
                schedule_children_at(
                    cx,
                    &self.children,
                    instructions,
                    &our_target,
                    damage,
                    view.geometry.origin(),
                );
            }
        }

        damage.translate(shift);
    }

    fn render(&mut self, cx: &mut PassContext<'_>, target: &RenderTarget, region: &Region) {
        let graph = cx.graph;
        let Ok(view) = graph.view(self.node) else {
            return;
        };
        let Some(transform) = view.transform else {
            return;
        };
        let origin = view.geometry.origin();

        let source = match self.direct(graph) {
            Some(direct) => {
                self.offscreen.release(cx.backend);
                self.cached_damage.clear();
                Some(direct)
            }
            None => self.captured(cx, target.scale),
        };
        let Some((texture, content_origin, texel_scale)) = source else {
            return;
        };

        let to_target = Vec2::new(
            f64::from(origin.x - target.geometry.x),
            f64::from(origin.y - target.geometry.y),
        );
        let placement = TexturePlacement {
            transform: Affine::scale(target.scale)
                * Affine::translate(to_target)
                * transform.affine
                * Affine::translate(Vec2::new(
                    f64::from(content_origin.x),
                    f64::from(content_origin.y),
                ))
                * Affine::scale(1.0 / texel_scale),
            alpha: transform.alpha,
        };

        let bounds = graph.bounding_box(self.node);
        for rect in region.iter() {
            let Some(rect) = rect.intersection(bounds) else {
                continue;
            };
            let clip = target.framebuffer_box_from_geometry_box(rect);
            cx.backend.draw_texture(target.buffer, texture, &placement, clip);
        }
    }

    fn try_scanout(&mut self, cx: &mut PassContext<'_>, output: OutputId) -> DirectScanout {
        let graph = cx.graph;
        let Some(desc) = graph.output(output) else {
            return DirectScanout::Skip;
        };
        let Ok(view) = graph.view(self.node) else {
            return DirectScanout::Skip;
        };
        if !view.mapped {
            return DirectScanout::Skip;
        }
        let screen = scanout_screen(graph, self.node, desc);

        if !graph.bounding_box(self.node).intersects(screen) {
            return DirectScanout::Skip;
        }
        if view.geometry != screen || view.has_transform() {
            return DirectScanout::Occlusion;
        }

        let Some(child) = only_child(graph, self.node) else {
            return DirectScanout::Occlusion;
        };
        let Ok(surface) = graph.surface(child) else {
            return DirectScanout::Occlusion;
        };
        if !surface.mapped || graph.child_count(child) != 0 {
            return DirectScanout::Occlusion;
        }
        if f64::from(surface.buffer_scale) != desc.scale
            || surface.buffer_transform != desc.transform
        {
            return DirectScanout::Occlusion;
        }
        let mut uncovered = Region::from(screen);
        uncovered.subtract_assign_region(&graph.opaque_region(self.node));
        if !uncovered.is_empty() {
            return DirectScanout::Occlusion;
        }

        match cx.backend.scanout(output, surface.surface) {
            Ok(()) => {
                tracing::debug!(?output, surface = ?surface.surface, "direct scanout");
                DirectScanout::Success
            }
            Err(err) => {
                tracing::warn!(?output, %err, "direct scanout rejected, composing");
                DirectScanout::Occlusion
            }
        }
    }

    fn release(&mut self, backend: &mut dyn GpuBackend) {
        self.offscreen.release(backend);
    }

    fn name(&self) -> &'static str {
        "view"
    }
}
