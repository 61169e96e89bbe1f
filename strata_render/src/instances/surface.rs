// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use strata_core::node::NodeId;
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;

use super::{collect_children, occludes, schedule_children_at};
use crate::damage::PendingDamage;
use crate::instance::{InstanceId, PassContext, RenderInstance, RenderInstruction};
use crate::target::{RenderTarget, Texture, TexturePlacement};

/// Instance of a client surface.
///
/// Sub-surfaces (children of the surface node) are scheduled first, in
/// surface-local coordinates, since they are drawn above it. The surface
/// itself pushes one instruction for the damage it covers and hides
/// everything behind its opaque region.
#[derive(Debug)]
pub struct SurfaceInstance {
    id: InstanceId,
    node: NodeId,
    pending: PendingDamage,
    children: Vec<InstanceId>,
}

impl SurfaceInstance {
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
        }
    }
}

impl RenderInstance for SurfaceInstance {
    fn collect_damage(&mut self, cx: &mut PassContext<'_>, acc: &mut Region) {
        acc.union_assign(&self.pending.take());
        if self.children.is_empty() {
            return;
        }
        let inner = collect_children(cx, &self.children);
        acc.union_assign(&cx.graph.region_to_parent(self.node, &inner));
    }

    fn schedule_instructions(
        &mut self,
        cx: &mut PassContext<'_>,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        let Ok(surface) = cx.graph.surface(self.node) else {
            return;
        };
        let offset = surface.offset;
        let geometry = surface.geometry();
        let mapped = surface.mapped;

        schedule_children_at(cx, &self.children, instructions, target, damage, offset);

        if !mapped {
            return;
        }
        let ours = damage.clipped(geometry);
        if ours.is_empty() {
            return;
        }
        instructions.push(RenderInstruction {
            instance: self.id,
            target: *target,
            damage: ours,
        });
        damage.subtract_assign_region(&cx.graph.opaque_region(self.node));
    }

    fn render(&mut self, cx: &mut PassContext<'_>, target: &RenderTarget, region: &Region) {
        let Ok(surface) = cx.graph.surface(self.node) else {
            return;
        };
        let geometry = surface.geometry();
        let placement =
            TexturePlacement::covering(target, geometry, f64::from(surface.buffer_scale.max(1)));
        let texture = Texture::Surface(surface.surface);
        for rect in region.iter() {
            let Some(rect) = rect.intersection(geometry) else {
                continue;
            };
            let clip = target.framebuffer_box_from_geometry_box(rect);
            cx.backend
                .draw_texture(target.buffer, texture, &placement, clip);
        }
    }

    /// Bare surfaces (cursors, panels) block scanout of what lies behind.
    fn try_scanout(&mut self, cx: &mut PassContext<'_>, output: OutputId) -> DirectScanout {
        match cx.graph.surface(self.node) {
            Ok(surface) if surface.mapped => occludes(cx.graph, self.node, output),
            _ => DirectScanout::Skip,
        }
    }

    fn name(&self) -> &'static str {
        "surface"
    }
}
