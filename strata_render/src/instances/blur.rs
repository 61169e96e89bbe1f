// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use strata_core::effect::EffectId;
use strata_core::geometry::Geometry;
use strata_core::node::{NodeId, SceneGraph};
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;

use super::{DirectSource, collect_children, direct_source, occludes, only_child};
use crate::backend::{GpuBackend, OffscreenBuffer};
use crate::damage::PendingDamage;
use crate::effects::{BlurSource, sampling_padding};
use crate::instance::{InstanceId, PassContext, RenderInstance, RenderInstruction};
use crate::pass::{RenderPassParams, run_render_pass};
use crate::target::{Color, RenderTarget, Texture, TexturePlacement, scaled_size};

/// Instance of a blur node.
///
/// Blurs whatever lies behind its subtree and draws the subtree on top.
/// Damage is padded by the provider's sampling radius so the blur reads
/// fresh pixels; the band added by padding is copied aside while
/// scheduling and restored after rendering, so it ends up unchanged.
#[derive(Debug)]
pub struct BlurInstance {
    id: InstanceId,
    node: NodeId,
    effect: EffectId,
    pending: PendingDamage,
    children: Vec<InstanceId>,
    /// Damage of the offscreen capture of the subtree.
    cached_damage: Region,
    offscreen: OffscreenBuffer,
    /// Pixels of the padding band, at the same framebuffer positions.
    saved: OffscreenBuffer,
    /// Framebuffer boxes held in `saved`.
    saved_region: Region,
}

impl BlurInstance {
    pub(crate) fn new(
        id: InstanceId,
        node: NodeId,
        effect: EffectId,
        pending: PendingDamage,
        children: Vec<InstanceId>,
        bbox: Geometry,
    ) -> Self {
        Self {
            id,
            node,
            effect,
            pending,
            children,
            cached_damage: Region::from(bbox),
            offscreen: OffscreenBuffer::new(),
            saved: OffscreenBuffer::new(),
            saved_region: Region::new(),
        }
    }

    /// Effect this instance applies.
    #[must_use]
    pub fn effect(&self) -> EffectId {
        self.effect
    }

    /// The client buffer showing the whole subtree, if there is one.
    fn direct(&self, graph: &SceneGraph) -> Option<DirectSource> {
        if self.children.len() != 1 {
            return None;
        }
        direct_source(graph, only_child(graph, self.node)?)
    }

    /// Copies the padding band out of the target before anything draws.
    fn preserve(&mut self, cx: &mut PassContext<'_>, target: &RenderTarget, band: &Region) {
        if let Err(err) =
            self.saved
                .ensure(cx.backend, target.viewport_width, target.viewport_height)
        {
            tracing::warn!(node = ?self.node, %err, "cannot allocate blur padding capture");
            return;
        }
        let Some(saved) = self.saved.buffer() else {
            return;
        };
        let viewport = target.viewport();
        for rect in band.iter() {
            let Some(fb) = target
                .framebuffer_box_from_geometry_box(rect)
                .intersection(viewport)
            else {
                continue;
            };
            cx.backend.blit(target.buffer, fb, saved, fb);
            self.saved_region.add_geometry(fb);
        }
    }

    /// Puts the preserved band back.
    fn restore(&mut self, cx: &mut PassContext<'_>, target: &RenderTarget) {
        let region = self.saved_region.take();
        let Some(saved) = self.saved.buffer() else {
            return;
        };
        for fb in region.iter() {
            cx.backend.blit(saved, fb, target.buffer, fb);
        }
    }

    /// Returns the subtree as a texture, refreshing the capture if needed.
    fn source(
        &mut self,
        cx: &mut PassContext<'_>,
        target: &RenderTarget,
        bounds: Geometry,
    ) -> Option<BlurSource> {
        if let Some(src) = self.direct(cx.graph) {
            self.offscreen.release(cx.backend);
            self.cached_damage.clear();
            return Some(BlurSource {
                texture: Texture::Surface(src.surface),
                placement: TexturePlacement::covering(target, src.geometry, src.texel_scale),
            });
        }

        let (width, height) = scaled_size(bounds, target.scale);
        match self.offscreen.ensure(cx.backend, width, height) {
            Ok(true) => self.cached_damage.add_geometry(bounds),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(node = ?self.node, %err, "cannot allocate blur capture");
                return None;
            }
        }
        let buffer = self.offscreen.buffer()?;
        let damage = self.cached_damage.take().clipped(bounds);
        if !damage.is_empty() {
            let params = RenderPassParams {
                target: RenderTarget::new(buffer, bounds, target.scale),
                damage,
                clear: Some(Color::TRANSPARENT),
            };
            run_render_pass(cx, &self.children, params);
        }
        Some(BlurSource {
            texture: Texture::Buffer(buffer),
            placement: TexturePlacement::covering(target, bounds, target.scale),
        })
    }
}

impl RenderInstance for BlurInstance {
    fn collect_damage(&mut self, cx: &mut PassContext<'_>, acc: &mut Region) {
        acc.union_assign(&self.pending.take());
        let inner = collect_children(cx, &self.children);
        if self.direct(cx.graph).is_some() {
            // Blurring straight from the client buffer; no capture to keep.
            self.offscreen.release(cx.backend);
            self.cached_damage.clear();
        } else {
            self.cached_damage.union_assign(&inner);
        }
        acc.union_assign(&inner);
    }

    fn schedule_instructions(
        &mut self,
        cx: &mut PassContext<'_>,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        let graph = cx.graph;
        let Some(radius) = cx.effects.get(self.effect).map(|p| p.sampling_radius()) else {
            tracing::warn!(effect = ?self.effect, "unknown blur effect, drawing unblurred");
            for &child in &self.children {
                cx.schedule(child, instructions, target, damage);
            }
            return;
        };

        let bounds = graph.bounding_box(self.node);
        let mut padded = damage.clipped(bounds);
        if padded.is_empty() {
            return;
        }

        // Nothing shows through an opaque child, so there is nothing to blur.
        if let Some(child) = only_child(graph, self.node) {
            let mut exposed = padded.clipped(target.geometry);
            exposed.subtract_assign_region(&graph.opaque_region(child));
            if exposed.is_empty() {
                for &child in &self.children {
                    cx.schedule(child, instructions, target, damage);
                }
                return;
            }
        }

        padded.expand_edges(sampling_padding(radius, target.scale));
        padded.intersect_geometry(bounds);
        padded.intersect_geometry(target.geometry);

        let band = padded.subtract(damage);
        if !band.is_empty() {
            self.preserve(cx, target, &band);
            damage.union_assign(&band);
        }
        instructions.push(RenderInstruction {
            instance: self.id,
            target: *target,
            damage: padded,
        });
    }

    fn render(&mut self, cx: &mut PassContext<'_>, target: &RenderTarget, region: &Region) {
        let graph = cx.graph;
        let effects = cx.effects;
        let bounds = graph.bounding_box(self.node);

        match self.source(cx, target, bounds) {
            Some(source) => {
                if let Some(provider) = effects.get(self.effect) {
                    let mut translucent = region.clone();
                    translucent.subtract_assign_region(&graph.opaque_region(self.node));
                    provider.pre_render(cx.backend, bounds, &translucent, target);
                    for rect in region.iter() {
                        provider.render(cx.backend, &source, bounds, rect, target);
                    }
                }
            }
            None => {
                let params = RenderPassParams {
                    target: *target,
                    damage: region.clone(),
                    clear: None,
                };
                run_render_pass(cx, &self.children, params);
            }
        }

        self.restore(cx, target);
    }

    /// Whatever shows through a blur was composed, so it always blocks.
    fn try_scanout(&mut self, cx: &mut PassContext<'_>, output: OutputId) -> DirectScanout {
        occludes(cx.graph, self.node, output)
    }

    fn release(&mut self, backend: &mut dyn GpuBackend) {
        self.offscreen.release(backend);
        self.saved.release(backend);
        self.saved_region.clear();
    }

    fn name(&self) -> &'static str {
        "blur"
    }
}
