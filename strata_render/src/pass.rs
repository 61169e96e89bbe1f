// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Running a render pass over a list of instances.

use alloc::vec::Vec;

use strata_core::geometry::{Geometry, Offset};
use strata_core::region::Region;

use crate::instance::{InstanceId, PassContext, RenderInstruction};
use crate::target::{Color, RenderTarget};

/// Inputs of [`run_render_pass`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPassParams {
    /// Where to draw.
    pub target: RenderTarget,
    /// Area to repaint, in the frame of `target.geometry`.
    pub damage: Region,
    /// Fill damage that no opaque instance covers with this color before
    /// executing instructions.
    pub clear: Option<Color>,
}

/// What a pass did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PassOutcome {
    /// Number of executed instructions.
    pub instructions: usize,
    /// Area touched by instructions or the background clear.
    pub painted: Region,
}

/// Pulls pending damage out of `instances` into `acc`.
pub fn collect_damage(cx: &mut PassContext<'_>, instances: &[InstanceId], acc: &mut Region) {
    for &id in instances {
        cx.collect(id, acc);
    }
}

/// Schedule phase: walks `instances` front to back and returns their
/// instructions in push order.
///
/// `damage` is clipped to the target first. On return it holds what no
/// opaque content covered, including any padding instances added.
pub fn schedule_pass(
    cx: &mut PassContext<'_>,
    instances: &[InstanceId],
    target: &RenderTarget,
    damage: &mut Region,
) -> Vec<RenderInstruction> {
    damage.intersect_geometry(target.geometry);
    let mut instructions = Vec::new();
    for &id in instances {
        cx.schedule(id, &mut instructions, target, damage);
    }
    damage.intersect_geometry(target.geometry);
    instructions
}

/// Execute phase: fills `uncovered` with `clear`, if given, then runs the
/// instructions back to front.
pub fn execute_pass(
    cx: &mut PassContext<'_>,
    instructions: &[RenderInstruction],
    target: &RenderTarget,
    uncovered: &Region,
    clear: Option<Color>,
) -> PassOutcome {
    let mut painted = Region::new();
    if let Some(color) = clear {
        if !uncovered.is_empty() {
            let boxes: Vec<Geometry> = uncovered
                .iter()
                .map(|g| target.framebuffer_box_from_geometry_box(g))
                .collect();
            cx.backend.clear(target.buffer, color, &boxes);
            painted.union_assign(uncovered);
        }
    }

    for instruction in instructions.iter().rev() {
        // Instructions are in the frame they were scheduled in.
        let to_pass = Offset::new(
            target.geometry.x - instruction.target.geometry.x,
            target.geometry.y - instruction.target.geometry.y,
        );
        painted.union_assign(&instruction.damage.translated(to_pass));
        cx.execute(instruction);
    }

    tracing::trace!(
        instructions = instructions.len(),
        area = painted.area(),
        "render pass done"
    );
    PassOutcome {
        instructions: instructions.len(),
        painted,
    }
}

/// Schedules `instances`, optionally clears what is left of the damage, then
/// executes the instructions.
pub fn run_render_pass(
    cx: &mut PassContext<'_>,
    instances: &[InstanceId],
    params: RenderPassParams,
) -> PassOutcome {
    let RenderPassParams {
        target,
        mut damage,
        clear,
    } = params;
    let instructions = schedule_pass(cx, instances, &target, &mut damage);
    execute_pass(cx, &instructions, &target, &damage, clear)
}
