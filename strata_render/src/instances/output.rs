// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use strata_core::node::NodeId;
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;

use super::{collect_children, schedule_children_at};
use crate::damage::PendingDamage;
use crate::instance::{InstanceId, PassContext, RenderInstance, RenderInstruction};
use crate::target::RenderTarget;

/// Instance of one output's subtree within a layer.
///
/// Moves damage and target into output-local coordinates around its
/// children. With a limit region, children only ever see damage inside it
/// and only damage inside it is reported upwards.
#[derive(Debug)]
pub struct OutputInstance {
    id: InstanceId,
    node: NodeId,
    output: OutputId,
    pending: PendingDamage,
    children: Vec<InstanceId>,
}

impl OutputInstance {
    pub(crate) fn new(
        id: InstanceId,
        node: NodeId,
        output: OutputId,
        pending: PendingDamage,
        children: Vec<InstanceId>,
    ) -> Self {
        Self {
            id,
            node,
            output,
            pending,
            children,
        }
    }

    /// Output this subtree belongs to.
    #[must_use]
    pub fn output(&self) -> OutputId {
        self.output
    }

    /// Arena id of the instance.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }
}

impl RenderInstance for OutputInstance {
    fn collect_damage(&mut self, cx: &mut PassContext<'_>, acc: &mut Region) {
        let mut own = self.pending.take();
        let inner = collect_children(cx, &self.children);
        own.union_assign(&cx.graph.region_to_parent(self.node, &inner));
        if let Ok(data) = cx.graph.output_node(self.node) {
            if let Some(limit) = &data.limit_region {
                own.intersect_assign(limit);
            }
        }
        acc.union_assign(&own);
    }

    fn schedule_instructions(
        &mut self,
        cx: &mut PassContext<'_>,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        let Ok(data) = cx.graph.output_node(self.node) else {
            return;
        };
        let origin = data.origin;
        let Some(limit) = &data.limit_region else {
            schedule_children_at(cx, &self.children, instructions, target, damage, origin);
            return;
        };

        let mut ours = damage.intersect(limit);
        ours.intersect_geometry(target.geometry);
        if ours.is_empty() {
            return;
        }
        schedule_children_at(cx, &self.children, instructions, target, &mut ours, origin);

        // What the children left inside the limit replaces the damage there.
        damage.subtract_assign_region(limit);
        ours.intersect_assign(limit);
        damage.union_assign(&ours);
    }

    fn try_scanout(&mut self, cx: &mut PassContext<'_>, output: OutputId) -> DirectScanout {
        if output != self.output {
            return DirectScanout::Skip;
        }
        cx.try_scanout_children(&self.children, output)
    }

    fn name(&self) -> &'static str {
        "output"
    }
}
