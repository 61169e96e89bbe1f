// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use strata_core::node::NodeId;
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;

use crate::damage::PendingDamage;
use crate::instance::{InstanceId, PassContext, RenderInstance, RenderInstruction};
use crate::target::RenderTarget;

/// Instance of a node that draws nothing itself: the root, layers and plain
/// inner nodes.
///
/// Forwards every phase to its children unchanged. Rendering it directly is
/// an invariant violation.
#[derive(Debug)]
pub struct ContainerInstance {
    node: NodeId,
    pending: PendingDamage,
    children: Vec<InstanceId>,
}

impl ContainerInstance {
    pub(crate) fn new(node: NodeId, pending: PendingDamage, children: Vec<InstanceId>) -> Self {
        Self {
            node,
            pending,
            children,
        }
    }

    /// Node this instance was generated from.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl RenderInstance for ContainerInstance {
    fn collect_damage(&mut self, cx: &mut PassContext<'_>, acc: &mut Region) {
        acc.union_assign(&self.pending.take());
        for &child in &self.children {
            cx.collect(child, acc);
        }
    }

    fn schedule_instructions(
        &mut self,
        cx: &mut PassContext<'_>,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        for &child in &self.children {
            cx.schedule(child, instructions, target, damage);
        }
    }

    fn try_scanout(&mut self, cx: &mut PassContext<'_>, output: OutputId) -> DirectScanout {
        cx.try_scanout_children(&self.children, output)
    }

    fn name(&self) -> &'static str {
        "container"
    }
}
