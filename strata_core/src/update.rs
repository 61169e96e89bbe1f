// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications emitted by the scene graph.
//!
//! Two streams leave the graph:
//!
//! - **Updates** describe structural changes ([`UpdateFlags`]). They are
//!   delivered synchronously to root listeners as a [`RootUpdate`] and also
//!   batched in dirty channels for per-frame consumers.
//! - **Damage** describes pixels that changed ([`DamageEvent`]). It is queued
//!   and drained by the renderer once per frame.

use bitflags::bitflags;
use understory_dirty::Channel;

use crate::dirty;
use crate::node::NodeId;
use crate::region::Region;

bitflags! {
    /// What kind of structural change happened.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u32 {
        /// The child list of the node changed.
        const CHILDREN_LIST = 1 << 0;
        /// The node was enabled or disabled.
        const ENABLED = 1 << 1;
        /// Hit-testing results may have changed.
        const INPUT_STATE = 1 << 2;
    }
}

impl UpdateFlags {
    /// Adds the flags implied by `self`.
    ///
    /// Children-list and enablement changes always change input state too.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.intersects(Self::CHILDREN_LIST | Self::ENABLED) {
            self | Self::INPUT_STATE
        } else {
            self
        }
    }

    /// Dirty channels matching the set bits.
    pub(crate) fn channels(self) -> impl Iterator<Item = Channel> {
        [Self::CHILDREN_LIST, Self::ENABLED, Self::INPUT_STATE]
            .into_iter()
            .zip(dirty::ALL)
            .filter_map(move |(flag, channel)| self.contains(flag).then_some(channel))
    }
}

/// A structural change that reached the scene root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootUpdate {
    /// Normalized flags of the change.
    pub flags: UpdateFlags,
    /// The node the change was reported on.
    pub origin: NodeId,
}

/// Handle returned by [`SceneGraph::connect_update`](crate::node::SceneGraph::connect_update).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u32);

/// Pixels that changed on a node, in the node's content space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageEvent {
    /// Node the damage was reported on.
    pub node: NodeId,
    /// Damaged area in the node's content space.
    pub region: Region,
}
