// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Strata uses multi-channel dirty tracking (via [`understory_dirty`]) to
//! batch structural changes between frames. Each channel matches one
//! [`UpdateFlags`](crate::update::UpdateFlags) bit.
//!
//! # Propagation semantics
//!
//! Every attach adds a dependency edge from parent to child on all channels,
//! and [`SceneGraph::update`](crate::node::SceneGraph::update) marks with
//! [`EagerPolicy`](understory_dirty::EagerPolicy). Marking a node therefore
//! marks all of its ancestors up to the root, which is what a per-output
//! consumer needs: it looks for its own output node in the drained set.
//!
//! # Consumption
//!
//! Per-frame consumers call
//! [`SceneGraph::drain_updates`](crate::node::SceneGraph::drain_updates),
//! which drains the selected channels in deterministic order.

use understory_dirty::Channel;

/// A node's child list changed.
pub const CHILDREN_LIST: Channel = Channel::new(0);

/// A node's effective enablement flipped.
pub const ENABLED: Channel = Channel::new(1);

/// Something that affects hit testing changed.
pub const INPUT_STATE: Channel = Channel::new(2);

/// Every channel, in flag-bit order.
pub const ALL: [Channel; 3] = [CHILDREN_LIST, ENABLED, INPUT_STATE];
