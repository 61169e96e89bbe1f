// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recoverable scene-graph errors.
//!
//! Invariant violations (stale handles, double parenting, destroying an
//! attached node) panic instead; see the `# Panics` sections of
//! [`SceneGraph`](crate::node::SceneGraph).

use crate::node::NodeId;
use crate::output::OutputId;

/// Errors returned by scene-graph operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// A new child list reorders, drops or adds structure nodes.
    #[error("child list does not preserve the order of structure nodes")]
    StructureMismatch,
    /// The operation needs the node to be attached.
    #[error("node {0:?} has no parent")]
    Detached(NodeId),
    /// No output with this id is registered.
    #[error("unknown output {0:?}")]
    UnknownOutput(OutputId),
    /// The node is not an output node.
    #[error("node {0:?} is not an output node")]
    NotAnOutput(NodeId),
    /// The node is not a view node.
    #[error("node {0:?} is not a view node")]
    NotAView(NodeId),
    /// The node is not a surface node.
    #[error("node {0:?} is not a surface node")]
    NotASurface(NodeId),
    /// The node is not a blur node.
    #[error("node {0:?} is not a blur node")]
    NotABlur(NodeId),
}
