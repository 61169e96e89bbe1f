// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect nodes.
//!
//! Effect nodes wrap a subtree and change how it is drawn. The graph only
//! stores which effect to apply; the effect itself is resolved by the
//! renderer through its effect registry.

use alloc::vec::Vec;
use core::fmt;

use crate::error::SceneError;
use crate::node::{NodeId, NodeKind, SceneGraph};

/// Identifies an effect implementation registered with the renderer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EffectId(pub u32);

impl fmt::Debug for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EffectId({})", self.0)
    }
}

/// Blurs whatever is behind the wrapped subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlurNode {
    /// Blur implementation to use.
    pub effect: EffectId,
}

impl SceneGraph {
    /// Replaces `node` in its parent's child list with a new blur node that
    /// has `node` as its only child.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Detached`] if `node` has no parent and
    /// [`SceneError::StructureMismatch`] if it is a structure node.
    pub fn wrap_in_blur(&mut self, node: NodeId, blur: BlurNode) -> Result<NodeId, SceneError> {
        let parent = self.parent(node).ok_or(SceneError::Detached(node))?;
        if self.is_structure(node) {
            return Err(SceneError::StructureMismatch);
        }

        let wrapper = self.create_blur(blur);
        let siblings: Vec<NodeId> = self
            .children(parent)
            .map(|c| if c == node { wrapper } else { c })
            .collect();
        self.remove_child(node);
        self.add_front(wrapper, node);
        self.set_children_list(parent, siblings)?;
        Ok(wrapper)
    }

    /// Undoes [`wrap_in_blur`](Self::wrap_in_blur): puts the blur node's
    /// first child back in its place and destroys the blur node.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotABlur`] for other kinds and
    /// [`SceneError::Detached`] if the blur node has no parent.
    pub fn unwrap_blur(&mut self, blur: NodeId) -> Result<Option<NodeId>, SceneError> {
        if !matches!(self.kind(blur), NodeKind::Blur(_)) {
            return Err(SceneError::NotABlur(blur));
        }
        let parent = self.parent(blur).ok_or(SceneError::Detached(blur))?;
        let inner = self.children(blur).next();

        let siblings: Vec<NodeId> = self
            .children(parent)
            .filter_map(|c| if c == blur { inner } else { Some(c) })
            .collect();
        self.remove_child(blur);
        self.set_children_unchecked(blur, Vec::new());
        self.set_children_list(parent, siblings)?;
        self.destroy_subtree(blur);
        Ok(inner)
    }
}
