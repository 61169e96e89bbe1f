// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fixed layers below the scene root.

use crate::node::{NodeId, NodeKind, SceneGraph};

/// One of the fixed stacking layers, listed back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Wallpapers.
    Background,
    /// Desktop panels drawn below windows.
    Bottom,
    /// Regular windows.
    Workspace,
    /// Panels drawn above windows.
    Top,
    /// Override-redirect windows.
    Unmanaged,
    /// Lock screens and other full-screen overlays.
    Overlay,
    /// Desktop widgets, above everything.
    DesktopWidget,
}

impl Layer {
    /// Number of layers.
    pub const COUNT: usize = 7;

    /// Every layer, back to front.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Background,
        Self::Bottom,
        Self::Workspace,
        Self::Top,
        Self::Unmanaged,
        Self::Overlay,
        Self::DesktopWidget,
    ];

    /// Position in back-to-front order.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used in scene dumps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Bottom => "bottom",
            Self::Workspace => "workspace",
            Self::Top => "top",
            Self::Unmanaged => "unmanaged",
            Self::Overlay => "overlay",
            Self::DesktopWidget => "dwidget",
        }
    }
}

impl SceneGraph {
    /// Returns the node of a layer.
    #[must_use]
    pub fn layer(&self, layer: Layer) -> NodeId {
        self.handle(self.layers[layer.index()])
    }

    /// Returns which layer `node` is, if it is a layer node.
    #[must_use]
    pub fn layer_of(&self, node: NodeId) -> Option<Layer> {
        self.validate(node);
        match self.kind[node.idx as usize] {
            NodeKind::Layer(layer) => Some(layer),
            _ => None,
        }
    }
}
