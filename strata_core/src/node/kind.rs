// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-kind node data.

use crate::effect::BlurNode;
use crate::layer::Layer;
use crate::output::OutputNode;
use crate::view::{SurfaceNode, ViewNode};

/// What a node is, together with the data specific to that kind.
///
/// The graph dispatches bounding boxes, coordinate mapping, hit testing and
/// render-instance generation on this tag. Use the `as_*` accessors instead
/// of matching when only one kind is of interest.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// The scene root. Exactly one per graph.
    Root,
    /// One of the fixed layers directly below the root.
    Layer(Layer),
    /// A plain grouping node.
    Inner,
    /// The subtree of one output within one layer.
    Output(OutputNode),
    /// A toplevel, popup or desktop-environment window.
    View(ViewNode),
    /// A client buffer.
    Surface(SurfaceNode),
    /// A blur effect applied to the subtree.
    Blur(BlurNode),
}

impl NodeKind {
    /// Short lowercase name used in scene dumps and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Layer(_) => "layer",
            Self::Inner => "inner",
            Self::Output(_) => "output",
            Self::View(_) => "view",
            Self::Surface(_) => "surface",
            Self::Blur(_) => "blur",
        }
    }

    /// Returns the layer tag, if this is a layer node.
    #[inline]
    #[must_use]
    pub const fn as_layer(&self) -> Option<Layer> {
        match self {
            Self::Layer(layer) => Some(*layer),
            _ => None,
        }
    }

    /// Returns the output data, if this is an output node.
    #[inline]
    #[must_use]
    pub const fn as_output(&self) -> Option<&OutputNode> {
        match self {
            Self::Output(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the view data, if this is a view node.
    #[inline]
    #[must_use]
    pub const fn as_view(&self) -> Option<&ViewNode> {
        match self {
            Self::View(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the surface data, if this is a surface node.
    #[inline]
    #[must_use]
    pub const fn as_surface(&self) -> Option<&SurfaceNode> {
        match self {
            Self::Surface(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the blur data, if this is a blur node.
    #[inline]
    #[must_use]
    pub const fn as_blur(&self) -> Option<&BlurNode> {
        match self {
            Self::Blur(b) => Some(b),
            _ => None,
        }
    }

    pub(crate) fn as_output_mut(&mut self) -> Option<&mut OutputNode> {
        match self {
            Self::Output(o) => Some(o),
            _ => None,
        }
    }

    pub(crate) fn as_view_mut(&mut self) -> Option<&mut ViewNode> {
        match self {
            Self::View(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_surface_mut(&mut self) -> Option<&mut SurfaceNode> {
        match self {
            Self::Surface(s) => Some(s),
            _ => None,
        }
    }
}
