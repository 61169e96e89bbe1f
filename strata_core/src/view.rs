// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Views and the client surfaces inside them.
//!
//! A view node is positioned by its [`geometry`](ViewNode::geometry) in its
//! parent's space (output-local for views under an output node). Its children
//! live in view-local space, where `(0, 0)` is the geometry origin. An active
//! [`ViewTransform`] maps view-local space through an affine before the
//! origin offset is applied.

use kurbo::Affine;

use crate::error::SceneError;
use crate::geometry::{Geometry, Offset};
use crate::node::{NodeId, SceneGraph, SurfaceId};
use crate::output::{BufferTransform, OutputId};
use crate::region::Region;
use crate::update::UpdateFlags;

/// What kind of window a view is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewRole {
    /// A regular application window.
    #[default]
    Toplevel,
    /// An override-redirect window.
    Unmanaged,
    /// A panel, dock or background owned by the desktop environment.
    DesktopEnvironment,
}

/// A 2D transform applied to a whole view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    /// Maps view-local coordinates before the geometry origin is added.
    pub affine: Affine,
    /// Opacity multiplier in `0.0..=1.0`.
    pub alpha: f32,
}

impl ViewTransform {
    /// A transform that only changes opacity.
    #[must_use]
    pub const fn alpha(alpha: f32) -> Self {
        Self {
            affine: Affine::IDENTITY,
            alpha,
        }
    }

    /// Returns `true` if axis-aligned rectangles stay axis-aligned.
    #[must_use]
    pub fn is_axis_aligned(&self) -> bool {
        let [_, b, c, _, _, _] = self.affine.as_coeffs();
        b == 0.0 && c == 0.0
    }
}

/// Per-view data.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewNode {
    /// Position and size in the parent's space.
    pub geometry: Geometry,
    /// Transform, if one is active.
    pub transform: Option<ViewTransform>,
    /// Shown on every workspace of its output.
    pub sticky: bool,
    /// Minimized views never receive input.
    pub minimized: bool,
    /// Whether the view may take input focus.
    pub focusable: bool,
    /// Whether the client has mapped the view.
    pub mapped: bool,
    /// Window role.
    pub role: ViewRole,
    /// Output the view is assigned to.
    pub output: Option<OutputId>,
}

impl ViewNode {
    /// A mapped, focusable toplevel view with no transform.
    #[must_use]
    pub const fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            transform: None,
            sticky: false,
            minimized: false,
            focusable: true,
            mapped: true,
            role: ViewRole::Toplevel,
            output: None,
        }
    }

    /// Returns `true` if a transform is active.
    #[inline]
    #[must_use]
    pub const fn has_transform(&self) -> bool {
        self.transform.is_some()
    }
}

/// Per-surface data: one client buffer inside a view.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceNode {
    /// Buffer handle understood by the GPU backend.
    pub surface: SurfaceId,
    /// Position in the parent's space (view-local).
    pub offset: Offset,
    /// Logical width.
    pub width: i32,
    /// Logical height.
    pub height: i32,
    /// Opaque area in surface-local coordinates.
    pub opaque: Region,
    /// Buffer pixels per logical unit.
    pub buffer_scale: i32,
    /// Transform of the buffer contents.
    pub buffer_transform: BufferTransform,
    /// Whether the surface has a buffer attached.
    pub mapped: bool,
}

impl SurfaceNode {
    /// A mapped, fully translucent surface at the parent's origin.
    #[must_use]
    pub const fn new(surface: SurfaceId, width: i32, height: i32) -> Self {
        Self {
            surface,
            offset: Offset::ZERO,
            width,
            height,
            opaque: Region::new(),
            buffer_scale: 1,
            buffer_transform: BufferTransform::Normal,
            mapped: true,
        }
    }

    /// Position and size in the parent's space.
    #[inline]
    #[must_use]
    pub const fn geometry(&self) -> Geometry {
        Geometry::new(self.offset.x, self.offset.y, self.width, self.height)
    }

    /// Marks the whole surface opaque.
    #[must_use]
    pub fn opaque(mut self) -> Self {
        self.opaque = Region::from(Geometry::new(0, 0, self.width, self.height));
        self
    }
}

impl SceneGraph {
    /// Returns the view data of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotAView`] for other kinds.
    pub fn view(&self, node: NodeId) -> Result<&ViewNode, SceneError> {
        self.kind(node).as_view().ok_or(SceneError::NotAView(node))
    }

    /// Returns the surface data of `node`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotASurface`] for other kinds.
    pub fn surface(&self, node: NodeId) -> Result<&SurfaceNode, SceneError> {
        self.kind(node)
            .as_surface()
            .ok_or(SceneError::NotASurface(node))
    }

    /// Applies `edit` to a view and damages its old and new bounding boxes on
    /// the parent.
    ///
    /// Input-relevant fields (geometry, transform, minimized, focusable)
    /// also produce an [`INPUT_STATE`](UpdateFlags::INPUT_STATE) update.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotAView`] for other kinds.
    pub fn edit_view(
        &mut self,
        node: NodeId,
        edit: impl FnOnce(&mut ViewNode),
    ) -> Result<(), SceneError> {
        self.validate(node);
        let before_box = self.bounding_box(node);
        let view = self.kind[node.idx as usize]
            .as_view_mut()
            .ok_or(SceneError::NotAView(node))?;
        let before = view.clone();
        edit(view);
        let input_changed = before.geometry != view.geometry
            || before.transform != view.transform
            || before.minimized != view.minimized
            || before.focusable != view.focusable;

        let after_box = self.bounding_box(node);
        if let Some(parent) = self.parent(node) {
            let mut damage = Region::from(before_box);
            damage.add_geometry(after_box);
            self.damage(parent, damage);
        }
        if input_changed {
            self.update(node, UpdateFlags::INPUT_STATE);
        }
        Ok(())
    }

    /// Applies `edit` to a surface and damages its old and new areas.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotASurface`] for other kinds.
    pub fn edit_surface(
        &mut self,
        node: NodeId,
        edit: impl FnOnce(&mut SurfaceNode),
    ) -> Result<(), SceneError> {
        self.validate(node);
        let before_box = self.bounding_box(node);
        let surface = self.kind[node.idx as usize]
            .as_surface_mut()
            .ok_or(SceneError::NotASurface(node))?;
        edit(surface);
        let after_box = self.bounding_box(node);
        if let Some(parent) = self.parent(node) {
            let mut damage = Region::from(before_box);
            damage.add_geometry(after_box);
            self.damage(parent, damage);
        }
        Ok(())
    }

    /// Reports new client content on a surface, in surface-local
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotASurface`] for other kinds.
    pub fn commit_surface(&mut self, node: NodeId, damage: Region) -> Result<(), SceneError> {
        let surface = self.surface(node)?;
        let bounds = Geometry::new(0, 0, surface.width, surface.height);
        self.damage(node, damage.clipped(bounds));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;

    #[test]
    fn axis_alignment() {
        assert!(ViewTransform::alpha(0.5).is_axis_aligned());
        let rot = ViewTransform {
            affine: Affine::rotate(0.3),
            alpha: 1.0,
        };
        assert!(!rot.is_axis_aligned());
    }

    #[test]
    fn moving_a_view_damages_both_positions() {
        let mut graph = SceneGraph::new();
        let layer = graph.layer(Layer::Workspace);
        let view = graph.create_view(ViewNode::new(Geometry::new(0, 0, 10, 10)));
        graph.add_back(layer, view);
        let _ = graph.take_damage();

        graph
            .edit_view(view, |v| v.geometry = Geometry::new(100, 0, 10, 10))
            .expect("view");
        let events = graph.take_damage();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].node, layer);
        assert_eq!(
            events[0].region,
            Region::from_geometries([Geometry::new(0, 0, 10, 10), Geometry::new(100, 0, 10, 10)])
        );
    }

    #[test]
    fn wrong_kind_is_an_error() {
        let mut graph = SceneGraph::new();
        let inner = graph.create_inner(false);
        assert_eq!(
            graph.edit_view(inner, |_| {}),
            Err(SceneError::NotAView(inner))
        );
        assert_eq!(
            graph.commit_surface(inner, Region::new()),
            Err(SceneError::NotASurface(inner))
        );
    }

    #[test]
    fn commit_is_clipped_to_surface() {
        let mut graph = SceneGraph::new();
        let s = graph.create_surface(SurfaceNode::new(SurfaceId(1), 20, 20));
        graph
            .commit_surface(s, Region::from(Geometry::new(10, 10, 50, 50)))
            .expect("surface");
        let events = graph.take_damage();
        assert_eq!(events[0].region, Region::from(Geometry::new(10, 10, 10, 10)));
    }
}
