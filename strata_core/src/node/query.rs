// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry queries, coordinate mapping and hit testing.

use kurbo::{Point, Vec2};

use super::id::{NodeId, SurfaceId};
use super::kind::NodeKind;
use super::store::SceneGraph;
use crate::geometry::{Geometry, Offset};
use crate::region::Region;
use crate::view::ViewNode;

/// Result of a hit test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputNode {
    /// The surface that was hit.
    pub node: NodeId,
    /// The point in the surface's local coordinates.
    pub local: Point,
}

impl SceneGraph {
    // -- Bounding boxes --

    /// Bounding box of the node in its parent's space.
    #[must_use]
    pub fn bounding_box(&self, node: NodeId) -> Geometry {
        self.validate(node);
        self.bbox_at(node.idx)
    }

    /// Union of the children's bounding boxes, in the node's content space.
    ///
    /// Empty child boxes do not contribute.
    #[must_use]
    pub fn content_bounding_box(&self, node: NodeId) -> Geometry {
        self.validate(node);
        self.content_bbox_at(node.idx)
    }

    fn content_bbox_at(&self, idx: u32) -> Geometry {
        self.children[idx as usize]
            .iter()
            .fold(Geometry::default(), |acc, &c| {
                acc.union_bounds(self.bbox_at(c))
            })
    }

    fn bbox_at(&self, idx: u32) -> Geometry {
        let content = self.content_bbox_at(idx);
        match &self.kind[idx as usize] {
            NodeKind::Root | NodeKind::Layer(_) | NodeKind::Inner | NodeKind::Blur(_) => content,
            NodeKind::Output(o) => translate_nonempty(content, o.origin),
            NodeKind::View(v) => {
                let local = Geometry::new(0, 0, v.geometry.width, v.geometry.height)
                    .union_bounds(content);
                view_to_parent(v, local)
            }
            NodeKind::Surface(s) => s
                .geometry()
                .union_bounds(translate_nonempty(content, s.offset)),
        }
    }

    // -- Coordinate mapping --

    /// Maps a point from the node's parent space into its content space.
    #[must_use]
    pub fn to_local(&self, node: NodeId, point: Point) -> Point {
        self.validate(node);
        match &self.kind[node.idx as usize] {
            NodeKind::Output(o) => point - offset_vec(o.origin),
            NodeKind::View(v) => {
                let p = point - offset_vec(v.geometry.origin());
                match v.transform {
                    Some(t) => t.affine.inverse() * p,
                    None => p,
                }
            }
            NodeKind::Surface(s) => point - offset_vec(s.offset),
            _ => point,
        }
    }

    /// Maps a point from the node's content space into its parent space.
    #[must_use]
    pub fn to_global(&self, node: NodeId, point: Point) -> Point {
        self.validate(node);
        match &self.kind[node.idx as usize] {
            NodeKind::Output(o) => point + offset_vec(o.origin),
            NodeKind::View(v) => {
                let p = match v.transform {
                    Some(t) => t.affine * point,
                    None => point,
                };
                p + offset_vec(v.geometry.origin())
            }
            NodeKind::Surface(s) => point + offset_vec(s.offset),
            _ => point,
        }
    }

    /// Offset from the node's content space to its parent space, if the
    /// mapping is a pure translation.
    ///
    /// Returns `None` for views with an active transform.
    #[must_use]
    pub fn content_offset(&self, node: NodeId) -> Option<Offset> {
        self.validate(node);
        match &self.kind[node.idx as usize] {
            NodeKind::Output(o) => Some(o.origin),
            NodeKind::View(v) => v.transform.is_none().then(|| v.geometry.origin()),
            NodeKind::Surface(s) => Some(s.offset),
            _ => Some(Offset::ZERO),
        }
    }

    /// Maps a region from the node's content space into its parent space.
    ///
    /// Under a non-translating view transform each rectangle is replaced by
    /// the outer bounds of its image.
    #[must_use]
    pub fn region_to_parent(&self, node: NodeId, region: &Region) -> Region {
        if let Some(offset) = self.content_offset(node) {
            return region.translated(offset);
        }
        match &self.kind[node.idx as usize] {
            NodeKind::View(v) => region.iter().map(|r| view_to_parent(v, r)).collect(),
            _ => region.clone(),
        }
    }

    // -- Capabilities --

    /// Area of the node, in its parent's space, that fully hides what is
    /// below it.
    #[must_use]
    pub fn opaque_region(&self, node: NodeId) -> Region {
        self.validate(node);
        self.opaque_at(node.idx)
    }

    fn opaque_at(&self, idx: u32) -> Region {
        match &self.kind[idx as usize] {
            NodeKind::Surface(s) => {
                if !s.mapped {
                    return Region::new();
                }
                let local = Geometry::new(0, 0, s.width, s.height);
                s.opaque.clipped(local).translated(s.offset)
            }
            NodeKind::View(v) => {
                let content = self.children_opaque(idx);
                match v.transform {
                    None => content.translated(v.geometry.origin()),
                    Some(t) if t.alpha >= 1.0 && t.is_axis_aligned() => content
                        .iter()
                        .map(|r| {
                            let image = t.affine.transform_rect_bbox(r.to_rect());
                            Geometry::from_rect_inner(image).translate(v.geometry.origin())
                        })
                        .collect(),
                    Some(_) => Region::new(),
                }
            }
            NodeKind::Output(o) => {
                let mut out = self.children_opaque(idx).translated(o.origin);
                if let Some(limit) = &o.limit_region {
                    out.intersect_assign(limit);
                }
                out
            }
            NodeKind::Root | NodeKind::Layer(_) | NodeKind::Inner | NodeKind::Blur(_) => {
                self.children_opaque(idx)
            }
        }
    }

    fn children_opaque(&self, idx: u32) -> Region {
        let mut out = Region::new();
        for &c in &self.children[idx as usize] {
            if self.enabled[c as usize] > 0 {
                out.union_assign(&self.opaque_at(c));
            }
        }
        out
    }

    /// Client buffer that shows exactly what the node would render, if any.
    ///
    /// Mapped surfaces return their own buffer. A view qualifies when it is
    /// mapped, untransformed and holds exactly one enabled surface at its
    /// origin.
    #[must_use]
    pub fn direct_texture(&self, node: NodeId) -> Option<SurfaceId> {
        self.validate(node);
        match &self.kind[node.idx as usize] {
            NodeKind::Surface(s) => s.mapped.then_some(s.surface),
            NodeKind::View(v) => {
                if !v.mapped || v.transform.is_some() {
                    return None;
                }
                let [only] = self.children[node.idx as usize][..] else {
                    return None;
                };
                if self.enabled[only as usize] <= 0 {
                    return None;
                }
                match &self.kind[only as usize] {
                    NodeKind::Surface(s) if s.mapped && s.offset == Offset::ZERO => {
                        Some(s.surface)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }

    // -- Hit testing --

    /// Finds the front-most surface under a point in global coordinates.
    ///
    /// Disabled subtrees are skipped. Views refuse input while minimized or
    /// unfocusable; output nodes refuse points outside their limit region.
    #[must_use]
    pub fn find_at(&self, point: Point) -> Option<InputNode> {
        self.find_at_node(self.root, point)
    }

    /// Like [`find_at`](Self::find_at), starting below `node` with `point`
    /// in the node's parent space.
    #[must_use]
    pub fn find_at_from(&self, node: NodeId, point: Point) -> Option<InputNode> {
        self.validate(node);
        self.find_at_node(node.idx, point)
    }

    fn find_at_node(&self, idx: u32, point: Point) -> Option<InputNode> {
        match &self.kind[idx as usize] {
            NodeKind::View(v) if v.minimized || !v.focusable => return None,
            NodeKind::Output(o) => {
                if let Some(limit) = &o.limit_region {
                    if !limit.contains_point(point) {
                        return None;
                    }
                }
            }
            _ => {}
        }

        let node = self.handle(idx);
        let local = self.to_local(node, point);
        for &c in &self.children[idx as usize] {
            if self.enabled[c as usize] <= 0 {
                continue;
            }
            if let Some(hit) = self.find_at_node(c, local) {
                return Some(hit);
            }
        }

        if let NodeKind::Surface(s) = &self.kind[idx as usize] {
            let own = Geometry::new(0, 0, s.width, s.height);
            if s.mapped && own.contains_point(local) {
                return Some(InputNode { node, local });
            }
        }
        None
    }
}

fn offset_vec(o: Offset) -> Vec2 {
    Vec2::new(f64::from(o.x), f64::from(o.y))
}

fn translate_nonempty(g: Geometry, offset: Offset) -> Geometry {
    if g.is_empty() { g } else { g.translate(offset) }
}

/// Maps a view-local rectangle into the view's parent space.
fn view_to_parent(v: &ViewNode, local: Geometry) -> Geometry {
    if local.is_empty() {
        return local;
    }
    let mapped = match v.transform {
        Some(t) => Geometry::from_rect_outer(t.affine.transform_rect_bbox(local.to_rect())),
        None => local,
    };
    mapped.translate(v.geometry.origin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use crate::output::OutputDesc;
    use crate::view::{SurfaceNode, ViewTransform};
    use kurbo::Affine;

    fn scene_with_view(
        layout: Geometry,
        view_geometry: Geometry,
    ) -> (SceneGraph, NodeId, NodeId, NodeId) {
        let mut graph = SceneGraph::new();
        let out = graph.add_output(OutputDesc::new("DP-1", layout));
        let ws = graph
            .output_layer_node(out, Layer::Workspace)
            .expect("registered");
        let view = graph.create_view(ViewNode::new(view_geometry));
        let surface = graph.create_surface(SurfaceNode::new(
            SurfaceId(7),
            view_geometry.width,
            view_geometry.height,
        ));
        graph.add_back(view, surface);
        graph.add_back(ws, view);
        (graph, ws, view, surface)
    }

    #[test]
    fn bounding_box_of_empty_inner_is_empty() {
        let mut graph = SceneGraph::new();
        let n = graph.create_inner(false);
        assert!(graph.bounding_box(n).is_empty());
    }

    #[test]
    fn view_box_is_positioned_by_geometry() {
        let (graph, ws, view, surface) =
            scene_with_view(Geometry::new(100, 0, 800, 600), Geometry::new(10, 20, 30, 40));
        assert_eq!(graph.bounding_box(surface), Geometry::new(0, 0, 30, 40));
        assert_eq!(graph.bounding_box(view), Geometry::new(10, 20, 30, 40));
        // The output node adds its layout origin.
        assert_eq!(graph.bounding_box(ws), Geometry::new(110, 20, 30, 40));
    }

    #[test]
    fn transformed_view_box_covers_image() {
        let (mut graph, _, view, _) =
            scene_with_view(Geometry::new(0, 0, 800, 600), Geometry::new(10, 10, 100, 50));
        graph
            .edit_view(view, |v| {
                v.transform = Some(ViewTransform {
                    affine: Affine::scale(2.0),
                    alpha: 1.0,
                });
            })
            .expect("view");
        assert_eq!(graph.bounding_box(view), Geometry::new(10, 10, 200, 100));
        let local = graph.to_local(view, Point::new(110.0, 60.0));
        assert_eq!(local, Point::new(50.0, 25.0));
    }

    #[test]
    fn hit_test_returns_surface_local_point() {
        let (graph, _, _, surface) =
            scene_with_view(Geometry::new(100, 0, 800, 600), Geometry::new(10, 20, 30, 40));
        let hit = graph.find_at(Point::new(115.0, 25.0)).expect("hit");
        assert_eq!(hit.node, surface);
        assert_eq!(hit.local, Point::new(5.0, 5.0));
        assert!(graph.find_at(Point::new(5.0, 25.0)).is_none());
    }

    #[test]
    fn hit_test_skips_disabled_and_minimized() {
        let (mut graph, _, view, surface) =
            scene_with_view(Geometry::new(0, 0, 800, 600), Geometry::new(0, 0, 100, 100));
        let p = Point::new(50.0, 50.0);
        assert_eq!(graph.find_at(p).map(|h| h.node), Some(surface));

        graph.set_enabled(surface, false);
        assert!(graph.find_at(p).is_none());
        graph.set_enabled(surface, true);

        graph.edit_view(view, |v| v.minimized = true).expect("view");
        assert!(graph.find_at(p).is_none());
    }

    #[test]
    fn hit_test_respects_limit_region() {
        let (mut graph, _, _, surface) =
            scene_with_view(Geometry::new(0, 0, 800, 600), Geometry::new(0, 0, 100, 100));
        let out = graph.outputs().next().expect("one output");
        graph
            .set_output_limit_region(out, Some(Region::from(Geometry::new(0, 0, 10, 10))))
            .expect("registered");
        assert_eq!(graph.find_at(Point::new(5.0, 5.0)).map(|h| h.node), Some(surface));
        assert!(graph.find_at(Point::new(50.0, 50.0)).is_none());
    }

    #[test]
    fn front_most_child_wins() {
        let mut graph = SceneGraph::new();
        let layer = graph.layer(Layer::Workspace);
        let back = graph.create_surface(SurfaceNode::new(SurfaceId(1), 100, 100));
        let front = graph.create_surface(SurfaceNode::new(SurfaceId(2), 100, 100));
        graph.add_back(layer, back);
        graph.add_front(layer, front);
        let hit = graph.find_at(Point::new(1.0, 1.0)).expect("hit");
        assert_eq!(hit.node, front);
    }

    #[test]
    fn opaque_region_follows_view_and_alpha() {
        let (mut graph, _, view, surface) =
            scene_with_view(Geometry::new(0, 0, 800, 600), Geometry::new(10, 10, 100, 100));
        assert!(graph.opaque_region(view).is_empty());
        graph
            .edit_surface(surface, |s| *s = s.clone().opaque())
            .expect("surface");
        assert_eq!(
            graph.opaque_region(view),
            Region::from(Geometry::new(10, 10, 100, 100))
        );
        graph
            .edit_view(view, |v| v.transform = Some(ViewTransform::alpha(0.5)))
            .expect("view");
        assert!(graph.opaque_region(view).is_empty());
    }

    #[test]
    fn direct_texture_needs_single_untransformed_surface() {
        let (mut graph, _, view, _) =
            scene_with_view(Geometry::new(0, 0, 800, 600), Geometry::new(0, 0, 100, 100));
        assert_eq!(graph.direct_texture(view), Some(SurfaceId(7)));

        graph
            .edit_view(view, |v| v.transform = Some(ViewTransform::alpha(0.9)))
            .expect("view");
        assert_eq!(graph.direct_texture(view), None);
        graph.edit_view(view, |v| v.transform = None).expect("view");

        let popup = graph.create_surface(SurfaceNode::new(SurfaceId(8), 10, 10));
        graph.add_front(view, popup);
        assert_eq!(graph.direct_texture(view), None);
    }

    #[test]
    fn region_to_parent_translates_outputs() {
        let (graph, ws, _, _) =
            scene_with_view(Geometry::new(100, 50, 800, 600), Geometry::new(0, 0, 10, 10));
        let r = Region::from(Geometry::new(0, 0, 5, 5));
        assert_eq!(
            graph.region_to_parent(ws, &r),
            Region::from(Geometry::new(100, 50, 5, 5))
        );
    }
}
