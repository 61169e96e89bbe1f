// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable scene dumps.
//!
//! One line per node, children indented below their parent in front-to-back
//! order:
//!
//! ```text
//! root
//! |-layer_dwidget
//! | |-output DP-1 @(0,0)
//! ...
//! |-layer_workspace
//! | |-output DP-1 @(0,0)
//! | | |-view (10,10 640x480)
//! | | | |-surface SurfaceId(1) (0,0 640x480)
//! ```

use core::fmt::{self, Write};

use crate::node::{NodeId, NodeKind, SceneGraph};

/// Writes the whole scene below the root.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn dump_scene(graph: &SceneGraph, out: &mut impl Write) -> fmt::Result {
    dump_subtree(graph, graph.root(), out)
}

/// Writes `node` and everything below it.
///
/// # Errors
///
/// Propagates errors from `out`.
pub fn dump_subtree(graph: &SceneGraph, node: NodeId, out: &mut impl Write) -> fmt::Result {
    dump_node(graph, node, 0, out)
}

fn dump_node(graph: &SceneGraph, node: NodeId, depth: usize, out: &mut impl Write) -> fmt::Result {
    if depth > 0 {
        for _ in 1..depth {
            out.write_str("| ")?;
        }
        out.write_str("|-")?;
    }
    describe(graph, node, out)?;
    if !graph.is_enabled(node) {
        out.write_str(" [disabled]")?;
    }
    out.write_char('\n')?;
    for child in graph.children(node) {
        dump_node(graph, child, depth + 1, out)?;
    }
    Ok(())
}

fn describe(graph: &SceneGraph, node: NodeId, out: &mut impl Write) -> fmt::Result {
    match graph.kind(node) {
        NodeKind::Root => out.write_str("root"),
        NodeKind::Layer(layer) => write!(out, "layer_{}", layer.name()),
        NodeKind::Inner => {
            if graph.is_structure(node) {
                out.write_str("inner (structure)")
            } else {
                out.write_str("inner")
            }
        }
        NodeKind::Output(o) => {
            let name = graph.output(o.output).map_or("?", |d| d.name.as_str());
            write!(out, "output {name} @({},{})", o.origin.x, o.origin.y)
        }
        NodeKind::View(v) => {
            write!(out, "view {:?}", v.geometry)?;
            if v.transform.is_some() {
                out.write_str(" transformed")?;
            }
            if v.sticky {
                out.write_str(" sticky")?;
            }
            if v.minimized {
                out.write_str(" minimized")?;
            }
            Ok(())
        }
        NodeKind::Surface(s) => {
            write!(out, "surface {:?} {:?}", s.surface, s.geometry())?;
            if !s.mapped {
                out.write_str(" unmapped")?;
            }
            Ok(())
        }
        NodeKind::Blur(b) => write!(out, "blur {:?}", b.effect),
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use super::*;
    use crate::geometry::Geometry;
    use crate::layer::Layer;
    use crate::node::SurfaceId;
    use crate::output::OutputDesc;
    use crate::view::{SurfaceNode, ViewNode};

    #[test]
    fn layers_are_listed_front_to_back() {
        let graph = SceneGraph::new();
        let mut s = String::new();
        dump_scene(&graph, &mut s).expect("string writes cannot fail");
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(
            lines,
            [
                "root",
                "|-layer_dwidget",
                "|-layer_overlay",
                "|-layer_unmanaged",
                "|-layer_top",
                "|-layer_workspace",
                "|-layer_bottom",
                "|-layer_background",
            ]
        );
    }

    #[test]
    fn nested_nodes_are_indented() {
        let mut graph = SceneGraph::new();
        let out = graph.add_output(OutputDesc::new("DP-1", Geometry::new(0, 0, 800, 600)));
        let ws = graph
            .output_layer_node(out, Layer::Workspace)
            .expect("registered");
        let view = graph.create_view(ViewNode::new(Geometry::new(10, 10, 64, 48)));
        let surface = graph.create_surface(SurfaceNode::new(SurfaceId(1), 64, 48));
        graph.add_back(view, surface);
        graph.add_back(ws, view);
        graph.set_enabled(surface, false);

        let mut s = String::new();
        dump_subtree(&graph, ws, &mut s).expect("string writes cannot fail");
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(
            lines,
            [
                "output DP-1 @(0,0)",
                "|-view (10,10 64x48)",
                "| |-surface SurfaceId(1) (0,0 64x48) [disabled]",
            ]
        );
    }
}
