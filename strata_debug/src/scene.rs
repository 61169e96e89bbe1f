// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON export of a scene graph.
//!
//! [`scene_to_json`] produces a tree of node objects mirroring the graph,
//! children front to back, together with the list of outputs. Geometry is
//! written as `[x, y, width, height]`. The format is meant for inspection
//! tools and bug reports; nothing reads it back.

use std::io::{self, Write};

use serde_json::{Map, Value, json};

use strata_core::geometry::Geometry;
use strata_core::node::{NodeId, NodeKind, SceneGraph};
use strata_core::region::Region;

fn geometry(g: Geometry) -> Value {
    json!([g.x, g.y, g.width, g.height])
}

fn region(r: &Region) -> Value {
    Value::Array(r.iter().map(geometry).collect())
}

/// Describes the whole scene.
#[must_use]
pub fn scene_to_json(graph: &SceneGraph) -> Value {
    let outputs: Vec<Value> = graph
        .outputs()
        .filter_map(|id| {
            let desc = graph.output(id)?;
            Some(json!({
                "id": id.0,
                "name": desc.name,
                "layout": geometry(desc.layout),
                "scale": desc.scale,
                "transform": format!("{:?}", desc.transform),
            }))
        })
        .collect();
    json!({
        "outputs": outputs,
        "root": node_to_json(graph, graph.root()),
    })
}

/// Describes `node` and everything below it.
#[must_use]
pub fn node_to_json(graph: &SceneGraph, node: NodeId) -> Value {
    let mut obj = Map::new();
    let kind = graph.kind(node);
    obj.insert("id".into(), json!([node.index(), node.generation()]));
    obj.insert("kind".into(), json!(kind.name()));
    obj.insert("enabled".into(), json!(graph.is_enabled(node)));
    if graph.is_structure(node) {
        obj.insert("structure".into(), json!(true));
    }

    match kind {
        NodeKind::Root | NodeKind::Inner => {}
        NodeKind::Layer(layer) => {
            obj.insert("layer".into(), json!(layer.name()));
        }
        NodeKind::Output(o) => {
            obj.insert("output".into(), json!(o.output.0));
            obj.insert("origin".into(), json!([o.origin.x, o.origin.y]));
            if let Some(limit) = &o.limit_region {
                obj.insert("limit".into(), region(limit));
            }
        }
        NodeKind::View(v) => {
            obj.insert("geometry".into(), geometry(v.geometry));
            obj.insert("role".into(), json!(format!("{:?}", v.role)));
            obj.insert("mapped".into(), json!(v.mapped));
            obj.insert("sticky".into(), json!(v.sticky));
            obj.insert("minimized".into(), json!(v.minimized));
            if let Some(t) = v.transform {
                obj.insert(
                    "transform".into(),
                    json!({ "affine": t.affine.as_coeffs(), "alpha": t.alpha }),
                );
            }
            if let Some(output) = v.output {
                obj.insert("assigned_output".into(), json!(output.0));
            }
        }
        NodeKind::Surface(s) => {
            obj.insert("surface".into(), json!(s.surface.0));
            obj.insert("geometry".into(), geometry(s.geometry()));
            obj.insert("mapped".into(), json!(s.mapped));
            obj.insert("buffer_scale".into(), json!(s.buffer_scale));
            if !s.opaque.is_empty() {
                obj.insert("opaque".into(), region(&s.opaque));
            }
        }
        NodeKind::Blur(b) => {
            obj.insert("effect".into(), json!(b.effect.0));
        }
    }

    obj.insert("bounding_box".into(), geometry(graph.bounding_box(node)));
    let children: Vec<Value> = graph
        .children(node)
        .map(|child| node_to_json(graph, child))
        .collect();
    if !children.is_empty() {
        obj.insert("children".into(), Value::Array(children));
    }
    Value::Object(obj)
}

/// Writes [`scene_to_json`] as indented JSON.
///
/// # Errors
///
/// Propagates errors from `writer`.
pub fn write_scene(graph: &SceneGraph, writer: &mut dyn Write) -> io::Result<()> {
    serde_json::to_writer_pretty(writer, &scene_to_json(graph))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::effect::BlurNode;
    use strata_core::effect::EffectId;
    use strata_core::layer::Layer;
    use strata_core::node::SurfaceId;
    use strata_core::output::OutputDesc;
    use strata_core::view::{SurfaceNode, ViewNode};

    #[test]
    fn layers_appear_front_to_back() {
        let graph = SceneGraph::new();
        let v = scene_to_json(&graph);
        let layers: Vec<&str> = v["root"]["children"]
            .as_array()
            .expect("root has layer children")
            .iter()
            .map(|l| l["layer"].as_str().expect("layers carry a name"))
            .collect();
        assert_eq!(
            layers,
            ["dwidget", "overlay", "unmanaged", "top", "workspace", "bottom", "background"]
        );
        assert_eq!(v["outputs"], json!([]));
    }

    #[test]
    fn views_surfaces_and_blurs_are_described() {
        let mut graph = SceneGraph::new();
        let out = graph.add_output(OutputDesc::new("DP-1", Geometry::new(0, 0, 800, 600)));
        let ws = graph
            .output_layer_node(out, Layer::Workspace)
            .expect("output has a workspace node");
        let view = graph.create_view(ViewNode::new(Geometry::new(10, 20, 30, 40)));
        let surface = graph.create_surface(SurfaceNode::new(SurfaceId(9), 30, 40).opaque());
        graph.add_back(view, surface);
        graph.add_front(ws, view);
        let blur = graph
            .wrap_in_blur(view, BlurNode { effect: EffectId(2) })
            .expect("view is attached");

        let b = node_to_json(&graph, blur);
        assert_eq!(b["kind"], "blur");
        assert_eq!(b["effect"], 2);
        let v = &b["children"][0];
        assert_eq!(v["kind"], "view");
        assert_eq!(v["geometry"], json!([10, 20, 30, 40]));
        assert_eq!(v["mapped"], true);
        let s = &v["children"][0];
        assert_eq!(s["surface"], 9);
        assert_eq!(s["opaque"], json!([[0, 0, 30, 40]]));
        assert!(s.get("children").is_none());

        let scene = scene_to_json(&graph);
        assert_eq!(scene["outputs"][0]["name"], "DP-1");
        assert_eq!(scene["outputs"][0]["layout"], json!([0, 0, 800, 600]));
    }

    #[test]
    fn written_scene_parses_back() {
        let graph = SceneGraph::new();
        let mut out = Vec::new();
        write_scene(&graph, &mut out).expect("writing to a Vec cannot fail");
        let parsed: Value = serde_json::from_slice(&out).expect("output is valid JSON");
        assert_eq!(parsed, scene_to_json(&graph));
    }
}
