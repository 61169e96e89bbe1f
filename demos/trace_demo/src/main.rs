// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renders a small desktop with the software backend and traces every frame.
//!
//! The scene has a wallpaper, a panel and a translucent terminal behind a
//! blur. Over a dozen frames the terminal's cursor blinks, the terminal
//! moves, and finally a fullscreen video covers the output and is scanned
//! out. Events go to a
//! [`PrettyPrintSink`](strata_debug::pretty::PrettyPrintSink) on stdout and a
//! [`SummaryLog`](strata_debug::summary::SummaryLog); the summaries and the
//! final scene are written as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};

use strata_backend_soft::{Pixmap, SoftBackend, SoftBackendConfig, argb, pack};
use strata_core::effect::BlurNode;
use strata_core::geometry::Geometry;
use strata_core::layer::Layer;
use strata_core::node::{NodeId, SceneGraph, SurfaceId};
use strata_core::output::{OutputDesc, OutputId};
use strata_core::region::Region;
use strata_core::trace::{
    DamageRect, FrameSummary, PhaseBeginEvent, PhaseEndEvent, RegenerateEvent,
    RenderPassBeginEvent, ScanoutEvent, TraceSink, Tracer,
};
use strata_core::view::{SurfaceNode, ViewNode};
use strata_render::{BoxBlur, Color, EffectRegistry, FrameResult, GpuBackend, RenderConfig, Renderer};

use strata_debug::pretty::PrettyPrintSink;
use strata_debug::summary::SummaryLog;

const WIDTH: i32 = 320;
const HEIGHT: i32 = 200;
const FRAME_COUNT: u32 = 12;

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_render_pass_begin(&mut self, e: &RenderPassBeginEvent) {
        self.a.on_render_pass_begin(e);
        self.b.on_render_pass_begin(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.a.on_phase_begin(e);
        self.b.on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.a.on_phase_end(e);
        self.b.on_phase_end(e);
    }

    fn on_regenerate(&mut self, e: &RegenerateEvent) {
        self.a.on_regenerate(e);
        self.b.on_regenerate(e);
    }

    fn on_scanout(&mut self, e: &ScanoutEvent) {
        self.a.on_scanout(e);
        self.b.on_scanout(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.a.on_frame_summary(s);
        self.b.on_frame_summary(s);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.a.on_damage_rects(frame_index, rects);
        self.b.on_damage_rects(frame_index, rects);
    }
}

/// Adds a view with a single surface and uploads its pixels.
fn add_window(
    graph: &mut SceneGraph,
    backend: &mut SoftBackend,
    output: OutputId,
    layer: Layer,
    geometry: Geometry,
    surface: SurfaceId,
    pixels: Pixmap,
    opaque: bool,
) -> (NodeId, NodeId) {
    let mut node = SurfaceNode::new(surface, pixels.width(), pixels.height());
    if opaque {
        node = node.opaque();
    }
    backend.upload_surface(surface, pixels);
    let parent = graph
        .output_layer_node(output, layer)
        .expect("every output has all layers");
    let view = graph.create_view(ViewNode::new(geometry));
    let surface = graph.create_surface(node);
    graph.add_back(view, surface);
    graph.add_front(parent, view);
    (view, surface)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "gradient coordinates are bounded by the output size"
)]
fn wallpaper() -> Pixmap {
    Pixmap::from_fn(WIDTH, HEIGHT, |x, y| {
        let r = (x * 255 / WIDTH) as u8;
        let b = (y * 255 / HEIGHT) as u8;
        argb(255, r, 64, b)
    })
}

fn main() {
    // -- scene -------------------------------------------------------------
    let mut graph = SceneGraph::new();
    let output = graph.add_output(OutputDesc::new("SOFT-1", Geometry::new(0, 0, WIDTH, HEIGHT)));
    let mut backend = SoftBackend::new(SoftBackendConfig::DEFAULT);
    let mut effects = EffectRegistry::new();
    let frosted = effects.register(BoxBlur {
        radius: 3,
        passes: 2,
    });

    add_window(
        &mut graph,
        &mut backend,
        output,
        Layer::Background,
        Geometry::new(0, 0, WIDTH, HEIGHT),
        SurfaceId(1),
        wallpaper(),
        true,
    );
    add_window(
        &mut graph,
        &mut backend,
        output,
        Layer::Top,
        Geometry::new(0, 0, WIDTH, 16),
        SurfaceId(2),
        Pixmap::filled(WIDTH, 16, pack(Color::rgba(0.1, 0.1, 0.1, 1.0))),
        true,
    );
    let (terminal, terminal_surface) = add_window(
        &mut graph,
        &mut backend,
        output,
        Layer::Workspace,
        Geometry::new(40, 40, 160, 100),
        SurfaceId(3),
        Pixmap::filled(160, 100, pack(Color::rgba(0.0, 0.0, 0.0, 0.6))),
        false,
    );
    graph
        .wrap_in_blur(terminal, BlurNode { effect: frosted })
        .expect("terminal is attached");

    // -- renderer ----------------------------------------------------------
    let mut renderer = Renderer::new(RenderConfig::DEFAULT);
    renderer.add_output(output);
    let framebuffer = backend
        .create_buffer(WIDTH, HEIGHT)
        .expect("room for the framebuffer");

    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut log = SummaryLog::new();

    // -- frames ------------------------------------------------------------
    for frame in 0..FRAME_COUNT {
        match frame {
            // Cursor blink in the terminal's top-left cell.
            1..=4 => graph
                .commit_surface(terminal_surface, Region::from(Geometry::new(4, 4, 6, 10)))
                .expect("terminal surface is a surface"),
            // Drag the terminal to the right.
            6 => graph
                .edit_view(terminal, |v| v.geometry.x += 30)
                .expect("terminal is a view"),
            // A fullscreen video appears above everything.
            9 => {
                add_window(
                    &mut graph,
                    &mut backend,
                    output,
                    Layer::Overlay,
                    Geometry::new(0, 0, WIDTH, HEIGHT),
                    SurfaceId(4),
                    Pixmap::filled(WIDTH, HEIGHT, pack(Color::BLACK)),
                    true,
                );
            }
            _ => {}
        }

        let mut tee = Tee {
            a: &mut pretty,
            b: &mut log,
        };
        let result = renderer
            .render_output(
                &mut graph,
                &mut backend,
                &effects,
                output,
                framebuffer,
                &mut Tracer::new(&mut tee),
            )
            .expect("output is registered");
        match result {
            FrameResult::Idle => println!("frame {frame}: idle"),
            FrameResult::ScannedOut => println!("frame {frame}: scanned out"),
            FrameResult::Rendered {
                damage,
                instructions,
            } => println!(
                "frame {frame}: repainted {}px² with {instructions} instructions",
                damage.area()
            ),
        }
    }

    let totals = log.totals();
    println!(
        "{} frames, {} composed, {} scanned out, {} regenerations, {} buffers alive",
        totals.frames,
        totals.composed,
        totals.scanouts,
        totals.regenerations,
        backend.live_buffers(),
    );

    // -- export ------------------------------------------------------------
    let path = "frames.json";
    let file = File::create(path).expect("failed to create frames.json");
    write_summaries(BufWriter::new(file), &log);
    println!("Wrote {path}");

    let path = "scene.json";
    let file = File::create(path).expect("failed to create scene.json");
    strata_debug::scene::write_scene(&graph, &mut BufWriter::new(file))
        .expect("failed to write scene");
    println!("Wrote {path}");
}

fn write_summaries(mut writer: impl Write, log: &SummaryLog) {
    writeln!(writer, "{:#}", log.to_json()).expect("failed to write frame summaries");
}
