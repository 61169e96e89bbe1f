// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole frames rendered through [`Renderer`] into real pixels.

use strata_core::effect::BlurNode;
use strata_core::geometry::{Geometry, Offset};
use strata_core::layer::Layer;
use strata_core::node::{NodeId, SceneGraph, SurfaceId};
use strata_core::output::{OutputDesc, OutputId};
use strata_core::region::Region;
use strata_core::trace::Tracer;
use strata_core::view::{SurfaceNode, ViewNode, ViewTransform};
use strata_render::{
    BoxBlur, BufferId, Color, EffectRegistry, FrameResult, GpuBackend, RenderConfig, Renderer,
};

use crate::{Pixmap, SoftBackend, SoftBackendConfig, channels, pack};

const WHITE: u32 = 0xFFFF_FFFF;
const BLACK: u32 = 0xFF00_0000;
const RED: u32 = 0xFFFF_0000;

fn composing() -> RenderConfig {
    RenderConfig {
        direct_scanout: false,
        expand_damage_for_effects: false,
        ..RenderConfig::DEFAULT
    }
}

/// One output, a renderer and a framebuffer the size of the output.
struct Desk {
    graph: SceneGraph,
    output: OutputId,
    renderer: Renderer,
    backend: SoftBackend,
    effects: EffectRegistry,
    fb: BufferId,
}

impl Desk {
    fn new(layout: Geometry, config: RenderConfig) -> Self {
        Self::with_backend(layout, config, SoftBackend::default())
    }

    fn with_backend(layout: Geometry, config: RenderConfig, mut backend: SoftBackend) -> Self {
        let mut graph = SceneGraph::new();
        let output = graph.add_output(OutputDesc::new("soft", layout));
        let mut renderer = Renderer::new(config);
        renderer.add_output(output);
        let fb = backend
            .create_buffer(layout.width, layout.height)
            .expect("room for the framebuffer");
        Self {
            graph,
            output,
            renderer,
            backend,
            effects: EffectRegistry::new(),
            fb,
        }
    }

    /// Adds a view holding one surface filled from `pixels`, in front of the
    /// layer's other views.
    fn add_view(
        &mut self,
        layer: Layer,
        view: ViewNode,
        surface: SurfaceId,
        pixels: Pixmap,
        opaque: bool,
    ) -> NodeId {
        let mut node = SurfaceNode::new(surface, pixels.width(), pixels.height());
        if opaque {
            node = node.opaque();
        }
        self.backend.upload_surface(surface, pixels);
        let parent = self
            .graph
            .output_layer_node(self.output, layer)
            .expect("output has every layer");
        let view = self.graph.create_view(view);
        let surface = self.graph.create_surface(node);
        self.graph.add_back(view, surface);
        self.graph.add_front(parent, view);
        view
    }

    fn frame(&mut self) -> FrameResult {
        self.renderer
            .render_output(
                &mut self.graph,
                &mut self.backend,
                &self.effects,
                self.output,
                self.fb,
                &mut Tracer::none(),
            )
            .expect("output is registered")
    }

    fn pixel(&self, x: i32, y: i32) -> u32 {
        self.backend
            .read_pixel(self.fb, x, y)
            .expect("pixel inside the framebuffer")
    }

    fn pixels(&self) -> Vec<u32> {
        self.backend
            .pixmap(self.fb)
            .expect("framebuffer is alive")
            .pixels()
            .to_vec()
    }
}

/// Two-pixel vertical stripes, white first.
fn stripes(width: i32, height: i32) -> Pixmap {
    Pixmap::from_fn(width, height, |x, _| if x % 4 < 2 { WHITE } else { BLACK })
}

#[test]
fn padding_band_keeps_its_pixels() {
    let mut desk = Desk::new(Geometry::new(0, 0, 100, 100), composing());
    desk.add_view(
        Layer::Background,
        ViewNode::new(Geometry::new(0, 0, 100, 100)),
        SurfaceId(1),
        stripes(100, 100),
        true,
    );
    let window = desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(20, 20, 60, 60)),
        SurfaceId(2),
        Pixmap::filled(60, 60, pack(Color::rgba(0.0, 0.0, 1.0, 0.5))),
        false,
    );
    let surface = desk
        .graph
        .children(window)
        .next()
        .expect("window has a surface");
    let effect = desk.effects.register(BoxBlur {
        radius: 4,
        passes: 1,
    });
    desk.graph
        .wrap_in_blur(window, BlurNode { effect })
        .expect("window is attached");

    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    // Blurred stripes under half-transparent blue: 5 of 9 columns are
    // white, so red settles at 142 before the window halves it.
    assert_eq!(channels(desk.pixel(48, 50))[1], 71);
    let first = desk.pixels();

    desk.graph
        .commit_surface(surface, Region::from(Geometry::new(10, 10, 10, 10)))
        .expect("node is a surface");
    let result = desk.frame();
    assert_eq!(
        result,
        FrameResult::Rendered {
            damage: Region::from(Geometry::new(26, 26, 18, 18)),
            instructions: 2,
        }
    );
    // The band was captured once, into a buffer that stays around.
    assert_eq!(desk.backend.live_buffers(), 2);
    assert_eq!(desk.pixels(), first);
}

#[test]
fn failed_blur_capture_draws_the_window_plainly() {
    // Room for the framebuffer and the padding capture only.
    let mut desk = Desk::with_backend(
        Geometry::new(0, 0, 100, 100),
        composing(),
        SoftBackend::new(SoftBackendConfig { max_buffers: 2 }),
    );
    desk.add_view(
        Layer::Background,
        ViewNode::new(Geometry::new(0, 0, 100, 100)),
        SurfaceId(1),
        stripes(100, 100),
        true,
    );
    let window = desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(20, 20, 60, 60)),
        SurfaceId(2),
        Pixmap::filled(60, 60, RED),
        false,
    );
    let surface = desk
        .graph
        .children(window)
        .next()
        .expect("window has a surface");
    // A second surface keeps the blur off the client buffer.
    desk.backend
        .upload_surface(SurfaceId(3), Pixmap::filled(10, 10, WHITE));
    let badge = desk.graph.create_surface(SurfaceNode {
        offset: Offset::new(50, 50),
        ..SurfaceNode::new(SurfaceId(3), 10, 10)
    });
    desk.graph.add_front(window, badge);
    let effect = desk.effects.register(BoxBlur {
        radius: 4,
        passes: 1,
    });
    desk.graph
        .wrap_in_blur(window, BlurNode { effect })
        .expect("window is attached");

    // Hold the last slot so the first frame cannot capture either.
    let spare = desk.backend.create_buffer(1, 1).expect("one slot left");
    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    desk.backend.destroy_buffer(spare);
    assert_eq!(desk.backend.live_buffers(), 1);
    assert_eq!(desk.pixel(20, 40), RED);
    assert_eq!(desk.pixel(75, 75), WHITE);
    // Stripes next to the window are untouched by any blur.
    assert_eq!(desk.pixel(19, 40), BLACK);
    assert_eq!(desk.pixel(17, 40), WHITE);
    let first = desk.pixels();

    desk.graph
        .commit_surface(surface, Region::from(Geometry::new(10, 10, 10, 10)))
        .expect("node is a surface");
    let result = desk.frame();
    assert_eq!(
        result,
        FrameResult::Rendered {
            damage: Region::from(Geometry::new(26, 26, 18, 18)),
            instructions: 2,
        }
    );
    // The padding band was saved; the capture still did not fit.
    assert_eq!(desk.backend.live_buffers(), 2);
    assert_eq!(desk.pixels(), first);
}

#[test]
fn opaque_window_skips_blurring() {
    let mut desk = Desk::new(Geometry::new(0, 0, 100, 100), composing());
    let window = desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(0, 0, 50, 50)),
        SurfaceId(1),
        Pixmap::filled(50, 50, RED),
        true,
    );
    let effect = desk.effects.register(BoxBlur::DEFAULT);
    desk.graph
        .wrap_in_blur(window, BlurNode { effect })
        .expect("window is attached");

    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    assert_eq!(desk.pixel(49, 49), RED);
    // Edges stay sharp.
    assert_eq!(desk.pixel(50, 49), BLACK);
    assert_eq!(desk.backend.live_buffers(), 1);
}

#[test]
fn fullscreen_window_is_scanned_out() {
    let mut desk = Desk::new(Geometry::new(0, 0, 100, 100), RenderConfig::DEFAULT);
    desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(0, 0, 100, 100)),
        SurfaceId(7),
        Pixmap::filled(100, 100, RED),
        true,
    );

    assert_eq!(desk.frame(), FrameResult::ScannedOut);
    assert_eq!(desk.backend.scanouts(), [(desk.output, SurfaceId(7))]);
    // Nothing was composed.
    assert_eq!(desk.pixel(50, 50), 0);
}

#[test]
fn composition_after_scanout_repaints_everything() {
    let layout = Geometry::new(0, 0, 100, 100);
    let mut desk = Desk::new(layout, RenderConfig::DEFAULT);
    desk.add_view(
        Layer::Workspace,
        ViewNode::new(layout),
        SurfaceId(7),
        Pixmap::filled(100, 100, RED),
        true,
    );
    assert_eq!(desk.frame(), FrameResult::ScannedOut);

    desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(10, 10, 10, 10)),
        SurfaceId(8),
        Pixmap::filled(10, 10, WHITE),
        false,
    );
    let result = desk.frame();
    assert!(
        matches!(&result, FrameResult::Rendered { damage, .. } if *damage == Region::from(layout)),
        "unexpected frame {result:?}"
    );
    assert_eq!(desk.pixel(50, 50), RED);
    assert_eq!(desk.pixel(15, 15), WHITE);
}

#[test]
fn rejected_scanout_is_composed() {
    let mut desk = Desk::new(Geometry::new(0, 0, 100, 100), RenderConfig::DEFAULT);
    desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(0, 0, 100, 100)),
        SurfaceId(7),
        Pixmap::filled(100, 100, RED),
        true,
    );
    desk.backend.set_reject_scanout(true);

    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    assert!(desk.backend.scanouts().is_empty());
    assert_eq!(desk.pixel(0, 0), RED);
    assert_eq!(desk.pixel(99, 99), RED);
}

#[test]
fn regeneration_releases_captures() {
    let layout = Geometry::new(0, 0, 100, 100);
    let mut desk = Desk::new(layout, composing());
    let faded = desk.add_view(
        Layer::Workspace,
        ViewNode {
            transform: Some(ViewTransform::alpha(0.5)),
            ..ViewNode::new(Geometry::new(10, 10, 40, 40))
        },
        SurfaceId(1),
        Pixmap::filled(20, 20, RED),
        false,
    );
    // A second surface keeps the view off the direct path.
    desk.backend
        .upload_surface(SurfaceId(2), Pixmap::filled(20, 20, WHITE));
    let second = desk.graph.create_surface(SurfaceNode {
        offset: Offset::new(20, 20),
        ..SurfaceNode::new(SurfaceId(2), 20, 20)
    });
    desk.graph.add_back(faded, second);

    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    assert_eq!(desk.backend.live_buffers(), 2);

    desk.add_view(
        Layer::Workspace,
        ViewNode::new(Geometry::new(60, 60, 10, 10)),
        SurfaceId(3),
        Pixmap::filled(10, 10, WHITE),
        true,
    );
    desk.renderer.damage_whole(desk.output);
    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    assert_eq!(desk.backend.live_buffers(), 2);

    desk.renderer.remove_output(desk.output, &mut desk.backend);
    assert_eq!(desk.backend.live_buffers(), 1);
}

#[test]
fn faded_view_is_blended_over_background() {
    let mut desk = Desk::new(Geometry::new(0, 0, 20, 20), composing());
    desk.add_view(
        Layer::Workspace,
        ViewNode {
            transform: Some(ViewTransform::alpha(0.5)),
            ..ViewNode::new(Geometry::new(0, 0, 10, 10))
        },
        SurfaceId(1),
        Pixmap::filled(10, 10, WHITE),
        true,
    );

    assert!(matches!(desk.frame(), FrameResult::Rendered { .. }));
    // Half white over the black background.
    assert_eq!(desk.pixel(5, 5), crate::argb(255, 128, 128, 128));
    assert_eq!(desk.pixel(15, 15), BLACK);
}
