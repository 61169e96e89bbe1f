// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets, textures and colors.

use core::fmt;

use kurbo::{Affine, Rect, Vec2};
use strata_core::geometry::{Geometry, Offset};
use strata_core::node::SurfaceId;

/// A buffer owned by the GPU backend.
///
/// Assigned by [`GpuBackend::create_buffer`](crate::backend::GpuBackend::create_buffer)
/// and passed through the renderer without interpretation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub u32);

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// Straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Creates a color from its components.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Something that can be sampled when drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Texture {
    /// A client buffer.
    Surface(SurfaceId),
    /// A buffer created by the renderer.
    Buffer(BufferId),
}

/// How a texture lands in a framebuffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexturePlacement {
    /// Maps texel coordinates to framebuffer pixel coordinates.
    pub transform: Affine,
    /// Opacity multiplier.
    pub alpha: f32,
}

impl TexturePlacement {
    /// Places a texture with `texel_scale` texels per logical unit so that it
    /// covers `geometry` (in the target's frame).
    #[must_use]
    pub fn covering(target: &RenderTarget, geometry: Geometry, texel_scale: f64) -> Self {
        let origin = Vec2::new(
            f64::from(geometry.x - target.geometry.x) * target.scale,
            f64::from(geometry.y - target.geometry.y) * target.scale,
        );
        Self {
            transform: Affine::translate(origin) * Affine::scale(target.scale / texel_scale),
            alpha: 1.0,
        }
    }

    /// Returns a copy with a different opacity.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

/// A framebuffer together with the logical area it shows.
///
/// `geometry` is expressed in the frame of whoever schedules into the target;
/// containers that change coordinates hand their children a
/// [`translated`](Self::translated) copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTarget {
    /// Destination buffer.
    pub buffer: BufferId,
    /// Logical area covered by the buffer.
    pub geometry: Geometry,
    /// Pixels per logical unit.
    pub scale: f64,
    /// Buffer width in pixels.
    pub viewport_width: i32,
    /// Buffer height in pixels.
    pub viewport_height: i32,
}

impl RenderTarget {
    /// Creates a target whose viewport is `geometry` scaled up and rounded
    /// outwards.
    #[must_use]
    pub fn new(buffer: BufferId, geometry: Geometry, scale: f64) -> Self {
        let (viewport_width, viewport_height) = scaled_size(geometry, scale);
        Self {
            buffer,
            geometry,
            scale,
            viewport_width,
            viewport_height,
        }
    }

    /// Returns the same target with its geometry moved by `offset`.
    #[must_use]
    pub const fn translated(mut self, offset: Offset) -> Self {
        self.geometry = self.geometry.translate(offset);
        self
    }

    /// Converts a logical box into framebuffer pixels, rounding outwards.
    #[must_use]
    pub fn framebuffer_box_from_geometry_box(&self, g: Geometry) -> Geometry {
        let x0 = f64::from(g.x - self.geometry.x) * self.scale;
        let y0 = f64::from(g.y - self.geometry.y) * self.scale;
        let x1 = f64::from(g.right() - self.geometry.x) * self.scale;
        let y1 = f64::from(g.bottom() - self.geometry.y) * self.scale;
        Geometry::from_rect_outer(Rect::new(x0, y0, x1, y1))
    }

    /// The whole viewport in framebuffer pixels.
    #[must_use]
    pub const fn viewport(&self) -> Geometry {
        Geometry::new(0, 0, self.viewport_width, self.viewport_height)
    }
}

/// Size of `geometry` in pixels at `scale`, rounded up.
#[must_use]
pub fn scaled_size(geometry: Geometry, scale: f64) -> (i32, i32) {
    let r = Geometry::from_rect_outer(Rect::new(
        0.0,
        0.0,
        f64::from(geometry.width) * scale,
        f64::from(geometry.height) * scale,
    ));
    (r.width, r.height)
}
