// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The CPU implementation of [`GpuBackend`].

use std::collections::BTreeMap;

use kurbo::{Affine, Point};
use strata_core::geometry::Geometry;
use strata_core::node::SurfaceId;
use strata_core::output::OutputId;
use strata_render::{BackendError, BufferId, Color, GpuBackend, Texture, TexturePlacement};

use crate::pixmap::{Pixmap, fade, over, pack};

/// Limits of a [`SoftBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftBackendConfig {
    /// Most buffers alive at once; further allocations fail with
    /// [`BackendError::OutOfMemory`].
    pub max_buffers: usize,
}

impl SoftBackendConfig {
    /// Room for 64 buffers.
    pub const DEFAULT: Self = Self { max_buffers: 64 };
}

impl Default for SoftBackendConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A [`GpuBackend`] that draws into in-memory pixmaps.
///
/// Client buffers are supplied with [`upload_surface`](Self::upload_surface).
/// Scanouts are recorded instead of displayed and can be made to fail with
/// [`set_reject_scanout`](Self::set_reject_scanout).
#[derive(Debug, Default)]
pub struct SoftBackend {
    config: SoftBackendConfig,
    buffers: BTreeMap<BufferId, Pixmap>,
    surfaces: BTreeMap<SurfaceId, Pixmap>,
    next_buffer: u32,
    active: Option<BufferId>,
    scanouts: Vec<(OutputId, SurfaceId)>,
    reject_scanout: bool,
}

impl SoftBackend {
    /// Creates a backend with no buffers.
    #[must_use]
    pub fn new(config: SoftBackendConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Limits in effect.
    #[must_use]
    pub const fn config(&self) -> &SoftBackendConfig {
        &self.config
    }

    /// Sets the contents of a client buffer, replacing any previous upload.
    pub fn upload_surface(&mut self, surface: SurfaceId, pixels: Pixmap) {
        self.surfaces.insert(surface, pixels);
    }

    /// Forgets a client buffer.
    pub fn remove_surface(&mut self, surface: SurfaceId) -> Option<Pixmap> {
        self.surfaces.remove(&surface)
    }

    /// Number of buffers currently allocated.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Contents of a buffer.
    #[must_use]
    pub fn pixmap(&self, buffer: BufferId) -> Option<&Pixmap> {
        self.buffers.get(&buffer)
    }

    /// Reads one pixel of a buffer as premultiplied `0xAARRGGBB`.
    #[must_use]
    pub fn read_pixel(&self, buffer: BufferId, x: i32, y: i32) -> Option<u32> {
        self.buffers.get(&buffer)?.get(x, y)
    }

    /// Buffers put on outputs so far, oldest first.
    #[must_use]
    pub fn scanouts(&self) -> &[(OutputId, SurfaceId)] {
        &self.scanouts
    }

    /// Makes every following scanout fail with
    /// [`BackendError::ScanoutRejected`].
    pub fn set_reject_scanout(&mut self, reject: bool) {
        self.reject_scanout = reject;
    }

    fn texture(&self, texture: Texture) -> Option<&Pixmap> {
        match texture {
            Texture::Surface(id) => self.surfaces.get(&id),
            Texture::Buffer(id) => self.buffers.get(&id),
        }
    }
}

/// Maps the center of framebuffer pixel `(x, y)` into texel coordinates.
#[expect(
    clippy::cast_possible_truncation,
    reason = "texel coordinates are bounds-checked against the pixmap afterwards"
)]
fn texel(inverse: Affine, x: i32, y: i32) -> (i32, i32) {
    let p = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
    (p.x.floor() as i32, p.y.floor() as i32)
}

/// Copies `src_box` of `src` into `dst_box` of `dst`, scaling with nearest
/// sampling when the sizes differ.
fn copy_scaled(src: &Pixmap, src_box: Geometry, dst: &mut Pixmap, dst_box: Geometry) {
    let Some(area) = dst_box.intersection(dst.bounds()) else {
        return;
    };
    let (sw, sh) = (i64::from(src_box.width), i64::from(src_box.height));
    let (dw, dh) = (i64::from(dst_box.width), i64::from(dst_box.height));
    for y in area.y..area.bottom() {
        let sy = i64::from(src_box.y) + i64::from(y - dst_box.y) * sh / dh;
        for x in area.x..area.right() {
            let sx = i64::from(src_box.x) + i64::from(x - dst_box.x) * sw / dw;
            let (Ok(sx), Ok(sy)) = (i32::try_from(sx), i32::try_from(sy)) else {
                continue;
            };
            if let Some(pixel) = src.get(sx, sy) {
                dst.set(x, y, pixel);
            }
        }
    }
}

impl GpuBackend for SoftBackend {
    fn begin(&mut self, buffer: BufferId) {
        debug_assert!(
            self.active.is_none(),
            "begin({buffer:?}) while {:?} is still active",
            self.active
        );
        self.active = Some(buffer);
    }

    fn end(&mut self) {
        self.active = None;
    }

    fn create_buffer(&mut self, width: i32, height: i32) -> Result<BufferId, BackendError> {
        if self.buffers.len() >= self.config.max_buffers {
            tracing::warn!(
                width,
                height,
                live = self.buffers.len(),
                "buffer limit reached"
            );
            return Err(BackendError::OutOfMemory);
        }
        self.next_buffer += 1;
        let id = BufferId(self.next_buffer);
        self.buffers.insert(id, Pixmap::new(width, height));
        tracing::trace!(?id, width, height, "created buffer");
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_some() {
            tracing::trace!(id = ?buffer, "destroyed buffer");
        }
    }

    fn clear(&mut self, buffer: BufferId, color: Color, boxes: &[Geometry]) {
        let Some(pixmap) = self.buffers.get_mut(&buffer) else {
            tracing::warn!(?buffer, "clear of unknown buffer");
            return;
        };
        let pixel = pack(color);
        for &b in boxes {
            pixmap.fill(b, pixel);
        }
    }

    fn blit(&mut self, src: BufferId, src_box: Geometry, dst: BufferId, dst_box: Geometry) {
        if src_box.is_empty() || dst_box.is_empty() {
            return;
        }
        let Some(mut target) = self.buffers.remove(&dst) else {
            tracing::warn!(?dst, "blit to unknown buffer");
            return;
        };
        let copy;
        let source = if src == dst {
            copy = target.clone();
            Some(&copy)
        } else {
            self.buffers.get(&src)
        };
        match source {
            Some(source) => copy_scaled(source, src_box, &mut target, dst_box),
            None => tracing::warn!(?src, "blit from unknown buffer"),
        }
        self.buffers.insert(dst, target);
    }

    fn draw_texture(
        &mut self,
        target: BufferId,
        texture: Texture,
        placement: &TexturePlacement,
        clip: Geometry,
    ) {
        if placement.transform.determinant() == 0.0 || placement.alpha <= 0.0 {
            return;
        }
        // Take the target out so the source can be borrowed alongside it.
        let Some(mut dst) = self.buffers.remove(&target) else {
            tracing::warn!(?target, "draw into unknown buffer");
            return;
        };
        match self.texture(texture) {
            Some(src) => {
                if let Some(area) = clip.intersection(dst.bounds()) {
                    let inverse = placement.transform.inverse();
                    for y in area.y..area.bottom() {
                        for x in area.x..area.right() {
                            let (tx, ty) = texel(inverse, x, y);
                            let Some(pixel) = src.get(tx, ty) else {
                                continue;
                            };
                            let pixel = fade(pixel, placement.alpha);
                            let below = dst.get(x, y).unwrap_or(0);
                            dst.set(x, y, over(pixel, below));
                        }
                    }
                }
            }
            None => tracing::warn!(?texture, "draw of unknown texture"),
        }
        self.buffers.insert(target, dst);
    }

    fn box_blur(&mut self, buffer: BufferId, rect: Geometry, radius: u32) {
        match self.buffers.get_mut(&buffer) {
            Some(pixmap) => pixmap.box_blur(rect, radius),
            None => tracing::warn!(?buffer, "blur of unknown buffer"),
        }
    }

    fn scanout(&mut self, output: OutputId, surface: SurfaceId) -> Result<(), BackendError> {
        if self.reject_scanout {
            return Err(BackendError::ScanoutRejected);
        }
        tracing::debug!(?output, ?surface, "scanout");
        self.scanouts.push((output, surface));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;
    use crate::pixmap::argb;

    const RED: u32 = 0xFFFF_0000;
    const WHITE: u32 = 0xFFFF_FFFF;

    fn backend_with_buffer(width: i32, height: i32) -> (SoftBackend, BufferId) {
        let mut backend = SoftBackend::default();
        let buffer = backend
            .create_buffer(width, height)
            .expect("room for one buffer");
        (backend, buffer)
    }

    #[test]
    fn buffers_are_counted_and_limited() {
        let mut backend = SoftBackend::new(SoftBackendConfig { max_buffers: 2 });
        let a = backend.create_buffer(4, 4).expect("first buffer fits");
        let b = backend.create_buffer(4, 4).expect("second buffer fits");
        assert_ne!(a, b);
        assert_eq!(backend.create_buffer(4, 4), Err(BackendError::OutOfMemory));
        assert_eq!(backend.live_buffers(), 2);
        backend.destroy_buffer(a);
        backend.destroy_buffer(a);
        assert_eq!(backend.live_buffers(), 1);
        assert!(backend.create_buffer(4, 4).is_ok());
    }

    #[test]
    fn new_buffers_are_transparent() {
        let (backend, fb) = backend_with_buffer(3, 3);
        assert_eq!(backend.read_pixel(fb, 1, 1), Some(0));
        assert_eq!(backend.read_pixel(fb, 3, 0), None);
    }

    #[test]
    fn clear_fills_boxes_only() {
        let (mut backend, fb) = backend_with_buffer(4, 4);
        backend.clear(fb, Color::BLACK, &[Geometry::new(0, 0, 2, 2)]);
        assert_eq!(backend.read_pixel(fb, 1, 1), Some(0xFF00_0000));
        assert_eq!(backend.read_pixel(fb, 2, 2), Some(0));
    }

    #[test]
    fn draw_places_and_clips_texture() {
        let (mut backend, fb) = backend_with_buffer(10, 10);
        backend.upload_surface(SurfaceId(1), Pixmap::filled(4, 4, RED));
        let placement = TexturePlacement {
            transform: Affine::translate(Vec2::new(2.0, 3.0)),
            alpha: 1.0,
        };
        backend.draw_texture(
            fb,
            Texture::Surface(SurfaceId(1)),
            &placement,
            Geometry::new(0, 0, 4, 10),
        );
        assert_eq!(backend.read_pixel(fb, 2, 3), Some(RED));
        assert_eq!(backend.read_pixel(fb, 3, 6), Some(RED));
        // Outside the texture.
        assert_eq!(backend.read_pixel(fb, 1, 3), Some(0));
        assert_eq!(backend.read_pixel(fb, 2, 7), Some(0));
        // Inside the texture but outside the clip.
        assert_eq!(backend.read_pixel(fb, 5, 3), Some(0));
    }

    #[test]
    fn draw_blends_with_alpha() {
        let (mut backend, fb) = backend_with_buffer(2, 2);
        backend.clear(fb, Color::rgba(1.0, 1.0, 1.0, 1.0), &[Geometry::new(0, 0, 2, 2)]);
        backend.upload_surface(SurfaceId(1), Pixmap::filled(2, 2, 0xFF00_0000));
        let placement = TexturePlacement {
            transform: Affine::IDENTITY,
            alpha: 0.5,
        };
        backend.draw_texture(
            fb,
            Texture::Surface(SurfaceId(1)),
            &placement,
            Geometry::new(0, 0, 2, 2),
        );
        // Half black over white.
        assert_eq!(backend.read_pixel(fb, 0, 0), Some(argb(255, 127, 127, 127)));
    }

    #[test]
    fn scaled_placement_samples_nearest_texel() {
        let (mut backend, fb) = backend_with_buffer(4, 4);
        backend.upload_surface(
            SurfaceId(1),
            Pixmap::from_fn(2, 2, |x, _| if x == 0 { RED } else { WHITE }),
        );
        let placement = TexturePlacement {
            transform: Affine::scale(2.0),
            alpha: 1.0,
        };
        backend.draw_texture(
            fb,
            Texture::Surface(SurfaceId(1)),
            &placement,
            Geometry::new(0, 0, 4, 4),
        );
        assert_eq!(backend.read_pixel(fb, 1, 3), Some(RED));
        assert_eq!(backend.read_pixel(fb, 2, 0), Some(WHITE));
    }

    #[test]
    fn buffers_can_be_drawn_from() {
        let mut backend = SoftBackend::default();
        let fb = backend.create_buffer(4, 4).expect("room for buffers");
        let off = backend.create_buffer(2, 2).expect("room for buffers");
        backend.clear(off, Color::BLACK, &[Geometry::new(0, 0, 2, 2)]);
        let placement = TexturePlacement {
            transform: Affine::IDENTITY,
            alpha: 1.0,
        };
        backend.draw_texture(fb, Texture::Buffer(off), &placement, Geometry::new(0, 0, 4, 4));
        assert_eq!(backend.read_pixel(fb, 1, 1), Some(0xFF00_0000));
        assert_eq!(backend.read_pixel(fb, 2, 2), Some(0));
        assert_eq!(backend.live_buffers(), 2);
    }

    #[test]
    fn blit_round_trips_pixels() {
        let mut backend = SoftBackend::default();
        let fb = backend.create_buffer(4, 4).expect("room for buffers");
        let saved = backend.create_buffer(4, 4).expect("room for buffers");
        let area = Geometry::new(1, 1, 2, 2);
        backend.clear(fb, Color::BLACK, &[area]);
        backend.blit(fb, area, saved, area);
        backend.clear(fb, Color::TRANSPARENT, &[Geometry::new(0, 0, 4, 4)]);
        backend.blit(saved, area, fb, area);
        assert_eq!(backend.read_pixel(fb, 2, 2), Some(0xFF00_0000));
        assert_eq!(backend.read_pixel(fb, 0, 0), Some(0));
    }

    #[test]
    fn rejected_scanout_is_not_recorded() {
        let mut backend = SoftBackend::default();
        assert_eq!(backend.scanout(OutputId(0), SurfaceId(3)), Ok(()));
        backend.set_reject_scanout(true);
        assert_eq!(
            backend.scanout(OutputId(0), SurfaceId(4)),
            Err(BackendError::ScanoutRejected)
        );
        assert_eq!(backend.scanouts(), [(OutputId(0), SurfaceId(3))]);
    }
}
