// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blur providers and the registry that resolves [`EffectId`]s.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::fmt;

use strata_core::effect::EffectId;
use strata_core::geometry::Geometry;
use strata_core::region::Region;

use crate::backend::GpuBackend;
use crate::target::{RenderTarget, Texture, TexturePlacement};

/// Content of the blurred subtree, ready to be drawn over the blurred
/// background.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurSource {
    /// Texture holding the subtree.
    pub texture: Texture,
    /// Where the texture lands in the target.
    pub placement: TexturePlacement,
}

/// A blur algorithm.
///
/// Providers are stateless from the renderer's point of view; any buffers
/// they need belong to the backend.
pub trait BlurProvider {
    /// How far, in framebuffer pixels, one output pixel samples from.
    fn sampling_radius(&self) -> u32;

    /// Called once per instruction before [`render`](Self::render), with the
    /// part of the damage that shows the background through the subtree.
    fn pre_render(
        &self,
        backend: &mut dyn GpuBackend,
        bounds: Geometry,
        translucent: &Region,
        target: &RenderTarget,
    ) {
        _ = (backend, bounds, translucent, target);
    }

    /// Blurs the background inside `rect` and draws `source` over it.
    ///
    /// `bounds` is the blur node's bounding box; `rect` is one rectangle of
    /// the instruction's damage. Both are in the target's frame.
    fn render(
        &self,
        backend: &mut dyn GpuBackend,
        source: &BlurSource,
        bounds: Geometry,
        rect: Geometry,
        target: &RenderTarget,
    );
}

/// Repeated box filter on top of [`GpuBackend::box_blur`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxBlur {
    /// Filter radius in framebuffer pixels.
    pub radius: u32,
    /// Number of filter passes.
    pub passes: u32,
}

impl BoxBlur {
    /// Two passes of radius 4.
    pub const DEFAULT: Self = Self {
        radius: 4,
        passes: 2,
    };
}

impl Default for BoxBlur {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BlurProvider for BoxBlur {
    fn sampling_radius(&self) -> u32 {
        self.radius.saturating_mul(self.passes)
    }

    fn render(
        &self,
        backend: &mut dyn GpuBackend,
        source: &BlurSource,
        bounds: Geometry,
        rect: Geometry,
        target: &RenderTarget,
    ) {
        let Some(area) = rect.intersection(bounds) else {
            return;
        };
        let fb = target.framebuffer_box_from_geometry_box(area);
        for _ in 0..self.passes {
            backend.box_blur(target.buffer, fb, self.radius);
        }
        backend.draw_texture(target.buffer, source.texture, &source.placement, fb);
    }
}

/// Logical padding needed around damage for a provider sampling `radius`
/// framebuffer pixels at `scale`: `ceil(radius / scale)`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "blur radii are small; the quotient fits comfortably in i32"
)]
pub fn sampling_padding(radius: u32, scale: f64) -> i32 {
    if radius == 0 || scale <= 0.0 {
        return 0;
    }
    let q = f64::from(radius) / scale;
    let t = q as i32;
    if f64::from(t) < q { t + 1 } else { t }
}

/// Resolves [`EffectId`]s to blur providers.
#[derive(Default)]
pub struct EffectRegistry {
    providers: BTreeMap<EffectId, Box<dyn BlurProvider>>,
    next: u32,
}

impl fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("effects", &self.providers.keys())
            .finish_non_exhaustive()
    }
}

impl EffectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider and returns its id.
    pub fn register(&mut self, provider: impl BlurProvider + 'static) -> EffectId {
        let id = EffectId(self.next);
        self.next += 1;
        self.providers.insert(id, Box::new(provider));
        id
    }

    /// Replaces the provider behind an existing id.
    ///
    /// Returns `false` if the id is not registered.
    pub fn replace(&mut self, id: EffectId, provider: impl BlurProvider + 'static) -> bool {
        match self.providers.get_mut(&id) {
            Some(slot) => {
                *slot = Box::new(provider);
                true
            }
            None => false,
        }
    }

    /// Unregisters a provider.
    pub fn remove(&mut self, id: EffectId) -> bool {
        self.providers.remove(&id).is_some()
    }

    /// Looks up a provider.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&dyn BlurProvider> {
        self.providers.get(&id).map(|p| &**p)
    }

    /// Largest logical padding any registered provider needs at `scale`.
    #[must_use]
    pub fn max_padding(&self, scale: f64) -> i32 {
        self.providers
            .values()
            .map(|p| sampling_padding(p.sampling_radius(), scale))
            .max()
            .unwrap_or(0)
    }
}
