// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! GPU backend contract.
//!
//! The renderer never talks to a graphics API directly. Everything it needs
//! goes through [`GpuBackend`], which a platform crate implements on top of
//! its API of choice. All boxes passed to the backend are in framebuffer
//! pixels of the buffer they refer to; backends clip them to the buffer.
//!
//! Work on the GPU is bracketed by [`begin`](GpuBackend::begin) and
//! [`end`](GpuBackend::end). Use [`GpuScope`] so that `end` runs on every
//! exit path.

use core::fmt;
use core::ops::{Deref, DerefMut};

use strata_core::geometry::Geometry;
use strata_core::node::SurfaceId;
use strata_core::output::OutputId;

use crate::target::{BufferId, Color, Texture, TexturePlacement};

/// Errors reported by a [`GpuBackend`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend could not allocate a buffer.
    #[error("out of buffer memory")]
    OutOfMemory,
    /// The buffer handle is not known to the backend.
    #[error("unknown buffer {0:?}")]
    UnknownBuffer(BufferId),
    /// The display refused a direct scanout buffer.
    #[error("scanout rejected")]
    ScanoutRejected,
}

/// Operations the renderer needs from a GPU.
pub trait GpuBackend {
    /// Starts a batch of work targeting `buffer`.
    fn begin(&mut self, buffer: BufferId) {
        _ = buffer;
    }

    /// Ends the batch started by [`begin`](Self::begin).
    fn end(&mut self) {}

    /// Allocates a buffer of `width` × `height` pixels, cleared to
    /// transparent.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::OutOfMemory`] when allocation fails.
    fn create_buffer(&mut self, width: i32, height: i32) -> Result<BufferId, BackendError>;

    /// Frees a buffer. Unknown handles are ignored.
    fn destroy_buffer(&mut self, buffer: BufferId);

    /// Fills `boxes` of `buffer` with `color`.
    fn clear(&mut self, buffer: BufferId, color: Color, boxes: &[Geometry]);

    /// Copies `src_box` of `src` into `dst_box` of `dst`.
    fn blit(&mut self, src: BufferId, src_box: Geometry, dst: BufferId, dst_box: Geometry);

    /// Draws `texture` into `target` with source-over blending, touching only
    /// pixels inside `clip`.
    fn draw_texture(
        &mut self,
        target: BufferId,
        texture: Texture,
        placement: &TexturePlacement,
        clip: Geometry,
    );

    /// Blurs the pixels of `rect` in place with a box filter of `radius`
    /// pixels. Samples outside `rect` are read but never written.
    fn box_blur(&mut self, buffer: BufferId, rect: Geometry, radius: u32);

    /// Puts a client buffer directly on an output, bypassing composition.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::ScanoutRejected`] when the display refuses it.
    fn scanout(&mut self, output: OutputId, surface: SurfaceId) -> Result<(), BackendError>;
}

/// Calls [`GpuBackend::begin`] on creation and [`GpuBackend::end`] on drop.
pub struct GpuScope<'a> {
    backend: &'a mut dyn GpuBackend,
}

impl fmt::Debug for GpuScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuScope").finish_non_exhaustive()
    }
}

impl<'a> GpuScope<'a> {
    /// Begins work on `buffer`.
    pub fn new(backend: &'a mut dyn GpuBackend, buffer: BufferId) -> Self {
        backend.begin(buffer);
        Self { backend }
    }
}

impl<'a> Deref for GpuScope<'a> {
    type Target = dyn GpuBackend + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.backend
    }
}

impl DerefMut for GpuScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.backend
    }
}

impl Drop for GpuScope<'_> {
    fn drop(&mut self) {
        self.backend.end();
    }
}

/// A lazily allocated buffer that follows a requested size.
#[derive(Debug, Default)]
pub struct OffscreenBuffer {
    buffer: Option<BufferId>,
    width: i32,
    height: i32,
}

impl OffscreenBuffer {
    /// An unallocated buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: None,
            width: 0,
            height: 0,
        }
    }

    /// Makes sure a buffer of exactly `width` × `height` exists.
    ///
    /// Returns `true` if a new buffer was allocated, meaning its contents
    /// are undefined and must be redrawn in full.
    ///
    /// # Errors
    ///
    /// Propagates allocation failures. The previous buffer is already
    /// released at that point.
    pub fn ensure(
        &mut self,
        backend: &mut dyn GpuBackend,
        width: i32,
        height: i32,
    ) -> Result<bool, BackendError> {
        if self.buffer.is_some() && self.width == width && self.height == height {
            return Ok(false);
        }
        self.release(backend);
        let buffer = backend.create_buffer(width, height)?;
        self.buffer = Some(buffer);
        self.width = width;
        self.height = height;
        Ok(true)
    }

    /// Frees the buffer, if any.
    pub fn release(&mut self, backend: &mut dyn GpuBackend) {
        if let Some(buffer) = self.buffer.take() {
            backend.destroy_buffer(buffer);
        }
        self.width = 0;
        self.height = 0;
    }

    /// The current buffer.
    #[must_use]
    pub const fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    /// Returns `true` if a buffer is allocated.
    #[must_use]
    pub const fn is_allocated(&self) -> bool {
        self.buffer.is_some()
    }
}
