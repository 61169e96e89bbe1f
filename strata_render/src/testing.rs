// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test double that records every backend call.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use strata_core::geometry::Geometry;
use strata_core::node::SurfaceId;
use strata_core::output::OutputId;

use crate::backend::{BackendError, GpuBackend};
use crate::target::{BufferId, Color, Texture, TexturePlacement};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Op {
    Begin(BufferId),
    End,
    Create(BufferId, i32, i32),
    Destroy(BufferId),
    Clear(BufferId, Vec<Geometry>),
    Blit {
        src: BufferId,
        src_box: Geometry,
        dst: BufferId,
        dst_box: Geometry,
    },
    Draw {
        target: BufferId,
        texture: Texture,
        clip: Geometry,
        alpha: f32,
    },
    Blur(BufferId, Geometry, u32),
    Scanout(OutputId, SurfaceId),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub(crate) ops: Vec<Op>,
    pub(crate) live: BTreeSet<BufferId>,
    pub(crate) next: u32,
    pub(crate) fail_allocations: bool,
    pub(crate) reject_scanout: bool,
}

impl RecordingBackend {
    pub(crate) fn live_buffers(&self) -> usize {
        self.live.len()
    }

    pub(crate) fn draws(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().filter(|op| matches!(op, Op::Draw { .. }))
    }

    pub(crate) fn blits(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().filter(|op| matches!(op, Op::Blit { .. }))
    }

    pub(crate) fn creates(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, Op::Create(..)))
            .count()
    }
}

impl GpuBackend for RecordingBackend {
    fn begin(&mut self, buffer: BufferId) {
        self.ops.push(Op::Begin(buffer));
    }

    fn end(&mut self) {
        self.ops.push(Op::End);
    }

    fn create_buffer(&mut self, width: i32, height: i32) -> Result<BufferId, BackendError> {
        if self.fail_allocations {
            return Err(BackendError::OutOfMemory);
        }
        let id = BufferId(1000 + self.next);
        self.next += 1;
        self.live.insert(id);
        self.ops.push(Op::Create(id, width, height));
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) {
        self.live.remove(&buffer);
        self.ops.push(Op::Destroy(buffer));
    }

    fn clear(&mut self, buffer: BufferId, _color: Color, boxes: &[Geometry]) {
        self.ops.push(Op::Clear(buffer, boxes.to_vec()));
    }

    fn blit(&mut self, src: BufferId, src_box: Geometry, dst: BufferId, dst_box: Geometry) {
        self.ops.push(Op::Blit {
            src,
            src_box,
            dst,
            dst_box,
        });
    }

    fn draw_texture(
        &mut self,
        target: BufferId,
        texture: Texture,
        placement: &TexturePlacement,
        clip: Geometry,
    ) {
        self.ops.push(Op::Draw {
            target,
            texture,
            clip,
            alpha: placement.alpha,
        });
    }

    fn box_blur(&mut self, buffer: BufferId, rect: Geometry, radius: u32) {
        self.ops.push(Op::Blur(buffer, rect, radius));
    }

    fn scanout(&mut self, output: OutputId, surface: SurfaceId) -> Result<(), BackendError> {
        if self.reject_scanout {
            return Err(BackendError::ScanoutRejected);
        }
        self.ops.push(Op::Scanout(output, surface));
        Ok(())
    }
}
