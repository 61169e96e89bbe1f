// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for render passes.
//!
//! The renderer reports each stage of a frame to a [`TraceSink`]. Sinks
//! pick the events they want; every other method does nothing.
//!
//! The renderer never holds a sink directly but a [`Tracer`]. Without the
//! `trace` feature a `Tracer` is an empty marker and its calls vanish. With
//! it, each call is one `Option` check.
//!
//! [`FrameSummaryBuilder`] accumulates the phases and areas of one frame
//! into a [`FrameSummary`].
//!
//! # Crate features
//!
//! - `trace` enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) gates [`DamageRect`] events and the
//!   corresponding `TraceSink` method.

use crate::output::{DirectScanout, OutputId};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a frame is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Pulling pending damage out of the instance tree.
    Collect,
    /// Front-to-back instruction scheduling.
    Schedule,
    /// Back-to-front instruction execution.
    Execute,
    /// Direct scanout attempt.
    Scanout,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted once the damage of a frame is known, before scheduling.
#[derive(Clone, Copy, Debug)]
pub struct RenderPassBeginEvent {
    /// Per-output frame counter.
    pub frame_index: u64,
    /// Output being drawn.
    pub output: OutputId,
    /// Total damaged area in logical units.
    pub damage_area: i64,
    /// Number of rectangles in the damage region.
    pub damage_rects: usize,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Phase that starts.
    pub phase: PhaseKind,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Phase that ends.
    pub phase: PhaseKind,
}

/// Emitted when the render instance tree of an output is rebuilt.
#[derive(Clone, Copy, Debug)]
pub struct RegenerateEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Output whose tree was rebuilt.
    pub output: OutputId,
    /// Number of instances in the new tree.
    pub instances: usize,
}

/// Emitted after a direct scanout attempt.
#[derive(Clone, Copy, Debug)]
pub struct ScanoutEvent {
    /// Frame counter.
    pub frame_index: u64,
    /// Output that was tried.
    pub output: OutputId,
    /// Outcome of the attempt.
    pub result: DirectScanout,
}

/// Per-frame summary produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct FrameSummary {
    /// Frame counter.
    pub frame_index: u64,
    /// Which output.
    pub output: OutputId,
    /// Whether the instance tree was rebuilt this frame.
    pub regenerated: bool,
    /// Scanout outcome, if scanout was attempted.
    pub scanout: Option<DirectScanout>,
    /// Area of the damage pulled from the instance tree.
    pub collected_area: i64,
    /// Area actually repainted, including sampling padding.
    pub repainted_area: i64,
    /// Number of instructions executed.
    pub instructions: usize,
    /// Phases that began and ended during the frame.
    pub phases: u8,
}

/// One repainted rectangle, in global coordinates.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl From<crate::geometry::Geometry> for DamageRect {
    fn from(g: crate::geometry::Geometry) -> Self {
        Self {
            x: g.x,
            y: g.y,
            width: g.width.max(0).unsigned_abs(),
            height: g.height.max(0).unsigned_abs(),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the renderer.
///
/// Every method defaults to doing nothing.
pub trait TraceSink {
    /// Called when a render pass has its damage and is about to schedule.
    fn on_render_pass_begin(&mut self, e: &RenderPassBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when an output's instance tree is rebuilt.
    fn on_regenerate(&mut self, e: &RegenerateEvent) {
        _ = e;
    }

    /// Called after a direct scanout attempt.
    fn on_scanout(&mut self, e: &ScanoutEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called with the rectangles repainted in a frame. Needs `trace-rich`.
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// Sink that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Event front end handed to the renderer.
///
/// Compiled out entirely unless the `trace` feature is enabled.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Forwards events to `sink`.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// A tracer without a sink.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Forwards a [`RenderPassBeginEvent`].
    #[inline]
    pub fn render_pass_begin(&mut self, e: &RenderPassBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_pass_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Forwards a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Forwards a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Forwards a [`RegenerateEvent`].
    #[inline]
    pub fn regenerate(&mut self, e: &RegenerateEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_regenerate(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Forwards a [`ScanoutEvent`].
    #[inline]
    pub fn scanout(&mut self, e: &ScanoutEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_scanout(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Forwards a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Reports repainted rectangles. Needs `trace-rich`.
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects per-frame counters and produces a [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    summary: FrameSummary,
    open: u8,
}

impl FrameSummaryBuilder {
    /// Starts building a summary for one frame of `output`.
    #[must_use]
    pub fn new(frame_index: u64, output: OutputId) -> Self {
        Self {
            summary: FrameSummary {
                frame_index,
                output,
                regenerated: false,
                scanout: None,
                collected_area: 0,
                repainted_area: 0,
                instructions: 0,
                phases: 0,
            },
            open: 0,
        }
    }

    /// Marks `phase` as started.
    pub fn phase_begin(&mut self, phase: PhaseKind) {
        self.open |= phase_bit(phase);
    }

    /// Records the end of a phase. Ends without a matching begin are ignored.
    pub fn phase_end(&mut self, phase: PhaseKind) {
        let bit = phase_bit(phase);
        if self.open & bit != 0 {
            self.open &= !bit;
            self.summary.phases |= bit;
        }
    }

    /// Marks the instance tree as rebuilt.
    pub fn set_regenerated(&mut self) {
        self.summary.regenerated = true;
    }

    /// Records the scanout outcome.
    pub fn set_scanout(&mut self, result: DirectScanout) {
        self.summary.scanout = Some(result);
    }

    /// Records the collected and repainted areas.
    pub fn set_areas(&mut self, collected: i64, repainted: i64) {
        self.summary.collected_area = collected;
        self.summary.repainted_area = repainted;
    }

    /// Records the number of executed instructions.
    pub fn set_instructions(&mut self, count: usize) {
        self.summary.instructions = count;
    }

    /// Returns the finished summary.
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        self.summary
    }
}

impl FrameSummary {
    /// Returns `true` if `phase` both began and ended during the frame.
    #[must_use]
    pub const fn ran(&self, phase: PhaseKind) -> bool {
        self.phases & phase_bit(phase) != 0
    }
}

/// Maps a [`PhaseKind`] to a bit in [`FrameSummary::phases`].
const fn phase_bit(phase: PhaseKind) -> u8 {
    match phase {
        PhaseKind::Collect => 1 << 0,
        PhaseKind::Schedule => 1 << 1,
        PhaseKind::Execute => 1 << 2,
        PhaseKind::Scanout => 1 << 3,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
