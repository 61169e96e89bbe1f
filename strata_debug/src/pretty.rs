// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line-oriented trace printer.
//!
//! [`PrettyPrintSink`] turns every [`TraceSink`] event into a single text
//! line, written to stderr unless another writer is given. Phase end lines
//! carry the wall-clock time since the matching begin.

use std::io::Write;
use std::time::Instant;

use strata_core::output::DirectScanout;
use strata_core::trace::{
    DamageRect, FrameSummary, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RegenerateEvent,
    RenderPassBeginEvent, ScanoutEvent, TraceSink,
};

const PHASES: [PhaseKind; 4] = [
    PhaseKind::Collect,
    PhaseKind::Schedule,
    PhaseKind::Execute,
    PhaseKind::Scanout,
];

/// Prints one line per trace event.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    started: [Option<Instant>; 4],
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("started", &self.started)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Prints to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Prints to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Prints to `writer`.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            started: [None; 4],
        }
    }

    /// Returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn phase_name(phase: PhaseKind) -> &'static str {
    match phase {
        PhaseKind::Collect => "collect",
        PhaseKind::Schedule => "schedule",
        PhaseKind::Execute => "execute",
        PhaseKind::Scanout => "scanout",
    }
}

fn phase_slot(phase: PhaseKind) -> usize {
    PHASES.iter().position(|&p| p == phase).unwrap_or(0)
}

fn scanout_name(result: DirectScanout) -> &'static str {
    match result {
        DirectScanout::Success => "success",
        DirectScanout::Skip => "skip",
        DirectScanout::Occlusion => "occlusion",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_render_pass_begin(&mut self, e: &RenderPassBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[pass] frame={} output={} damage={}px² rects={}",
            e.frame_index, e.output.0, e.damage_area, e.damage_rects,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.started[phase_slot(e.phase)] = Some(Instant::now());
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {}",
            e.frame_index,
            phase_name(e.phase),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let elapsed = self.started[phase_slot(e.phase)]
            .take()
            .map(|t| t.elapsed().as_secs_f64() * 1e6);
        let _ = match elapsed {
            Some(us) => writeln!(
                self.writer,
                "[phase:end] frame={} {} took {us:.1}µs",
                e.frame_index,
                phase_name(e.phase),
            ),
            None => writeln!(
                self.writer,
                "[phase:end] frame={} {}",
                e.frame_index,
                phase_name(e.phase),
            ),
        };
    }

    fn on_regenerate(&mut self, e: &RegenerateEvent) {
        let _ = writeln!(
            self.writer,
            "[regenerate] frame={} output={} instances={}",
            e.frame_index, e.output.0, e.instances,
        );
    }

    fn on_scanout(&mut self, e: &ScanoutEvent) {
        let _ = writeln!(
            self.writer,
            "[scanout] frame={} output={} result={}",
            e.frame_index,
            e.output.0,
            scanout_name(e.result),
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let scanout = s.scanout.map_or("-", scanout_name);
        let ran: Vec<&str> = PHASES
            .iter()
            .filter(|&&p| s.ran(p))
            .map(|&p| phase_name(p))
            .collect();
        let _ = writeln!(
            self.writer,
            "[summary] frame={} output={} regenerated={} scanout={scanout} \
             collected={}px² repainted={}px² instructions={} phases={}",
            s.frame_index,
            s.output.0,
            s.regenerated,
            s.collected_area,
            s.repainted_area,
            s.instructions,
            ran.join(","),
        );
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let list: Vec<String> = rects
            .iter()
            .map(|r| format!("({},{} {}x{})", r.x, r.y, r.width, r.height))
            .collect();
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={} {}",
            rects.len(),
            list.join(" "),
        );
    }
}
