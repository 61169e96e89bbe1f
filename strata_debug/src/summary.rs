// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame summary collection.
//!
//! [`SummaryLog`] implements [`TraceSink`] and keeps every
//! [`FrameSummary`] it sees, together with tree regenerations. The log can
//! be aggregated with [`SummaryLog::totals`] or exported as a JSON array
//! with [`SummaryLog::to_json`].

use serde_json::{Value, json};

use strata_core::output::{DirectScanout, OutputId};
use strata_core::trace::{FrameSummary, PhaseKind, RegenerateEvent, TraceSink};

/// Counters over all frames in a [`SummaryLog`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Frames summarized.
    pub frames: usize,
    /// Frames that went out through direct scanout.
    pub scanouts: usize,
    /// Frames that executed instructions.
    pub composed: usize,
    /// Instance tree rebuilds.
    pub regenerations: usize,
    /// Sum of repainted areas.
    pub repainted_area: i64,
}

/// A [`TraceSink`] that keeps frame summaries.
#[derive(Debug, Default)]
pub struct SummaryLog {
    frames: Vec<FrameSummary>,
    regenerations: Vec<RegenerateEvent>,
}

impl SummaryLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summaries in arrival order.
    #[must_use]
    pub fn frames(&self) -> &[FrameSummary] {
        &self.frames
    }

    /// Summaries of one output.
    pub fn frames_of(&self, output: OutputId) -> impl Iterator<Item = &FrameSummary> + '_ {
        self.frames.iter().filter(move |s| s.output == output)
    }

    /// Aggregates the log.
    #[must_use]
    pub fn totals(&self) -> Totals {
        let mut t = Totals {
            regenerations: self.regenerations.len(),
            ..Totals::default()
        };
        for s in &self.frames {
            t.frames += 1;
            if s.scanout == Some(DirectScanout::Success) {
                t.scanouts += 1;
            }
            if s.ran(PhaseKind::Execute) {
                t.composed += 1;
            }
            t.repainted_area += s.repainted_area;
        }
        t
    }

    /// Exports the summaries as a JSON array, one object per frame.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Array(
            self.frames
                .iter()
                .map(|s| {
                    json!({
                        "frame": s.frame_index,
                        "output": s.output.0,
                        "regenerated": s.regenerated,
                        "scanout": s.scanout.map(|r| format!("{r:?}")),
                        "collected_area": s.collected_area,
                        "repainted_area": s.repainted_area,
                        "instructions": s.instructions,
                        "phases": s.phases,
                    })
                })
                .collect(),
        )
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.regenerations.clear();
    }
}

impl TraceSink for SummaryLog {
    fn on_regenerate(&mut self, e: &RegenerateEvent) {
        self.regenerations.push(*e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.frames.push(*s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(
        frame_index: u64,
        output: u32,
        scanout: Option<DirectScanout>,
        phases: u8,
    ) -> FrameSummary {
        FrameSummary {
            frame_index,
            output: OutputId(output),
            regenerated: false,
            scanout,
            collected_area: 10,
            repainted_area: 25,
            instructions: 1,
            phases,
        }
    }

    #[test]
    fn totals_count_scanouts_and_compositions() {
        let mut log = SummaryLog::new();
        log.on_regenerate(&RegenerateEvent {
            frame_index: 1,
            output: OutputId(0),
            instances: 12,
        });
        log.on_frame_summary(&summary(1, 0, Some(DirectScanout::Success), 0b1000));
        log.on_frame_summary(&summary(2, 0, Some(DirectScanout::Occlusion), 0b1111));
        log.on_frame_summary(&summary(1, 1, None, 0b0111));

        assert_eq!(
            log.totals(),
            Totals {
                frames: 3,
                scanouts: 1,
                composed: 2,
                regenerations: 1,
                repainted_area: 75,
            }
        );
        assert_eq!(log.frames_of(OutputId(1)).count(), 1);

        log.clear();
        assert_eq!(log.totals(), Totals::default());
    }

    #[test]
    fn json_has_one_object_per_frame() {
        let mut log = SummaryLog::new();
        log.on_frame_summary(&summary(4, 2, Some(DirectScanout::Skip), 0b0001));
        let v = log.to_json();
        assert_eq!(v.as_array().map(Vec::len), Some(1));
        assert_eq!(v[0]["frame"], 4);
        assert_eq!(v[0]["output"], 2);
        assert_eq!(v[0]["scanout"], "Skip");
        assert_eq!(v[0]["repainted_area"], 25);
    }
}
