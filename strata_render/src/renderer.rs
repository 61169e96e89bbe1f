// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-output frame driver.
//!
//! A [`Renderer`] keeps one render tree per output. Each tree is built from
//! the whole scene with the output's layout as viewport hint, so output nodes
//! of other outputs are pruned. Trees are rebuilt when the structure below
//! them changes; damage that was routed to the old tree but not yet
//! collected is carried over in global coordinates.
//!
//! A frame ([`Renderer::render_output`]) runs:
//!
//! 1. **Pump**: drain structural updates, rebuild the affected trees, route
//!    queued damage to every tree.
//! 2. **Scanout** (optional): ask the tree whether a client buffer can go on
//!    screen directly. On success the frame ends here.
//! 3. **Collect**: pull pending damage, add carried damage, clip to the
//!    output, optionally dilate by the largest blur padding.
//! 4. **Schedule** and **Execute** inside a [`GpuScope`].

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use strata_core::geometry::Geometry;
use strata_core::node::{NodeId, NodeKind, SceneGraph};
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;
#[cfg(feature = "trace-rich")]
use strata_core::trace::DamageRect;
use strata_core::trace::{
    FrameSummaryBuilder, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RegenerateEvent,
    RenderPassBeginEvent, ScanoutEvent, Tracer,
};
use strata_core::update::{DamageEvent, UpdateFlags};

use crate::backend::{GpuBackend, GpuScope};
use crate::config::RenderConfig;
use crate::damage::DamageRouter;
use crate::effects::EffectRegistry;
use crate::instance::{GenContext, InstanceArena, InstanceId, PassContext};
use crate::instances::gen_render_instances;
use crate::pass::{collect_damage, execute_pass, schedule_pass};
use crate::target::{BufferId, RenderTarget};

/// Errors returned by [`Renderer::render_output`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The output is not registered with the renderer or the scene.
    #[error("unknown output {0:?}")]
    UnknownOutput(OutputId),
}

/// What a call to [`Renderer::render_output`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameResult {
    /// A client buffer was put on screen; nothing was composed.
    ScannedOut,
    /// Nothing was damaged; the buffer was not touched.
    Idle,
    /// The frame was composed.
    Rendered {
        /// Area of the buffer that changed, in global coordinates.
        damage: Region,
        /// Number of executed instructions.
        instructions: usize,
    },
}

#[derive(Debug)]
struct RenderTree {
    /// Layout of the output when the tree was built.
    viewport: Geometry,
    arena: InstanceArena,
    roots: Vec<InstanceId>,
    router: DamageRouter,
    effects: usize,
}

impl RenderTree {
    fn generate(
        graph: &SceneGraph,
        output: OutputId,
        viewport: Geometry,
        wake: &Rc<Cell<bool>>,
    ) -> Self {
        let mut arena = InstanceArena::new();
        let mut router = DamageRouter::new();
        let mut roots = Vec::new();
        let mut cx = GenContext::new(
            graph,
            output,
            Some(viewport),
            &mut arena,
            &mut router,
            Rc::clone(wake),
        );
        gen_render_instances(&mut cx, graph.root(), &mut roots);
        let effects = cx.effect_instances();
        Self {
            viewport,
            arena,
            roots,
            router,
            effects,
        }
    }
}

#[derive(Debug)]
struct OutputState {
    tree: Option<RenderTree>,
    /// Raised by every damage callback of the tree.
    wake: Rc<Cell<bool>>,
    frame_index: u64,
    /// Global damage routed to the tree since its last collect.
    routed: Region,
    /// Damage inherited from discarded trees.
    carried: Region,
    full_damage: bool,
    regenerated: bool,
}

impl OutputState {
    fn new() -> Self {
        Self {
            tree: None,
            wake: Rc::new(Cell::new(true)),
            frame_index: 0,
            routed: Region::new(),
            carried: Region::new(),
            full_damage: true,
            regenerated: false,
        }
    }
}

/// Drives frames for a set of outputs.
#[derive(Debug)]
pub struct Renderer {
    config: RenderConfig,
    outputs: BTreeMap<OutputId, OutputState>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::DEFAULT)
    }
}

impl Renderer {
    /// Creates a renderer with no outputs.
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            outputs: BTreeMap::new(),
        }
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the configuration and repaints every output in full.
    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
        for state in self.outputs.values_mut() {
            state.full_damage = true;
            state.wake.set(true);
        }
    }

    /// Starts rendering `output`. Its tree is built on the first frame.
    pub fn add_output(&mut self, output: OutputId) {
        self.outputs.entry(output).or_insert_with(OutputState::new);
    }

    /// Stops rendering `output` and frees its tree.
    pub fn remove_output(&mut self, output: OutputId, backend: &mut dyn GpuBackend) {
        if let Some(mut state) = self.outputs.remove(&output) {
            if let Some(tree) = state.tree.as_mut() {
                tree.arena.release_all(backend);
            }
        }
    }

    /// Repaints the whole of `output` on its next frame.
    pub fn damage_whole(&mut self, output: OutputId) {
        if let Some(state) = self.outputs.get_mut(&output) {
            state.full_damage = true;
            state.wake.set(true);
        }
    }

    /// Returns `true` if `output` has damage waiting.
    ///
    /// Damage queued on the scene only counts once it has been routed by
    /// [`pump`](Self::pump) or a frame.
    #[must_use]
    pub fn needs_frame(&self, output: OutputId) -> bool {
        self.outputs.get(&output).is_some_and(|state| {
            state.wake.get() || state.tree.is_none() || !state.carried.is_empty()
        })
    }

    /// Number of instances in the tree of `output`, if it has been built.
    #[must_use]
    pub fn instance_count(&self, output: OutputId) -> Option<usize> {
        self.outputs
            .get(&output)
            .and_then(|state| state.tree.as_ref())
            .map(|tree| tree.arena.len())
    }

    /// Applies pending scene changes to every output: rebuilds trees whose
    /// part of the scene changed and routes queued damage.
    ///
    /// [`render_output`](Self::render_output) calls this itself.
    pub fn pump(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut dyn GpuBackend,
        tracer: &mut Tracer<'_>,
    ) {
        let changed = graph.drain_updates(UpdateFlags::CHILDREN_LIST | UpdateFlags::ENABLED);
        let events = graph.take_damage();
        let graph: &SceneGraph = graph;

        if !changed.is_empty() {
            let stale = Stale::from_changes(graph, &changed);
            for (&output, state) in &mut self.outputs {
                let Some(viewport) = state.tree.as_ref().map(|t| t.viewport) else {
                    continue;
                };
                if stale.affects(graph, output, viewport) {
                    regenerate(state, graph, output, viewport, backend, tracer);
                }
            }
        }

        for event in &events {
            let global = region_to_global(graph, event);
            for state in self.outputs.values_mut() {
                if let Some(tree) = &state.tree {
                    tree.router.route(graph, event);
                    state.routed.union_assign(&global);
                }
            }
        }
    }

    /// Draws one frame of `output` into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownOutput`] if the output was never added
    /// to the renderer or is not registered in the scene.
    pub fn render_output(
        &mut self,
        graph: &mut SceneGraph,
        backend: &mut dyn GpuBackend,
        effects: &EffectRegistry,
        output: OutputId,
        buffer: BufferId,
        tracer: &mut Tracer<'_>,
    ) -> Result<FrameResult, RenderError> {
        if !self.outputs.contains_key(&output) {
            return Err(RenderError::UnknownOutput(output));
        }
        let (layout, scale) = graph
            .output(output)
            .map(|desc| (desc.layout, desc.scale))
            .ok_or(RenderError::UnknownOutput(output))?;

        self.pump(graph, backend, tracer);
        let graph: &SceneGraph = graph;
        let config = &self.config;
        let Some(state) = self.outputs.get_mut(&output) else {
            return Err(RenderError::UnknownOutput(output));
        };

        if state.tree.as_ref().is_none_or(|t| t.viewport != layout) {
            regenerate(state, graph, output, layout, backend, tracer);
        }
        let Some(tree) = state.tree.as_mut() else {
            return Err(RenderError::UnknownOutput(output));
        };

        state.frame_index += 1;
        let frame_index = state.frame_index;
        let mut summary = FrameSummaryBuilder::new(frame_index, output);
        if core::mem::take(&mut state.regenerated) {
            summary.set_regenerated();
        }
        let target = RenderTarget::new(buffer, layout, scale);

        // -- Scanout --

        if config.direct_scanout {
            begin_phase(tracer, &mut summary, frame_index, PhaseKind::Scanout);
            let mut cx = PassContext::new(graph, &mut *backend, effects, config, &mut tree.arena);
            let result = cx.try_scanout_children(&tree.roots, output);
            end_phase(tracer, &mut summary, frame_index, PhaseKind::Scanout);
            tracer.scanout(&ScanoutEvent {
                frame_index,
                output,
                result,
            });
            summary.set_scanout(result);

            if result == DirectScanout::Success {
                // The buffer we compose into next is stale by now.
                let mut drained = Region::new();
                collect_damage(&mut cx, &tree.roots, &mut drained);
                state.routed.clear();
                state.carried.clear();
                state.full_damage = true;
                state.wake.set(false);
                tracer.frame_summary(&summary.finish());
                return Ok(FrameResult::ScannedOut);
            }
        }

        // -- Collect --

        begin_phase(tracer, &mut summary, frame_index, PhaseKind::Collect);
        let mut damage = Region::new();
        {
            let mut cx = PassContext::new(graph, &mut *backend, effects, config, &mut tree.arena);
            collect_damage(&mut cx, &tree.roots, &mut damage);
        }
        damage.union_assign(&state.carried.take());
        state.routed.clear();
        if core::mem::take(&mut state.full_damage) || config.force_full_damage {
            damage.add_geometry(layout);
        }
        damage.intersect_geometry(layout);
        state.wake.set(false);
        end_phase(tracer, &mut summary, frame_index, PhaseKind::Collect);

        let collected = damage.area();
        if damage.is_empty() {
            tracer.frame_summary(&summary.finish());
            return Ok(FrameResult::Idle);
        }

        if tree.effects > 0 && config.expand_damage_for_effects {
            damage.expand_edges(effects.max_padding(scale));
            damage.intersect_geometry(layout);
        }

        tracer.render_pass_begin(&RenderPassBeginEvent {
            frame_index,
            output,
            damage_area: damage.area(),
            damage_rects: damage.rects().len(),
        });
        #[cfg(feature = "trace-rich")]
        {
            let rects: Vec<DamageRect> = damage.iter().map(DamageRect::from).collect();
            tracer.damage_rects(frame_index, &rects);
        }

        // -- Schedule and execute --

        let requested = damage.clone();
        let mut gpu = GpuScope::new(backend, buffer);
        let mut cx = PassContext::new(graph, &mut *gpu, effects, config, &mut tree.arena);

        begin_phase(tracer, &mut summary, frame_index, PhaseKind::Schedule);
        let instructions = schedule_pass(&mut cx, &tree.roots, &target, &mut damage);
        end_phase(tracer, &mut summary, frame_index, PhaseKind::Schedule);

        begin_phase(tracer, &mut summary, frame_index, PhaseKind::Execute);
        let clear = config.clear_background.then_some(config.background);
        let outcome = execute_pass(&mut cx, &instructions, &target, &damage, clear);
        end_phase(tracer, &mut summary, frame_index, PhaseKind::Execute);
        drop(gpu);

        let mut repainted = outcome.painted;
        repainted.union_assign(&requested);
        summary.set_areas(collected, repainted.area());
        summary.set_instructions(outcome.instructions);
        tracer.frame_summary(&summary.finish());

        tracing::trace!(
            ?output,
            frame_index,
            instructions = outcome.instructions,
            "frame rendered"
        );
        Ok(FrameResult::Rendered {
            damage: repainted,
            instructions: outcome.instructions,
        })
    }
}

/// Rebuilds the tree of one output, carrying over damage routed to the old
/// tree.
fn regenerate(
    state: &mut OutputState,
    graph: &SceneGraph,
    output: OutputId,
    viewport: Geometry,
    backend: &mut dyn GpuBackend,
    tracer: &mut Tracer<'_>,
) {
    match state.tree.take() {
        Some(mut old) => {
            old.arena.release_all(backend);
            let routed = state.routed.take();
            state.carried.union_assign(&routed);
            if old.viewport != viewport {
                state.carried.add_geometry(old.viewport);
                state.carried.add_geometry(viewport);
            }
        }
        None => state.full_damage = true,
    }

    let tree = RenderTree::generate(graph, output, viewport, &state.wake);
    tracing::debug!(?output, instances = tree.arena.len(), "render tree regenerated");
    tracer.regenerate(&RegenerateEvent {
        frame_index: state.frame_index,
        output,
        instances: tree.arena.len(),
    });
    state.regenerated = true;
    state.wake.set(true);
    state.tree = Some(tree);
}

/// Which trees a batch of structural changes invalidates.
enum Stale {
    All,
    /// Output nodes whose subtrees changed.
    Outputs(Vec<NodeId>),
}

impl Stale {
    fn from_changes(graph: &SceneGraph, changed: &[NodeId]) -> Self {
        let mut outputs = Vec::new();
        let mut layers = Vec::new();
        for &node in changed {
            match graph.kind(node) {
                NodeKind::Root => {}
                NodeKind::Layer(_) => layers.push(node),
                NodeKind::Output(_) => outputs.push(node),
                _ => {
                    if graph.output_of(node).is_none() && is_attached(graph, node) {
                        return Self::All;
                    }
                }
            }
        }
        // A layer marked without one of its output nodes changed its own
        // child list.
        let explained =
            |layer: NodeId| outputs.iter().any(|&o| graph.parent(o) == Some(layer));
        if layers.iter().any(|&layer| !explained(layer)) {
            return Self::All;
        }
        Self::Outputs(outputs)
    }

    fn affects(&self, graph: &SceneGraph, output: OutputId, viewport: Geometry) -> bool {
        match self {
            Self::All => true,
            Self::Outputs(nodes) => nodes.iter().any(|&node| {
                graph.output_node(node).is_ok_and(|data| {
                    data.output == output
                        || data
                            .limit_region
                            .as_ref()
                            .is_none_or(|limit| limit.intersects_geometry(viewport))
                })
            }),
        }
    }
}

fn is_attached(graph: &SceneGraph, node: NodeId) -> bool {
    let mut cur = node;
    while let Some(parent) = graph.parent(cur) {
        cur = parent;
    }
    cur == graph.root()
}

/// Maps a damage event from its node's content space to global coordinates.
///
/// Events on dead or detached nodes map to nothing.
fn region_to_global(graph: &SceneGraph, event: &DamageEvent) -> Region {
    if !graph.is_alive(event.node) {
        return Region::new();
    }
    let mut region = event.region.clone();
    let mut node = event.node;
    loop {
        region = graph.region_to_parent(node, &region);
        match graph.parent(node) {
            Some(parent) => node = parent,
            None => break,
        }
    }
    if node == graph.root() {
        region
    } else {
        Region::new()
    }
}

fn begin_phase(
    tracer: &mut Tracer<'_>,
    summary: &mut FrameSummaryBuilder,
    frame_index: u64,
    phase: PhaseKind,
) {
    summary.phase_begin(phase);
    tracer.phase_begin(&PhaseBeginEvent { frame_index, phase });
}

fn end_phase(
    tracer: &mut Tracer<'_>,
    summary: &mut FrameSummaryBuilder,
    frame_index: u64,
    phase: PhaseKind,
) {
    tracer.phase_end(&PhaseEndEvent { frame_index, phase });
    summary.phase_end(phase);
}
