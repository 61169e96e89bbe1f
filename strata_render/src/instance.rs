// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render instance contract and the arena instances live in.
//!
//! A render instance is the per-output drawable form of one node and its
//! enabled subtree. Instances form their own tree, addressed by
//! [`InstanceId`] into an [`InstanceArena`]. Each frame runs three phases
//! over it:
//!
//! 1. **Collect**: [`RenderInstance::collect_damage`] pulls the damage routed
//!    to each instance since the last frame, in the instance's parent space.
//! 2. **Schedule**: [`RenderInstance::schedule_instructions`] walks the tree
//!    front to back. Instances push [`RenderInstruction`]s and may shrink the
//!    damage passed on to what is below them (opaque content) or grow it
//!    (sampling padding).
//! 3. **Execute**: the instructions run back to front through
//!    [`RenderInstance::render`].

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;
use core::fmt;

use strata_core::geometry::Geometry;
use strata_core::node::{NodeId, SceneGraph};
use strata_core::output::{DirectScanout, OutputId};
use strata_core::region::Region;

use crate::backend::GpuBackend;
use crate::config::RenderConfig;
use crate::damage::{DamageCallback, DamageRouter, PendingDamage};
use crate::effects::EffectRegistry;
use crate::target::RenderTarget;

/// Handle to an instance in an [`InstanceArena`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub(crate) u32);

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

/// One unit of drawing work produced by scheduling.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderInstruction {
    /// Instance whose [`render`](RenderInstance::render) runs.
    pub instance: InstanceId,
    /// Target, in the frame the instance was scheduled in.
    pub target: RenderTarget,
    /// Area to repaint, in the same frame as `target.geometry`.
    pub damage: Region,
}

/// Per-output drawable form of a node.
pub trait RenderInstance {
    /// Adds damage accumulated since the last call to `acc`, which is in the
    /// instance's parent space, and clears it.
    fn collect_damage(&mut self, cx: &mut PassContext<'_>, acc: &mut Region);

    /// Pushes instructions for the part of `damage` this instance covers.
    ///
    /// Called front to back. `damage` may be reduced for instances further
    /// back or grown for sampling padding; growth stays within the
    /// instance's bounding box and `target.geometry`.
    fn schedule_instructions(
        &mut self,
        cx: &mut PassContext<'_>,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    );

    /// Draws `region` into `target`.
    ///
    /// # Panics
    ///
    /// Instances that never push instructions for themselves panic here.
    fn render(&mut self, cx: &mut PassContext<'_>, target: &RenderTarget, region: &Region) {
        _ = (cx, target, region);
        panic!("rendering an inner node");
    }

    /// Tries to put a client buffer on `output` directly.
    fn try_scanout(&mut self, cx: &mut PassContext<'_>, output: OutputId) -> DirectScanout {
        _ = (cx, output);
        DirectScanout::Skip
    }

    /// Frees GPU resources held by the instance.
    fn release(&mut self, backend: &mut dyn GpuBackend) {
        _ = backend;
    }

    /// Short name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Owns the instances of one render tree.
#[derive(Default)]
pub struct InstanceArena {
    slots: Vec<Option<Box<dyn RenderInstance>>>,
}

impl fmt::Debug for InstanceArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceArena")
            .field("len", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl InstanceArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an instance.
    pub fn insert(&mut self, instance: Box<dyn RenderInstance>) -> InstanceId {
        let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        assert!(idx != u32::MAX, "instance arena overflow");
        self.slots.push(Some(instance));
        InstanceId(idx)
    }

    /// Reserves a slot to be filled later with [`fill`](Self::fill).
    ///
    /// Lets an instance know its own id before its children are generated.
    pub fn reserve(&mut self) -> InstanceId {
        let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        assert!(idx != u32::MAX, "instance arena overflow");
        self.slots.push(None);
        InstanceId(idx)
    }

    /// Fills a slot obtained from [`reserve`](Self::reserve).
    ///
    /// # Panics
    ///
    /// Panics if the slot is already occupied.
    pub fn fill(&mut self, id: InstanceId, instance: Box<dyn RenderInstance>) {
        let slot = &mut self.slots[id.0 as usize];
        assert!(slot.is_none(), "instance slot {id:?} is already filled");
        *slot = Some(instance);
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the arena holds no instances.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Releases every instance's GPU resources and empties the arena.
    pub fn release_all(&mut self, backend: &mut dyn GpuBackend) {
        for inst in self.slots.iter_mut().flatten() {
            inst.release(backend);
        }
        self.slots.clear();
    }

    fn take(&mut self, id: InstanceId) -> Box<dyn RenderInstance> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .unwrap_or_else(|| panic!("render instance {id:?} is gone"))
    }

    fn put(&mut self, id: InstanceId, instance: Box<dyn RenderInstance>) {
        self.slots[id.0 as usize] = Some(instance);
    }
}

/// Everything an instance may touch while a pass runs.
pub struct PassContext<'a> {
    /// The scene being drawn.
    pub graph: &'a SceneGraph,
    /// GPU access.
    pub backend: &'a mut dyn GpuBackend,
    /// Blur providers.
    pub effects: &'a EffectRegistry,
    /// Renderer configuration.
    pub config: &'a RenderConfig,
    arena: &'a mut InstanceArena,
}

impl fmt::Debug for PassContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PassContext")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> PassContext<'a> {
    /// Bundles the pieces of a pass.
    pub fn new(
        graph: &'a SceneGraph,
        backend: &'a mut dyn GpuBackend,
        effects: &'a EffectRegistry,
        config: &'a RenderConfig,
        arena: &'a mut InstanceArena,
    ) -> Self {
        Self {
            graph,
            backend,
            effects,
            config,
            arena,
        }
    }

    /// Runs `f` on one instance while it is checked out of the arena.
    ///
    /// # Panics
    ///
    /// Panics if the instance does not exist or is already checked out,
    /// which means an instruction outlived its tree or an instance tried to
    /// reach itself.
    pub fn with_instance<R>(
        &mut self,
        id: InstanceId,
        f: impl FnOnce(&mut dyn RenderInstance, &mut Self) -> R,
    ) -> R {
        let mut inst = self.arena.take(id);
        let r = f(inst.as_mut(), self);
        self.arena.put(id, inst);
        r
    }

    /// Collect phase for one instance.
    pub fn collect(&mut self, id: InstanceId, acc: &mut Region) {
        self.with_instance(id, |inst, cx| inst.collect_damage(cx, acc));
    }

    /// Schedule phase for one instance.
    pub fn schedule(
        &mut self,
        id: InstanceId,
        instructions: &mut Vec<RenderInstruction>,
        target: &RenderTarget,
        damage: &mut Region,
    ) {
        self.with_instance(id, |inst, cx| {
            inst.schedule_instructions(cx, instructions, target, damage);
        });
    }

    /// Executes one instruction.
    pub fn execute(&mut self, instruction: &RenderInstruction) {
        self.with_instance(instruction.instance, |inst, cx| {
            inst.render(cx, &instruction.target, &instruction.damage);
        });
    }

    /// Scanout attempt for one instance.
    pub fn try_scanout(&mut self, id: InstanceId, output: OutputId) -> DirectScanout {
        self.with_instance(id, |inst, cx| inst.try_scanout(cx, output))
    }

    /// Scans `children` front to back and returns the first answer other than
    /// [`DirectScanout::Skip`].
    pub fn try_scanout_children(&mut self, children: &[InstanceId], output: OutputId) -> DirectScanout {
        for &child in children {
            match self.try_scanout(child, output) {
                DirectScanout::Skip => {}
                other => return other,
            }
        }
        DirectScanout::Skip
    }
}

/// State shared while generating one render tree.
pub struct GenContext<'a> {
    /// The scene being instantiated.
    pub graph: &'a SceneGraph,
    /// Output the tree draws.
    pub output: OutputId,
    /// Area of interest in global coordinates, if known.
    pub viewport: Option<Geometry>,
    arena: &'a mut InstanceArena,
    router: &'a mut DamageRouter,
    wake: Rc<Cell<bool>>,
    effect_instances: usize,
}

impl fmt::Debug for GenContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenContext")
            .field("output", &self.output)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl<'a> GenContext<'a> {
    /// Starts generating into `arena`, registering callbacks with `router`.
    ///
    /// Every routed damage raises `wake`.
    pub fn new(
        graph: &'a SceneGraph,
        output: OutputId,
        viewport: Option<Geometry>,
        arena: &'a mut InstanceArena,
        router: &'a mut DamageRouter,
        wake: Rc<Cell<bool>>,
    ) -> Self {
        Self {
            graph,
            output,
            viewport,
            arena,
            router,
            wake,
            effect_instances: 0,
        }
    }

    /// Creates the damage accumulator of an instance for `node` and
    /// registers it with the router.
    pub fn pending_for(&mut self, node: NodeId) -> PendingDamage {
        let pending = PendingDamage::new();
        self.router.connect(node, pending.callback(&self.wake));
        pending
    }

    /// Registers an extra callback for `node`.
    pub fn connect(&mut self, node: NodeId, callback: DamageCallback) {
        self.router.connect(node, callback);
    }

    /// Reserves the id of an instance whose children are generated next.
    pub fn reserve(&mut self) -> InstanceId {
        self.arena.reserve()
    }

    /// Stores an instance under an id from [`reserve`](Self::reserve).
    pub fn fill(&mut self, id: InstanceId, instance: Box<dyn RenderInstance>) {
        self.arena.fill(id, instance);
    }

    /// Notes that an effect instance was generated.
    pub fn note_effect(&mut self) {
        self.effect_instances += 1;
    }

    /// Number of effect instances generated so far.
    #[must_use]
    pub fn effect_instances(&self) -> usize {
        self.effect_instances
    }
}
