// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene graph and region algebra for damage-tracked compositing.
//!
//! `strata_core` describes everything a compositing window manager puts on
//! screen. It is `no_std` compatible (with `alloc`) and stores nodes in a
//! struct-of-arrays arena addressed by generational handles.
//!
//! # Architecture
//!
//! Collaborators mutate the graph; the renderer consumes what changed once
//! per frame:
//!
//! ```text
//!   add_front / set_enabled / edit_view / commit_surface
//!       │
//!       ▼
//!   SceneGraph ──► root listeners (synchronous RootUpdate)
//!       │
//!       ├──► dirty channels ──► drain_updates()  (rebuild render trees)
//!       │
//!       └──► damage queue   ──► take_damage()    (per-node damage)
//! ```
//!
//! **[`node`]**: the arena, topology, enablement, bounding boxes, coordinate
//! mapping and hit testing.
//!
//! **[`region`]** and **[`geometry`]**: integer rectangles and sets of
//! disjoint rectangles with the usual set algebra.
//!
//! **[`layer`]**: the fixed stacking layers below the root.
//!
//! **[`output`]**: the output registry and per-layer output nodes.
//!
//! **[`view`]** and **[`effect`]**: window and blur node data.
//!
//! **[`dirty`]** and **[`update`]**: change propagation to the root.
//!
//! **[`dump`]**: indented text dumps of the tree.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! render-pass instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates damage-rect
//!   events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod dump;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod layer;
pub mod node;
pub mod output;
pub mod region;
pub mod trace;
pub mod update;
pub mod view;

pub use error::SceneError;
