// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-tracked render passes over a [`strata_core`] scene.
//!
//! This crate turns the scene graph into per-output trees of render
//! instances and drives frames through them:
//!
//! - [`Renderer`] owns one instance tree per output, rebuilds trees when the
//!   scene structure changes and runs frames.
//! - [`RenderInstance`] is the contract every drawable form of a node
//!   implements: collect damage, schedule instructions front to back, render
//!   back to front, optionally scan out.
//! - [`instances`] holds the instance for each node kind, including the
//!   blur instance with its padding and pixel preservation.
//! - [`GpuBackend`] is everything the renderer asks of a GPU.
//! - [`EffectRegistry`] resolves blur nodes to [`BlurProvider`]s.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Forwards frame events to the
//!   [`Tracer`](strata_core::trace::Tracer) passed to
//!   [`Renderer::render_output`].
//! - `trace-rich` (disabled by default, implies `trace`): Also emits the
//!   damage rectangles of each frame.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod config;
pub mod damage;
pub mod effects;
pub mod instance;
pub mod instances;
pub mod pass;
pub mod renderer;
pub mod target;

#[cfg(test)]
mod testing;

pub use backend::{BackendError, GpuBackend, GpuScope, OffscreenBuffer};
pub use config::RenderConfig;
pub use damage::{DamageCallback, DamageRouter, PendingDamage};
pub use effects::{BlurProvider, BlurSource, BoxBlur, EffectRegistry};
pub use instance::{InstanceArena, InstanceId, PassContext, RenderInstance, RenderInstruction};
pub use pass::{RenderPassParams, run_render_pass};
pub use renderer::{FrameResult, RenderError, Renderer};
pub use target::{BufferId, Color, RenderTarget, Texture, TexturePlacement};
