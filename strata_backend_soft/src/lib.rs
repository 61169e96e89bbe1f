// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU reference backend for strata.
//!
//! [`SoftBackend`] implements [`GpuBackend`](strata_render::GpuBackend) on
//! plain pixel arrays:
//!
//! - buffers are premultiplied `0xAARRGGBB` [`Pixmap`]s,
//! - textures are drawn with nearest sampling and source-over blending,
//! - blur is an exact box filter,
//! - scanouts are recorded and can be made to fail on demand.
//!
//! It is slow and meant for tests, demos and checking a GPU backend against.

mod backend;
mod pixmap;

#[cfg(test)]
mod scenarios;

pub use backend::{SoftBackend, SoftBackendConfig};
pub use pixmap::{Pixmap, argb, channels, pack};
