// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer configuration.

use crate::target::Color;

/// Knobs of the per-output [`Renderer`](crate::renderer::Renderer).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    /// Color for damaged areas that no opaque node covers.
    pub background: Color,
    /// Fill uncovered damage with [`background`](Self::background) before
    /// executing instructions.
    pub clear_background: bool,
    /// Try direct scanout before composing a frame.
    pub direct_scanout: bool,
    /// Dilate each frame's damage by the largest blur padding so that changes
    /// below a blurred node re-blur their surroundings.
    pub expand_damage_for_effects: bool,
    /// Repaint whole outputs every frame, ignoring collected damage.
    pub force_full_damage: bool,
}

impl RenderConfig {
    /// Defaults used by [`Renderer::new`](crate::renderer::Renderer::new).
    pub const DEFAULT: Self = Self {
        background: Color::BLACK,
        clear_background: true,
        direct_scanout: true,
        expand_damage_for_effects: true,
        force_full_damage: false,
    };

    /// Repaints everything every frame. Useful when chasing damage bugs.
    #[must_use]
    pub const fn full_damage() -> Self {
        Self {
            direct_scanout: false,
            force_full_damage: true,
            ..Self::DEFAULT
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
