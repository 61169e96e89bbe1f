// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer pixel geometry.
//!
//! Damage, bounding boxes and render-target placement are all expressed in
//! whole pixels, so [`Geometry`] is integer-valued. Pointer positions and view
//! transforms are fractional and use [`kurbo::Point`] / [`kurbo::Affine`];
//! [`Geometry::to_rect`] and [`Geometry::from_rect_outer`] bridge the two.

use core::fmt;

use kurbo::{Point, Rect};

/// An integer offset between two coordinate frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Offset {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl Offset {
    /// The zero offset.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Creates an offset.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the offset pointing the other way.
    #[inline]
    #[must_use]
    pub const fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// An axis-aligned rectangle in integer pixel coordinates.
///
/// A geometry with a non-positive width or height is *empty*; empty
/// geometries never intersect anything.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Geometry {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Geometry {
    /// Creates a geometry from its origin and size.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a geometry from its edges.
    #[inline]
    #[must_use]
    pub const fn from_edges(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y + self.height
    }

    /// Top-left corner as an offset from the frame origin.
    #[inline]
    #[must_use]
    pub const fn origin(self) -> Offset {
        Offset {
            x: self.x,
            y: self.y,
        }
    }

    /// Returns `true` if the geometry covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub fn area(self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width) * i64::from(self.height)
        }
    }

    /// Returns the overlap of two geometries, or `None` if they are disjoint.
    #[must_use]
    pub fn intersection(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        let out = Self::from_edges(x1, y1, x2, y2);
        (!out.is_empty()).then_some(out)
    }

    /// Returns `true` if the two geometries share at least one pixel.
    #[inline]
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.intersection(other).is_some()
    }

    /// Smallest geometry containing both. Empty inputs are ignored.
    #[must_use]
    pub fn union_bounds(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self::from_edges(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Returns `true` if `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        other.is_empty()
            || (other.x >= self.x
                && other.y >= self.y
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    /// Returns `true` if the (fractional) point lies inside.
    #[must_use]
    pub fn contains_point(self, p: Point) -> bool {
        p.x >= f64::from(self.x)
            && p.y >= f64::from(self.y)
            && p.x < f64::from(self.right())
            && p.y < f64::from(self.bottom())
    }

    /// Moves the geometry by `offset`.
    #[inline]
    #[must_use]
    pub const fn translate(self, offset: Offset) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Grows every edge outward by `amount` pixels (shrinks if negative).
    #[inline]
    #[must_use]
    pub const fn expand(self, amount: i32) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2 * amount,
            height: self.height + 2 * amount,
        }
    }

    /// Converts to a `kurbo` rectangle.
    #[must_use]
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.right()),
            f64::from(self.bottom()),
        )
    }

    /// Smallest integer geometry covering `rect`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "coordinates are integral after rounding and fit screen space"
    )]
    pub fn from_rect_outer(rect: Rect) -> Self {
        let r = rect.abs().expand();
        Self::from_edges(r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32)
    }

    /// Largest integer geometry contained in `rect`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "coordinates are integral after rounding and fit screen space"
    )]
    pub fn from_rect_inner(rect: Rect) -> Self {
        let r = rect.abs().trunc();
        Self::from_edges(r.x0 as i32, r.y0 as i32, r.x1 as i32, r.y1 as i32)
    }
}

impl fmt::Debug for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{} {}x{})",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Euclidean remainder of a point modulo a size, used to pin sticky content.
#[must_use]
pub fn wrap_offset(origin: Offset, width: i32, height: i32) -> Offset {
    Offset {
        x: if width > 0 { origin.x.rem_euclid(width) } else { origin.x },
        y: if height > 0 {
            origin.y.rem_euclid(height)
        } else {
            origin.y
        },
    }
}
