// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage regions: sets of non-overlapping integer rectangles.
//!
//! A [`Region`] is a value type recomputed every render pass. Internally it
//! is a list of pairwise-disjoint, non-empty [`Geometry`] rectangles; every
//! operation preserves that invariant. The decomposition is not canonical
//! (the same pixel set may be stored as different rectangle lists), so
//! equality compares pixel sets, not rectangle lists.
//!
//! Set operators are provided both as methods and as `std::ops` impls:
//!
//! | operation            | method                   | operator |
//! |----------------------|--------------------------|----------|
//! | union                | [`union`](Region::union) | `\|`     |
//! | intersection         | [`intersect`](Region::intersect) | `&` |
//! | subtraction          | [`subtract`](Region::subtract) | `-` |
//! | symmetric difference | [`symmetric_difference`](Region::symmetric_difference) | `^` |

use alloc::vec::Vec;
use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use kurbo::Point;

use crate::geometry::{Geometry, Offset};

/// A set of pixels described by disjoint rectangles.
#[derive(Clone, Default)]
pub struct Region {
    rects: Vec<Geometry>,
}

impl Region {
    /// Creates an empty region.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Creates a region covering exactly `geometry`.
    #[must_use]
    pub fn from_geometry(geometry: Geometry) -> Self {
        let mut rects = Vec::new();
        if !geometry.is_empty() {
            rects.push(geometry);
        }
        Self { rects }
    }

    /// Creates a region covering the union of `geometries`.
    #[must_use]
    pub fn from_geometries(geometries: impl IntoIterator<Item = Geometry>) -> Self {
        let mut out = Self::new();
        for g in geometries {
            out.add_geometry(g);
        }
        out
    }

    /// Returns `true` if the region covers no pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// The disjoint rectangles making up the region.
    #[inline]
    #[must_use]
    pub fn rects(&self) -> &[Geometry] {
        &self.rects
    }

    /// Iterates over the disjoint rectangles making up the region.
    pub fn iter(&self) -> impl Iterator<Item = Geometry> + '_ {
        self.rects.iter().copied()
    }

    /// Removes every rectangle.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Moves the contents out, leaving the region empty.
    #[must_use]
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> i64 {
        self.rects.iter().map(|r| r.area()).sum()
    }

    /// Bounding box of the region (empty geometry if the region is empty).
    #[must_use]
    pub fn extents(&self) -> Geometry {
        self.rects
            .iter()
            .fold(Geometry::default(), |acc, r| acc.union_bounds(*r))
    }

    /// Returns `true` if the point lies inside one of the rectangles.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        self.rects.iter().any(|r| r.contains_point(p))
    }

    /// Returns `true` if every pixel of `geometry` is in the region.
    #[must_use]
    pub fn contains_geometry(&self, geometry: Geometry) -> bool {
        let mut rest = Self::from_geometry(geometry);
        rest.subtract_assign_region(self);
        rest.is_empty()
    }

    /// Returns `true` if the region shares a pixel with `geometry`.
    #[must_use]
    pub fn intersects_geometry(&self, geometry: Geometry) -> bool {
        self.rects.iter().any(|r| r.intersects(geometry))
    }

    // -- In-place set operations --

    /// Adds `geometry` to the region.
    pub fn add_geometry(&mut self, geometry: Geometry) {
        if geometry.is_empty() {
            return;
        }
        let mut pieces = Vec::new();
        pieces.push(geometry);
        for existing in &self.rects {
            pieces = subtract_from_all(&pieces, *existing);
            if pieces.is_empty() {
                return;
            }
        }
        self.rects.extend(pieces);
    }

    /// Adds every pixel of `other` to the region.
    pub fn union_assign(&mut self, other: &Self) {
        if self.is_empty() {
            self.rects.clone_from(&other.rects);
            return;
        }
        for r in &other.rects {
            self.add_geometry(*r);
        }
    }

    /// Keeps only the pixels also inside `geometry`.
    pub fn intersect_geometry(&mut self, geometry: Geometry) {
        self.rects = self
            .rects
            .iter()
            .filter_map(|r| r.intersection(geometry))
            .collect();
    }

    /// Keeps only the pixels also inside `other`.
    pub fn intersect_assign(&mut self, other: &Self) {
        let mut out = Vec::new();
        for a in &self.rects {
            for b in &other.rects {
                if let Some(i) = a.intersection(*b) {
                    out.push(i);
                }
            }
        }
        self.rects = out;
    }

    /// Removes the pixels of `geometry` from the region.
    pub fn subtract_geometry(&mut self, geometry: Geometry) {
        if geometry.is_empty() {
            return;
        }
        self.rects = subtract_from_all(&self.rects, geometry);
    }

    /// Removes the pixels of `other` from the region.
    pub fn subtract_assign_region(&mut self, other: &Self) {
        for b in &other.rects {
            if self.rects.is_empty() {
                return;
            }
            self.rects = subtract_from_all(&self.rects, *b);
        }
    }

    /// Replaces the region with the pixels in exactly one of `self` and `other`.
    pub fn symmetric_difference_assign(&mut self, other: &Self) {
        let mut theirs = other.clone();
        theirs.subtract_assign_region(self);
        self.subtract_assign_region(other);
        // The two halves are disjoint by construction.
        self.rects.extend(theirs.rects);
    }

    /// Moves every rectangle by `offset`.
    pub fn translate(&mut self, offset: Offset) {
        if offset == Offset::ZERO {
            return;
        }
        for r in &mut self.rects {
            *r = r.translate(offset);
        }
    }

    /// Grows (positive `amount`) or erodes (negative `amount`) the region by
    /// `amount` pixels on every edge.
    ///
    /// Growth dilates each rectangle and re-normalizes. Erosion removes every
    /// pixel within `|amount|` of a pixel outside the region, so rectangles
    /// sharing an edge do not erode into each other.
    pub fn expand_edges(&mut self, amount: i32) {
        if amount == 0 || self.is_empty() {
            return;
        }
        if amount > 0 {
            let grown = Self::from_geometries(self.rects.iter().map(|r| r.expand(amount)));
            *self = grown;
        } else {
            let shrink = -amount;
            let frame = self.extents().expand(shrink);
            let mut outside = Self::from_geometry(frame);
            outside.subtract_assign_region(self);
            outside.expand_edges(shrink);
            self.subtract_assign_region(&outside);
        }
    }

    /// Merges rectangles that share a full edge, reducing fragmentation.
    pub fn coalesce(&mut self) {
        let mut merged = true;
        while merged {
            merged = false;
            'outer: for i in 0..self.rects.len() {
                for j in (i + 1)..self.rects.len() {
                    if let Some(m) = merge_adjacent(self.rects[i], self.rects[j]) {
                        self.rects[i] = m;
                        self.rects.swap_remove(j);
                        merged = true;
                        break 'outer;
                    }
                }
            }
        }
    }

    // -- Value-returning set operations --

    /// Returns the union of two regions.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.union_assign(other);
        out
    }

    /// Returns the intersection of two regions.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.intersect_assign(other);
        out
    }

    /// Returns `self` minus `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.subtract_assign_region(other);
        out
    }

    /// Returns the pixels in exactly one of the two regions.
    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.symmetric_difference_assign(other);
        out
    }

    /// Returns a copy moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: Offset) -> Self {
        let mut out = self.clone();
        out.translate(offset);
        out
    }

    /// Returns a copy clipped to `geometry`.
    #[must_use]
    pub fn clipped(&self, geometry: Geometry) -> Self {
        let mut out = self.clone();
        out.intersect_geometry(geometry);
        out
    }
}

/// Splits `a` minus `b` into at most four disjoint strips.
fn subtract_rect(a: Geometry, b: Geometry, out: &mut Vec<Geometry>) {
    let Some(overlap) = a.intersection(b) else {
        out.push(a);
        return;
    };
    // Top and bottom strips span the full width of `a`.
    if overlap.y > a.y {
        out.push(Geometry::from_edges(a.x, a.y, a.right(), overlap.y));
    }
    if overlap.bottom() < a.bottom() {
        out.push(Geometry::from_edges(
            a.x,
            overlap.bottom(),
            a.right(),
            a.bottom(),
        ));
    }
    // Left and right strips sit between them.
    if overlap.x > a.x {
        out.push(Geometry::from_edges(
            a.x,
            overlap.y,
            overlap.x,
            overlap.bottom(),
        ));
    }
    if overlap.right() < a.right() {
        out.push(Geometry::from_edges(
            overlap.right(),
            overlap.y,
            a.right(),
            overlap.bottom(),
        ));
    }
}

fn subtract_from_all(pieces: &[Geometry], b: Geometry) -> Vec<Geometry> {
    let mut out = Vec::with_capacity(pieces.len());
    for p in pieces {
        subtract_rect(*p, b, &mut out);
    }
    out
}

fn merge_adjacent(a: Geometry, b: Geometry) -> Option<Geometry> {
    if a.x == b.x && a.width == b.width && (a.bottom() == b.y || b.bottom() == a.y) {
        return Some(Geometry::new(a.x, a.y.min(b.y), a.width, a.height + b.height));
    }
    if a.y == b.y && a.height == b.height && (a.right() == b.x || b.right() == a.x) {
        return Some(Geometry::new(a.x.min(b.x), a.y, a.width + b.width, a.height));
    }
    None
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.area() == other.area() && self.symmetric_difference(other).is_empty()
    }
}

impl Eq for Region {}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.rects.iter()).finish()
    }
}

impl From<Geometry> for Region {
    fn from(geometry: Geometry) -> Self {
        Self::from_geometry(geometry)
    }
}

impl FromIterator<Geometry> for Region {
    fn from_iter<I: IntoIterator<Item = Geometry>>(iter: I) -> Self {
        Self::from_geometries(iter)
    }
}

impl BitOr<&Region> for &Region {
    type Output = Region;

    fn bitor(self, rhs: &Region) -> Region {
        self.union(rhs)
    }
}

impl BitOrAssign<&Self> for Region {
    fn bitor_assign(&mut self, rhs: &Self) {
        self.union_assign(rhs);
    }
}

impl BitOrAssign<Geometry> for Region {
    fn bitor_assign(&mut self, rhs: Geometry) {
        self.add_geometry(rhs);
    }
}

impl BitAnd<&Region> for &Region {
    type Output = Region;

    fn bitand(self, rhs: &Region) -> Region {
        self.intersect(rhs)
    }
}

impl BitAnd<Geometry> for &Region {
    type Output = Region;

    fn bitand(self, rhs: Geometry) -> Region {
        self.clipped(rhs)
    }
}

impl BitAndAssign<&Self> for Region {
    fn bitand_assign(&mut self, rhs: &Self) {
        self.intersect_assign(rhs);
    }
}

impl BitAndAssign<Geometry> for Region {
    fn bitand_assign(&mut self, rhs: Geometry) {
        self.intersect_geometry(rhs);
    }
}

impl Sub<&Region> for &Region {
    type Output = Region;

    fn sub(self, rhs: &Region) -> Region {
        self.subtract(rhs)
    }
}

impl SubAssign<&Self> for Region {
    fn sub_assign(&mut self, rhs: &Self) {
        self.subtract_assign_region(rhs);
    }
}

impl SubAssign<Geometry> for Region {
    fn sub_assign(&mut self, rhs: Geometry) {
        self.subtract_geometry(rhs);
    }
}

impl BitXor<&Region> for &Region {
    type Output = Region;

    fn bitxor(self, rhs: &Region) -> Region {
        self.symmetric_difference(rhs)
    }
}

impl BitXorAssign<&Self> for Region {
    fn bitxor_assign(&mut self, rhs: &Self) {
        self.symmetric_difference_assign(rhs);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn g(x: i32, y: i32, w: i32, h: i32) -> Geometry {
        Geometry::new(x, y, w, h)
    }

    fn is_disjoint(r: &Region) -> bool {
        let rects = r.rects();
        for i in 0..rects.len() {
            for j in (i + 1)..rects.len() {
                if rects[i].intersects(rects[j]) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn union_with_self_is_identity() {
        let a = Region::from_geometries(vec![g(0, 0, 10, 10), g(5, 5, 10, 10)]);
        assert_eq!(&a | &a, a);
        assert_eq!(a.area(), 175);
    }

    #[test]
    fn intersection_with_empty_is_empty() {
        let a = Region::from(g(0, 0, 10, 10));
        assert!((&a & &Region::new()).is_empty());
    }

    #[test]
    fn symmetric_difference_with_self_is_empty() {
        let a = Region::from_geometries(vec![g(0, 0, 10, 10), g(20, 20, 5, 5)]);
        assert!((&a ^ &a).is_empty());
    }

    #[test]
    fn symmetric_difference_keeps_both_sides() {
        let a = Region::from(g(0, 0, 10, 10));
        let b = Region::from(g(5, 0, 10, 10));
        let x = &a ^ &b;
        assert_eq!(x.area(), 100);
        assert!(x.contains_point(Point::new(1.0, 1.0)));
        assert!(x.contains_point(Point::new(12.0, 1.0)));
        assert!(!x.contains_point(Point::new(7.0, 1.0)));
        assert!(is_disjoint(&x));
    }

    #[test]
    fn union_keeps_rects_disjoint() {
        let mut r = Region::new();
        r |= g(0, 0, 10, 10);
        r |= g(5, 5, 10, 10);
        r |= g(-5, 2, 30, 3);
        assert!(is_disjoint(&r));
        assert_eq!(r.extents(), g(-5, 0, 30, 15));
    }

    #[test]
    fn subtract_hole_leaves_frame() {
        let mut r = Region::from(g(0, 0, 10, 10));
        r -= g(2, 2, 6, 6);
        assert_eq!(r.area(), 64);
        assert!(!r.contains_point(Point::new(5.0, 5.0)));
        assert!(is_disjoint(&r));
    }

    #[test]
    fn dilate_then_clip_stays_inside_box() {
        let mut r = Region::from_geometries(vec![g(0, 0, 10, 10), g(90, 90, 10, 10)]);
        r.expand_edges(15);
        let bbox = g(0, 0, 100, 100);
        r.intersect_geometry(bbox);
        assert!(r.iter().all(|rect| bbox.contains(rect)));
        assert!(is_disjoint(&r));
    }

    #[test]
    fn erosion_of_split_rect_matches_whole_rect() {
        // Same pixels, two decompositions.
        let whole = Region::from(g(0, 0, 20, 10));
        let split = Region::from_geometries(vec![g(0, 0, 10, 10), g(10, 0, 10, 10)]);
        let mut a = whole.clone();
        let mut b = split.clone();
        a.expand_edges(-2);
        b.expand_edges(-2);
        assert_eq!(a, Region::from(g(2, 2, 16, 6)));
        assert_eq!(a, b);
    }

    #[test]
    fn erosion_past_size_empties() {
        let mut r = Region::from(g(0, 0, 4, 4));
        r.expand_edges(-3);
        assert!(r.is_empty());
    }

    #[test]
    fn equality_ignores_decomposition() {
        let a = Region::from_geometries(vec![g(0, 0, 10, 5), g(0, 5, 10, 5)]);
        let b = Region::from(g(0, 0, 10, 10));
        assert_eq!(a, b);
        assert_ne!(a, Region::from(g(0, 0, 10, 9)));
    }

    #[test]
    fn coalesce_merges_stacked_strips() {
        let mut a = Region::from_geometries(vec![g(0, 0, 10, 5), g(0, 5, 10, 5)]);
        a.coalesce();
        assert_eq!(a.rects(), &[g(0, 0, 10, 10)]);
    }

    #[test]
    fn contains_geometry_across_rects() {
        let a = Region::from_geometries(vec![g(0, 0, 10, 5), g(0, 5, 10, 5)]);
        assert!(a.contains_geometry(g(2, 2, 6, 6)));
        assert!(!a.contains_geometry(g(2, 2, 10, 6)));
    }
}
