// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Premultiplied ARGB pixel storage.

use strata_core::geometry::Geometry;
use strata_render::Color;

/// Converts a straight-alpha color to a premultiplied `0xAARRGGBB` pixel.
#[must_use]
pub fn pack(color: Color) -> u32 {
    let a = color.a.clamp(0.0, 1.0);
    argb(
        channel(a),
        channel(color.r * a),
        channel(color.g * a),
        channel(color.b * a),
    )
}

/// Assembles a pixel from premultiplied channels.
#[inline]
#[must_use]
pub const fn argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Splits a pixel into `[a, r, g, b]`.
#[inline]
#[must_use]
pub const fn channels(pixel: u32) -> [u8; 4] {
    pixel.to_be_bytes()
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "value is clamped to 0..=255 before the cast"
)]
fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// Scales every channel of a premultiplied pixel by `alpha`.
pub(crate) fn fade(pixel: u32, alpha: f32) -> u32 {
    if alpha >= 1.0 {
        return pixel;
    }
    let [a, r, g, b] = channels(pixel);
    let f = |c: u8| channel(f32::from(c) / 255.0 * alpha);
    argb(f(a), f(r), f(g), f(b))
}

/// Porter-Duff source-over for premultiplied pixels.
pub(crate) fn over(src: u32, dst: u32) -> u32 {
    let [sa, ..] = channels(src);
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let inv = 255 - u32::from(sa);
    let s = channels(src);
    let d = channels(dst);
    let mut out = [0_u8; 4];
    for i in 0..4 {
        let blended = u32::from(s[i]) + (u32::from(d[i]) * inv + 127) / 255;
        out[i] = u8::try_from(blended.min(255)).unwrap_or(u8::MAX);
    }
    u32::from_be_bytes(out)
}

/// A rectangular block of premultiplied `0xAARRGGBB` pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pixmap {
    width: i32,
    height: i32,
    pixels: Vec<u32>,
}

impl Pixmap {
    /// A transparent pixmap. Negative sizes are treated as zero.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self::filled(width, height, 0)
    }

    /// A pixmap with every pixel set to `pixel`.
    #[must_use]
    pub fn filled(width: i32, height: i32, pixel: u32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let len = width.unsigned_abs() as usize * height.unsigned_abs() as usize;
        Self {
            width,
            height,
            pixels: vec![pixel; len],
        }
    }

    /// A pixmap whose pixels are produced by `f(x, y)`.
    #[must_use]
    pub fn from_fn(width: i32, height: i32, mut f: impl FnMut(i32, i32) -> u32) -> Self {
        let mut pixmap = Self::new(width, height);
        for y in 0..pixmap.height {
            for x in 0..pixmap.width {
                pixmap.set(x, y, f(x, y));
            }
        }
        pixmap
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// The whole pixmap as a box.
    #[must_use]
    pub const fn bounds(&self) -> Geometry {
        Geometry::new(0, 0, self.width, self.height)
    }

    /// Raw pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let row = y.unsigned_abs() as usize * self.width.unsigned_abs() as usize;
        Some(row + x.unsigned_abs() as usize)
    }

    /// Reads a pixel, or `None` outside the pixmap.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Writes a pixel. Writes outside the pixmap are dropped.
    pub fn set(&mut self, x: i32, y: i32, pixel: u32) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = pixel;
        }
    }

    /// Sets every pixel of `rect` to `pixel`.
    pub fn fill(&mut self, rect: Geometry, pixel: u32) {
        let Some(rect) = rect.intersection(self.bounds()) else {
            return;
        };
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.set(x, y, pixel);
            }
        }
    }

    /// Replaces the pixels of `rect` with the average of the
    /// `(2 * radius + 1)²` window around each of them.
    ///
    /// Windows are clipped to the pixmap and read the pixels as they were
    /// before the call, including pixels outside `rect`.
    pub fn box_blur(&mut self, rect: Geometry, radius: u32) {
        let Some(rect) = rect.intersection(self.bounds()) else {
            return;
        };
        let r = i32::try_from(radius.min(1 << 16)).unwrap_or(0);
        if r == 0 {
            return;
        }

        // Horizontal sums for every row a window can reach.
        let rows_top = (rect.y - r).max(0);
        let rows_bottom = (rect.bottom() + r).min(self.height);
        let width = rect.width.unsigned_abs() as usize;
        let rows = (rows_bottom - rows_top).unsigned_abs() as usize;
        let mut sums: Vec<[u32; 4]> = Vec::with_capacity(width * rows);
        let mut counts_x: Vec<u32> = Vec::with_capacity(width);
        for x in rect.x..rect.right() {
            let lo = (x - r).max(0);
            let hi = (x + r + 1).min(self.width);
            counts_x.push((hi - lo).unsigned_abs());
        }
        for y in rows_top..rows_bottom {
            for x in rect.x..rect.right() {
                let mut acc = [0_u32; 4];
                for sx in (x - r).max(0)..(x + r + 1).min(self.width) {
                    let p = channels(self.get(sx, y).unwrap_or(0));
                    for c in 0..4 {
                        acc[c] += u32::from(p[c]);
                    }
                }
                sums.push(acc);
            }
        }

        for y in rect.y..rect.bottom() {
            let lo = (y - r).max(0);
            let hi = (y + r + 1).min(self.height);
            let count_y = (hi - lo).unsigned_abs();
            for (col, x) in (rect.x..rect.right()).enumerate() {
                let mut acc = [0_u32; 4];
                for sy in lo..hi {
                    let row = (sy - rows_top).unsigned_abs() as usize;
                    let s = sums[row * width + col];
                    for c in 0..4 {
                        acc[c] += s[c];
                    }
                }
                let n = counts_x[col] * count_y;
                let mut out = [0_u8; 4];
                for c in 0..4 {
                    out[c] = u8::try_from((acc[c] + n / 2) / n).unwrap_or(u8::MAX);
                }
                self.set(x, y, u32::from_be_bytes(out));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: u32 = 0xFFFF_FFFF;
    const BLACK: u32 = 0xFF00_0000;

    #[test]
    fn pack_premultiplies() {
        assert_eq!(pack(Color::BLACK), BLACK);
        assert_eq!(pack(Color::TRANSPARENT), 0);
        assert_eq!(pack(Color::rgba(0.0, 0.0, 1.0, 0.5)), argb(128, 0, 0, 128));
    }

    #[test]
    fn over_blends_translucent_source() {
        let src = argb(128, 0, 0, 128);
        assert_eq!(over(src, WHITE), argb(255, 127, 127, 255));
        assert_eq!(over(BLACK, WHITE), BLACK);
        assert_eq!(over(0, WHITE), WHITE);
    }

    #[test]
    fn fade_scales_all_channels() {
        assert_eq!(fade(WHITE, 0.5), argb(128, 128, 128, 128));
        assert_eq!(fade(WHITE, 1.0), WHITE);
    }

    #[test]
    fn out_of_bounds_access_is_ignored() {
        let mut p = Pixmap::new(2, 2);
        p.set(5, 5, WHITE);
        assert_eq!(p.get(5, 5), None);
        assert!(p.pixels().iter().all(|&px| px == 0));
        assert_eq!(Pixmap::new(-3, 4).bounds(), Geometry::new(0, 0, 0, 4));
    }

    #[test]
    fn blur_keeps_uniform_areas() {
        let mut p = Pixmap::filled(10, 10, WHITE);
        p.box_blur(Geometry::new(0, 0, 10, 10), 3);
        assert!(p.pixels().iter().all(|&px| px == WHITE));
    }

    #[test]
    fn blur_reads_outside_rect_but_writes_inside_only() {
        // Left half black, right half white.
        let mut p = Pixmap::from_fn(8, 1, |x, _| if x < 4 { BLACK } else { WHITE });
        p.box_blur(Geometry::new(4, 0, 1, 1), 1);
        // Window of x = 4 is x = 3..=5: one black, two white.
        assert_eq!(p.get(4, 0), Some(argb(255, 170, 170, 170)));
        assert_eq!(p.get(3, 0), Some(BLACK));
        assert_eq!(p.get(5, 0), Some(WHITE));
    }

    #[test]
    fn blur_windows_are_clipped_at_the_edges() {
        let mut p = Pixmap::from_fn(3, 1, |x, _| if x == 0 { WHITE } else { BLACK });
        p.box_blur(Geometry::new(0, 0, 1, 1), 1);
        // Window of x = 0 is x = 0..=1 once clipped.
        assert_eq!(p.get(0, 0), Some(argb(255, 128, 128, 128)));
    }
}
