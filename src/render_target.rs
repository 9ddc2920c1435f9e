use std::sync::atomic::{AtomicU64, Ordering};

use bytemuck::cast_slice;
use glam::Vec2;
use rayon::prelude::*;

use crate::texture::Texture;
use crate::triangle::ScreenTriangle;

/// Map an `f32` onto a `u32` whose unsigned order matches the float order
/// (for every non-NaN value, including the infinities).
#[inline(always)]
fn depth_key(depth: f32) -> u32 {
    let bits = depth.to_bits();
    if bits & 0x8000_0000 != 0 { !bits } else { bits | 0x8000_0000 }
}

#[inline(always)]
fn key_depth(key: u32) -> f32 {
    let bits = if key & 0x8000_0000 != 0 { key & 0x7FFF_FFFF } else { !key };
    f32::from_bits(bits)
}

/// Row-major cell index, computed in `usize` so large targets don't wrap.
#[inline(always)]
fn cell_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

#[inline(always)]
fn pack(key: u32, color: u32) -> u64 {
    ((key as u64) << 32) | color as u64
}

/// Colour buffer plus inverse-depth buffer shared by every rasterization task
/// of a frame.
///
/// Each pixel is one `AtomicU64`: the high half holds the inverse depth
/// (larger is nearer), the low half the RGBA colour, so depth and colour are
/// always published together. A packed value only replaces a smaller one,
/// which makes the final frame independent of the order triangles arrive in
/// (exact depth ties go to the larger colour value).
pub struct RenderTarget {
    width: u32,
    height: u32,
    clear_color: [u8; 4],
    cells: Vec<AtomicU64>,
    resolved: Vec<u32>,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "render target must not be empty");
        let size = width as usize * height as usize;
        let clear_color = [0, 0, 0, 255];
        let empty = pack(depth_key(f32::NEG_INFINITY), u32::from_ne_bytes(clear_color));
        Self {
            width,
            height,
            clear_color,
            cells: (0..size).map(|_| AtomicU64::new(empty)).collect(),
            resolved: vec![u32::from_ne_bytes(clear_color); size],
        }
    }

    pub fn with_clear_color(mut self, color: [u8; 4]) -> Self {
        self.clear_color = color;
        self.clear();
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row of the resolved pixel buffer.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Reset every pixel to the clear colour and depth to `-inf`. Buffers are
    /// reused, never reallocated.
    pub fn clear(&mut self) {
        let empty = pack(depth_key(f32::NEG_INFINITY), u32::from_ne_bytes(self.clear_color));
        self.cells.par_iter_mut().for_each(|cell| *cell.get_mut() = empty);
    }

    #[inline(always)]
    fn index(&self, x: u32, y: u32) -> usize {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        cell_index(self.width, x, y)
    }

    /// Inverse depth at a pixel, `-inf` if nothing was drawn there.
    pub fn depth(&self, x: u32, y: u32) -> f32 {
        key_depth((self.cells[self.index(x, y)].load(Ordering::Acquire) >> 32) as u32)
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        (self.cells[self.index(x, y)].load(Ordering::Acquire) as u32).to_ne_bytes()
    }

    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        self.depth(x, y) > f32::NEG_INFINITY
    }

    /// Copy the colours out of the packed cells and return them as RGBA
    /// bytes, `stride()` bytes per row.
    pub fn resolve(&mut self) -> &[u8] {
        self.resolved
            .par_iter_mut()
            .zip(self.cells.par_iter_mut())
            .for_each(|(out, cell)| *out = *cell.get_mut() as u32);
        cast_slice(self.resolved.as_slice())
    }

    /// Depth-tested write of one pixel. The colour is only computed if the
    /// unsynchronized first look says this fragment can still win; the
    /// compare-and-swap loop then re-checks against the latest value.
    #[inline(always)]
    pub fn write_pixel(&self, index: usize, inv_depth: f32, color: impl FnOnce() -> [u8; 4]) -> bool {
        let cell = &self.cells[index];
        let key = depth_key(inv_depth);
        let mut current = cell.load(Ordering::Relaxed);
        if key < (current >> 32) as u32 {
            return false;
        }
        let new = pack(key, u32::from_ne_bytes(color()));
        loop {
            if new <= current {
                return false;
            }
            match cell.compare_exchange_weak(current, new, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Scanline fill of one screen-space triangle.
    ///
    /// Triangles must be clockwise in world space, which after the viewport's
    /// Y flip makes all three edge tests below non-negative inside.
    pub fn render_triangle(&self, tri: &ScreenTriangle, texture: &Texture) {
        let [p1, p2, p3] = tri.points;
        let [t1, t2, t3] = tri.texels;

        let min_x = p1.x.min(p2.x).min(p3.x).floor().max(0.0);
        let min_y = p1.y.min(p2.y).min(p3.y).floor().max(0.0);
        let max_x = p1.x.max(p2.x).max(p3.x).floor().min((self.width - 1) as f32);
        let max_y = p1.y.max(p2.y).max(p3.y).floor().min((self.height - 1) as f32);
        if !(min_x <= max_x && min_y <= max_y) {
            return;
        }
        let (min_x, min_y, max_x, max_y) = (min_x as u32, min_y as u32, max_x as u32, max_y as u32);

        let p1_p2 = p1 - p2;
        let p3_p2 = p3 - p2;
        let p2_p3 = p2 - p3;
        let p3_p1 = p3 - p1;

        // barycentric coordinates by Cramer's rule
        let d00 = p1_p2.x * p1_p2.x + p1_p2.y * p1_p2.y;
        let d01 = p1_p2.x * p3_p2.x + p1_p2.y * p3_p2.y;
        let d11 = p3_p2.x * p3_p2.x + p3_p2.y * p3_p2.y;
        let denom = d00 * d11 - d01 * d01;

        // plane through the three points, used to interpolate depth
        let a = p1_p2.y * p3_p2.z - p1_p2.z * p3_p2.y;
        let b = p1_p2.z * p3_p2.x - p1_p2.x * p3_p2.z;
        let c = p1_p2.x * p3_p2.y - p1_p2.y * p3_p2.x;
        if denom == 0.0 || c == 0.0 {
            return;
        }
        let inv_denom = 1.0 / denom;

        let inside = |p: Vec2| {
            let p_p1 = p - p1.truncate();
            let p_p2 = p - p2.truncate();
            let p_p3 = p - p3.truncate();
            // short-circuits on the first failing edge
            p_p1.x * p3_p1.y - p_p1.y * p3_p1.x >= 0.0
                && p_p2.x * p1_p2.y - p_p2.y * p1_p2.x >= 0.0
                && p_p3.x * p2_p3.y - p_p3.y * p2_p3.x >= 0.0
        };

        for y in min_y..=max_y {
            let py = y as f32 + 0.5;
            let at = |x: u32| Vec2::new(x as f32 + 0.5, py);

            let Some(start_x) = (min_x..=max_x).find(|&x| inside(at(x))) else {
                continue;
            };
            let end_x = (start_x..=max_x).rev().find(|&x| inside(at(x))).unwrap_or(start_x);

            let row = cell_index(self.width, 0, y);
            for x in start_x..=end_x {
                let p = at(x);
                let dx = p.x - p2.x;
                let dy = p.y - p2.y;
                // one division instead of interpolating z and then inverting it
                let inv_z = -c / (a * dx + b * dy - c * p2.z);

                self.write_pixel(row + x as usize, inv_z, || {
                    let d20 = dx * p1_p2.x + dy * p1_p2.y;
                    let d21 = dx * p3_p2.x + dy * p3_p2.y;
                    let v = (d11 * d20 - d01 * d21) * inv_denom; // weight of p1
                    let w = (d00 * d21 - d01 * d20) * inv_denom; // weight of p3
                    let u = 1.0 - v - w; // weight of p2

                    let inv_corr = 1.0 / (t1.z * v + t2.z * u + t3.z * w);
                    let tex_u = (t1.x * v + t2.x * u + t3.x * w) * inv_corr;
                    let tex_v = (t1.y * v + t2.y * u + t3.y * w) * inv_corr;

                    let [r, g, b] = texture.sample(tex_u, tex_v);
                    let shade = |channel: u8| (channel as f32 * tri.light) as u8;
                    [shade(r), shade(g), shade(b), 255]
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    /// Upper-left half of a square with side `size`, wound the way the
    /// rasterizer expects.
    fn upper_left(size: f32, z: f32, light: f32) -> ScreenTriangle {
        ScreenTriangle {
            points: [Vec3::new(0.0, size, z), Vec3::new(0.0, 0.0, z), Vec3::new(size, 0.0, z)],
            texels: [Vec3::new(0.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 1.0)],
            light,
        }
    }

    #[test]
    fn cell_index_does_not_wrap_on_large_targets() {
        assert_eq!(cell_index(10, 3, 2), 23);
        // 100_000 * 50_000 is past u32::MAX
        assert_eq!(cell_index(100_000, 5, 50_000), 5_000_000_005);
    }

    #[test]
    fn depth_keys_preserve_order() {
        let values = [f32::NEG_INFINITY, -1.0e9, -1.0, -0.0, 0.0, 1.0e-30, 0.5, 1.0, 2.0, 1.0e9, f32::INFINITY];
        for pair in values.windows(2) {
            assert!(depth_key(pair[0]) <= depth_key(pair[1]), "{pair:?}");
        }
        for v in values {
            assert_eq!(key_depth(depth_key(v)), v);
        }
    }

    #[test]
    fn cleared_target_is_empty() {
        let mut target = RenderTarget::new(4, 3).with_clear_color([1, 2, 3, 255]);
        assert_eq!(target.depth(3, 2), f32::NEG_INFINITY);
        assert_eq!(target.pixel(0, 0), [1, 2, 3, 255]);
        assert_eq!(target.stride(), 16);
        let bytes = target.resolve();
        assert_eq!(bytes.len(), 4 * 3 * 4);
        assert_eq!(&bytes[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn fills_covered_pixel_centres_only() {
        let target = RenderTarget::new(10, 10);
        let texture = Texture::solid(200, 100, 50);
        target.render_triangle(&upper_left(10.0, 0.5, 1.0), &texture);

        for y in 0..10 {
            for x in 0..10 {
                // pixel centre (x+0.5, y+0.5) lies under the diagonal x + y = 10
                let expected = x + y + 1 <= 10;
                assert_eq!(target.is_covered(x, y), expected, "pixel ({x}, {y})");
            }
        }
        assert_eq!(target.pixel(1, 1), [200, 100, 50, 255]);
        assert!((target.depth(1, 1) - 2.0).abs() < 1e-5);
    }

    #[test]
    fn light_scales_colour() {
        let target = RenderTarget::new(10, 10);
        target.render_triangle(&upper_left(10.0, 0.5, 0.5), &Texture::solid(200, 100, 50));
        assert_eq!(target.pixel(0, 0), [100, 50, 25, 255]);
    }

    #[test]
    fn nearer_triangle_wins_in_either_order() {
        let near_tex = Texture::solid(255, 0, 0);
        let far_tex = Texture::solid(0, 0, 255);
        let near = upper_left(10.0, 0.25, 1.0);
        let far = upper_left(10.0, 0.75, 1.0);

        for near_first in [true, false] {
            let target = RenderTarget::new(10, 10);
            if near_first {
                target.render_triangle(&near, &near_tex);
                target.render_triangle(&far, &far_tex);
            } else {
                target.render_triangle(&far, &far_tex);
                target.render_triangle(&near, &near_tex);
            }
            assert_eq!(target.pixel(2, 2), [255, 0, 0, 255]);
            assert!((target.depth(2, 2) - 4.0).abs() < 1e-4);
        }
    }

    #[test]
    fn texture_coordinates_follow_the_triangle() {
        // red for u < 0.5, green above
        let red = [255, 0, 0];
        let green = [0, 255, 0];
        let texture = Texture::from_rgb(5, 1, [red, red, green, green, green].concat());
        let target = RenderTarget::new(100, 100);
        target.render_triangle(&upper_left(100.0, 0.5, 1.0), &texture);
        assert_eq!(target.pixel(5, 5), [255, 0, 0, 255]);
        assert_eq!(target.pixel(80, 5), [0, 255, 0, 255]);
    }

    #[test]
    fn perspective_correction_uses_inverse_w() {
        // u runs 0 -> 1 from the left to the right edge, but the right edge is
        // 3x further away, so the screen midpoint maps to u = 1/4
        let tri = ScreenTriangle {
            points: [Vec3::new(0.0, 100.0, 0.5), Vec3::new(0.0, 0.0, 0.5), Vec3::new(100.0, 0.0, 0.5)],
            texels: [Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0 / 3.0, 0.0, 1.0 / 3.0)],
            light: 1.0,
        };
        // texel index is floor(4u)
        let texture = Texture::from_rgb(5, 1, vec![10, 0, 0, 20, 0, 0, 30, 0, 0, 40, 0, 0, 50, 0, 0]);
        let target = RenderTarget::new(100, 100);
        target.render_triangle(&tri, &texture);
        // screen x = 40 on the top row: affine u would be 0.4, corrected u = 0.4 / (0.4 + 3 * 0.6) ~ 0.18
        assert_eq!(target.pixel(40, 0), [10, 0, 0, 255]);
        // x = 95: corrected u ~ 0.88 -> texel 3
        assert_eq!(target.pixel(95, 0), [40, 0, 0, 255]);
    }

    #[test]
    fn off_screen_and_degenerate_triangles_draw_nothing() {
        let target = RenderTarget::new(10, 10);
        let texture = Texture::solid(255, 255, 255);
        let mut off = upper_left(10.0, 0.5, 1.0);
        for p in &mut off.points {
            p.x += 50.0;
        }
        target.render_triangle(&off, &texture);
        let flat = ScreenTriangle {
            points: [Vec3::new(0.0, 0.0, 0.5), Vec3::new(5.0, 5.0, 0.5), Vec3::new(10.0, 10.0, 0.5)],
            ..upper_left(10.0, 0.5, 1.0)
        };
        target.render_triangle(&flat, &texture);
        for y in 0..10 {
            for x in 0..10 {
                assert!(!target.is_covered(x, y));
            }
        }
    }

    #[test]
    fn equal_depth_ties_are_order_independent() {
        let a = RenderTarget::new(1, 1);
        a.write_pixel(0, 1.0, || [10, 0, 0, 255]);
        a.write_pixel(0, 1.0, || [20, 0, 0, 255]);
        let b = RenderTarget::new(1, 1);
        b.write_pixel(0, 1.0, || [20, 0, 0, 255]);
        b.write_pixel(0, 1.0, || [10, 0, 0, 255]);
        assert_eq!(a.pixel(0, 0), b.pixel(0, 0));
    }

    #[test]
    fn rejected_fragments_skip_shading() {
        let target = RenderTarget::new(1, 1);
        assert!(target.write_pixel(0, 5.0, || [1, 1, 1, 255]));
        let wrote = target.write_pixel(0, 1.0, || panic!("colour computed for a hidden fragment"));
        assert!(!wrote);
    }
}
