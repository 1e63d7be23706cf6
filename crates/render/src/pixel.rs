//! Persistent RGBA8 raster that scenes are drawn into tick after tick.
//!
//! Always available (no feature gate); only the PNG encoder needs `image`.

use fieldlines_core::error::FieldError;
use fieldlines_core::scene::{Polyline, Scene};
use glam::DVec2;
use tracing::trace;

use crate::color::{direction_color, Srgb};
use crate::style::Style;

/// Row-major RGBA8 pixel buffer, origin top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Creates a frame filled with `background`.
    ///
    /// Returns `FieldError::InvalidDimensions` for a zero side or a buffer
    /// size that overflows `usize`.
    pub fn new(width: usize, height: usize, background: Srgb) -> Result<Self, FieldError> {
        let invalid = || FieldError::InvalidDimensions {
            width: width as f64,
            height: height as f64,
        };
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(invalid)?;
        let mut data = Vec::with_capacity(len);
        let px = background.to_rgba8();
        for _ in 0..width * height {
            data.extend_from_slice(&px);
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA8 bytes, `width * height * 4` long.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Blends `color` over the whole frame with the given alpha.
    pub fn fade(&mut self, color: Srgb, alpha: u8) {
        if alpha == 0 {
            return;
        }
        let src = color.to_rgba8();
        let a = alpha as u32;
        for px in self.data.chunks_exact_mut(4) {
            for c in 0..3 {
                let dst = px[c] as u32;
                px[c] = ((src[c] as u32 * a + dst * (255 - a) + 127) / 255) as u8;
            }
            px[3] = 255;
        }
    }

    fn put(&mut self, x: i64, y: i64, rgba: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    fn stamp(&mut self, x: i64, y: i64, size: u32, rgba: [u8; 4]) {
        let lo = -((size as i64 - 1) / 2);
        let hi = lo + size as i64;
        for dy in lo..hi {
            for dx in lo..hi {
                self.put(x + dx, y + dy, rgba);
            }
        }
    }

    /// Draws a screen-space segment with a square brush of side `size`.
    ///
    /// The segment is clipped to the frame (grown by the brush) first, so
    /// far-off or non-finite endpoints cost nothing.
    pub fn draw_line(&mut self, a: DVec2, b: DVec2, color: Srgb, size: u32) {
        if size == 0 {
            return;
        }
        let pad = size as f64;
        let min = DVec2::splat(-pad);
        let max = DVec2::new(self.width as f64 - 1.0 + pad, self.height as f64 - 1.0 + pad);
        let Some((a, b)) = clip_segment(a, b, min, max) else {
            return;
        };
        let rgba = color.to_rgba8();
        let (mut x0, mut y0) = (a.x.round() as i64, a.y.round() as i64);
        let (x1, y1) = (b.x.round() as i64, b.y.round() as i64);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp(x0, y0, size, rgba);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn draw_polyline(&mut self, scene: &Scene, line: &Polyline, color: Srgb, size: u32) {
        for pair in line.windows(2) {
            self.draw_line(scene.to_screen(pair[0]), scene.to_screen(pair[1]), color, size);
        }
    }

    /// Fades the frame, then draws point trails, live probes of both kinds
    /// and finished traced probes.
    pub fn draw_scene(&mut self, scene: &Scene, style: &Style) {
        self.fade(style.background, style.fade);

        for trail in &scene.trails {
            for pair in trail.windows(2) {
                let color = if style.hue_by_direction {
                    direction_color(pair[0], pair[1])
                } else {
                    style.point_color
                };
                self.draw_line(
                    scene.to_screen(pair[0]),
                    scene.to_screen(pair[1]),
                    color,
                    style.point_width,
                );
            }
        }
        for line in scene.traced.iter().chain(&scene.potential) {
            self.draw_polyline(scene, line, style.trace_color, style.trace_width);
        }
        for line in &scene.finished_traced {
            self.draw_polyline(scene, line, style.expired_color, style.trace_width);
        }
        trace!(segments = scene.segment_count(), "scene drawn");
    }
}

/// Liang–Barsky clip of segment `a`-`b` against the box `[min, max]`.
fn clip_segment(a: DVec2, b: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    if !(a.is_finite() && b.is_finite()) {
        return None;
    }
    let d = b - a;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }
    Some((a + d * t0, a + d * t1))
}
