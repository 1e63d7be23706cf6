//! Centered rectangles used for spawning points and detecting escapes.

use fieldlines_core::config::SimConfig;
use fieldlines_core::prng::Xorshift64;
use glam::DVec2;

/// Axis-aligned rectangle centered on the origin, stored as half extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub half: DVec2,
}

impl Rect {
    pub fn new(half_width: f64, half_height: f64) -> Self {
        Self {
            half: DVec2::new(half_width, half_height),
        }
    }

    /// The padded field new points are placed in.
    pub fn spawn(config: &SimConfig) -> Self {
        Self::new(
            (config.width + config.padding_x) / 2.0,
            (config.height + config.padding_y) / 2.0,
        )
    }

    /// The field plus margin; `None` when `limit_distance` is off.
    pub fn escape(config: &SimConfig) -> Option<Self> {
        config.limit_distance.then(|| {
            Self::new(
                config.width / 2.0 + config.margin_x,
                config.height / 2.0 + config.margin_y,
            )
        })
    }

    /// Inclusive containment; NaN coordinates are outside.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x.abs() <= self.half.x && p.y.abs() <= self.half.y
    }

    /// Uniform sample inside the rectangle.
    pub fn sample(&self, rng: &mut Xorshift64) -> DVec2 {
        rng.next_in_rect(self.half)
    }
}

/// True when `p` has left `escape`. Always false without an escape rectangle.
pub(crate) fn escaped(escape: Option<Rect>, p: DVec2) -> bool {
    escape.is_some_and(|r| !r.contains(p))
}
