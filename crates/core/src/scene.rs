//! Read-only snapshot of everything a renderer draws after a tick.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// One connected run of center-relative positions, oldest first.
pub type Polyline = Vec<DVec2>;

/// Polylines produced by one tick, in center-relative coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    /// One trail per live point, in point-key order.
    pub trails: Vec<Polyline>,
    pub traced: Vec<Polyline>,
    pub potential: Vec<Polyline>,
    pub finished_traced: Vec<Polyline>,
    pub finished_potential: Vec<Polyline>,
}

impl Scene {
    /// Translates a center-relative position to screen space (origin top-left).
    pub fn to_screen(&self, p: DVec2) -> DVec2 {
        p + DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Total number of line segments across every polyline.
    pub fn segment_count(&self) -> usize {
        [
            &self.trails,
            &self.traced,
            &self.potential,
            &self.finished_traced,
            &self.finished_potential,
        ]
        .iter()
        .flat_map(|group| group.iter())
        .map(|line| line.len().saturating_sub(1))
        .sum()
    }
}
