//! Field evaluation: the displacement a source set imposes at a position.
//!
//! Each source contributes `polarity * strength / (d² + 1) * (p - s)`. The
//! `+ 1` softens the singularity at short range. The two genuinely singular
//! cases are classified instead of clamped, so the lifecycle layer sees an
//! explicit event:
//!
//! - exact coincidence with a source is [`Status::Degenerate`];
//! - entering an attractor's removal radius is [`Status::Collided`], with the
//!   displacement pointing exactly at the attractor.
//!
//! A repeller's removal disc is force-free: it contributes nothing there.

use fieldlines_core::config::Polarity;
use glam::DVec2;

use crate::source::SourceSet;

/// Classification of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Inside an attractor's removal radius.
    Collided,
    /// Exactly on a source; the force direction is undefined.
    Degenerate,
}

/// Result of evaluating the field at one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub status: Status,
    /// Displacement to add to the position (unit-step Euler). For
    /// `Collided` this is the vector to the attractor; for `Degenerate` it is zero.
    pub displacement: DVec2,
}

impl Evaluation {
    /// The displacement rotated by -90°: `(dx, dy) -> (dy, -dx)`.
    pub fn orthogonal(&self) -> DVec2 {
        DVec2::new(self.displacement.y, -self.displacement.x)
    }
}

/// Evaluates the field of a borrowed [`SourceSet`].
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    sources: &'a SourceSet,
    gain: f64,
    removal_radius_sq: f64,
}

impl<'a> Evaluator<'a> {
    pub fn new(sources: &'a SourceSet, gain: f64, removal_radius: f64) -> Self {
        Self {
            sources,
            gain,
            removal_radius_sq: removal_radius * removal_radius,
        }
    }

    /// Sums the contribution of every source at `p`, stopping early on a
    /// degenerate or collided source. Sources are visited in set order.
    pub fn evaluate(&self, p: DVec2) -> Evaluation {
        let mut sum = DVec2::ZERO;
        for source in self.sources {
            let offset = p - source.position();
            let d2 = offset.length_squared();
            if d2 == 0.0 {
                return Evaluation {
                    status: Status::Degenerate,
                    displacement: DVec2::ZERO,
                };
            }
            if d2 < self.removal_radius_sq {
                match source.polarity() {
                    Polarity::Attractor => {
                        return Evaluation {
                            status: Status::Collided,
                            displacement: -offset,
                        }
                    }
                    Polarity::Repeller => continue,
                }
            }
            let m = source.polarity().sign() * source.strength() / (d2 + 1.0);
            sum += m * offset;
        }
        Evaluation {
            status: Status::Ok,
            displacement: self.gain * sum,
        }
    }
}
