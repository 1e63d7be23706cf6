//! The `Engine` trait: the seam between a simulation and the collaborators
//! that drive it (input) or draw it (rendering).
//!
//! The trait is object-safe so drivers can hold a `Box<dyn Engine>`.

use glam::DVec2;
use serde_json::Value;

use crate::error::FieldError;
use crate::scene::Scene;
use crate::seed::ProbeKind;

/// A tick-driven field simulation.
pub trait Engine {
    /// Advance the simulation by one tick.
    ///
    /// Per-tick anomalies are lifecycle events, not errors; an `Err` here
    /// means the engine itself is in an unusable state.
    fn step(&mut self) -> Result<(), FieldError>;

    /// Start a new probe trajectory at a center-relative position.
    fn seed_probe(&mut self, kind: ProbeKind, at: DVec2);

    /// Everything a renderer needs to draw the current state.
    fn scene(&self) -> Scene;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all available parameters.
    fn param_schema(&self) -> Value;
}
