//! Reproducible description of a run.
//!
//! A [`Seed`] captures everything needed to replay a simulation: field size,
//! parameters, PRNG seed, tick count, and the probe trajectories to start.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::FieldError;

/// Which probe collection a seeded trajectory belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Follows the field itself.
    Traced,
    /// Follows the field rotated by 90°.
    Potential,
}

/// Start position of a probe trajectory, center-relative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeSeed {
    pub kind: ProbeKind,
    pub x: f64,
    pub y: f64,
}

impl ProbeSeed {
    pub fn new(kind: ProbeKind, x: f64, y: f64) -> Self {
        Self { kind, x, y }
    }

    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// Reproducible run description.
///
/// Two identical seeds produce bit-identical point positions, trails and
/// trajectories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Seed {
    pub width: usize,
    pub height: usize,
    pub params: serde_json::Value,
    pub seed: u64,
    pub steps: usize,
    #[serde(default)]
    pub probes: Vec<ProbeSeed>,
}

impl Seed {
    /// Creates a seed with default params (`{}`), zero steps and no probes.
    pub fn new(width: usize, height: usize, seed: u64) -> Self {
        Self {
            width,
            height,
            params: serde_json::Value::Object(serde_json::Map::new()),
            seed,
            steps: 0,
            probes: Vec::new(),
        }
    }

    /// Adds a probe trajectory to start before the first tick.
    pub fn with_probe(mut self, kind: ProbeKind, x: f64, y: f64) -> Self {
        self.probes.push(ProbeSeed::new(kind, x, y));
        self
    }

    /// Checks for non-zero dimensions whose pixel count fits in `usize`.
    pub fn validate(&self) -> Result<(), FieldError> {
        let invalid = || FieldError::InvalidDimensions {
            width: self.width as f64,
            height: self.height as f64,
        };
        if self.width == 0 || self.height == 0 {
            return Err(invalid());
        }
        self.width.checked_mul(self.height).ok_or_else(invalid)?;
        for probe in &self.probes {
            if !probe.position().is_finite() {
                return Err(FieldError::invalid_param(
                    "probes",
                    format!("probe start must be finite, got ({}, {})", probe.x, probe.y),
                ));
            }
        }
        Ok(())
    }

    /// Validates the seed and builds the configuration it describes.
    pub fn config(&self) -> Result<SimConfig, FieldError> {
        self.validate()?;
        SimConfig::from_json(self.width, self.height, &self.params)
    }
}
