//! Tick orchestration: one tick advances the point swarm, then traced
//! probes, then potential probes, all against the same source positions,
//! and only then rotates the sources.

use std::ops::AddAssign;

use fieldlines_core::config::SimConfig;
use fieldlines_core::error::FieldError;
use fieldlines_core::prng::Xorshift64;
use fieldlines_core::scene::Scene;
use fieldlines_core::seed::{ProbeKind, Seed};
use fieldlines_core::Engine;
use glam::DVec2;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::bounds::Rect;
use crate::evaluator::Evaluator;
use crate::points::{PointField, PointKey, PointTickReport};
use crate::probes::{ProbeSet, ProbeTickReport};
use crate::source::SourceSet;

/// Everything that happened during one [`Simulation::tick`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// 1-based index of the tick this report describes.
    pub tick: u64,
    pub points: PointTickReport,
    pub traced: ProbeTickReport,
    pub potential: ProbeTickReport,
}

impl AddAssign for TickReport {
    fn add_assign(&mut self, rhs: Self) {
        self.tick = self.tick.max(rhs.tick);
        self.points += rhs.points;
        self.traced += rhs.traced;
        self.potential += rhs.potential;
    }
}

/// Sources, points and probes advanced in lockstep.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    sources: SourceSet,
    points: PointField,
    traced: ProbeSet,
    potential: ProbeSet,
    escape: Option<Rect>,
    rng: Xorshift64,
    ticks: u64,
}

impl Simulation {
    /// Validates `config`, places the sources, then seeds
    /// `config.point_count()` points, drawing both from one PRNG.
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, FieldError> {
        config.validate()?;
        let mut rng = Xorshift64::new(seed);
        let sources = SourceSet::from_layout(&config.sources, config.width, config.height, &mut rng)?;
        let mut points = PointField::from_config(&config)?;
        points.populate(config.point_count(), &mut rng);
        info!(
            seed,
            width = config.width,
            height = config.height,
            points = points.len(),
            sources = sources.len(),
            "simulation initialized"
        );
        Ok(Self {
            escape: Rect::escape(&config),
            config,
            sources,
            points,
            traced: ProbeSet::new(ProbeKind::Traced),
            potential: ProbeSet::new(ProbeKind::Potential),
            rng,
            ticks: 0,
        })
    }

    /// Builds a simulation from a JSON params object.
    pub fn from_json(
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, FieldError> {
        Self::new(SimConfig::from_json(width, height, params)?, seed)
    }

    /// Builds a simulation from a run description and starts its probes.
    /// Does not run `seed.steps`; that is up to the driver.
    pub fn from_seed(seed: &Seed) -> Result<Self, FieldError> {
        let mut sim = Self::new(seed.config()?, seed.seed)?;
        for probe in &seed.probes {
            sim.seed_probe(probe.kind, probe.position());
        }
        Ok(sim)
    }

    /// Advances everything by one tick.
    pub fn tick(&mut self) -> TickReport {
        let evaluator = Evaluator::new(&self.sources, self.config.gain, self.config.removal_radius);
        let points = self.points.tick(&evaluator, &mut self.rng);
        let traced = self.traced.tick(&evaluator, self.escape);
        let potential = self.potential.tick(&evaluator, self.escape);
        self.sources.rotate(self.config.rotation);
        self.ticks += 1;

        debug!(
            tick = self.ticks,
            live = self.points.len(),
            advanced = points.advanced,
            collided = points.collided,
            escaped = points.escaped,
            degenerate = points.degenerate,
            respawned = points.respawned,
            retired = points.retired,
            traced_live = self.traced.live().len(),
            potential_live = self.potential.live().len(),
            "tick"
        );
        TickReport {
            tick: self.ticks,
            points,
            traced,
            potential,
        }
    }

    /// Starts a probe of the given kind at a center-relative position.
    pub fn seed_probe(&mut self, kind: ProbeKind, at: DVec2) {
        debug!(?kind, x = at.x, y = at.y, "probe seeded");
        self.probes_mut(kind).seed(at);
    }

    /// Adds a point outside the initial population.
    pub fn spawn_point(&mut self, at: DVec2) -> PointKey {
        self.points.insert(at)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    pub fn points(&self) -> &PointField {
        &self.points
    }

    pub fn probes(&self, kind: ProbeKind) -> &ProbeSet {
        match kind {
            ProbeKind::Traced => &self.traced,
            ProbeKind::Potential => &self.potential,
        }
    }

    pub fn probes_mut(&mut self, kind: ProbeKind) -> &mut ProbeSet {
        match kind {
            ProbeKind::Traced => &mut self.traced,
            ProbeKind::Potential => &mut self.potential,
        }
    }

    /// Number of ticks run so far.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

impl Engine for Simulation {
    fn step(&mut self) -> Result<(), FieldError> {
        self.tick();
        Ok(())
    }

    fn seed_probe(&mut self, kind: ProbeKind, at: DVec2) {
        Simulation::seed_probe(self, kind, at);
    }

    fn scene(&self) -> Scene {
        let live = |set: &ProbeSet| {
            set.live()
                .iter()
                .map(|t| t.vertices().to_vec())
                .collect::<Vec<_>>()
        };
        Scene {
            width: self.config.width,
            height: self.config.height,
            trails: self.points.iter().map(|(_, _, h)| h.to_vec()).collect(),
            traced: live(&self.traced),
            potential: live(&self.potential),
            finished_traced: self.traced.finished().to_vec(),
            finished_potential: self.potential.finished().to_vec(),
        }
    }

    fn params(&self) -> Value {
        self.config.to_json()
    }

    fn param_schema(&self) -> Value {
        SimConfig::schema()
    }
}
