//! Probe trajectories: user-seeded polylines that grow one vertex per tick.
//!
//! A [`ProbeSet`] holds one class of probes. Traced probes follow the field;
//! potential probes follow the field rotated by -90°, tracing a streamline
//! of the orthogonal flow. A probe ends on degeneracy, on escape, or after
//! snapping to an attractor. Ending is deferred like point removal: the
//! probe is marked during a tick and moved to the finished list at the start
//! of the next one, never deleted.

use std::ops::AddAssign;

use fieldlines_core::scene::Polyline;
use fieldlines_core::seed::ProbeKind;
use glam::DVec2;
use serde::Serialize;

use crate::bounds::{escaped, Rect};
use crate::evaluator::{Evaluator, Status};

/// A live probe: its vertices so far and whether it ends next tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    vertices: Polyline,
    finishing: bool,
}

impl Trajectory {
    fn new(start: DVec2) -> Self {
        Self {
            vertices: vec![start],
            finishing: false,
        }
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// True once the probe has been marked to move to the finished list.
    pub fn is_finishing(&self) -> bool {
        self.finishing
    }
}

/// What one [`ProbeSet::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProbeTickReport {
    /// Probes that gained a vertex.
    pub extended: usize,
    /// Probes that snapped onto an attractor.
    pub collided: usize,
    pub escaped: usize,
    pub degenerate: usize,
    /// Probes moved from live to finished at the start of the tick.
    pub archived: usize,
}

impl AddAssign for ProbeTickReport {
    fn add_assign(&mut self, rhs: Self) {
        self.extended += rhs.extended;
        self.collided += rhs.collided;
        self.escaped += rhs.escaped;
        self.degenerate += rhs.degenerate;
        self.archived += rhs.archived;
    }
}

/// Live and finished probes of one kind.
#[derive(Debug, Clone)]
pub struct ProbeSet {
    kind: ProbeKind,
    live: Vec<Trajectory>,
    finished: Vec<Polyline>,
}

impl ProbeSet {
    pub fn new(kind: ProbeKind) -> Self {
        Self {
            kind,
            live: Vec::new(),
            finished: Vec::new(),
        }
    }

    pub fn kind(&self) -> ProbeKind {
        self.kind
    }

    /// Starts a new live probe at `start`.
    pub fn seed(&mut self, start: DVec2) {
        self.live.push(Trajectory::new(start));
    }

    pub fn live(&self) -> &[Trajectory] {
        &self.live
    }

    pub fn finished(&self) -> &[Polyline] {
        &self.finished
    }

    /// Drops archived probes. Live probes are untouched.
    pub fn clear_finished(&mut self) {
        self.finished.clear();
    }

    /// Archives last tick's ended probes, then extends every live probe by
    /// one step evaluated at its last vertex.
    ///
    /// On a collision the step vertex is followed by the attractor position
    /// itself, so the drawn line ends on the source.
    pub fn tick(&mut self, evaluator: &Evaluator<'_>, escape: Option<Rect>) -> ProbeTickReport {
        let mut report = ProbeTickReport::default();
        self.archive(&mut report);

        for trajectory in &mut self.live {
            let Some(head) = trajectory.vertices.last().copied() else {
                trajectory.finishing = true;
                continue;
            };
            let eval = evaluator.evaluate(head);
            if eval.status == Status::Degenerate {
                report.degenerate += 1;
                trajectory.finishing = true;
                continue;
            }
            let step = match self.kind {
                ProbeKind::Traced => eval.displacement,
                ProbeKind::Potential => eval.orthogonal(),
            };
            let next = head + step;
            if escaped(escape, next) {
                report.escaped += 1;
                trajectory.finishing = true;
                continue;
            }
            trajectory.vertices.push(next);
            report.extended += 1;
            if eval.status == Status::Collided {
                trajectory.vertices.push(head + eval.displacement);
                trajectory.finishing = true;
                report.collided += 1;
            }
        }
        report
    }

    /// Moves marked probes to the finished list, keeping both lists in order.
    fn archive(&mut self, report: &mut ProbeTickReport) {
        if !self.live.iter().any(Trajectory::is_finishing) {
            return;
        }
        let live = std::mem::take(&mut self.live);
        for trajectory in live {
            if trajectory.finishing {
                self.finished.push(trajectory.vertices);
                report.archived += 1;
            } else {
                self.live.push(trajectory);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSet;
    use fieldlines_core::config::{Polarity, SourceSpec};

    fn sources(specs: &[SourceSpec]) -> SourceSet {
        SourceSet::from_specs(specs).unwrap()
    }

    #[test]
    fn seed_creates_single_vertex_probe() {
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::new(1.0, 2.0));
        assert_eq!(set.live().len(), 1);
        assert_eq!(set.live()[0].vertices(), &[DVec2::new(1.0, 2.0)]);
        assert!(set.finished().is_empty());
    }

    #[test]
    fn empty_field_probe_repeats_its_position() {
        let empty = SourceSet::default();
        let eval = Evaluator::new(&empty, 25.0, 5.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::new(4.0, 4.0));
        for _ in 0..3 {
            set.tick(&eval, None);
        }
        assert_eq!(set.live()[0].vertices(), &[DVec2::new(4.0, 4.0); 4]);
    }

    #[test]
    fn traced_collision_ends_on_source_and_archives_next_tick() {
        let s = sources(&[SourceSpec::new(20.0, -100.0, 0.0, Polarity::Attractor)]);
        let eval = Evaluator::new(&s, 25.0, 5.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::new(-97.0, 0.0));

        let report = set.tick(&eval, None);
        assert_eq!(report.collided, 1);
        let live = &set.live()[0];
        assert!(live.is_finishing());
        assert_eq!(
            live.vertices(),
            &[
                DVec2::new(-97.0, 0.0),
                DVec2::new(-100.0, 0.0),
                DVec2::new(-100.0, 0.0)
            ]
        );

        let report = set.tick(&eval, None);
        assert_eq!(report.archived, 1);
        assert!(set.live().is_empty());
        assert_eq!(set.finished().len(), 1);
        assert_eq!(set.finished()[0].last(), Some(&DVec2::new(-100.0, 0.0)));
    }

    #[test]
    fn potential_collision_snaps_to_source_after_rotated_step() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Attractor)]);
        let eval = Evaluator::new(&s, 25.0, 5.0);
        let mut set = ProbeSet::new(ProbeKind::Potential);
        set.seed(DVec2::new(3.0, 0.0));
        set.tick(&eval, None);
        // Raw displacement (-3, 0) rotates to (0, 3).
        assert_eq!(
            set.live()[0].vertices(),
            &[DVec2::new(3.0, 0.0), DVec2::new(3.0, 3.0), DVec2::ZERO]
        );
        assert!(set.live()[0].is_finishing());
    }

    #[test]
    fn potential_step_is_perpendicular_to_traced_step() {
        let s = sources(&[
            SourceSpec::new(20.0, -100.0, 0.0, Polarity::Attractor),
            SourceSpec::new(15.0, 100.0, 40.0, Polarity::Repeller),
        ]);
        let eval = Evaluator::new(&s, 25.0, 5.0);
        let start = DVec2::new(10.0, -20.0);
        let mut traced = ProbeSet::new(ProbeKind::Traced);
        let mut potential = ProbeSet::new(ProbeKind::Potential);
        traced.seed(start);
        potential.seed(start);
        traced.tick(&eval, None);
        potential.tick(&eval, None);
        let a = traced.live()[0].vertices()[1] - start;
        let b = potential.live()[0].vertices()[1] - start;
        assert!(a.dot(b).abs() < 1e-9, "dot = {}", a.dot(b));
        assert!((a.length() - b.length()).abs() < 1e-9);
    }

    #[test]
    fn escape_marks_without_adding_vertex() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Repeller)]);
        let eval = Evaluator::new(&s, 1000.0, 1.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::new(30.0, 0.0));
        let report = set.tick(&eval, Some(Rect::new(40.0, 40.0)));
        assert_eq!(report.escaped, 1);
        assert_eq!(set.live()[0].vertices().len(), 1);
        assert!(set.live()[0].is_finishing());
    }

    #[test]
    fn degenerate_probe_is_archived_next_tick() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Repeller)]);
        let eval = Evaluator::new(&s, 1.0, 0.0);
        let mut set = ProbeSet::new(ProbeKind::Potential);
        set.seed(DVec2::ZERO);
        assert_eq!(set.tick(&eval, None).degenerate, 1);
        assert_eq!(set.tick(&eval, None).archived, 1);
        assert_eq!(set.finished(), &[vec![DVec2::ZERO]]);
    }

    #[test]
    fn potential_escape_marks_without_adding_vertex() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Repeller)]);
        let eval = Evaluator::new(&s, 1000.0, 1.0);
        let mut set = ProbeSet::new(ProbeKind::Potential);
        set.seed(DVec2::new(30.0, 0.0));
        // Raw push is along +x; the rotated step runs far down -y.
        let report = set.tick(&eval, Some(Rect::new(40.0, 40.0)));
        assert_eq!(report.escaped, 1);
        assert_eq!(set.live()[0].vertices().len(), 1);
        assert!(set.live()[0].is_finishing());
        assert_eq!(set.tick(&eval, Some(Rect::new(40.0, 40.0))).archived, 1);
        assert_eq!(set.finished(), &[vec![DVec2::new(30.0, 0.0)]]);
    }

    #[test]
    fn traced_degenerate_probe_is_archived_next_tick() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Attractor)]);
        let eval = Evaluator::new(&s, 25.0, 5.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::ZERO);
        let report = set.tick(&eval, None);
        assert_eq!(report.degenerate, 1);
        assert_eq!(report.collided, 0);
        assert_eq!(set.live()[0].vertices(), &[DVec2::ZERO]);
        assert_eq!(set.tick(&eval, None).archived, 1);
        assert!(set.live().is_empty());
        assert_eq!(set.finished(), &[vec![DVec2::ZERO]]);
    }

    #[test]
    fn archive_preserves_order_of_survivors() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Repeller)]);
        let eval = Evaluator::new(&s, 1.0, 0.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::new(10.0, 0.0));
        set.seed(DVec2::ZERO);
        set.seed(DVec2::new(0.0, 10.0));
        set.tick(&eval, None);
        set.tick(&eval, None);
        let starts: Vec<DVec2> = set.live().iter().map(|t| t.vertices()[0]).collect();
        assert_eq!(starts, vec![DVec2::new(10.0, 0.0), DVec2::new(0.0, 10.0)]);
        assert_eq!(set.finished().len(), 1);
    }

    #[test]
    fn clear_finished_keeps_live() {
        let s = sources(&[SourceSpec::new(20.0, 0.0, 0.0, Polarity::Repeller)]);
        let eval = Evaluator::new(&s, 1.0, 0.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::ZERO);
        set.seed(DVec2::new(5.0, 5.0));
        set.tick(&eval, None);
        set.tick(&eval, None);
        set.clear_finished();
        assert!(set.finished().is_empty());
        assert_eq!(set.live().len(), 1);
    }

    #[test]
    fn finished_probes_never_grow() {
        let s = sources(&[SourceSpec::new(20.0, -100.0, 0.0, Polarity::Attractor)]);
        let eval = Evaluator::new(&s, 25.0, 5.0);
        let mut set = ProbeSet::new(ProbeKind::Traced);
        set.seed(DVec2::new(-97.0, 0.0));
        set.tick(&eval, None);
        set.tick(&eval, None);
        let archived = set.finished()[0].clone();
        for _ in 0..5 {
            set.tick(&eval, None);
        }
        assert_eq!(set.finished(), &[archived]);
    }
}
