//! The tracer-point swarm: an arena of positions and trails with deferred
//! removal.
//!
//! Points live in slots addressed by [`PointKey`]. A key is stable for the
//! whole life of its point. With respawn enabled a removed point is reset in
//! place and keeps its key; otherwise its slot is emptied and the key goes to
//! a free list for a later [`PointField::insert`].
//!
//! Removal always lags one tick. Whatever a tick decides (collision,
//! degeneracy, escape) is queued and committed at the start of the next tick,
//! so a collided point is drawn once sitting on its attractor before it goes.

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::AddAssign;

use fieldlines_core::config::SimConfig;
use fieldlines_core::error::FieldError;
use fieldlines_core::prng::Xorshift64;
use glam::DVec2;
use serde::Serialize;
use tracing::trace;

use crate::bounds::{escaped, Rect};
use crate::evaluator::{Evaluator, Status};
use crate::history::History;

/// Stable identifier of a point: its arena slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointKey(usize);

impl PointKey {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for PointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position and trail of one point, always updated together.
#[derive(Debug, Clone)]
struct Slot {
    position: DVec2,
    history: History,
}

/// What one [`PointField::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PointTickReport {
    /// Points that moved this tick (collided points included).
    pub advanced: usize,
    /// Points that reached an attractor and were queued for removal.
    pub collided: usize,
    /// Points whose step would leave the escape rectangle.
    pub escaped: usize,
    /// Points sitting exactly on a source.
    pub degenerate: usize,
    /// Queued points reset to a fresh position.
    pub respawned: usize,
    /// Queued points deleted for good.
    pub retired: usize,
}

impl AddAssign for PointTickReport {
    fn add_assign(&mut self, rhs: Self) {
        self.advanced += rhs.advanced;
        self.collided += rhs.collided;
        self.escaped += rhs.escaped;
        self.degenerate += rhs.degenerate;
        self.respawned += rhs.respawned;
        self.retired += rhs.retired;
    }
}

/// Arena of live points plus the removals queued for the next tick.
#[derive(Debug, Clone)]
pub struct PointField {
    slots: Vec<Option<Slot>>,
    free: Vec<PointKey>,
    will_remove: Vec<PointKey>,
    live: usize,
    history_capacity: NonZeroUsize,
    spawn: Rect,
    escape: Option<Rect>,
    respawn: bool,
}

impl PointField {
    pub fn new(
        history_capacity: NonZeroUsize,
        spawn: Rect,
        escape: Option<Rect>,
        respawn: bool,
    ) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            will_remove: Vec::new(),
            live: 0,
            history_capacity,
            spawn,
            escape,
            respawn,
        }
    }

    /// An empty field using the configuration's trail length, rectangles
    /// and respawn policy.
    pub fn from_config(config: &SimConfig) -> Result<Self, FieldError> {
        let capacity = NonZeroUsize::new(config.history).ok_or(FieldError::InvalidHistory)?;
        Ok(Self::new(
            capacity,
            Rect::spawn(config),
            Rect::escape(config),
            config.respawn,
        ))
    }

    /// Inserts `count` points uniformly over the spawn rectangle.
    pub fn populate(&mut self, count: usize, rng: &mut Xorshift64) {
        self.slots.reserve(count);
        for _ in 0..count {
            let position = self.spawn.sample(rng);
            self.insert(position);
        }
    }

    /// Adds a point with a one-entry trail, reusing a retired key if any.
    pub fn insert(&mut self, position: DVec2) -> PointKey {
        let slot = Slot {
            position,
            history: History::new(position, self.history_capacity),
        };
        self.live += 1;
        match self.free.pop() {
            Some(key) => {
                self.slots[key.0] = Some(slot);
                key
            }
            None => {
                self.slots.push(Some(slot));
                PointKey(self.slots.len() - 1)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn contains(&self, key: PointKey) -> bool {
        self.slot(key).is_some()
    }

    pub fn position(&self, key: PointKey) -> Option<DVec2> {
        self.slot(key).map(|s| s.position)
    }

    pub fn history(&self, key: PointKey) -> Option<&History> {
        self.slot(key).map(|s| &s.history)
    }

    /// Live points in key order.
    pub fn iter(&self) -> impl Iterator<Item = (PointKey, DVec2, &History)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|s| (PointKey(index), s.position, &s.history))
        })
    }

    /// Keys queued during the last tick, to be removed at the start of the next.
    pub fn pending_removals(&self) -> &[PointKey] {
        &self.will_remove
    }

    fn slot(&self, key: PointKey) -> Option<&Slot> {
        self.slots.get(key.0).and_then(Option::as_ref)
    }

    /// Commits last tick's removals, then advances every live point one
    /// Euler step.
    ///
    /// A point is queued for removal when it is degenerate (not moved), when
    /// its step would leave the escape rectangle (not moved), or when it
    /// collided (moved onto the attractor first). Points respawned at the
    /// start of the tick take part in the same tick's advance.
    pub fn tick(&mut self, evaluator: &Evaluator<'_>, rng: &mut Xorshift64) -> PointTickReport {
        let mut report = PointTickReport::default();
        self.commit_removals(rng, &mut report);

        for (index, entry) in self.slots.iter_mut().enumerate() {
            let Some(slot) = entry else { continue };
            let key = PointKey(index);
            let eval = evaluator.evaluate(slot.position);
            if eval.status == Status::Degenerate {
                report.degenerate += 1;
                self.will_remove.push(key);
                continue;
            }
            let next = slot.position + eval.displacement;
            if escaped(self.escape, next) {
                report.escaped += 1;
                self.will_remove.push(key);
                continue;
            }
            slot.history.push(next);
            slot.position = next;
            report.advanced += 1;
            if eval.status == Status::Collided {
                report.collided += 1;
                self.will_remove.push(key);
            }
        }
        report
    }

    fn commit_removals(&mut self, rng: &mut Xorshift64, report: &mut PointTickReport) {
        let pending = std::mem::take(&mut self.will_remove);
        for key in pending {
            let Some(entry) = self.slots.get_mut(key.0) else {
                continue;
            };
            if self.respawn {
                if let Some(slot) = entry.as_mut() {
                    let position = self.spawn.sample(rng);
                    slot.position = position;
                    slot.history.reset(position);
                    report.respawned += 1;
                    trace!(%key, x = position.x, y = position.y, "respawned point");
                }
            } else if entry.take().is_some() {
                self.free.push(key);
                self.live -= 1;
                report.retired += 1;
                trace!(%key, "retired point");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSet;
    use fieldlines_core::config::{Polarity, SourceSpec};

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn field(capacity: usize, respawn: bool) -> PointField {
        PointField::new(
            cap(capacity),
            Rect::new(50.0, 50.0),
            Some(Rect::new(40.0, 40.0)),
            respawn,
        )
    }

    fn attractor_at(x: f64, y: f64) -> SourceSet {
        SourceSet::from_specs(&[SourceSpec::new(20.0, x, y, Polarity::Attractor)]).unwrap()
    }

    #[test]
    fn insert_assigns_sequential_keys() {
        let mut f = field(4, true);
        let a = f.insert(DVec2::ZERO);
        let b = f.insert(DVec2::ONE);
        assert_eq!((a.index(), b.index()), (0, 1));
        assert_eq!(f.len(), 2);
        assert_eq!(f.history(b).unwrap().len(), 1);
    }

    #[test]
    fn empty_sources_freeze_points_and_fill_history() {
        let sources = SourceSet::default();
        let eval = Evaluator::new(&sources, 25.0, 5.0);
        let mut rng = Xorshift64::new(1);
        let mut f = field(3, true);
        let key = f.insert(DVec2::new(2.0, -3.0));
        for tick in 1..=5 {
            f.tick(&eval, &mut rng);
            assert_eq!(f.position(key), Some(DVec2::new(2.0, -3.0)));
            assert_eq!(f.history(key).unwrap().len(), (tick + 1).min(3));
        }
    }

    #[test]
    fn degenerate_point_is_not_moved_and_removed_next_tick() {
        let sources = attractor_at(0.0, 0.0);
        let eval = Evaluator::new(&sources, 1.0, 0.0);
        let mut rng = Xorshift64::new(1);
        let mut f = field(4, false);
        let key = f.insert(DVec2::ZERO);

        let report = f.tick(&eval, &mut rng);
        assert_eq!(report.degenerate, 1);
        assert_eq!(f.position(key), Some(DVec2::ZERO));
        assert_eq!(f.history(key).unwrap().len(), 1);
        assert_eq!(f.pending_removals(), &[key]);

        let report = f.tick(&eval, &mut rng);
        assert_eq!(report.retired, 1);
        assert!(!f.contains(key));
        assert!(f.is_empty());
    }

    #[test]
    fn escaping_point_is_not_moved() {
        let sources = SourceSet::from_specs(&[SourceSpec::new(
            20.0,
            0.0,
            0.0,
            Polarity::Repeller,
        )])
        .unwrap();
        // Strong gain pushes the point past the 40-unit escape rectangle.
        let eval = Evaluator::new(&sources, 1000.0, 1.0);
        let mut rng = Xorshift64::new(1);
        let mut f = field(4, false);
        let key = f.insert(DVec2::new(30.0, 0.0));
        let report = f.tick(&eval, &mut rng);
        assert_eq!(report.escaped, 1);
        assert_eq!(f.position(key), Some(DVec2::new(30.0, 0.0)));
        assert_eq!(f.pending_removals(), &[key]);
    }

    #[test]
    fn no_escape_check_without_limit() {
        let sources = SourceSet::from_specs(&[SourceSpec::new(
            20.0,
            0.0,
            0.0,
            Polarity::Repeller,
        )])
        .unwrap();
        let eval = Evaluator::new(&sources, 1000.0, 1.0);
        let mut rng = Xorshift64::new(1);
        let mut f = PointField::new(cap(4), Rect::new(50.0, 50.0), None, false);
        let key = f.insert(DVec2::new(30.0, 0.0));
        let report = f.tick(&eval, &mut rng);
        assert_eq!(report.escaped, 0);
        assert!(f.position(key).unwrap().x > 40.0);
    }

    #[test]
    fn collided_point_snaps_then_is_removed_one_tick_later() {
        let sources = attractor_at(-10.0, 0.0);
        let eval = Evaluator::new(&sources, 25.0, 5.0);
        let mut rng = Xorshift64::new(1);
        let mut f = field(8, false);
        let key = f.insert(DVec2::new(-8.0, 1.0));

        let report = f.tick(&eval, &mut rng);
        assert_eq!(report.collided, 1);
        assert_eq!(f.position(key), Some(DVec2::new(-10.0, 0.0)));
        assert_eq!(f.history(key).unwrap().latest(), Some(DVec2::new(-10.0, 0.0)));
        assert!(f.contains(key));

        f.tick(&eval, &mut rng);
        assert!(!f.contains(key));
        assert_eq!(f.position(key), None);
        assert!(f.history(key).is_none());
    }

    #[test]
    fn respawned_point_keeps_key_and_restarts_trail_in_spawn_rect() {
        let sources = attractor_at(0.0, 0.0);
        let eval = Evaluator::new(&sources, 1.0, 0.0);
        let mut rng = Xorshift64::new(3);
        let mut f = field(8, true);
        let key = f.insert(DVec2::ZERO);
        f.tick(&eval, &mut rng);

        let report = f.tick(&eval, &mut rng);
        assert_eq!(report.respawned, 1);
        assert!(f.contains(key));
        let history = f.history(key).unwrap();
        let start = history.oldest().unwrap();
        assert!(Rect::new(50.0, 50.0).contains(start));
        assert!(history.len() <= 2, "trail not restarted: {}", history.len());
        assert_ne!(start, DVec2::ZERO);
    }

    #[test]
    fn retired_keys_are_reused_by_insert() {
        let sources = attractor_at(0.0, 0.0);
        let eval = Evaluator::new(&sources, 1.0, 0.0);
        let mut rng = Xorshift64::new(1);
        let mut f = field(4, false);
        let doomed = f.insert(DVec2::ZERO);
        let kept = f.insert(DVec2::new(30.0, 30.0));
        f.tick(&eval, &mut rng);
        f.tick(&eval, &mut rng);
        assert!(!f.contains(doomed));
        assert!(f.contains(kept));

        let reused = f.insert(DVec2::new(1.0, 1.0));
        assert_eq!(reused, doomed);
        assert_eq!(f.len(), 2);
    }

    #[test]
    fn iter_visits_live_points_in_key_order() {
        let mut f = field(4, true);
        f.insert(DVec2::X);
        f.insert(DVec2::Y);
        f.insert(DVec2::ONE);
        let keys: Vec<usize> = f.iter().map(|(k, _, _)| k.index()).collect();
        assert_eq!(keys, vec![0, 1, 2]);
    }

    #[test]
    fn populate_places_points_inside_spawn_rect() {
        let mut f = field(4, true);
        let mut rng = Xorshift64::new(17);
        f.populate(500, &mut rng);
        assert_eq!(f.len(), 500);
        assert!(f.iter().all(|(_, p, _)| Rect::new(50.0, 50.0).contains(p)));
    }

    #[test]
    fn report_accumulates() {
        let mut total = PointTickReport::default();
        total += PointTickReport {
            advanced: 2,
            retired: 1,
            ..PointTickReport::default()
        };
        total += PointTickReport {
            advanced: 3,
            collided: 1,
            ..PointTickReport::default()
        };
        assert_eq!(total.advanced, 5);
        assert_eq!(total.collided, 1);
        assert_eq!(total.retired, 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn spec() -> impl Strategy<Value = SourceSpec> {
            (5.0_f64..30.0, -40.0_f64..40.0, -40.0_f64..40.0, any::<bool>()).prop_map(
                |(strength, x, y, attract)| {
                    let polarity = if attract { Polarity::Attractor } else { Polarity::Repeller };
                    SourceSpec::new(strength, x, y, polarity)
                },
            )
        }

        proptest! {
            #[test]
            fn history_bounded_and_non_empty_every_tick(
                specs in proptest::collection::vec(spec(), 0..6),
                capacity in 1_usize..12,
                respawn: bool,
                seed: u64,
            ) {
                let sources = SourceSet::from_specs(&specs).unwrap();
                let eval = Evaluator::new(&sources, 25.0, 3.0);
                let mut rng = Xorshift64::new(seed);
                let mut f = field(capacity, respawn);
                f.populate(40, &mut rng);
                for _ in 0..30 {
                    f.tick(&eval, &mut rng);
                    for (_, position, history) in f.iter() {
                        prop_assert!(!history.is_empty());
                        prop_assert!(history.len() <= capacity);
                        prop_assert_eq!(history.latest(), Some(position));
                    }
                }
                if respawn {
                    prop_assert_eq!(f.len(), 40);
                }
            }
        }
    }
}
