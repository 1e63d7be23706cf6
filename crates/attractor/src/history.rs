//! Bounded FIFO trail of a point's recent positions.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use glam::DVec2;

/// Recent positions of one point, oldest first.
///
/// Never empty and never longer than its capacity: a trail is created with
/// its starting position and pushing at capacity evicts the oldest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    positions: VecDeque<DVec2>,
    capacity: NonZeroUsize,
}

impl History {
    pub fn new(start: DVec2, capacity: NonZeroUsize) -> Self {
        let mut positions = VecDeque::with_capacity(capacity.get());
        positions.push_back(start);
        Self {
            positions,
            capacity,
        }
    }

    /// Appends `p`, evicting the oldest entry when full.
    pub fn push(&mut self, p: DVec2) {
        if self.positions.len() == self.capacity.get() {
            self.positions.pop_front();
        }
        self.positions.push_back(p);
    }

    /// Discards the trail and restarts it at `start`.
    pub fn reset(&mut self, start: DVec2) {
        self.positions.clear();
        self.positions.push_back(start);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn oldest(&self) -> Option<DVec2> {
        self.positions.front().copied()
    }

    pub fn latest(&self) -> Option<DVec2> {
        self.positions.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.positions.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<DVec2> {
        self.iter().collect()
    }
}
