#![deny(unsafe_code)]
//! Signed point-source field engine.
//!
//! A handful of attractors and repellers define a softened inverse-square
//! field. A swarm of massless points is pushed through it one Euler step per
//! tick, each point dragging a bounded trail; points that reach an attractor,
//! sit exactly on a source, or leave the field are removed (or respawned) one
//! tick later. Two kinds of user-seeded probe trajectories integrate the same
//! field and its 90°-rotated companion and are archived when they end.

pub mod bounds;
pub mod evaluator;
pub mod history;
pub mod points;
pub mod probes;
pub mod simulation;
pub mod source;

pub use bounds::Rect;
pub use evaluator::{Evaluation, Evaluator, Status};
pub use history::History;
pub use points::{PointField, PointKey, PointTickReport};
pub use probes::{ProbeSet, ProbeTickReport, Trajectory};
pub use simulation::{Simulation, TickReport};
pub use source::{Source, SourceSet};
