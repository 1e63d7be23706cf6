#![deny(unsafe_code)]
//! Core types and traits for fieldlines, a tracer-point field simulator.
//!
//! Provides the `Engine` trait, the validated `SimConfig`, the reproducible
//! `Seed` run description, the `Scene` handed to renderers, the
//! `Xorshift64` PRNG, and typed parameter helpers.

pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod prng;
pub mod scene;
pub mod seed;

pub use config::{Polarity, SimConfig, SourceLayout, SourceSpec};
pub use engine::Engine;
pub use error::FieldError;
pub use prng::Xorshift64;
pub use scene::{Polyline, Scene};
pub use seed::{ProbeKind, ProbeSeed, Seed};
