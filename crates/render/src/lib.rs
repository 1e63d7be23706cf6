#![deny(unsafe_code)]
//! Rasterizes field-line scenes: point trails, probe trajectories and
//! trail fading into a persistent RGBA8 frame, with optional PNG output.

pub mod color;
pub mod pixel;
#[cfg(feature = "png")]
pub mod snapshot;
pub mod style;

pub use color::{direction_color, direction_hue, hls_to_srgb, Srgb};
pub use pixel::Frame;
#[cfg(feature = "png")]
pub use snapshot::write_png;
pub use style::Style;
