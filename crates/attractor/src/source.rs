//! Signed point sources generating the field, and their optional rotation.

use fieldlines_core::config::{validate_spec, Polarity, SourceLayout, SourceSpec, DIPOLES};
use fieldlines_core::error::FieldError;
use fieldlines_core::prng::Xorshift64;
use glam::DVec2;

/// A signed point charge. Strength and polarity are fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Source {
    strength: f64,
    polarity: Polarity,
    position: DVec2,
}

impl Source {
    /// Returns `FieldError::InvalidSource` (index 0) for a non-positive or
    /// non-finite strength or a non-finite position.
    pub fn new(strength: f64, position: DVec2, polarity: Polarity) -> Result<Self, FieldError> {
        Self::from_spec(0, &SourceSpec::new(strength, position.x, position.y, polarity))
    }

    fn from_spec(index: usize, spec: &SourceSpec) -> Result<Self, FieldError> {
        validate_spec(index, spec)?;
        Ok(Self {
            strength: spec.strength,
            polarity: spec.polarity,
            position: DVec2::new(spec.x, spec.y),
        })
    }

    pub fn strength(&self) -> f64 {
        self.strength
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }
}

/// The set of sources shared read-only by every evaluation in a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSet {
    sources: Vec<Source>,
}

impl SourceSet {
    pub fn new(sources: Vec<Source>) -> Self {
        Self { sources }
    }

    pub fn from_specs(specs: &[SourceSpec]) -> Result<Self, FieldError> {
        let sources = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| Source::from_spec(index, spec))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sources })
    }

    /// Builds the sources a layout describes.
    ///
    /// Random sources draw strength, then x, then y, then polarity, with the
    /// position uniform over the visible field `[-w/2, w/2) × [-h/2, h/2)`.
    pub fn from_layout(
        layout: &SourceLayout,
        width: f64,
        height: f64,
        rng: &mut Xorshift64,
    ) -> Result<Self, FieldError> {
        match layout {
            SourceLayout::Random {
                count,
                strength_min,
                strength_max,
            } => {
                let half = DVec2::new(width / 2.0, height / 2.0);
                let specs: Vec<SourceSpec> = (0..*count)
                    .map(|_| {
                        let strength = rng.next_range(*strength_min, *strength_max);
                        let p = rng.next_in_rect(half);
                        let polarity = if rng.next_bool() {
                            Polarity::Repeller
                        } else {
                            Polarity::Attractor
                        };
                        SourceSpec::new(strength, p.x, p.y, polarity)
                    })
                    .collect();
                Self::from_specs(&specs)
            }
            SourceLayout::Dipoles => Self::from_specs(&DIPOLES),
            SourceLayout::Explicit(specs) => Self::from_specs(specs),
        }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Source> {
        self.sources.iter()
    }

    /// Nudges every source about the origin by `w` along its tangent.
    ///
    /// `x' = x - w*y/r`, `y' = y + w*x/r` with `r` and both right-hand sides
    /// taken before the update. This is a first-order step, so the radius
    /// drifts outward slowly; the drift is part of the intended motion.
    /// Sources at the origin have no tangent and stay put.
    pub fn rotate(&mut self, w: f64) {
        if w == 0.0 {
            return;
        }
        for source in &mut self.sources {
            let p = source.position;
            let r = p.length();
            if r == 0.0 {
                continue;
            }
            source.position = DVec2::new(p.x - w * p.y / r, p.y + w * p.x / r);
        }
    }
}

impl<'a> IntoIterator for &'a SourceSet {
    type Item = &'a Source;
    type IntoIter = std::slice::Iter<'a, Source>;

    fn into_iter(self) -> Self::IntoIter {
        self.sources.iter()
    }
}
