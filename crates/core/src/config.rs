//! Simulation configuration: field geometry, integration constants,
//! lifecycle flags and the source layout.
//!
//! A [`SimConfig`] is built once from a JSON params object, validated, and
//! then passed by value into the simulation. Nothing reads settings from a
//! global afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::FieldError;
use crate::params::{param_bool, param_f64, param_string, param_usize};

/// Default horizontal spawn padding beyond the visible field.
pub const DEFAULT_PADDING_X: f64 = 100.0;
/// Default vertical spawn padding beyond the visible field.
pub const DEFAULT_PADDING_Y: f64 = 100.0;
/// Default horizontal escape margin.
pub const DEFAULT_MARGIN_X: f64 = 50.0;
/// Default vertical escape margin.
pub const DEFAULT_MARGIN_Y: f64 = 50.0;
/// Default spacing between initial points; count is `area / density²`.
pub const DEFAULT_DENSITY: f64 = 10.0;
/// Default gain `K` applied to the summed field.
pub const DEFAULT_GAIN: f64 = 25.0;
/// Default distance at which a point counts as having reached a source.
pub const DEFAULT_REMOVAL_RADIUS: f64 = 5.0;
/// Default trail length in positions.
pub const DEFAULT_HISTORY: usize = 20;
/// Default number of randomly placed sources.
pub const DEFAULT_SOURCE_COUNT: usize = 6;
/// Default lower bound for random source strength.
pub const DEFAULT_STRENGTH_MIN: f64 = 10.0;
/// Default upper bound for random source strength.
pub const DEFAULT_STRENGTH_MAX: f64 = 30.0;
/// Upper bound on the initial point count; denser configurations are rejected.
pub const MAX_POINTS: usize = 16_777_216;

/// Sign of a source. Serialized as the integers `-1` and `+1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Polarity {
    /// `-1`: pulls points in and absorbs them on contact.
    Attractor,
    /// `+1`: pushes points away; force-free inside its removal radius.
    Repeller,
}

impl Polarity {
    /// The signed multiplier applied to the source strength.
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Attractor => -1.0,
            Polarity::Repeller => 1.0,
        }
    }
}

impl TryFrom<i8> for Polarity {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Polarity::Attractor),
            1 => Ok(Polarity::Repeller),
            other => Err(format!("polarity must be -1 or 1, got {other}")),
        }
    }
}

impl From<Polarity> for i8 {
    fn from(p: Polarity) -> i8 {
        match p {
            Polarity::Attractor => -1,
            Polarity::Repeller => 1,
        }
    }
}

/// An explicitly placed source, as written in a params object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    pub strength: f64,
    pub x: f64,
    pub y: f64,
    pub polarity: Polarity,
}

impl SourceSpec {
    pub const fn new(strength: f64, x: f64, y: f64, polarity: Polarity) -> Self {
        Self {
            strength,
            x,
            y,
            polarity,
        }
    }
}

/// Three attractors and three repellers on a 200 × 200 lattice around the origin.
pub const DIPOLES: [SourceSpec; 6] = [
    SourceSpec::new(20.0, -100.0, 100.0, Polarity::Attractor),
    SourceSpec::new(20.0, -100.0, -100.0, Polarity::Attractor),
    SourceSpec::new(20.0, -100.0, 0.0, Polarity::Repeller),
    SourceSpec::new(20.0, 100.0, 0.0, Polarity::Attractor),
    SourceSpec::new(20.0, 100.0, 100.0, Polarity::Repeller),
    SourceSpec::new(20.0, 100.0, -100.0, Polarity::Repeller),
];

/// How the initial sources are produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLayout {
    /// `count` sources with uniform strength, position and polarity.
    Random {
        count: usize,
        strength_min: f64,
        strength_max: f64,
    },
    /// The fixed [`DIPOLES`] arrangement.
    Dipoles,
    /// Sources exactly as listed.
    Explicit(Vec<SourceSpec>),
}

impl SourceLayout {
    fn name(&self) -> &'static str {
        match self {
            SourceLayout::Random { .. } => "random",
            SourceLayout::Dipoles => "dipoles",
            SourceLayout::Explicit(_) => "explicit",
        }
    }
}

/// Validated simulation configuration.
///
/// Coordinates are centered on the field: the visible field spans
/// `[-width/2, width/2] × [-height/2, height/2]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub width: f64,
    pub height: f64,
    /// Extra room around the field where points may be spawned.
    pub padding_x: f64,
    pub padding_y: f64,
    /// Extra room around the field before a point counts as escaped.
    pub margin_x: f64,
    pub margin_y: f64,
    pub density: f64,
    /// Global gain `K`.
    pub gain: f64,
    pub removal_radius: f64,
    /// Trail capacity in positions.
    pub history: usize,
    /// Respawn removed points instead of retiring their keys.
    pub respawn: bool,
    /// Remove points and end probes that leave the margin rectangle.
    pub limit_distance: bool,
    /// Angular step applied to every source after each tick; 0 disables.
    pub rotation: f64,
    pub sources: SourceLayout,
}

impl SimConfig {
    /// Default configuration for a field of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding_x: DEFAULT_PADDING_X,
            padding_y: DEFAULT_PADDING_Y,
            margin_x: DEFAULT_MARGIN_X,
            margin_y: DEFAULT_MARGIN_Y,
            density: DEFAULT_DENSITY,
            gain: DEFAULT_GAIN,
            removal_radius: DEFAULT_REMOVAL_RADIUS,
            history: DEFAULT_HISTORY,
            respawn: true,
            limit_distance: true,
            rotation: 0.0,
            sources: SourceLayout::Random {
                count: DEFAULT_SOURCE_COUNT,
                strength_min: DEFAULT_STRENGTH_MIN,
                strength_max: DEFAULT_STRENGTH_MAX,
            },
        }
    }

    /// Builds and validates a configuration from a JSON params object.
    ///
    /// Missing keys take their defaults. If `source_layout` is absent but a
    /// `sources` array is present, the layout is `explicit`.
    pub fn from_json(width: usize, height: usize, params: &Value) -> Result<Self, FieldError> {
        let base = SimConfig::new(width as f64, height as f64);
        let layout_default = if params.get("sources").is_some_and(|v| !v.is_null()) {
            "explicit"
        } else {
            "random"
        };
        let sources = match param_string(params, "source_layout", layout_default)?.as_str() {
            "random" => SourceLayout::Random {
                count: param_usize(params, "source_count", DEFAULT_SOURCE_COUNT)?,
                strength_min: param_f64(params, "strength_min", DEFAULT_STRENGTH_MIN)?,
                strength_max: param_f64(params, "strength_max", DEFAULT_STRENGTH_MAX)?,
            },
            "dipoles" => SourceLayout::Dipoles,
            "explicit" => SourceLayout::Explicit(parse_sources(params)?),
            other => return Err(FieldError::UnknownLayout(other.to_string())),
        };
        let config = Self {
            padding_x: param_f64(params, "padding_x", base.padding_x)?,
            padding_y: param_f64(params, "padding_y", base.padding_y)?,
            margin_x: param_f64(params, "margin_x", base.margin_x)?,
            margin_y: param_f64(params, "margin_y", base.margin_y)?,
            density: param_f64(params, "density", base.density)?,
            gain: param_f64(params, "gain", base.gain)?,
            removal_radius: param_f64(params, "removal_radius", base.removal_radius)?,
            history: param_usize(params, "history", base.history)?,
            respawn: param_bool(params, "respawn", base.respawn)?,
            limit_distance: param_bool(params, "limit_distance", base.limit_distance)?,
            rotation: param_f64(params, "rotation", base.rotation)?,
            sources,
            ..base
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that would make per-tick behavior undefined.
    pub fn validate(&self) -> Result<(), FieldError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;

        if !positive(self.width) || !positive(self.height) {
            return Err(FieldError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for (name, value) in [
            ("padding_x", self.padding_x),
            ("padding_y", self.padding_y),
            ("margin_x", self.margin_x),
            ("margin_y", self.margin_y),
            ("removal_radius", self.removal_radius),
        ] {
            if !non_negative(value) {
                return Err(FieldError::invalid_param(
                    name,
                    format!("must be finite and non-negative, got {value}"),
                ));
            }
        }
        if !positive(self.density) {
            return Err(FieldError::invalid_param(
                "density",
                format!("must be finite and positive, got {}", self.density),
            ));
        }
        let count = self.point_count_f64();
        if !count.is_finite() || count > MAX_POINTS as f64 {
            return Err(FieldError::invalid_param(
                "density",
                format!("{count} initial points exceeds the limit of {MAX_POINTS}"),
            ));
        }
        if !self.gain.is_finite() {
            return Err(FieldError::invalid_param("gain", "must be finite"));
        }
        if !self.rotation.is_finite() {
            return Err(FieldError::invalid_param("rotation", "must be finite"));
        }
        if self.history == 0 {
            return Err(FieldError::InvalidHistory);
        }
        match &self.sources {
            SourceLayout::Random {
                strength_min,
                strength_max,
                ..
            } => {
                if !positive(*strength_min) {
                    return Err(FieldError::invalid_param(
                        "strength_min",
                        format!("must be finite and positive, got {strength_min}"),
                    ));
                }
                if !strength_max.is_finite() || strength_max < strength_min {
                    return Err(FieldError::invalid_param(
                        "strength_max",
                        format!("must be finite and at least strength_min ({strength_min}), got {strength_max}"),
                    ));
                }
            }
            SourceLayout::Dipoles => {}
            SourceLayout::Explicit(specs) => {
                for (index, spec) in specs.iter().enumerate() {
                    validate_spec(index, spec)?;
                }
            }
        }
        Ok(())
    }

    /// Number of points seeded at startup: padded area over `density²`, truncated.
    ///
    /// At most [`MAX_POINTS`] for a validated config.
    pub fn point_count(&self) -> usize {
        self.point_count_f64() as usize
    }

    fn point_count_f64(&self) -> f64 {
        let area = (self.width + self.padding_x) * (self.height + self.padding_y);
        area / (self.density * self.density)
    }

    /// Current values as a flat JSON params object, accepted by [`SimConfig::from_json`].
    pub fn to_json(&self) -> Value {
        let mut params = json!({
            "padding_x": self.padding_x,
            "padding_y": self.padding_y,
            "margin_x": self.margin_x,
            "margin_y": self.margin_y,
            "density": self.density,
            "gain": self.gain,
            "removal_radius": self.removal_radius,
            "history": self.history,
            "respawn": self.respawn,
            "limit_distance": self.limit_distance,
            "rotation": self.rotation,
            "source_layout": self.sources.name(),
        });
        match &self.sources {
            SourceLayout::Random {
                count,
                strength_min,
                strength_max,
            } => {
                params["source_count"] = json!(count);
                params["strength_min"] = json!(strength_min);
                params["strength_max"] = json!(strength_max);
            }
            SourceLayout::Dipoles => {}
            SourceLayout::Explicit(specs) => {
                params["sources"] = json!(specs);
            }
        }
        params
    }

    /// Schema describing every parameter, its type, default and meaning.
    pub fn schema() -> Value {
        json!({
            "padding_x": {"type": "number", "default": DEFAULT_PADDING_X, "min": 0.0,
                "description": "Horizontal spawn padding beyond the field"},
            "padding_y": {"type": "number", "default": DEFAULT_PADDING_Y, "min": 0.0,
                "description": "Vertical spawn padding beyond the field"},
            "margin_x": {"type": "number", "default": DEFAULT_MARGIN_X, "min": 0.0,
                "description": "Horizontal distance past the field edge before a point escapes"},
            "margin_y": {"type": "number", "default": DEFAULT_MARGIN_Y, "min": 0.0,
                "description": "Vertical distance past the field edge before a point escapes"},
            "density": {"type": "number", "default": DEFAULT_DENSITY, "min": 0.0,
                "description": "Spacing between initial points; count is padded area / density^2"},
            "gain": {"type": "number", "default": DEFAULT_GAIN,
                "description": "Gain K applied to the summed field displacement"},
            "removal_radius": {"type": "number", "default": DEFAULT_REMOVAL_RADIUS, "min": 0.0,
                "description": "Distance at which a point is absorbed by an attractor"},
            "history": {"type": "integer", "default": DEFAULT_HISTORY, "min": 1,
                "description": "Trail capacity in positions"},
            "respawn": {"type": "boolean", "default": true,
                "description": "Respawn removed points at a random position"},
            "limit_distance": {"type": "boolean", "default": true,
                "description": "Remove points that leave the margin rectangle"},
            "rotation": {"type": "number", "default": 0.0,
                "description": "Per-tick angular nudge of every source about the origin"},
            "source_layout": {"type": "string", "default": "random",
                "enum": ["random", "dipoles", "explicit"],
                "description": "How initial sources are produced"},
            "source_count": {"type": "integer", "default": DEFAULT_SOURCE_COUNT, "min": 0,
                "description": "Number of random sources"},
            "strength_min": {"type": "number", "default": DEFAULT_STRENGTH_MIN, "min": 0.0,
                "description": "Lower bound for random source strength"},
            "strength_max": {"type": "number", "default": DEFAULT_STRENGTH_MAX, "min": 0.0,
                "description": "Upper bound for random source strength"},
            "sources": {"type": "array",
                "description": "Explicit sources: [{strength, x, y, polarity: -1|1}]"}
        })
    }
}

fn parse_sources(params: &Value) -> Result<Vec<SourceSpec>, FieldError> {
    match params.get("sources") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| FieldError::invalid_param("sources", e.to_string())),
    }
}

/// Checks one source for a finite positive strength and a finite position.
pub fn validate_spec(index: usize, spec: &SourceSpec) -> Result<(), FieldError> {
    if !(spec.strength.is_finite() && spec.strength > 0.0) {
        return Err(FieldError::InvalidSource {
            index,
            reason: format!("strength must be finite and positive, got {}", spec.strength),
        });
    }
    if !(spec.x.is_finite() && spec.y.is_finite()) {
        return Err(FieldError::InvalidSource {
            index,
            reason: "position must be finite".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_give_defaults() {
        let config = SimConfig::from_json(800, 600, &json!({})).unwrap();
        assert_eq!(config, SimConfig::new(800.0, 600.0));
    }

    #[test]
    fn point_count_uses_padded_area() {
        let config = SimConfig::new(800.0, 600.0);
        // (900 * 700) / 100
        assert_eq!(config.point_count(), 6300);
    }

    #[test]
    fn point_count_truncates() {
        let mut config = SimConfig::new(10.0, 10.0);
        config.padding_x = 0.0;
        config.padding_y = 0.0;
        config.density = 3.0;
        // 100 / 9 = 11.1
        assert_eq!(config.point_count(), 11);
    }

    #[test]
    fn zero_history_is_rejected() {
        let err = SimConfig::from_json(100, 100, &json!({"history": 0})).unwrap_err();
        assert!(matches!(err, FieldError::InvalidHistory));
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = SimConfig::from_json(0, 100, &json!({})).unwrap_err();
        assert!(matches!(err, FieldError::InvalidDimensions { .. }));
    }

    #[test]
    fn negative_density_is_rejected() {
        let err = SimConfig::from_json(100, 100, &json!({"density": -4})).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParam { ref name, .. } if name == "density"));
    }

    #[test]
    fn zero_density_is_rejected() {
        assert!(SimConfig::from_json(100, 100, &json!({"density": 0})).is_err());
    }

    #[test]
    fn tiny_density_is_rejected() {
        let err = SimConfig::from_json(800, 600, &json!({"density": 1e-9})).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParam { ref name, .. } if name == "density"));
    }

    #[test]
    fn point_count_at_limit_is_accepted() {
        // 4096 * 4096 = MAX_POINTS exactly.
        let config = SimConfig {
            padding_x: 0.0,
            padding_y: 0.0,
            density: 1.0,
            ..SimConfig::new(4096.0, 4096.0)
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.point_count(), MAX_POINTS);

        let over = SimConfig {
            padding_x: 1.0,
            ..config
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn negative_removal_radius_is_rejected() {
        assert!(SimConfig::from_json(100, 100, &json!({"removal_radius": -1.0})).is_err());
    }

    #[test]
    fn inverted_strength_range_is_rejected() {
        let params = json!({"strength_min": 30, "strength_max": 10});
        let err = SimConfig::from_json(100, 100, &params).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParam { ref name, .. } if name == "strength_max"));
    }

    #[test]
    fn unknown_layout_is_rejected() {
        let err = SimConfig::from_json(100, 100, &json!({"source_layout": "spiral"})).unwrap_err();
        assert!(matches!(err, FieldError::UnknownLayout(ref s) if s == "spiral"));
    }

    #[test]
    fn sources_array_implies_explicit_layout() {
        let params = json!({"sources": [{"strength": 20, "x": -100, "y": 0, "polarity": -1}]});
        let config = SimConfig::from_json(400, 400, &params).unwrap();
        assert_eq!(
            config.sources,
            SourceLayout::Explicit(vec![SourceSpec::new(20.0, -100.0, 0.0, Polarity::Attractor)])
        );
    }

    #[test]
    fn bad_polarity_is_rejected() {
        let params = json!({"sources": [{"strength": 20, "x": 0, "y": 0, "polarity": 0}]});
        let err = SimConfig::from_json(400, 400, &params).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParam { ref name, .. } if name == "sources"));
    }

    #[test]
    fn non_positive_explicit_strength_is_rejected() {
        let params = json!({"sources": [
            {"strength": 20, "x": 0, "y": 0, "polarity": 1},
            {"strength": 0, "x": 5, "y": 5, "polarity": -1}
        ]});
        let err = SimConfig::from_json(400, 400, &params).unwrap_err();
        assert!(matches!(err, FieldError::InvalidSource { index: 1, .. }));
    }

    #[test]
    fn dipoles_layout_parses() {
        let config = SimConfig::from_json(400, 400, &json!({"source_layout": "dipoles"})).unwrap();
        assert_eq!(config.sources, SourceLayout::Dipoles);
    }

    #[test]
    fn to_json_round_trips_through_from_json() {
        let params = json!({
            "gain": 3.5,
            "history": 7,
            "respawn": false,
            "rotation": 0.5,
            "sources": [{"strength": 12.5, "x": 1, "y": 2, "polarity": 1}]
        });
        let config = SimConfig::from_json(320, 240, &params).unwrap();
        let again = SimConfig::from_json(320, 240, &config.to_json()).unwrap();
        assert_eq!(config, again);
    }

    #[test]
    fn polarity_serializes_as_sign() {
        assert_eq!(serde_json::to_value(Polarity::Attractor).unwrap(), json!(-1));
        assert_eq!(serde_json::to_value(Polarity::Repeller).unwrap(), json!(1));
        assert_eq!(Polarity::Attractor.sign(), -1.0);
    }

    #[test]
    fn schema_covers_every_emitted_key() {
        let schema = SimConfig::schema();
        let config = SimConfig::from_json(100, 100, &json!({})).unwrap();
        for key in config.to_json().as_object().unwrap().keys() {
            assert!(schema.get(key).is_some(), "schema missing {key}");
            assert!(schema[key].get("description").is_some(), "{key} missing description");
        }
    }

    #[test]
    fn dipoles_have_three_of_each_polarity() {
        let attractors = DIPOLES
            .iter()
            .filter(|s| s.polarity == Polarity::Attractor)
            .count();
        assert_eq!(attractors, 3);
    }
}
