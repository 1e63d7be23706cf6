//! Drawing style: colors, line widths and trail fade.

use fieldlines_core::error::FieldError;
use fieldlines_core::params::{param_bool, param_string, param_usize};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::color::Srgb;

pub const DEFAULT_BACKGROUND: &str = "#000000";
pub const DEFAULT_POINT_COLOR: &str = "#ffffff";
pub const DEFAULT_TRACE_COLOR: &str = "#ff4040";
pub const DEFAULT_EXPIRED_COLOR: &str = "#606060";
pub const DEFAULT_POINT_WIDTH: usize = 1;
pub const DEFAULT_TRACE_WIDTH: usize = 2;
pub const DEFAULT_FADE: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub background: Srgb,
    /// Color of point trails.
    pub point_color: Srgb,
    /// Color of live probe trajectories.
    pub trace_color: Srgb,
    /// Color of finished traced trajectories.
    pub expired_color: Srgb,
    /// Brush size in pixels; 0 disables drawing.
    pub point_width: u32,
    pub trace_width: u32,
    /// Background alpha blended over the frame before each draw. 255 clears
    /// it, 0 keeps every trail forever.
    pub fade: u8,
    /// Color each trail segment by its direction instead of `point_color`.
    pub hue_by_direction: bool,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: Srgb::BLACK,
            point_color: Srgb::WHITE,
            trace_color: Srgb::new(1.0, 64.0 / 255.0, 64.0 / 255.0),
            expired_color: Srgb::new(96.0 / 255.0, 96.0 / 255.0, 96.0 / 255.0),
            point_width: DEFAULT_POINT_WIDTH as u32,
            trace_width: DEFAULT_TRACE_WIDTH as u32,
            fade: DEFAULT_FADE as u8,
            hue_by_direction: false,
        }
    }
}

impl Style {
    /// Reads a style from a JSON object. Missing keys take their defaults.
    pub fn from_json(params: &Value) -> Result<Self, FieldError> {
        let color = |name: &str, default: &str| -> Result<Srgb, FieldError> {
            Srgb::from_hex(&param_string(params, name, default)?)
        };
        let width = |name: &str, default: usize| -> Result<u32, FieldError> {
            let w = param_usize(params, name, default)?;
            u32::try_from(w)
                .ok()
                .filter(|&w| w <= 64)
                .ok_or_else(|| FieldError::invalid_param(name, "must be at most 64"))
        };
        let fade = param_usize(params, "fade", DEFAULT_FADE)?;
        let fade = u8::try_from(fade)
            .map_err(|_| FieldError::invalid_param("fade", "must be in [0, 255]"))?;

        Ok(Self {
            background: color("background", DEFAULT_BACKGROUND)?,
            point_color: color("point_color", DEFAULT_POINT_COLOR)?,
            trace_color: color("trace_color", DEFAULT_TRACE_COLOR)?,
            expired_color: color("expired_color", DEFAULT_EXPIRED_COLOR)?,
            point_width: width("point_width", DEFAULT_POINT_WIDTH)?,
            trace_width: width("trace_width", DEFAULT_TRACE_WIDTH)?,
            fade,
            hue_by_direction: param_bool(params, "hue_by_direction", false)?,
        })
    }

    pub fn schema() -> Value {
        json!({
            "background": { "type": "string", "default": DEFAULT_BACKGROUND },
            "point_color": { "type": "string", "default": DEFAULT_POINT_COLOR },
            "trace_color": { "type": "string", "default": DEFAULT_TRACE_COLOR },
            "expired_color": { "type": "string", "default": DEFAULT_EXPIRED_COLOR },
            "point_width": { "type": "integer", "default": DEFAULT_POINT_WIDTH, "min": 0, "max": 64 },
            "trace_width": { "type": "integer", "default": DEFAULT_TRACE_WIDTH, "min": 0, "max": 64 },
            "fade": { "type": "integer", "default": DEFAULT_FADE, "min": 0, "max": 255 },
            "hue_by_direction": { "type": "boolean", "default": false },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Style::from_json(&json!({})).unwrap(), Style::default());
    }

    #[test]
    fn default_colors_match_hex_constants() {
        let style = Style::default();
        assert_eq!(style.trace_color.to_hex(), DEFAULT_TRACE_COLOR);
        assert_eq!(style.expired_color.to_hex(), DEFAULT_EXPIRED_COLOR);
    }

    #[test]
    fn overrides_are_applied() {
        let style = Style::from_json(&json!({
            "background": "#102030",
            "point_width": 3,
            "fade": 255,
            "hue_by_direction": true,
        }))
        .unwrap();
        assert_eq!(style.background.to_hex(), "#102030");
        assert_eq!(style.point_width, 3);
        assert_eq!(style.fade, 255);
        assert!(style.hue_by_direction);
    }

    #[test]
    fn out_of_range_fade_is_rejected() {
        let err = Style::from_json(&json!({ "fade": 300 })).unwrap_err();
        assert!(matches!(err, FieldError::InvalidParam { ref name, .. } if name == "fade"));
    }

    #[test]
    fn bad_color_is_rejected() {
        let err = Style::from_json(&json!({ "point_color": "white" })).unwrap_err();
        assert!(matches!(err, FieldError::InvalidColor(_)));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let err = Style::from_json(&json!({ "hue_by_direction": "yes" })).unwrap_err();
        assert!(matches!(err, FieldError::ParamTypeMismatch { .. }));
    }

    #[test]
    fn schema_lists_every_key() {
        let schema = Style::schema();
        for key in [
            "background",
            "point_color",
            "trace_color",
            "expired_color",
            "point_width",
            "trace_width",
            "fade",
            "hue_by_direction",
        ] {
            assert!(schema.get(key).is_some(), "missing {key}");
        }
    }
}
