//! Studio configuration.
//!
//! Every field has a default, so hosts only override what they need:
//! `{"snapZone": 10}` is a complete config.

use crate::model::{Color, SurfaceSize, TextStyle};
use serde::{Deserialize, Serialize};

/// Tunables shared by both surfaces of a studio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudioConfig {
    /// Logical surface size, identical for front and back.
    pub surface: SurfaceSize,
    /// Distance from a midline within which a dragged center snaps onto it.
    pub snap_zone: f32,
    /// Offset applied to each successive paste.
    pub paste_offset: f32,
    pub defaults: ElementDefaults,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            surface: SurfaceSize::DEFAULT,
            snap_zone: 15.0,
            paste_offset: 10.0,
            defaults: ElementDefaults::default(),
        }
    }
}

impl StudioConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Initial properties for elements created from the toolbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementDefaults {
    pub rect_width: f32,
    pub rect_height: f32,
    pub circle_radius: f32,
    pub shape_fill: Color,
    pub text_content: String,
    pub text: TextStyle,
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            rect_width: 100.0,
            rect_height: 100.0,
            circle_radius: 50.0,
            shape_fill: Color::rgb(0xE7, 0x4C, 0x3C),
            text_content: "Your text".into(),
            text: TextStyle::default(),
        }
    }
}
