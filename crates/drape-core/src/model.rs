//! Design element model for garment surfaces.
//!
//! A design is two independent surfaces (front and back). Each surface holds
//! an ordered list of `DesignElement`s (shapes, text, and uploaded images)
//! painted in list order above a pinned garment template. Geometry is in
//! logical surface units, independent of on-screen pixel size.

use crate::id::ElementId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGBA color. Persisted as a hex string so documents round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();

        match bytes.len() {
            3 | 4 => {
                let r = hex_val(bytes[0])? * 17;
                let g = hex_val(bytes[1])? * 17;
                let b = hex_val(bytes[2])? * 17;
                let a = match bytes.get(3) {
                    Some(&c) => hex_val(c)? * 17,
                    None => 255,
                };
                Some(Self::rgba(r, g, b, a))
            }
            6 | 8 => {
                let pair = |i: usize| -> Option<u8> {
                    Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?)
                };
                let a = if bytes.len() == 8 { pair(6)? } else { 255 };
                Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, a))
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Channels as `[0.0, 1.0]` floats.
    pub fn to_f32_array(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal text alignment within the text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Typography and decoration of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_family: String,
    pub font_size: f32,
    /// CSS-style weight, 100..=900.
    pub font_weight: u16,
    pub font_style: FontStyle,
    pub text_align: TextAlign,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub underline: bool,
    pub strikethrough: bool,
    pub overline: bool,
    /// Outline color; `None` draws no outline.
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    pub fill: Color,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".into(),
            font_size: 32.0,
            font_weight: 400,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
            line_height: 1.16,
            underline: false,
            strikethrough: false,
            overline: false,
            stroke: None,
            stroke_width: 1.0,
            fill: Color::BLACK,
        }
    }
}

impl TextStyle {
    /// Pull every numeric field into its accepted range. An empty family
    /// falls back to the default one.
    pub fn clamp_to_limits(&mut self) {
        if self.font_family.trim().is_empty() {
            self.font_family = TextStyle::default().font_family;
        }
        self.font_size = clamp_finite(self.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.line_height = clamp_finite(self.line_height, MIN_LINE_HEIGHT, MAX_LINE_HEIGHT);
        self.stroke_width = clamp_finite(self.stroke_width, 0.0, MAX_STROKE_WIDTH);
        self.font_weight = self.font_weight.clamp(MIN_FONT_WEIGHT, MAX_FONT_WEIGHT);
    }
}

// ─── Limits ──────────────────────────────────────────────────────────────
//
// Shared by every write path and by document validation, so whatever the
// editor can produce is also loadable.

/// Largest width, height or radius of an element, in logical units.
pub const MAX_EXTENT: f32 = 100_000.0;
pub const MIN_FONT_SIZE: f32 = 1.0;
pub const MAX_FONT_SIZE: f32 = 1_000.0;
/// Line height bounds, as multiples of the font size.
pub const MIN_LINE_HEIGHT: f32 = 0.1;
pub const MAX_LINE_HEIGHT: f32 = 10.0;
pub const MAX_STROKE_WIDTH: f32 = 100.0;
pub const MIN_FONT_WEIGHT: u16 = 100;
pub const MAX_FONT_WEIGHT: u16 = 900;

/// `v` clamped to `[lo, hi]`; NaN maps to `lo`.
pub fn clamp_finite(v: f32, lo: f32, hi: f32) -> f32 {
    if v.is_nan() { lo } else { v.clamp(lo, hi) }
}

/// Average glyph advance as a fraction of the font size. Used to size text
/// blocks without a font engine; the rasterizer measures real glyphs.
pub const AVERAGE_ADVANCE_EM: f32 = 0.6;

/// Approximate the unscaled size of a text block.
pub fn estimate_text_size(content: &str, style: &TextStyle) -> (f32, f32) {
    let lines: Vec<&str> = content.split('\n').collect();
    let widest = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let width = widest as f32 * style.font_size * AVERAGE_ADVANCE_EM;
    let height = lines.len() as f32 * style.font_size * style.line_height;
    (width, height)
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Placement of an element on its surface.
///
/// `x`/`y` is the top-left of the unrotated box. Scale is kept separate from
/// intrinsic size while the user resizes interactively; the property bridge
/// bakes it back into the size on commit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub x: f32,
    pub y: f32,
    /// Degrees, clockwise, about the element center.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// Non-finite placement becomes 0; a scale that is not a positive
    /// finite number becomes 1.
    pub fn clamp_to_limits(&mut self) {
        for v in [&mut self.x, &mut self.y, &mut self.rotation] {
            if !v.is_finite() {
                *v = 0.0;
            }
        }
        for s in [&mut self.scale_x, &mut self.scale_y] {
            if !(s.is_finite() && *s > 0.0) {
                *s = 1.0;
            }
        }
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

/// What an element is, with its kind-specific properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ElementKind {
    Rect {
        width: f32,
        height: f32,
        corner_radius: f32,
        fill: Color,
    },
    Circle {
        radius: f32,
        fill: Color,
    },
    Text {
        content: String,
        style: TextStyle,
    },
    /// A user image placed on the garment. Never the garment template.
    Image {
        width: f32,
        height: f32,
        source_ref: String,
    },
}

impl ElementKind {
    /// Human-readable kind label, used for auto-generated names.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Rect { .. } => "Rect",
            ElementKind::Circle { .. } => "Circle",
            ElementKind::Text { .. } => "Text",
            ElementKind::Image { .. } => "Image",
        }
    }

    /// Unscaled width and height.
    pub fn intrinsic_size(&self) -> (f32, f32) {
        match self {
            ElementKind::Rect { width, height, .. } | ElementKind::Image { width, height, .. } => {
                (*width, *height)
            }
            ElementKind::Circle { radius, .. } => (radius * 2.0, radius * 2.0),
            ElementKind::Text { content, style } => estimate_text_size(content, style),
        }
    }

    pub fn clamp_to_limits(&mut self) {
        let extent = |v: &mut f32| *v = clamp_finite(*v, 0.0, MAX_EXTENT);
        match self {
            ElementKind::Rect {
                width,
                height,
                corner_radius,
                ..
            } => {
                extent(width);
                extent(height);
                extent(corner_radius);
            }
            ElementKind::Circle { radius, .. } => extent(radius),
            ElementKind::Image { width, height, .. } => {
                extent(width);
                extent(height);
            }
            ElementKind::Text { style, .. } => style.clamp_to_limits(),
        }
    }
}

/// One selectable, editable object on a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignElement {
    pub id: ElementId,
    /// Display name for the layer list: `"Rect 3"`, or the text itself.
    pub name: String,
    pub transform: Transform,
    pub kind: ElementKind,
}

impl DesignElement {
    pub fn new(id: ElementId, name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Transform::default(),
            kind,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }

    /// Intrinsic size multiplied by the current scale.
    pub fn effective_size(&self) -> (f32, f32) {
        let (w, h) = self.kind.intrinsic_size();
        (w * self.transform.scale_x, h * self.transform.scale_y)
    }

    /// Axis-aligned box of the unrotated element.
    pub fn bounds(&self) -> Bounds {
        let (width, height) = self.effective_size();
        Bounds {
            x: self.transform.x,
            y: self.transform.y,
            width,
            height,
        }
    }

    /// Clamp geometry and style into the ranges a document accepts.
    pub fn clamp_to_limits(&mut self) {
        self.transform.clamp_to_limits();
        self.kind.clamp_to_limits();
    }
}

/// The garment silhouette drawn beneath every element.
///
/// Lives in the surface's reserved background slot: never selectable, never
/// serialized, always bottom of z-order. Its alpha channel defines the
/// drawable region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateImage {
    pub source_ref: String,
}

impl TemplateImage {
    pub fn new(source_ref: impl Into<String>) -> Self {
        Self {
            source_ref: source_ref.into(),
        }
    }
}

// ─── Surfaces ────────────────────────────────────────────────────────────

/// Which side of the garment a surface represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SurfaceSide {
    #[default]
    Front,
    Back,
}

impl SurfaceSide {
    pub const ALL: [SurfaceSide; 2] = [SurfaceSide::Front, SurfaceSide::Back];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceSide::Front => "front",
            SurfaceSide::Back => "back",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "front" => Some(SurfaceSide::Front),
            "back" => Some(SurfaceSide::Back),
            _ => None,
        }
    }
}

/// Fixed logical size of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const DEFAULT: SurfaceSize = SurfaceSize {
        width: 500.0,
        height: 600.0,
    };

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned box in surface coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Bounds {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }

    /// Check if this bounds intersects another (AABB overlap).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}
