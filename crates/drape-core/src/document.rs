//! Persisted design documents.
//!
//! A `SurfaceDocument` is the lossless, id-free form of one surface: every
//! element in z-order with its full property set. Selection, guides, and the
//! garment template are never written. `DesignDocuments` pairs the two sides
//! and knows how to encode itself as JSON (the storefront wire format) or
//! MessagePack (compact snapshots).

use crate::model::{
    ElementKind, MAX_EXTENT, MAX_FONT_SIZE, MAX_FONT_WEIGHT, MAX_LINE_HEIGHT, MAX_STROKE_WIDTH,
    MIN_FONT_SIZE, MIN_FONT_WEIGHT, MIN_LINE_HEIGHT, SurfaceSide, SurfaceSize, Transform,
};
use crate::surface::SceneSurface;
use serde::{Deserialize, Serialize};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// Tolerance for comparing persisted surface dimensions.
const DIMENSION_EPSILON: f32 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not encode MessagePack document: {0}")]
    MsgpackEncode(#[from] rmp_serde::encode::Error),
    #[error("malformed MessagePack document: {0}")]
    MsgpackDecode(#[from] rmp_serde::decode::Error),
    #[error("unsupported document version {found}")]
    UnsupportedVersion { found: u32 },
    #[error("document is {found_width}x{found_height} but the surface is {width}x{height}")]
    DimensionMismatch {
        width: f32,
        height: f32,
        found_width: f32,
        found_height: f32,
    },
    #[error("element {index}: `{field}` is not finite or out of range")]
    InvalidGeometry { index: usize, field: &'static str },
    #[error("element {index}: font family is empty")]
    EmptyFontFamily { index: usize },
}

/// One persisted element. Ids are not stored; they are regenerated on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub name: String,
    pub transform: Transform,
    pub shape: ElementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceDocument {
    pub version: u32,
    pub width: f32,
    pub height: f32,
    pub elements: Vec<ElementRecord>,
}

impl SurfaceDocument {
    pub fn empty(size: SurfaceSize) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            width: size.width,
            height: size.height,
            elements: Vec::new(),
        }
    }

    /// Capture every element of `surface` in z-order.
    pub fn from_surface(surface: &SceneSurface) -> Self {
        let size = surface.size();
        Self {
            version: DOCUMENT_VERSION,
            width: size.width,
            height: size.height,
            elements: surface
                .elements()
                .iter()
                .map(|e| ElementRecord {
                    name: e.name.clone(),
                    transform: e.transform,
                    shape: e.kind.clone(),
                })
                .collect(),
        }
    }

    /// Check the whole document against a target surface size.
    pub fn validate(&self, size: SurfaceSize) -> Result<(), DocumentError> {
        if self.version != DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: self.version,
            });
        }
        if (self.width - size.width).abs() > DIMENSION_EPSILON
            || (self.height - size.height).abs() > DIMENSION_EPSILON
        {
            return Err(DocumentError::DimensionMismatch {
                width: size.width,
                height: size.height,
                found_width: self.width,
                found_height: self.height,
            });
        }
        for (index, record) in self.elements.iter().enumerate() {
            validate_record(index, record)?;
        }
        Ok(())
    }
}

fn validate_record(index: usize, record: &ElementRecord) -> Result<(), DocumentError> {
    let bad = |field: &'static str| DocumentError::InvalidGeometry { index, field };
    let finite = |v: f32, field: &'static str| if v.is_finite() { Ok(()) } else { Err(bad(field)) };
    // NaN fails both comparisons.
    let within = |v: f32, lo: f32, hi: f32, field: &'static str| {
        if v >= lo && v <= hi { Ok(()) } else { Err(bad(field)) }
    };
    let extent = |v: f32, field: &'static str| within(v, 0.0, MAX_EXTENT, field);

    let t = &record.transform;
    finite(t.x, "x")?;
    finite(t.y, "y")?;
    finite(t.rotation, "rotation")?;
    within(t.scale_x, f32::MIN_POSITIVE, f32::MAX, "scaleX")?;
    within(t.scale_y, f32::MIN_POSITIVE, f32::MAX, "scaleY")?;

    match &record.shape {
        ElementKind::Rect {
            width,
            height,
            corner_radius,
            ..
        } => {
            extent(*width, "width")?;
            extent(*height, "height")?;
            extent(*corner_radius, "cornerRadius")?;
        }
        ElementKind::Circle { radius, .. } => extent(*radius, "radius")?,
        ElementKind::Image { width, height, .. } => {
            extent(*width, "width")?;
            extent(*height, "height")?;
        }
        ElementKind::Text { style, .. } => {
            if style.font_family.trim().is_empty() {
                return Err(DocumentError::EmptyFontFamily { index });
            }
            within(style.font_size, MIN_FONT_SIZE, MAX_FONT_SIZE, "fontSize")?;
            within(style.line_height, MIN_LINE_HEIGHT, MAX_LINE_HEIGHT, "lineHeight")?;
            within(style.stroke_width, 0.0, MAX_STROKE_WIDTH, "strokeWidth")?;
            if !(MIN_FONT_WEIGHT..=MAX_FONT_WEIGHT).contains(&style.font_weight) {
                return Err(bad("fontWeight"));
            }
        }
    }
    Ok(())
}

/// Both sides of a design, as stored by the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignDocuments {
    pub front: SurfaceDocument,
    pub back: SurfaceDocument,
}

impl DesignDocuments {
    pub fn side(&self, side: SurfaceSide) -> &SurfaceDocument {
        match side {
            SurfaceSide::Front => &self.front,
            SurfaceSide::Back => &self.back,
        }
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode as MessagePack with field names, so tagged element kinds
    /// decode unambiguously.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, DocumentError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, DocumentError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
