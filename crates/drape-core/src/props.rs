//! Property snapshots for the property panel.
//!
//! `ElementProps` is a display-friendly view of one element: position,
//! effective size, rotation, and kind-specific extras. Sizes are reported
//! with the current scale folded in; writing a snapshot back resets scale to
//! 1 and bakes the size into the element, so scale and size never drift
//! apart after repeated edits.

use crate::model::{
    Color, DesignElement, ElementKind, FontStyle, MAX_STROKE_WIDTH, TextAlign, TextStyle,
    Transform, clamp_finite,
};
use serde::{Deserialize, Serialize};

/// Position, effective size and rotation shared by every kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrameProps {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees.
    pub angle: f32,
}

/// Snapshot of the active element, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ElementProps {
    Rect {
        frame: FrameProps,
        corner_radius: f32,
        fill: Color,
    },
    Circle {
        frame: FrameProps,
        radius: f32,
        fill: Color,
    },
    Text {
        frame: FrameProps,
        content: String,
        style: TextStyle,
    },
    Image {
        frame: FrameProps,
        source_ref: String,
    },
}

/// A field the panel can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelField {
    X,
    Y,
    Width,
    Height,
    Angle,
    CornerRadius,
    Radius,
    Fill,
    Content,
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    TextAlign,
    LineHeight,
    Underline,
    Strikethrough,
    Overline,
    Stroke,
    StrokeWidth,
}

const RECT_FIELDS: &[PanelField] = &[
    PanelField::X,
    PanelField::Y,
    PanelField::Width,
    PanelField::Height,
    PanelField::Angle,
    PanelField::CornerRadius,
    PanelField::Fill,
];

const CIRCLE_FIELDS: &[PanelField] = &[
    PanelField::X,
    PanelField::Y,
    PanelField::Radius,
    PanelField::Angle,
    PanelField::Fill,
];

const TEXT_FIELDS: &[PanelField] = &[
    PanelField::X,
    PanelField::Y,
    PanelField::Angle,
    PanelField::Content,
    PanelField::FontFamily,
    PanelField::FontSize,
    PanelField::FontWeight,
    PanelField::FontStyle,
    PanelField::TextAlign,
    PanelField::LineHeight,
    PanelField::Underline,
    PanelField::Strikethrough,
    PanelField::Overline,
    PanelField::Stroke,
    PanelField::StrokeWidth,
    PanelField::Fill,
];

const IMAGE_FIELDS: &[PanelField] = &[
    PanelField::X,
    PanelField::Y,
    PanelField::Width,
    PanelField::Height,
    PanelField::Angle,
];

/// Why a snapshot could not be written back.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropsError {
    #[error("snapshot is for a {snapshot} but the element is a {element}")]
    KindMismatch {
        snapshot: &'static str,
        element: &'static str,
    },
    #[error("{0:?} must be a finite number")]
    NonFinite(PanelField),
}

impl ElementProps {
    /// Compute the snapshot for an element.
    pub fn of(element: &DesignElement) -> Self {
        let t = &element.transform;
        let (width, height) = element.effective_size();
        let frame = FrameProps {
            x: t.x,
            y: t.y,
            width,
            height,
            angle: t.rotation,
        };
        match &element.kind {
            ElementKind::Rect {
                corner_radius,
                fill,
                ..
            } => ElementProps::Rect {
                frame,
                corner_radius: *corner_radius,
                fill: *fill,
            },
            ElementKind::Circle { radius, fill } => ElementProps::Circle {
                frame,
                radius: radius * t.scale_x,
                fill: *fill,
            },
            ElementKind::Text { content, style } => {
                let mut style = style.clone();
                style.font_size *= t.scale_y;
                ElementProps::Text {
                    frame,
                    content: content.clone(),
                    style,
                }
            }
            ElementKind::Image { source_ref, .. } => ElementProps::Image {
                frame,
                source_ref: source_ref.clone(),
            },
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ElementProps::Rect { .. } => "Rect",
            ElementProps::Circle { .. } => "Circle",
            ElementProps::Text { .. } => "Text",
            ElementProps::Image { .. } => "Image",
        }
    }

    pub fn frame(&self) -> &FrameProps {
        match self {
            ElementProps::Rect { frame, .. }
            | ElementProps::Circle { frame, .. }
            | ElementProps::Text { frame, .. }
            | ElementProps::Image { frame, .. } => frame,
        }
    }

    pub fn frame_mut(&mut self) -> &mut FrameProps {
        match self {
            ElementProps::Rect { frame, .. }
            | ElementProps::Circle { frame, .. }
            | ElementProps::Text { frame, .. }
            | ElementProps::Image { frame, .. } => frame,
        }
    }

    /// The panel fields relevant to this kind, in display order.
    pub fn fields(&self) -> &'static [PanelField] {
        match self {
            ElementProps::Rect { .. } => RECT_FIELDS,
            ElementProps::Circle { .. } => CIRCLE_FIELDS,
            ElementProps::Text { .. } => TEXT_FIELDS,
            ElementProps::Image { .. } => IMAGE_FIELDS,
        }
    }

    /// Write the snapshot onto `element`, resetting scale to 1. Values
    /// outside the document limits are clamped into range.
    pub fn apply_to(&self, element: &mut DesignElement) -> Result<(), PropsError> {
        self.check_finite()?;
        let frame = self.frame();
        let transform = Transform {
            x: frame.x,
            y: frame.y,
            rotation: frame.angle,
            scale_x: 1.0,
            scale_y: 1.0,
        };

        match (self, &mut element.kind) {
            (
                ElementProps::Rect {
                    frame,
                    corner_radius,
                    fill,
                },
                ElementKind::Rect {
                    width,
                    height,
                    corner_radius: r,
                    fill: f,
                },
            ) => {
                *width = frame.width;
                *height = frame.height;
                *r = *corner_radius;
                *f = *fill;
            }
            (ElementProps::Circle { radius, fill, .. }, ElementKind::Circle { radius: r, fill: f }) => {
                *r = *radius;
                *f = *fill;
            }
            (
                ElementProps::Text { content, style, .. },
                ElementKind::Text {
                    content: c,
                    style: s,
                },
            ) => {
                *c = content.clone();
                *s = style.clone();
                element.name = content.clone();
            }
            (
                ElementProps::Image { frame, .. },
                ElementKind::Image { width, height, .. },
            ) => {
                *width = frame.width;
                *height = frame.height;
            }
            (props, kind) => {
                return Err(PropsError::KindMismatch {
                    snapshot: props.kind_label(),
                    element: kind.label(),
                });
            }
        }

        element.kind.clamp_to_limits();
        element.transform = transform;
        Ok(())
    }

    fn check_finite(&self) -> Result<(), PropsError> {
        let frame = self.frame();
        let mut numbers = vec![
            (PanelField::X, frame.x),
            (PanelField::Y, frame.y),
            (PanelField::Width, frame.width),
            (PanelField::Height, frame.height),
            (PanelField::Angle, frame.angle),
        ];
        match self {
            ElementProps::Rect { corner_radius, .. } => {
                numbers.push((PanelField::CornerRadius, *corner_radius));
            }
            ElementProps::Circle { radius, .. } => numbers.push((PanelField::Radius, *radius)),
            ElementProps::Text { style, .. } => {
                numbers.push((PanelField::FontSize, style.font_size));
                numbers.push((PanelField::LineHeight, style.line_height));
                numbers.push((PanelField::StrokeWidth, style.stroke_width));
            }
            ElementProps::Image { .. } => {}
        }
        match numbers.into_iter().find(|(_, v)| !v.is_finite()) {
            Some((field, _)) => Err(PropsError::NonFinite(field)),
            None => Ok(()),
        }
    }
}

/// A continuous panel edit (typed numbers, text content). Staged while the
/// user types and written back on blur or Enter.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    X(f32),
    Y(f32),
    Width(f32),
    Height(f32),
    Angle(f32),
    CornerRadius(f32),
    Radius(f32),
    Fill(Color),
    Content(String),
    FontSize(f32),
    LineHeight(f32),
}

impl FieldEdit {
    /// Parse a raw panel value for `field`. Returns `None` for unparsable
    /// input or fields that are not continuous edits.
    pub fn parse(field: PanelField, raw: &str) -> Option<Self> {
        let num = || raw.trim().parse::<f32>().ok().filter(|v| v.is_finite());
        match field {
            PanelField::X => num().map(FieldEdit::X),
            PanelField::Y => num().map(FieldEdit::Y),
            PanelField::Width => num().map(FieldEdit::Width),
            PanelField::Height => num().map(FieldEdit::Height),
            PanelField::Angle => num().map(FieldEdit::Angle),
            PanelField::CornerRadius => num().map(FieldEdit::CornerRadius),
            PanelField::Radius => num().map(FieldEdit::Radius),
            PanelField::FontSize => num().map(FieldEdit::FontSize),
            PanelField::LineHeight => num().map(FieldEdit::LineHeight),
            PanelField::Fill => Color::from_hex(raw).map(FieldEdit::Fill),
            PanelField::Content => Some(FieldEdit::Content(raw.to_string())),
            _ => None,
        }
    }

    /// Apply onto a snapshot. Returns `false` when the field does not exist
    /// for the snapshot's kind.
    pub fn apply(&self, props: &mut ElementProps) -> bool {
        match self {
            FieldEdit::X(v) => props.frame_mut().x = *v,
            FieldEdit::Y(v) => props.frame_mut().y = *v,
            FieldEdit::Angle(v) => props.frame_mut().angle = *v,
            FieldEdit::Width(v) => match props {
                ElementProps::Rect { frame, .. } | ElementProps::Image { frame, .. } => {
                    frame.width = *v
                }
                _ => return false,
            },
            FieldEdit::Height(v) => match props {
                ElementProps::Rect { frame, .. } | ElementProps::Image { frame, .. } => {
                    frame.height = *v
                }
                _ => return false,
            },
            FieldEdit::CornerRadius(v) => match props {
                ElementProps::Rect { corner_radius, .. } => *corner_radius = *v,
                _ => return false,
            },
            FieldEdit::Radius(v) => match props {
                ElementProps::Circle { frame, radius, .. } => {
                    *radius = *v;
                    frame.width = v * 2.0;
                    frame.height = v * 2.0;
                }
                _ => return false,
            },
            FieldEdit::Fill(c) => match props {
                ElementProps::Rect { fill, .. } | ElementProps::Circle { fill, .. } => *fill = *c,
                ElementProps::Text { style, .. } => style.fill = *c,
                ElementProps::Image { .. } => return false,
            },
            FieldEdit::Content(s) => match props {
                ElementProps::Text { content, .. } => *content = s.clone(),
                _ => return false,
            },
            FieldEdit::FontSize(v) => match props {
                ElementProps::Text { style, .. } => style.font_size = *v,
                _ => return false,
            },
            FieldEdit::LineHeight(v) => match props {
                ElementProps::Text { style, .. } => style.line_height = *v,
                _ => return false,
            },
        }
        true
    }
}

/// A discrete text-style choice (dropdowns, toggles, color pickers),
/// applied to the element immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TextChange {
    FontFamily(String),
    FontWeight(u16),
    FontStyle(FontStyle),
    TextAlign(TextAlign),
    Underline(bool),
    Strikethrough(bool),
    Overline(bool),
    Stroke(Option<Color>),
    StrokeWidth(f32),
    Fill(Color),
}

impl TextChange {
    /// Apply to `style`. Returns `false`, leaving the style untouched, for
    /// a blank font family.
    pub fn apply(&self, style: &mut TextStyle) -> bool {
        match self {
            TextChange::FontFamily(f) if f.trim().is_empty() => return false,
            TextChange::FontFamily(f) => style.font_family = f.trim().to_string(),
            TextChange::FontWeight(w) => style.font_weight = *w,
            TextChange::FontStyle(s) => style.font_style = *s,
            TextChange::TextAlign(a) => style.text_align = *a,
            TextChange::Underline(on) => style.underline = *on,
            TextChange::Strikethrough(on) => style.strikethrough = *on,
            TextChange::Overline(on) => style.overline = *on,
            TextChange::Stroke(c) => style.stroke = *c,
            TextChange::StrokeWidth(w) => {
                style.stroke_width = clamp_finite(*w, 0.0, MAX_STROKE_WIDTH)
            }
            TextChange::Fill(c) => style.fill = *c,
        }
        style.clamp_to_limits();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ElementId;
    use pretty_assertions::assert_eq;

    fn rect(w: f32, h: f32) -> DesignElement {
        DesignElement::new(
            ElementId::intern("props_rect"),
            "Rect 1",
            ElementKind::Rect {
                width: w,
                height: h,
                corner_radius: 4.0,
                fill: Color::BLACK,
            },
        )
    }

    #[test]
    fn snapshot_reports_effective_size() {
        let mut el = rect(100.0, 50.0);
        el.transform.scale_x = 1.5;
        el.transform.scale_y = 2.0;
        el.transform.rotation = 30.0;
        let props = ElementProps::of(&el);
        assert_eq!(
            *props.frame(),
            FrameProps {
                x: 0.0,
                y: 0.0,
                width: 150.0,
                height: 100.0,
                angle: 30.0
            }
        );
    }

    #[test]
    fn apply_bakes_scale_into_size() {
        let mut el = rect(100.0, 50.0);
        el.transform.scale_x = 2.0;
        el.transform.scale_y = 2.0;
        let props = ElementProps::of(&el);
        props.apply_to(&mut el).unwrap();

        assert_eq!(el.transform.scale_x, 1.0);
        assert_eq!(el.transform.scale_y, 1.0);
        assert_eq!(el.kind.intrinsic_size(), (200.0, 100.0));
        // Writing the same snapshot again is stable.
        let again = ElementProps::of(&el);
        assert_eq!(again, props);
    }

    #[test]
    fn circle_radius_folds_scale() {
        let mut el = DesignElement::new(
            ElementId::intern("props_circle"),
            "Circle 1",
            ElementKind::Circle {
                radius: 10.0,
                fill: Color::WHITE,
            },
        );
        el.transform.scale_x = 3.0;
        el.transform.scale_y = 3.0;
        let props = ElementProps::of(&el);
        match &props {
            ElementProps::Circle { radius, frame, .. } => {
                assert_eq!(*radius, 30.0);
                assert_eq!(frame.width, 60.0);
            }
            other => panic!("expected circle props, got {other:?}"),
        }
        props.apply_to(&mut el).unwrap();
        assert_eq!(
            el.kind,
            ElementKind::Circle {
                radius: 30.0,
                fill: Color::WHITE
            }
        );
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut el = rect(10.0, 10.0);
        let props = ElementProps::Circle {
            frame: FrameProps::default(),
            radius: 5.0,
            fill: Color::BLACK,
        };
        let before = el.clone();
        assert!(matches!(
            props.apply_to(&mut el),
            Err(PropsError::KindMismatch { .. })
        ));
        assert_eq!(el, before);
    }

    #[test]
    fn fields_match_kind() {
        let rect_props = ElementProps::of(&rect(1.0, 1.0));
        assert!(rect_props.fields().contains(&PanelField::CornerRadius));
        assert!(!rect_props.fields().contains(&PanelField::Radius));
        assert!(!rect_props.fields().contains(&PanelField::FontFamily));

        let circle = ElementProps::Circle {
            frame: FrameProps::default(),
            radius: 1.0,
            fill: Color::BLACK,
        };
        assert!(circle.fields().contains(&PanelField::Radius));
        assert!(!circle.fields().contains(&PanelField::Width));
    }

    #[test]
    fn field_edit_rejects_irrelevant_field() {
        let mut props = ElementProps::of(&rect(10.0, 10.0));
        assert!(!FieldEdit::Radius(4.0).apply(&mut props));
        assert!(FieldEdit::Width(42.0).apply(&mut props));
        assert_eq!(props.frame().width, 42.0);
    }

    #[test]
    fn field_edit_parse() {
        assert_eq!(
            FieldEdit::parse(PanelField::X, " 12.5 "),
            Some(FieldEdit::X(12.5))
        );
        assert_eq!(FieldEdit::parse(PanelField::X, "abc"), None);
        assert_eq!(FieldEdit::parse(PanelField::X, "NaN"), None);
        assert_eq!(
            FieldEdit::parse(PanelField::Fill, "#00FF00"),
            Some(FieldEdit::Fill(Color::rgb(0, 255, 0)))
        );
        assert_eq!(FieldEdit::parse(PanelField::Underline, "true"), None);
    }

    #[test]
    fn non_finite_snapshot_is_rejected() {
        let mut el = rect(10.0, 10.0);
        let mut props = ElementProps::of(&el);
        props.frame_mut().x = f32::NAN;
        assert_eq!(
            props.apply_to(&mut el),
            Err(PropsError::NonFinite(PanelField::X))
        );
    }

    #[test]
    fn text_change_applies_immediately() {
        let mut style = TextStyle::default();
        assert!(TextChange::Underline(true).apply(&mut style));
        assert!(TextChange::FontWeight(1200).apply(&mut style));
        assert!(TextChange::Stroke(Some(Color::WHITE)).apply(&mut style));
        assert!(TextChange::StrokeWidth(1e9).apply(&mut style));
        assert!(style.underline);
        assert_eq!(style.font_weight, 900);
        assert_eq!(style.stroke, Some(Color::WHITE));
        assert_eq!(style.stroke_width, MAX_STROKE_WIDTH);
    }

    #[test]
    fn blank_font_family_is_refused() {
        let mut style = TextStyle::default();
        assert!(!TextChange::FontFamily("  ".into()).apply(&mut style));
        assert_eq!(style.font_family, "Arial");
        assert!(TextChange::FontFamily(" Bebas Neue ".into()).apply(&mut style));
        assert_eq!(style.font_family, "Bebas Neue");
    }

    #[test]
    fn apply_clamps_text_to_limits() {
        let mut el = DesignElement::new(
            ElementId::intern("props_text"),
            "Hi",
            ElementKind::Text {
                content: "Hi".into(),
                style: TextStyle::default(),
            },
        );
        let mut props = ElementProps::of(&el);
        assert!(FieldEdit::FontSize(1e30).apply(&mut props));
        assert!(FieldEdit::LineHeight(0.0).apply(&mut props));
        props.apply_to(&mut el).unwrap();

        let ElementKind::Text { style, .. } = &el.kind else {
            panic!("expected text");
        };
        assert_eq!(style.font_size, crate::model::MAX_FONT_SIZE);
        assert_eq!(style.line_height, crate::model::MIN_LINE_HEIGHT);
    }

    #[test]
    fn apply_clamps_negative_size() {
        let mut el = rect(10.0, 10.0);
        let mut props = ElementProps::of(&el);
        assert!(FieldEdit::Width(-20.0).apply(&mut props));
        props.apply_to(&mut el).unwrap();
        assert_eq!(el.kind.intrinsic_size(), (0.0, 10.0));
    }
}
