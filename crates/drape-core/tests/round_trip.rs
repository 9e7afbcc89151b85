//! Integration tests: surface → document → surface.
//!
//! Loading what a surface saved must give back the same elements in the same
//! order, with fresh ids.

use drape_core::document::{DesignDocuments, DocumentError, SurfaceDocument};
use drape_core::model::{
    Color, ElementKind, FontStyle, SurfaceSide, SurfaceSize, TemplateImage, TextAlign,
};
use drape_core::props::{ElementProps, FieldEdit, TextChange};
use drape_core::surface::{ElementSpec, SceneSurface};
use drape_core::{ElementDefaults, ElementId};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn fixture() -> DesignDocuments {
    DesignDocuments::from_json(include_str!("fixtures/tee_design.json")).unwrap()
}

fn front() -> SceneSurface {
    SceneSurface::new(SurfaceSide::Front, SurfaceSize::DEFAULT)
}

#[test]
fn fixture_loads_every_kind_in_order() {
    let docs = fixture();
    let mut surface = front();
    surface.load_document(&docs.front).unwrap();

    let kinds: Vec<&str> = surface.elements().iter().map(|e| e.kind.label()).collect();
    assert_eq!(kinds, ["Rect", "Circle", "Text", "Image"]);
    let names: Vec<&str> = surface.elements().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Rect 1", "Circle 3", "Summer Tour", "Image 1"]);
}

#[test]
fn save_then_load_is_field_equal() {
    let docs = fixture();
    let mut original = front();
    original.load_document(&docs.front).unwrap();

    let saved = SurfaceDocument::from_surface(&original);
    let json = serde_json::to_string(&saved).unwrap();
    let parsed: SurfaceDocument = serde_json::from_str(&json).unwrap();

    let mut restored = front();
    restored.load_document(&parsed).unwrap();

    assert_eq!(restored.elements().len(), original.elements().len());
    for (a, b) in original.elements().iter().zip(restored.elements()) {
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, b.name);
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.kind, b.kind);
    }
    assert_eq!(SurfaceDocument::from_surface(&restored), saved);
}

#[test]
fn loaded_ids_are_unique() {
    let docs = fixture();
    let mut a = front();
    let mut b = front();
    a.load_document(&docs.front).unwrap();
    b.load_document(&docs.front).unwrap();

    let ids: HashSet<ElementId> = a
        .elements()
        .iter()
        .chain(b.elements())
        .map(|e| e.id)
        .collect();
    assert_eq!(ids.len(), 8);
}

#[test]
fn counters_continue_after_load() {
    let mut surface = front();
    surface.load_document(&fixture().front).unwrap();

    let defaults = ElementDefaults::default();
    let rect = surface.add_element(ElementSpec::rect(&defaults));
    let circle = surface.add_element(ElementSpec::circle(&defaults));
    assert_eq!(surface.get(rect).unwrap().name, "Rect 2");
    assert_eq!(surface.get(circle).unwrap().name, "Circle 4");
}

#[test]
fn load_keeps_template_and_replaces_elements() {
    let mut surface = front();
    surface.set_template(Some(TemplateImage::new("tee-front.png")));
    surface.add_element(ElementSpec::rect(&ElementDefaults::default()));

    surface.load_document(&fixture().front).unwrap();
    assert_eq!(surface.elements().len(), 4);
    assert_eq!(surface.template().unwrap().source_ref, "tee-front.png");
    assert!(surface.selection().is_empty());
}

#[test]
fn rejected_document_leaves_surface_unchanged() {
    let mut surface = front();
    let id = surface.add_element(ElementSpec::rect(&ElementDefaults::default()));
    let before = surface.elements().to_vec();
    let revision = surface.revision();

    let mut doc = fixture().front;
    if let ElementKind::Circle { radius, .. } = &mut doc.elements[1].shape {
        *radius = f32::INFINITY;
    }
    let err = surface.load_document(&doc).unwrap_err();
    assert!(matches!(
        err,
        DocumentError::InvalidGeometry {
            index: 1,
            field: "radius"
        }
    ));
    assert_eq!(surface.elements(), before.as_slice());
    assert_eq!(surface.revision(), revision);
    assert!(surface.get(id).is_some());
}

#[test]
fn json_and_msgpack_agree() {
    let docs = fixture();
    let from_json = DesignDocuments::from_json(&docs.to_json().unwrap()).unwrap();
    let from_msgpack = DesignDocuments::from_msgpack(&docs.to_msgpack().unwrap()).unwrap();
    assert_eq!(from_json, docs);
    assert_eq!(from_msgpack, docs);
}

#[test]
fn truncated_json_is_a_syntax_error() {
    let json = include_str!("fixtures/tee_design.json");
    let truncated = &json[..json.len() / 2];
    assert!(matches!(
        DesignDocuments::from_json(truncated),
        Err(DocumentError::Json(_))
    ));
}

// ─── Edited states ──────────────────────────────────────────────────────

/// Save `surface`, load it into a fresh one, and compare field by field.
fn assert_reloads(surface: &SceneSurface) {
    let saved = SurfaceDocument::from_surface(surface);
    let mut restored = front();
    if let Err(err) = restored.load_document(&saved) {
        panic!("saved surface failed to load: {err}");
    }
    assert_eq!(SurfaceDocument::from_surface(&restored), saved);
}

/// Stage one edit and write it back. Rejected snapshots (a radius whose
/// diameter overflows) leave the element as it was, which is fine here.
fn commit(surface: &mut SceneSurface, id: ElementId, edit: FieldEdit) {
    let mut props = ElementProps::of(surface.get(id).unwrap());
    assert!(edit.apply(&mut props), "{edit:?} does not apply");
    surface.set_element_props(id, &props);
}

#[test]
fn panel_edits_at_their_bounds_reload() {
    let defaults = ElementDefaults::default();
    let mut surface = front();
    let rect = surface.add_element(ElementSpec::rect(&defaults));
    let circle = surface.add_element(ElementSpec::circle(&defaults));
    let text = surface.add_element(ElementSpec::text(&defaults, Some("Tour")));
    let image = surface.add_element(ElementSpec::image("logo", 64.0, 64.0));

    let extremes = [-1.0, 0.0, 1e30, f32::MAX];
    for v in extremes {
        commit(&mut surface, rect, FieldEdit::X(v));
        commit(&mut surface, rect, FieldEdit::Y(-v));
        commit(&mut surface, rect, FieldEdit::Angle(v));
        commit(&mut surface, rect, FieldEdit::Width(v));
        commit(&mut surface, rect, FieldEdit::Height(-v));
        commit(&mut surface, rect, FieldEdit::CornerRadius(v));
        commit(&mut surface, circle, FieldEdit::Radius(v));
        commit(&mut surface, image, FieldEdit::Width(-v));
        commit(&mut surface, image, FieldEdit::Height(v));
        commit(&mut surface, text, FieldEdit::FontSize(v));
        commit(&mut surface, text, FieldEdit::LineHeight(v));
        assert_reloads(&surface);
    }
    commit(&mut surface, text, FieldEdit::Content(String::new()));
    commit(&mut surface, text, FieldEdit::Fill(Color::TRANSPARENT));
    assert_reloads(&surface);
}

#[test]
fn live_text_changes_at_their_bounds_reload() {
    let mut surface = front();
    let text = surface.add_element(ElementSpec::text(&ElementDefaults::default(), Some("Hi")));

    let changes = [
        TextChange::FontFamily(String::new()),
        TextChange::FontFamily("   ".into()),
        TextChange::FontWeight(0),
        TextChange::FontWeight(u16::MAX),
        TextChange::FontStyle(FontStyle::Italic),
        TextChange::TextAlign(TextAlign::Justify),
        TextChange::Underline(true),
        TextChange::Strikethrough(true),
        TextChange::Overline(true),
        TextChange::Stroke(Some(Color::WHITE)),
        TextChange::StrokeWidth(-5.0),
        TextChange::StrokeWidth(f32::NAN),
        TextChange::StrokeWidth(1e30),
        TextChange::Fill(Color::rgba(1, 2, 3, 4)),
    ];
    for change in &changes {
        surface.apply_text_change(text, change);
        assert_reloads(&surface);
    }
}

#[test]
fn degenerate_specs_reload() {
    let mut surface = front();
    surface.add_element(ElementSpec::image("logo", -20.0, 10.0));
    surface.add_element(ElementSpec::image("logo", f32::NAN, f32::INFINITY));
    surface.add_element(ElementSpec::new(ElementKind::Circle {
        radius: -3.0,
        fill: Color::BLACK,
    }));
    assert_reloads(&surface);
}
