//! Property bridge between the active element and the property panel.
//!
//! The bridge holds a snapshot of the single active element. Typed panel
//! edits are staged on top of it and written back to the surface only on
//! `commit` (field blur or Enter); discrete text-style changes go straight
//! through `apply_live`. Group selections and empty selections hide the
//! panel.

use drape_core::id::ElementId;
use drape_core::props::{ElementProps, FieldEdit, PanelField, TextChange};
use drape_core::surface::SceneSurface;
use log::debug;

#[derive(Debug, Default)]
pub struct PropertyBridge {
    snapshot: Option<(ElementId, ElementProps)>,
    pending: Vec<FieldEdit>,
}

impl PropertyBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the snapshot from the surface's selection.
    ///
    /// Staged edits survive a refresh of the same element and are dropped
    /// when the active element changes.
    pub fn refresh(&mut self, surface: &SceneSurface) {
        let next = surface
            .active_element()
            .map(|el| (el.id, ElementProps::of(el)));
        let same = matches!(
            (&self.snapshot, &next),
            (Some((a, _)), Some((b, _))) if a == b
        );
        if !same && !self.pending.is_empty() {
            debug!("dropping {} staged edit(s)", self.pending.len());
            self.pending.clear();
        }
        self.snapshot = next;
    }

    pub fn is_visible(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn active(&self) -> Option<ElementId> {
        self.snapshot.as_ref().map(|(id, _)| *id)
    }

    /// What the panel shows: the snapshot with staged edits applied.
    pub fn props(&self) -> Option<ElementProps> {
        let (_, props) = self.snapshot.as_ref()?;
        let mut props = props.clone();
        for edit in &self.pending {
            edit.apply(&mut props);
        }
        Some(props)
    }

    /// Fields the panel should render for the active kind.
    pub fn fields(&self) -> &'static [PanelField] {
        match &self.snapshot {
            Some((_, props)) => props.fields(),
            None => &[],
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Stage a typed edit. Returns `false` when the panel is hidden or the
    /// field does not belong to the active kind.
    pub fn stage(&mut self, edit: FieldEdit) -> bool {
        let Some((_, props)) = &self.snapshot else {
            return false;
        };
        let mut trial = props.clone();
        if !edit.apply(&mut trial) {
            debug!("staged edit {edit:?} does not fit a {}", props.kind_label());
            return false;
        }
        self.pending.push(edit);
        true
    }

    /// Write staged edits back to the active element.
    pub fn commit(&mut self, surface: &mut SceneSurface) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let (Some(id), Some(props)) = (self.active(), self.props()) else {
            self.pending.clear();
            return false;
        };
        self.pending.clear();
        let written = surface.set_element_props(id, &props);
        self.refresh(surface);
        written
    }

    pub fn discard(&mut self) {
        self.pending.clear();
    }

    /// Apply a discrete text-style change to the active element now.
    pub fn apply_live(&mut self, surface: &mut SceneSurface, change: &TextChange) -> bool {
        let Some(id) = self.active() else {
            return false;
        };
        let applied = surface.apply_text_change(id, change);
        if applied {
            self.refresh(surface);
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::model::{Color, ElementKind, FontStyle, SurfaceSide, SurfaceSize};
    use drape_core::props::FrameProps;
    use drape_core::surface::ElementSpec;
    use drape_core::ElementDefaults;
    use pretty_assertions::assert_eq;

    fn surface() -> SceneSurface {
        SceneSurface::new(SurfaceSide::Front, SurfaceSize::DEFAULT)
    }

    fn rect(w: f32, h: f32) -> ElementSpec {
        ElementSpec::new(ElementKind::Rect {
            width: w,
            height: h,
            corner_radius: 0.0,
            fill: Color::BLACK,
        })
    }

    #[test]
    fn hidden_without_single_selection() {
        let mut s = surface();
        let mut bridge = PropertyBridge::new();
        bridge.refresh(&s);
        assert!(!bridge.is_visible());
        assert!(bridge.fields().is_empty());

        let a = s.add_element(rect(10.0, 10.0));
        let b = s.add_element(rect(10.0, 10.0));
        s.select_group(&[a, b]);
        bridge.refresh(&s);
        assert!(!bridge.is_visible());
        assert!(!bridge.stage(FieldEdit::X(1.0)));
    }

    #[test]
    fn staged_edits_apply_on_commit() {
        let mut s = surface();
        let id = s.add_element(rect(100.0, 50.0));
        let mut bridge = PropertyBridge::new();
        bridge.refresh(&s);

        assert!(bridge.stage(FieldEdit::Width(120.0)));
        assert!(bridge.stage(FieldEdit::X(0.0)));
        // Not written yet.
        assert_eq!(s.get(id).unwrap().effective_size(), (100.0, 50.0));
        assert_eq!(bridge.props().unwrap().frame().width, 120.0);

        assert!(bridge.commit(&mut s));
        let el = s.get(id).unwrap();
        assert_eq!(el.effective_size(), (120.0, 50.0));
        assert_eq!(el.transform.x, 0.0);
        assert!(!bridge.has_pending());
    }

    #[test]
    fn commit_bakes_scale_into_size() {
        let mut s = surface();
        let id = s.add_element(ElementSpec {
            transform: drape_core::model::Transform {
                scale_x: 2.0,
                scale_y: 0.5,
                ..Default::default()
            },
            ..rect(100.0, 100.0)
        });
        let mut bridge = PropertyBridge::new();
        bridge.refresh(&s);
        assert_eq!(
            *bridge.props().unwrap().frame(),
            FrameProps {
                x: 150.0,
                y: 275.0,
                width: 200.0,
                height: 50.0,
                angle: 0.0,
            }
        );

        bridge.stage(FieldEdit::Angle(30.0));
        bridge.commit(&mut s);
        let el = s.get(id).unwrap();
        assert_eq!(el.transform.scale_x, 1.0);
        assert_eq!(el.transform.scale_y, 1.0);
        assert_eq!(el.effective_size(), (200.0, 50.0));
        assert_eq!(el.transform.rotation, 30.0);
    }

    #[test]
    fn kind_specific_fields() {
        let mut s = surface();
        let mut bridge = PropertyBridge::new();
        s.add_element(ElementSpec::circle(&ElementDefaults::default()));
        bridge.refresh(&s);
        assert!(bridge.fields().contains(&PanelField::Radius));
        assert!(!bridge.fields().contains(&PanelField::Width));
        assert!(!bridge.stage(FieldEdit::CornerRadius(4.0)));
        assert!(bridge.stage(FieldEdit::Radius(20.0)));
    }

    #[test]
    fn selection_change_drops_staged_edits() {
        let mut s = surface();
        let a = s.add_element(rect(10.0, 10.0));
        let mut bridge = PropertyBridge::new();
        bridge.refresh(&s);
        bridge.stage(FieldEdit::X(5.0));

        let b = s.add_element(rect(20.0, 20.0));
        bridge.refresh(&s);
        assert_eq!(bridge.active(), Some(b));
        assert!(!bridge.has_pending());
        assert!(!bridge.commit(&mut s));
        assert_ne!(s.get(a).unwrap().transform.x, 5.0);
    }

    #[test]
    fn live_text_changes_skip_staging() {
        let mut s = surface();
        let defaults = ElementDefaults::default();
        let id = s.add_element(ElementSpec::text(&defaults, Some("Hi")));
        let mut bridge = PropertyBridge::new();
        bridge.refresh(&s);

        assert!(bridge.apply_live(&mut s, &TextChange::FontStyle(FontStyle::Italic)));
        let ElementKind::Text { style, .. } = &s.get(id).unwrap().kind else {
            panic!("expected text");
        };
        assert_eq!(style.font_style, FontStyle::Italic);
        let Some(ElementProps::Text { style, .. }) = bridge.props() else {
            panic!("expected text props");
        };
        assert_eq!(style.font_style, FontStyle::Italic);
    }

    #[test]
    fn discard_restores_snapshot() {
        let mut s = surface();
        s.add_element(rect(10.0, 10.0));
        let mut bridge = PropertyBridge::new();
        bridge.refresh(&s);
        let before = bridge.props();
        bridge.stage(FieldEdit::Height(99.0));
        bridge.discard();
        assert_eq!(bridge.props(), before);
    }
}
