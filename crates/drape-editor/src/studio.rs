//! The studio controller.
//!
//! A `Studio` owns the front and back surfaces, remembers which one is
//! active, and routes pointer and keyboard input to it. It keeps the
//! property bridge in step with the active selection and owns the shared
//! clipboard, so a copy on the front can be pasted onto the back.

use crate::clipboard::Clipboard;
use crate::drag::DragSession;
use crate::input::{InputEvent, Modifiers};
use crate::selection::PropertyBridge;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use drape_core::config::StudioConfig;
use drape_core::document::{DesignDocuments, DocumentError, SurfaceDocument};
use drape_core::id::ElementId;
use drape_core::model::{Bounds, SurfaceSide, TemplateImage};
use drape_core::props::{FieldEdit, TextChange};
use drape_core::snap::{GuideLine, SnapEngine};
use drape_core::surface::{ElementSpec, SceneSurface, Selection};
use drape_render::hit::{hit_test, hit_test_rect};
use log::{debug, info};
use smallvec::SmallVec;

/// Marquee drags shorter than this on both axes count as a click.
const MARQUEE_MIN: f32 = 2.0;

#[derive(Debug)]
pub struct Studio {
    config: StudioConfig,
    front: SceneSurface,
    back: SceneSurface,
    active: SurfaceSide,
    bridge: PropertyBridge,
    clipboard: Clipboard,
    snap: SnapEngine,
    drag: Option<DragSession>,
    /// Marquee anchor and current corner.
    marquee: Option<((f32, f32), (f32, f32))>,
    guides: SmallVec<[GuideLine; 2]>,
    /// A host text input (not the canvas) has keyboard focus.
    text_focus: bool,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl Studio {
    pub fn new(config: StudioConfig) -> Self {
        let size = config.surface;
        Self {
            front: SceneSurface::new(SurfaceSide::Front, size),
            back: SceneSurface::new(SurfaceSide::Back, size),
            active: SurfaceSide::Front,
            bridge: PropertyBridge::new(),
            clipboard: Clipboard::new(config.paste_offset),
            snap: SnapEngine::new(size, config.snap_zone),
            drag: None,
            marquee: None,
            guides: SmallVec::new(),
            text_focus: false,
            config,
        }
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    // ── Surfaces ──

    pub fn surface(&self, side: SurfaceSide) -> &SceneSurface {
        match side {
            SurfaceSide::Front => &self.front,
            SurfaceSide::Back => &self.back,
        }
    }

    /// Direct access for subscriptions and reads. Call `refresh_panel`
    /// after mutating the active surface this way.
    pub fn surface_mut(&mut self, side: SurfaceSide) -> &mut SceneSurface {
        match side {
            SurfaceSide::Front => &mut self.front,
            SurfaceSide::Back => &mut self.back,
        }
    }

    pub fn active_side(&self) -> SurfaceSide {
        self.active
    }

    pub fn active_surface(&self) -> &SceneSurface {
        self.surface(self.active)
    }

    fn active_mut(&mut self) -> &mut SceneSurface {
        self.surface_mut(self.active)
    }

    /// Switch the edited side. Any in-progress drag is dropped.
    pub fn set_active_side(&mut self, side: SurfaceSide) {
        if self.active == side {
            return;
        }
        self.active_mut().end_text_edit();
        self.drag = None;
        self.marquee = None;
        self.guides.clear();
        self.active = side;
        debug!("active surface: {}", side.as_str());
        self.refresh_panel();
    }

    pub fn set_template(&mut self, side: SurfaceSide, template: Option<TemplateImage>) {
        self.surface_mut(side).set_template(template);
    }

    // ── Adding elements ──

    pub fn add_rect(&mut self) -> ElementId {
        let spec = ElementSpec::rect(&self.config.defaults);
        self.add(spec)
    }

    pub fn add_circle(&mut self) -> ElementId {
        let spec = ElementSpec::circle(&self.config.defaults);
        self.add(spec)
    }

    pub fn add_text(&mut self, content: Option<&str>) -> ElementId {
        let spec = ElementSpec::text(&self.config.defaults, content);
        self.add(spec)
    }

    pub fn add_image(&mut self, source_ref: &str, width: f32, height: f32) -> ElementId {
        self.add(ElementSpec::image(source_ref, width, height))
    }

    /// Add to the active surface and select the new element.
    pub fn add(&mut self, spec: ElementSpec) -> ElementId {
        let id = self.active_mut().add_element(spec);
        self.refresh_panel();
        id
    }

    // ── Property panel ──

    pub fn bridge(&self) -> &PropertyBridge {
        &self.bridge
    }

    pub fn refresh_panel(&mut self) {
        let surface = match self.active {
            SurfaceSide::Front => &self.front,
            SurfaceSide::Back => &self.back,
        };
        self.bridge.refresh(surface);
    }

    pub fn stage_field(&mut self, edit: FieldEdit) -> bool {
        self.bridge.stage(edit)
    }

    pub fn commit_fields(&mut self) -> bool {
        let surface = match self.active {
            SurfaceSide::Front => &mut self.front,
            SurfaceSide::Back => &mut self.back,
        };
        self.bridge.commit(surface)
    }

    pub fn discard_fields(&mut self) {
        self.bridge.discard();
    }

    pub fn apply_text_change(&mut self, change: &TextChange) -> bool {
        let surface = match self.active {
            SurfaceSide::Front => &mut self.front,
            SurfaceSide::Back => &mut self.back,
        };
        self.bridge.apply_live(surface, change)
    }

    /// Replace the content of the text element being edited on canvas.
    pub fn edit_text(&mut self, content: &str) -> bool {
        let Some(id) = self.active_surface().editing_element() else {
            return false;
        };
        let changed = self.active_mut().set_text_content(id, content);
        self.refresh_panel();
        changed
    }

    pub fn end_text_edit(&mut self) {
        self.active_mut().end_text_edit();
    }

    // ── Pointer ──

    pub fn guides(&self) -> &[GuideLine] {
        &self.guides
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Current marquee rectangle, normalized.
    pub fn marquee(&self) -> Option<Bounds> {
        self.marquee.map(|(a, b)| normalize(a, b))
    }

    pub fn pointer_down(&mut self, x: f32, y: f32, modifiers: Modifiers) {
        self.marquee = None;
        self.guides.clear();

        let hit = hit_test(self.active_surface().elements(), x, y);
        let surface = self.active_mut();
        match hit {
            Some(id) if modifiers.shift => {
                let mut ids: Vec<ElementId> = surface.selection().ids().to_vec();
                match ids.iter().position(|i| *i == id) {
                    Some(pos) => {
                        ids.remove(pos);
                    }
                    None => ids.push(id),
                }
                surface.select_group(&ids);
            }
            Some(id) => {
                // Pressing on a selected member keeps the group for dragging.
                if !surface.selection().contains(id) {
                    surface.select(id);
                }
            }
            None => {
                if !modifiers.shift {
                    surface.clear_selection();
                }
                self.marquee = Some(((x, y), (x, y)));
            }
        }

        if hit.is_some() && !self.active_surface().is_editing_text() {
            self.drag = DragSession::begin(self.active_surface(), x, y);
        }
        self.refresh_panel();
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some((anchor, _)) = self.marquee {
            self.marquee = Some((anchor, (x, y)));
            return;
        }
        let Some(drag) = self.drag.take() else {
            return;
        };
        let snap = self.snap;
        self.guides = drag.update(self.active_mut(), &snap, x, y);
        self.drag = Some(drag);
        self.refresh_panel();
    }

    pub fn pointer_up(&mut self, x: f32, y: f32) {
        // Guides never outlive the gesture.
        self.guides.clear();
        self.drag = None;

        if let Some((anchor, _)) = self.marquee.take() {
            let rect = normalize(anchor, (x, y));
            if rect.width >= MARQUEE_MIN || rect.height >= MARQUEE_MIN {
                let ids = hit_test_rect(self.active_surface().elements(), rect);
                debug!("marquee selected {} element(s)", ids.len());
                self.active_mut().select_group(&ids);
            }
        }
        self.refresh_panel();
    }

    /// Enter text editing when (`x`, `y`) lands on a text element.
    pub fn double_click(&mut self, x: f32, y: f32) -> bool {
        let Some(id) = hit_test(self.active_surface().elements(), x, y) else {
            return false;
        };
        let entered = self.active_mut().begin_text_edit(id);
        self.refresh_panel();
        entered
    }

    // ── Keyboard ──

    pub fn set_text_focus(&mut self, focused: bool) {
        self.text_focus = focused;
    }

    pub fn has_text_focus(&self) -> bool {
        self.text_focus
    }

    /// Resolve and run a shortcut. Returns the action when it was handled.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let action = ShortcutMap::resolve(key, modifiers)?;
        if self.text_focus && action.conflicts_with_text_input() {
            debug!("{action:?} left to the focused text field");
            return None;
        }

        match action {
            ShortcutAction::Copy => {
                let surface = match self.active {
                    SurfaceSide::Front => &self.front,
                    SurfaceSide::Back => &self.back,
                };
                self.clipboard.copy(surface);
            }
            ShortcutAction::Paste => {
                self.paste();
            }
            ShortcutAction::Delete => {
                self.active_mut().remove_active_element();
            }
            ShortcutAction::SelectAll => {
                let ids: Vec<ElementId> =
                    self.active_surface().elements().iter().map(|e| e.id).collect();
                self.active_mut().select_group(&ids);
            }
            ShortcutAction::Deselect => {
                let surface = self.active_mut();
                surface.end_text_edit();
                surface.clear_selection();
            }
            ShortcutAction::Undo | ShortcutAction::Redo => {
                info!("{action:?} is not implemented");
            }
        }
        self.refresh_panel();
        Some(action)
    }

    /// Paste the clipboard into the active surface.
    pub fn paste(&mut self) -> Vec<ElementId> {
        let surface = match self.active {
            SurfaceSide::Front => &mut self.front,
            SurfaceSide::Back => &mut self.back,
        };
        let ids = self.clipboard.paste(surface);
        self.refresh_panel();
        ids
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Dispatch a normalized input event.
    pub fn handle(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => self.pointer_down(*x, *y, *modifiers),
            InputEvent::PointerMove { x, y } => self.pointer_move(*x, *y),
            InputEvent::PointerUp { x, y } => self.pointer_up(*x, *y),
            InputEvent::DoubleClick { x, y } => {
                self.double_click(*x, *y);
            }
            InputEvent::Key { key, modifiers } => {
                self.handle_key(key, *modifiers);
            }
        }
    }

    // ── Persistence ──

    pub fn save(&self) -> DesignDocuments {
        DesignDocuments {
            front: SurfaceDocument::from_surface(&self.front),
            back: SurfaceDocument::from_surface(&self.back),
        }
    }

    /// Load both sides. Both documents are validated before either surface
    /// changes.
    pub fn load(&mut self, docs: &DesignDocuments) -> Result<(), DocumentError> {
        let size = self.config.surface;
        docs.front.validate(size)?;
        docs.back.validate(size)?;

        self.drag = None;
        self.marquee = None;
        self.guides.clear();
        self.front.load_document(&docs.front)?;
        self.back.load_document(&docs.back)?;
        self.refresh_panel();
        Ok(())
    }

    pub fn selection(&self) -> &Selection {
        self.active_surface().selection()
    }
}

fn normalize(a: (f32, f32), b: (f32, f32)) -> Bounds {
    Bounds {
        x: a.0.min(b.0),
        y: a.1.min(b.1),
        width: (b.0 - a.0).abs(),
        height: (b.1 - a.1).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CMD: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
        meta: false,
    };

    #[test]
    fn click_selects_and_empty_click_clears() {
        let mut studio = Studio::default();
        let id = studio.add_rect();
        studio.active_mut().clear_selection();

        studio.pointer_down(250.0, 300.0, Modifiers::default());
        studio.pointer_up(250.0, 300.0);
        assert_eq!(studio.selection(), &Selection::Single(id));
        assert!(studio.bridge().is_visible());

        studio.pointer_down(5.0, 5.0, Modifiers::default());
        studio.pointer_up(5.0, 5.0);
        assert!(studio.selection().is_empty());
        assert!(!studio.bridge().is_visible());
    }

    #[test]
    fn shift_click_builds_a_group() {
        let mut studio = Studio::default();
        let a = studio.add_rect();
        studio.active_mut().move_element_to(a, 0.0, 0.0);
        let b = studio.add_rect();
        studio.active_mut().move_element_to(b, 300.0, 300.0);

        studio.pointer_down(10.0, 10.0, Modifiers::default());
        studio.pointer_up(10.0, 10.0);
        let shift = Modifiers {
            shift: true,
            ..Modifiers::default()
        };
        studio.pointer_down(310.0, 310.0, shift);
        studio.pointer_up(310.0, 310.0);
        assert_eq!(studio.selection().ids(), &[a, b]);
        assert!(!studio.bridge().is_visible());
    }

    #[test]
    fn marquee_selects_intersecting() {
        let mut studio = Studio::default();
        let a = studio.add_rect();
        studio.active_mut().move_element_to(a, 0.0, 0.0);
        let b = studio.add_rect();
        studio.active_mut().move_element_to(b, 50.0, 50.0);
        let c = studio.add_rect();
        studio.active_mut().move_element_to(c, 390.0, 490.0);

        studio.pointer_down(495.0, 5.0, Modifiers::default());
        studio.pointer_move(120.0, 120.0);
        assert!(studio.marquee().is_some());
        studio.pointer_up(120.0, 120.0);
        assert_eq!(studio.selection().ids(), &[b]);
        assert!(studio.marquee().is_none());
    }

    #[test]
    fn drag_shows_and_clears_guides() {
        let mut studio = Studio::default();
        let id = studio.add_rect();
        // Centered already: any small drag stays in the zone.
        studio.pointer_down(250.0, 300.0, Modifiers::default());
        studio.pointer_move(254.0, 303.0);
        assert_eq!(studio.guides().len(), 2);
        let t = studio.active_surface().get(id).unwrap().transform;
        assert_eq!((t.x, t.y), (200.0, 250.0));

        studio.pointer_up(254.0, 303.0);
        assert!(studio.guides().is_empty());
        assert!(!studio.is_dragging());
    }

    #[test]
    fn double_click_edits_text_only() {
        let mut studio = Studio::default();
        let r = studio.add_rect();
        studio.active_mut().move_element_to(r, 0.0, 0.0);
        let t = studio.add_text(Some("Hello"));

        assert!(!studio.double_click(10.0, 10.0));
        assert!(studio.double_click(250.0, 300.0));
        assert_eq!(studio.active_surface().editing_element(), Some(t));

        assert!(studio.edit_text("Hello there"));
        assert_eq!(studio.active_surface().get(t).unwrap().name, "Hello there");
    }

    #[test]
    fn select_all_and_escape() {
        let mut studio = Studio::default();
        studio.add_rect();
        studio.add_circle();
        assert_eq!(
            studio.handle_key("a", CMD),
            Some(ShortcutAction::SelectAll)
        );
        assert_eq!(studio.selection().ids().len(), 2);
        studio.handle_key("Escape", Modifiers::default());
        assert!(studio.selection().is_empty());
    }

    #[test]
    fn undo_resolves_but_changes_nothing() {
        let mut studio = Studio::default();
        studio.add_rect();
        let before = studio.active_surface().revision();
        assert_eq!(studio.handle_key("z", CMD), Some(ShortcutAction::Undo));
        assert_eq!(studio.active_surface().revision(), before);
        assert_eq!(studio.active_surface().elements().len(), 1);
    }

    #[test]
    fn switching_sides_refreshes_panel() {
        let mut studio = Studio::default();
        studio.add_rect();
        assert!(studio.bridge().is_visible());
        studio.set_active_side(SurfaceSide::Back);
        assert!(!studio.bridge().is_visible());
        studio.set_active_side(SurfaceSide::Front);
        assert!(studio.bridge().is_visible());
    }

    #[test]
    fn input_events_dispatch() {
        let mut studio = Studio::default();
        let id = studio.add_rect();
        studio.handle(&InputEvent::Key {
            key: "Escape".into(),
            modifiers: Modifiers::default(),
        });
        studio.handle(&InputEvent::PointerDown {
            x: 250.0,
            y: 300.0,
            modifiers: Modifiers::default(),
        });
        studio.handle(&InputEvent::PointerUp { x: 250.0, y: 300.0 });
        assert_eq!(studio.selection().single(), Some(id));
    }
}
