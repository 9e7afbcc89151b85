//! WASM bridge for Drape: exposes the design studio to the storefront page.
//!
//! Compiled via `wasm-pack build --target web`. Structured values cross the
//! boundary as JSON strings; malformed input from the page becomes a thrown
//! JS error.

mod render2d;

use drape_core::config::StudioConfig;
use drape_core::document::DesignDocuments;
use drape_core::model::{SurfaceSide, TemplateImage};
use drape_core::props::{FieldEdit, PanelField, TextChange};
use drape_editor::{Modifiers, ShortcutAction, Studio};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The page-facing studio controller.
///
/// Pointer coordinates are in canvas pixels; `zoom` converts them to
/// logical surface units.
#[wasm_bindgen]
pub struct DrapeStudio {
    studio: Studio,
    zoom: f32,
}

#[wasm_bindgen]
impl DrapeStudio {
    /// Create a studio from a JSON `StudioConfig`. An empty string uses the
    /// defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<DrapeStudio, JsValue> {
        console_error_panic_hook_setup();
        let config = parse_config(config_json).map_err(|err| {
            warn!("studio config rejected: {err}");
            js_error(err)
        })?;
        Ok(Self {
            studio: Studio::new(config),
            zoom: 1.0,
        })
    }

    /// Canvas pixels per logical unit.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() && zoom > 0.0 {
            self.zoom = zoom;
        }
    }

    pub fn render(&self, ctx: &CanvasRenderingContext2d) {
        let surface = self.studio.active_surface();
        let overlay = render2d::Overlay {
            guides: self.studio.guides(),
            marquee: self.studio.marquee(),
            editing: surface.is_editing_text(),
        };
        render2d::render_surface(ctx, surface, self.zoom as f64, &overlay);
    }

    // ─── Surfaces ────────────────────────────────────────────────────────

    /// Switch to `"front"` or `"back"`. Returns false for unknown names.
    pub fn set_active_side(&mut self, side: &str) -> bool {
        match SurfaceSide::parse(side) {
            Some(side) => {
                self.studio.set_active_side(side);
                true
            }
            None => false,
        }
    }

    pub fn active_side(&self) -> String {
        self.studio.active_side().as_str().to_string()
    }

    /// Set or clear (`None`) the garment template behind a side.
    pub fn set_template(&mut self, side: &str, source_ref: Option<String>) -> bool {
        let Some(side) = SurfaceSide::parse(side) else {
            return false;
        };
        self.studio
            .set_template(side, source_ref.map(TemplateImage::new));
        true
    }

    /// Revision counter of a side; changes whenever its pixels would.
    pub fn revision(&self, side: &str) -> f64 {
        SurfaceSide::parse(side)
            .map(|s| self.studio.surface(s).revision() as f64)
            .unwrap_or(0.0)
    }

    // ─── Adding elements ────────────────────────────────────────────────

    pub fn add_rect(&mut self) -> String {
        self.studio.add_rect().as_str().to_string()
    }

    pub fn add_circle(&mut self) -> String {
        self.studio.add_circle().as_str().to_string()
    }

    pub fn add_text(&mut self, content: Option<String>) -> String {
        self.studio.add_text(content.as_deref()).as_str().to_string()
    }

    pub fn add_image(&mut self, source_ref: &str, width: f32, height: f32) -> String {
        self.studio
            .add_image(source_ref, width, height)
            .as_str()
            .to_string()
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    pub fn handle_pointer_down(&mut self, x: f32, y: f32, shift: bool) {
        let mods = Modifiers {
            shift,
            ..Modifiers::default()
        };
        self.studio
            .pointer_down(x / self.zoom, y / self.zoom, mods);
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) {
        self.studio.pointer_move(x / self.zoom, y / self.zoom);
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) {
        self.studio.pointer_up(x / self.zoom, y / self.zoom);
    }

    /// Returns true when text editing started.
    pub fn handle_double_click(&mut self, x: f32, y: f32) -> bool {
        self.studio.double_click(x / self.zoom, y / self.zoom)
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Tell the studio whether a page text field has focus.
    pub fn set_text_focus(&mut self, focused: bool) {
        self.studio.set_text_focus(focused);
    }

    /// Handle a keyboard event. Returns the action name, or `"none"` when
    /// the key was not handled and should keep its default behavior.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let mods = Modifiers {
            ctrl,
            shift,
            alt,
            meta,
        };
        self.studio
            .handle_key(key, mods)
            .map_or("none", action_to_name)
            .to_string()
    }

    /// Replace the content of the text element being edited on canvas.
    pub fn edit_text(&mut self, content: &str) -> bool {
        self.studio.edit_text(content)
    }

    pub fn end_text_edit(&mut self) {
        self.studio.end_text_edit();
    }

    // ─── Property panel ─────────────────────────────────────────────────

    /// The panel snapshot as JSON, or `null` when the panel is hidden.
    pub fn get_props(&self) -> String {
        serde_json::to_string(&self.studio.bridge().props()).unwrap_or_else(|_| "null".into())
    }

    /// Field names the panel should render, as a JSON array.
    pub fn get_fields(&self) -> String {
        serde_json::to_string(self.studio.bridge().fields()).unwrap_or_else(|_| "[]".into())
    }

    /// Stage a typed edit (`field` as in `get_fields`). Returns false when
    /// the value does not parse or the field is not shown.
    pub fn stage_field(&mut self, field: &str, value: &str) -> bool {
        match parse_field_edit(field, value) {
            Some(edit) => self.studio.stage_field(edit),
            None => {
                debug!("unparseable value {value:?} for field `{field}`");
                false
            }
        }
    }

    /// Write staged edits back (field blur or Enter).
    pub fn commit_fields(&mut self) -> bool {
        self.studio.commit_fields()
    }

    pub fn discard_fields(&mut self) {
        self.studio.discard_fields();
    }

    /// Apply a discrete text-style change, e.g.
    /// `{"field":"fontWeight","value":700}`.
    pub fn apply_text_change(&mut self, json: &str) -> Result<bool, JsValue> {
        let change: TextChange = serde_json::from_str(json).map_err(|err| {
            debug!("malformed text change {json}: {err}");
            js_error(err)
        })?;
        Ok(self.studio.apply_text_change(&change))
    }

    /// Current selection on the active side as JSON.
    pub fn get_selection(&self) -> String {
        serde_json::to_string(self.studio.selection())
            .unwrap_or_else(|_| r#"{"type":"none"}"#.into())
    }

    // ─── Persistence ────────────────────────────────────────────────────

    pub fn save_json(&self) -> Result<String, JsValue> {
        self.studio.save().to_json().map_err(js_error)
    }

    /// Load both sides. Throws and leaves the studio unchanged on a bad
    /// document.
    pub fn load_json(&mut self, json: &str) -> Result<(), JsValue> {
        let docs = DesignDocuments::from_json(json).map_err(|err| {
            debug!("design JSON did not parse: {err}");
            js_error(err)
        })?;
        self.studio.load(&docs).map_err(|err| {
            debug!("design rejected on load: {err}");
            js_error(err)
        })
    }
}

fn parse_config(json: &str) -> Result<StudioConfig, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(StudioConfig::default());
    }
    StudioConfig::from_json(json)
}

fn parse_field_edit(field: &str, value: &str) -> Option<FieldEdit> {
    let field: PanelField = serde_json::from_value(serde_json::Value::String(field.into())).ok()?;
    FieldEdit::parse(field, value)
}

fn action_to_name(action: ShortcutAction) -> &'static str {
    match action {
        ShortcutAction::Copy => "copy",
        ShortcutAction::Paste => "paste",
        ShortcutAction::Delete => "delete",
        ShortcutAction::SelectAll => "selectAll",
        ShortcutAction::Undo => "undo",
        ShortcutAction::Redo => "redo",
        ShortcutAction::Deselect => "deselect",
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Drape WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no studio needed) ───────────────────────────

/// Validate a saved design against a surface config. Returns JSON:
/// `{"ok":true}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate_design(json: &str, config_json: &str) -> String {
    let result = parse_config(config_json)
        .map_err(|e| e.to_string())
        .and_then(|config| {
            let docs = DesignDocuments::from_json(json).map_err(|e| e.to_string())?;
            docs.front
                .validate(config.surface)
                .and_then(|_| docs.back.validate(config.surface))
                .map_err(|e| e.to_string())
        });
    match result {
        Ok(()) => serde_json::json!({ "ok": true }).to_string(),
        Err(error) => {
            debug!("design failed validation: {error}");
            serde_json::json!({ "ok": false, "error": error }).to_string()
        }
    }
}
