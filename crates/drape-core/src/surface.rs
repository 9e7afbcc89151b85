//! One side of the garment: an ordered element list plus its selection.
//!
//! `SceneSurface` owns its collection. Callers mutate it only through the
//! command methods below and observe it through `subscribe`; every visual
//! change bumps `revision()` so renderers know when to redraw.

use crate::config::ElementDefaults;
use crate::document::{DocumentError, SurfaceDocument};
use crate::id::ElementId;
use crate::model::{
    Bounds, DesignElement, ElementKind, SurfaceSide, SurfaceSize, TemplateImage, Transform,
};
use crate::props::{ElementProps, TextChange};
use log::{debug, trace, warn};
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

// ─── Selection ───────────────────────────────────────────────────────────

/// Members of a group selection, in the order they were selected.
pub type SelectionSet = SmallVec<[ElementId; 4]>;

/// What is active on a surface.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", content = "ids", rename_all = "camelCase")]
pub enum Selection {
    #[default]
    None,
    Single(ElementId),
    Group(SelectionSet),
}

impl Selection {
    /// Build from a list of ids: empty is `None`, one id is `Single`.
    pub fn from_ids(ids: impl IntoIterator<Item = ElementId>) -> Self {
        let mut set = SelectionSet::new();
        for id in ids {
            if !set.contains(&id) {
                set.push(id);
            }
        }
        match set.len() {
            0 => Selection::None,
            1 => Selection::Single(set[0]),
            _ => Selection::Group(set),
        }
    }

    pub fn ids(&self) -> &[ElementId] {
        match self {
            Selection::None => &[],
            Selection::Single(id) => std::slice::from_ref(id),
            Selection::Group(set) => set.as_slice(),
        }
    }

    /// The single active element, if the selection is not a group.
    pub fn single(&self) -> Option<ElementId> {
        match self {
            Selection::Single(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::None)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.ids().contains(&id)
    }
}

// ─── Events ──────────────────────────────────────────────────────────────

/// Change notifications delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    ElementsAdded(Vec<ElementId>),
    ElementsRemoved(Vec<ElementId>),
    ElementChanged(ElementId),
    ElementsMoved(Vec<ElementId>),
    SelectionChanged(Selection),
    TextEditChanged(Option<ElementId>),
    TemplateChanged,
    Loaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SurfaceEvent)>;

// ─── Element specs ───────────────────────────────────────────────────────

/// Initial properties for `SceneSurface::add_element`. The position in
/// `transform` is ignored: new elements are always centered.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementSpec {
    pub kind: ElementKind,
    pub transform: Transform,
}

impl ElementSpec {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            transform: Transform::default(),
        }
    }

    pub fn rect(defaults: &ElementDefaults) -> Self {
        Self::new(ElementKind::Rect {
            width: defaults.rect_width,
            height: defaults.rect_height,
            corner_radius: 0.0,
            fill: defaults.shape_fill,
        })
    }

    pub fn circle(defaults: &ElementDefaults) -> Self {
        Self::new(ElementKind::Circle {
            radius: defaults.circle_radius,
            fill: defaults.shape_fill,
        })
    }

    /// A text element; `content` falls back to the configured placeholder.
    pub fn text(defaults: &ElementDefaults, content: Option<&str>) -> Self {
        Self::new(ElementKind::Text {
            content: content.unwrap_or(&defaults.text_content).to_string(),
            style: defaults.text.clone(),
        })
    }

    pub fn image(source_ref: impl Into<String>, width: f32, height: f32) -> Self {
        Self::new(ElementKind::Image {
            width,
            height,
            source_ref: source_ref.into(),
        })
    }

    pub fn rotated(mut self, degrees: f32) -> Self {
        self.transform.rotation = degrees;
        self
    }
}

// ─── Surface ─────────────────────────────────────────────────────────────

pub struct SceneSurface {
    side: SurfaceSide,
    size: SurfaceSize,
    /// Reserved background slot; never part of `elements`.
    background: Option<TemplateImage>,
    /// Z-order: index 0 is painted first.
    elements: Vec<DesignElement>,
    /// Last number handed out per kind label.
    counters: HashMap<&'static str, u32>,
    selection: Selection,
    /// Text element in live edit mode.
    editing: Option<ElementId>,
    revision: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for SceneSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneSurface")
            .field("side", &self.side)
            .field("size", &self.size)
            .field("background", &self.background)
            .field("elements", &self.elements)
            .field("selection", &self.selection)
            .field("editing", &self.editing)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SceneSurface {
    pub fn new(side: SurfaceSide, size: SurfaceSize) -> Self {
        Self {
            side,
            size,
            background: None,
            elements: Vec::new(),
            counters: HashMap::new(),
            selection: Selection::None,
            editing: None,
            revision: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ── Reads ──

    pub fn side(&self) -> SurfaceSide {
        self.side
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn template(&self) -> Option<&TemplateImage> {
        self.background.as_ref()
    }

    /// Elements bottom to top.
    pub fn elements(&self) -> &[DesignElement] {
        &self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&DesignElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The single active element. `None` for group selections.
    pub fn active_element(&self) -> Option<&DesignElement> {
        self.selection.single().and_then(|id| self.get(id))
    }

    /// Union of the unrotated bounds of every selected element.
    pub fn selection_bounds(&self) -> Option<Bounds> {
        self.selection
            .ids()
            .iter()
            .filter_map(|id| self.get(*id))
            .map(DesignElement::bounds)
            .reduce(|a, b| a.union(&b))
    }

    pub fn is_editing_text(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing_element(&self) -> Option<ElementId> {
        self.editing
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ── Subscriptions ──

    pub fn subscribe(&mut self, listener: impl FnMut(&SurfaceEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: SurfaceEvent) {
        trace!("{} surface: {:?}", self.side.as_str(), event);
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    fn next_name(&mut self, kind: &ElementKind) -> String {
        if let ElementKind::Text { content, .. } = kind {
            return content.clone();
        }
        let label = kind.label();
        let n = self.counters.entry(label).or_insert(0);
        *n += 1;
        format!("{label} {n}")
    }

    // ── Commands ──

    /// Append a new element on top, centered on the surface, and select it.
    /// Out-of-range sizes and styles in `spec` are clamped into range.
    pub fn add_element(&mut self, spec: ElementSpec) -> ElementId {
        let id = ElementId::mint(&spec.kind);
        let name = self.next_name(&spec.kind);
        let mut element = DesignElement::new(id, name, spec.kind);
        element.transform = spec.transform;
        element.clamp_to_limits();

        let (w, h) = element.effective_size();
        let (cx, cy) = self.size.center();
        element.transform.x = cx - w / 2.0;
        element.transform.y = cy - h / 2.0;

        debug!("add {} `{}` on {}", id, element.name, self.side.as_str());
        self.elements.push(element);
        self.touch();
        self.emit(SurfaceEvent::ElementsAdded(vec![id]));
        self.set_selection(Selection::Single(id));
        id
    }

    /// Remove the active element, or every member of the active group.
    ///
    /// Refused while a text element is being edited.
    pub fn remove_active_element(&mut self) -> bool {
        if let Some(editing) = self.editing {
            debug!("remove ignored: {editing} is in text edit mode");
            return false;
        }
        let ids: Vec<ElementId> = self.selection.ids().to_vec();
        if ids.is_empty() {
            debug!("remove ignored: nothing selected");
            return false;
        }
        self.elements.retain(|e| !ids.contains(&e.id));
        self.touch();
        self.emit(SurfaceEvent::ElementsRemoved(ids));
        self.set_selection(Selection::None);
        true
    }

    /// Write a property snapshot back onto an element.
    pub fn set_element_props(&mut self, id: ElementId, props: &ElementProps) -> bool {
        let Some(idx) = self.index_of(id) else {
            debug!("set props ignored: no element {id}");
            return false;
        };
        if let Err(err) = props.apply_to(&mut self.elements[idx]) {
            warn!("rejected props for {id}: {err}");
            return false;
        }
        self.touch();
        self.emit(SurfaceEvent::ElementChanged(id));
        true
    }

    /// Replace a text element's content; its name follows the content.
    pub fn set_text_content(&mut self, id: ElementId, text: &str) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let element = &mut self.elements[idx];
        let ElementKind::Text { content, .. } = &mut element.kind else {
            debug!("set text ignored: {id} is not text");
            return false;
        };
        *content = text.to_string();
        element.name = text.to_string();
        self.touch();
        self.emit(SurfaceEvent::ElementChanged(id));
        true
    }

    /// Apply a discrete style change to a text element immediately.
    pub fn apply_text_change(&mut self, id: ElementId, change: &TextChange) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let ElementKind::Text { style, .. } = &mut self.elements[idx].kind else {
            debug!("text change ignored: {id} is not text");
            return false;
        };
        if !change.apply(style) {
            debug!("text change ignored for {id}: {change:?}");
            return false;
        }
        self.touch();
        self.emit(SurfaceEvent::ElementChanged(id));
        true
    }

    /// Place an element's top-left corner.
    pub fn move_element_to(&mut self, id: ElementId, x: f32, y: f32) -> bool {
        if !(x.is_finite() && y.is_finite()) {
            debug!("move ignored: ({x}, {y}) is not finite");
            return false;
        }
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let t = &mut self.elements[idx].transform;
        if t.x == x && t.y == y {
            return true;
        }
        t.x = x;
        t.y = y;
        self.touch();
        self.emit(SurfaceEvent::ElementsMoved(vec![id]));
        true
    }

    /// Shift several elements by the same delta.
    pub fn translate(&mut self, ids: &[ElementId], dx: f32, dy: f32) -> bool {
        if !(dx.is_finite() && dy.is_finite()) {
            debug!("translate ignored: ({dx}, {dy}) is not finite");
            return false;
        }
        let mut moved = Vec::new();
        for element in &mut self.elements {
            if ids.contains(&element.id) {
                element.transform.x += dx;
                element.transform.y += dy;
                moved.push(element.id);
            }
        }
        if moved.is_empty() {
            return false;
        }
        if dx != 0.0 || dy != 0.0 {
            self.touch();
            self.emit(SurfaceEvent::ElementsMoved(moved));
        }
        true
    }

    // ── Selection ──

    fn set_selection(&mut self, selection: Selection) {
        if let Some(editing) = self.editing
            && !selection.contains(editing)
        {
            self.editing = None;
            self.emit(SurfaceEvent::TextEditChanged(None));
        }
        if self.selection != selection {
            self.selection = selection.clone();
            self.emit(SurfaceEvent::SelectionChanged(selection));
        }
    }

    pub fn select(&mut self, id: ElementId) -> bool {
        if self.get(id).is_none() {
            debug!("select ignored: no element {id}");
            return false;
        }
        self.set_selection(Selection::Single(id));
        true
    }

    /// Select several elements at once. Unknown ids are dropped.
    pub fn select_group(&mut self, ids: &[ElementId]) -> bool {
        let known = ids.iter().copied().filter(|id| self.get(*id).is_some());
        let selection = Selection::from_ids(known);
        let any = !selection.is_empty();
        self.set_selection(selection);
        any
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(Selection::None);
    }

    /// Enter live text editing on a text element, selecting it.
    pub fn begin_text_edit(&mut self, id: ElementId) -> bool {
        match self.get(id) {
            Some(el) if el.is_text() => {}
            _ => {
                debug!("text edit ignored: {id} is not a text element");
                return false;
            }
        }
        self.set_selection(Selection::Single(id));
        if self.editing != Some(id) {
            self.editing = Some(id);
            self.emit(SurfaceEvent::TextEditChanged(Some(id)));
        }
        true
    }

    pub fn end_text_edit(&mut self) {
        if self.editing.take().is_some() {
            self.emit(SurfaceEvent::TextEditChanged(None));
        }
    }

    // ── Template ──

    pub fn set_template(&mut self, template: Option<TemplateImage>) {
        if self.background == template {
            return;
        }
        self.background = template;
        self.touch();
        self.emit(SurfaceEvent::TemplateChanged);
    }

    // ── Clipboard and documents ──

    /// Insert clones on top with fresh ids and names, keeping their
    /// transforms, and select them.
    pub fn paste_elements(&mut self, clones: Vec<DesignElement>) -> Vec<ElementId> {
        if clones.is_empty() {
            return Vec::new();
        }
        let mut ids = Vec::with_capacity(clones.len());
        for mut element in clones {
            element.id = ElementId::mint(&element.kind);
            element.name = self.next_name(&element.kind);
            element.clamp_to_limits();
            ids.push(element.id);
            self.elements.push(element);
        }
        debug!("pasted {} element(s) on {}", ids.len(), self.side.as_str());
        self.touch();
        self.emit(SurfaceEvent::ElementsAdded(ids.clone()));
        self.set_selection(Selection::from_ids(ids.iter().copied()));
        ids
    }

    /// Replace every element with the document's contents.
    ///
    /// The document is validated first; on error the surface is unchanged.
    /// The template is kept and ids are regenerated.
    pub fn load_document(&mut self, doc: &SurfaceDocument) -> Result<(), DocumentError> {
        doc.validate(self.size)?;

        self.end_text_edit();
        self.set_selection(Selection::None);
        self.elements.clear();
        self.counters.clear();

        for record in &doc.elements {
            let id = ElementId::mint(&record.shape);
            let mut element = DesignElement::new(id, record.name.clone(), record.shape.clone());
            element.transform = record.transform;
            self.bump_counter_past(&element);
            self.elements.push(element);
        }

        debug!(
            "loaded {} element(s) on {}",
            self.elements.len(),
            self.side.as_str()
        );
        self.touch();
        self.emit(SurfaceEvent::Loaded);
        Ok(())
    }

    /// Keep the kind counter ahead of a loaded `"{Kind} {n}"` name.
    fn bump_counter_past(&mut self, element: &DesignElement) {
        if element.is_text() {
            return;
        }
        let label = element.kind.label();
        let Some(n) = element
            .name
            .strip_prefix(label)
            .and_then(|rest| rest.strip_prefix(' '))
            .and_then(|digits| digits.parse::<u32>().ok())
        else {
            return;
        };
        let counter = self.counters.entry(label).or_insert(0);
        *counter = (*counter).max(n);
    }
}
