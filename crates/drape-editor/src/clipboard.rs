//! Single-slot clipboard shared by both surfaces.
//!
//! Copy deep-clones the active element or every member of the active
//! group. Each paste offsets the slot's clones, inserts them into the
//! target surface, and stores the pasted copies back so repeated pastes
//! cascade diagonally.

use drape_core::id::ElementId;
use drape_core::model::DesignElement;
use drape_core::surface::SceneSurface;
use log::debug;

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Vec<DesignElement>,
    offset: f32,
}

impl Clipboard {
    pub fn new(offset: f32) -> Self {
        Self {
            slot: Vec::new(),
            offset,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slot.len()
    }

    pub fn contents(&self) -> &[DesignElement] {
        &self.slot
    }

    /// Replace the slot with the surface's selection, kept in z-order.
    /// Returns `false` (slot untouched) when nothing is selected.
    pub fn copy(&mut self, surface: &SceneSurface) -> bool {
        let selection = surface.selection();
        if selection.is_empty() {
            debug!("copy ignored: nothing selected");
            return false;
        }
        self.slot = surface
            .elements()
            .iter()
            .filter(|el| selection.contains(el.id))
            .cloned()
            .collect();
        debug!("copied {} element(s)", self.slot.len());
        true
    }

    /// Paste offset clones into `target` and select them.
    pub fn paste(&mut self, target: &mut SceneSurface) -> Vec<ElementId> {
        if self.slot.is_empty() {
            debug!("paste ignored: clipboard is empty");
            return Vec::new();
        }
        for el in &mut self.slot {
            el.transform.x += self.offset;
            el.transform.y += self.offset;
        }
        let ids = target.paste_elements(self.slot.clone());
        // Keep the slot in step with what landed so names and ids match
        // the most recent paste.
        for (el, id) in self.slot.iter_mut().zip(&ids) {
            if let Some(pasted) = target.get(*id) {
                *el = pasted.clone();
            }
        }
        ids
    }

    pub fn clear(&mut self) {
        self.slot.clear();
    }
}
