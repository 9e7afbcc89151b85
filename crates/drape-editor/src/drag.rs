//! Drag-move sessions with midline snapping.
//!
//! A session remembers where every dragged element started. Each pointer
//! move recomputes positions from those starts plus the total pointer
//! delta, so snapping never accumulates drift. Group drags snap the union
//! bounds and shift every member by the same correction.

use drape_core::id::ElementId;
use drape_core::model::Bounds;
use drape_core::snap::{GuideLine, SnapEngine};
use drape_core::surface::SceneSurface;
use smallvec::SmallVec;

#[derive(Debug, Clone)]
pub struct DragSession {
    pointer: (f32, f32),
    bounds: Bounds,
    starts: SmallVec<[(ElementId, f32, f32); 4]>,
}

impl DragSession {
    /// Start dragging the current selection from pointer (`px`, `py`).
    /// Returns `None` when nothing is selected.
    pub fn begin(surface: &SceneSurface, px: f32, py: f32) -> Option<Self> {
        let bounds = surface.selection_bounds()?;
        let starts = surface
            .selection()
            .ids()
            .iter()
            .filter_map(|id| surface.get(*id))
            .map(|el| (el.id, el.transform.x, el.transform.y))
            .collect();
        Some(Self {
            pointer: (px, py),
            bounds,
            starts,
        })
    }

    pub fn members(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.starts.iter().map(|(id, _, _)| *id)
    }

    /// Move the dragged elements for a pointer at (`px`, `py`) and return
    /// the guides to show.
    pub fn update(
        &self,
        surface: &mut SceneSurface,
        snap: &SnapEngine,
        px: f32,
        py: f32,
    ) -> SmallVec<[GuideLine; 2]> {
        let raw_x = self.bounds.x + (px - self.pointer.0);
        let raw_y = self.bounds.y + (py - self.pointer.1);
        let snapped = snap.snap(raw_x, raw_y, self.bounds.width, self.bounds.height);

        let dx = snapped.x - self.bounds.x;
        let dy = snapped.y - self.bounds.y;
        for (id, x, y) in &self.starts {
            surface.move_element_to(*id, x + dx, y + dy);
        }
        snapped.guides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::model::{Color, ElementKind, SurfaceSide, SurfaceSize};
    use drape_core::snap::GuideAxis;
    use drape_core::surface::ElementSpec;
    use pretty_assertions::assert_eq;

    fn setup() -> (SceneSurface, SnapEngine) {
        let size = SurfaceSize::DEFAULT;
        (
            SceneSurface::new(SurfaceSide::Front, size),
            SnapEngine::new(size, 15.0),
        )
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
    fn nothing_selected_means_no_drag() {
        let (s, _) = setup();
        assert!(DragSession::begin(&s, 0.0, 0.0).is_none());
    }

    #[test]
    fn far_from_midlines_follows_pointer() {
        let (mut s, snap) = setup();
        let id = s.add_element(rect(100.0, 50.0));
        s.move_element_to(id, 0.0, 0.0);
        let drag = DragSession::begin(&s, 10.0, 10.0).unwrap();

        let guides = drag.update(&mut s, &snap, 30.0, 40.0);
        assert!(guides.is_empty());
        let t = s.get(id).unwrap().transform;
        assert_eq!((t.x, t.y), (20.0, 30.0));
    }

    #[test]
    fn near_vertical_midline_snaps_x_only() {
        let (mut s, snap) = setup();
        let id = s.add_element(rect(100.0, 50.0));
        s.move_element_to(id, 0.0, 0.0);
        let drag = DragSession::begin(&s, 0.0, 0.0).unwrap();

        // Center x lands at 255, five past the midline at 250.
        let guides = drag.update(&mut s, &snap, 205.0, 100.0);
        let t = s.get(id).unwrap().transform;
        assert_eq!((t.x, t.y), (200.0, 100.0));
        assert_eq!(guides.len(), 1);
        assert_eq!(guides[0].axis, GuideAxis::Vertical);
        assert_eq!(guides[0].position, 250.0);
    }

    #[test]
    fn group_snaps_union_bounds() {
        let (mut s, snap) = setup();
        let a = s.add_element(rect(40.0, 40.0));
        let b = s.add_element(rect(40.0, 40.0));
        s.move_element_to(a, 0.0, 0.0);
        s.move_element_to(b, 60.0, 0.0);
        s.select_group(&[a, b]);

        // Union is 100 wide; dragging by 203 puts its center at 253.
        let drag = DragSession::begin(&s, 0.0, 0.0).unwrap();
        assert_eq!(drag.members().count(), 2);
        drag.update(&mut s, &snap, 203.0, 0.0);
        assert_eq!(s.get(a).unwrap().transform.x, 200.0);
        assert_eq!(s.get(b).unwrap().transform.x, 260.0);
    }

    #[test]
    fn repeated_moves_do_not_drift() {
        let (mut s, snap) = setup();
        let id = s.add_element(rect(10.0, 10.0));
        s.move_element_to(id, 0.0, 0.0);
        let drag = DragSession::begin(&s, 0.0, 0.0).unwrap();
        for step in 1..=5 {
            drag.update(&mut s, &snap, step as f32, 0.0);
        }
        assert_eq!(s.get(id).unwrap().transform.x, 5.0);
    }
}
