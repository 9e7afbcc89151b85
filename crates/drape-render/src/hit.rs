//! Hit testing: point → element lookup.
//!
//! Walks a surface's elements front-to-back (last painted is topmost).
//! Points are mapped into each element's unrotated local frame, so rotated
//! elements are hit exactly rather than by their axis-aligned box.

use drape_core::id::ElementId;
use drape_core::model::{Bounds, DesignElement, ElementKind};

/// Corners of an element's box after rotation about its center, clockwise
/// from the top-left.
pub fn element_corners(element: &DesignElement) -> [(f32, f32); 4] {
    let b = element.bounds();
    let (cx, cy) = b.center();
    let (sin, cos) = element.transform.rotation.to_radians().sin_cos();
    let (hw, hh) = (b.width / 2.0, b.height / 2.0);
    [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
        .map(|(lx, ly)| (cx + lx * cos - ly * sin, cy + lx * sin + ly * cos))
}

/// Axis-aligned box enclosing the rotated element.
pub fn rotated_bounds(element: &DesignElement) -> Bounds {
    let corners = element_corners(element);
    let (mut x0, mut y0) = corners[0];
    let (mut x1, mut y1) = corners[0];
    for &(x, y) in &corners[1..] {
        x0 = x0.min(x);
        y0 = y0.min(y);
        x1 = x1.max(x);
        y1 = y1.max(y);
    }
    Bounds {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    }
}

/// Whether (px, py) lies on the element.
pub fn element_contains(element: &DesignElement, px: f32, py: f32) -> bool {
    let b = element.bounds();
    let (cx, cy) = b.center();
    // Undo the rotation about the center.
    let (sin, cos) = (-element.transform.rotation.to_radians()).sin_cos();
    let (dx, dy) = (px - cx, py - cy);
    let lx = dx * cos - dy * sin;
    let ly = dx * sin + dy * cos;

    match element.kind {
        ElementKind::Circle { .. } => {
            let (rx, ry) = (b.width / 2.0, b.height / 2.0);
            if rx <= 0.0 || ry <= 0.0 {
                return false;
            }
            (lx / rx).powi(2) + (ly / ry).powi(2) <= 1.0
        }
        _ => lx.abs() <= b.width / 2.0 && ly.abs() <= b.height / 2.0,
    }
}

/// Find the topmost element at (px, py).
/// Returns `None` if only the background is hit.
pub fn hit_test(elements: &[DesignElement], px: f32, py: f32) -> Option<ElementId> {
    elements
        .iter()
        .rev()
        .find(|e| element_contains(e, px, py))
        .map(|e| e.id)
}

/// All elements whose rotated box intersects `rect`, bottom to top.
/// Used for marquee selection.
pub fn hit_test_rect(elements: &[DesignElement], rect: Bounds) -> Vec<ElementId> {
    elements
        .iter()
        .filter(|e| rotated_bounds(e).intersects(&rect))
        .map(|e| e.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drape_core::model::{Color, Transform};

    fn rect(name: &str, x: f32, y: f32, w: f32, h: f32) -> DesignElement {
        let kind = ElementKind::Rect {
            width: w,
            height: h,
            corner_radius: 0.0,
            fill: Color::BLACK,
        };
        let mut el = DesignElement::new(ElementId::mint(&kind), name, kind);
        el.transform = Transform::at(x, y);
        el
    }

    #[test]
    fn topmost_wins() {
        let elements = vec![
            rect("hit_bottom", 0.0, 0.0, 100.0, 100.0),
            rect("hit_top", 50.0, 50.0, 100.0, 100.0),
        ];
        assert_eq!(hit_test(&elements, 75.0, 75.0), Some(elements[1].id));
        assert_eq!(hit_test(&elements, 10.0, 10.0), Some(elements[0].id));
        assert_eq!(hit_test(&elements, 300.0, 300.0), None);
    }

    #[test]
    fn rotation_is_respected() {
        // A thin bar rotated 90° about its center (50, 5) becomes vertical.
        let mut bar = rect("hit_bar", 0.0, 0.0, 100.0, 10.0);
        bar.transform.rotation = 90.0;
        let id = bar.id;
        let elements = vec![bar];
        assert_eq!(hit_test(&elements, 5.0, 5.0), None);
        assert_eq!(hit_test(&elements, 50.0, 40.0), Some(id));
    }

    #[test]
    fn circle_corners_miss() {
        let kind = ElementKind::Circle {
            radius: 10.0,
            fill: Color::BLACK,
        };
        let mut dot = DesignElement::new(ElementId::mint(&kind), "Circle 1", kind);
        dot.transform = Transform::at(0.0, 0.0);
        let elements = vec![dot];
        assert_eq!(hit_test(&elements, 1.0, 1.0), None);
        assert!(hit_test(&elements, 10.0, 10.0).is_some());
    }

    #[test]
    fn marquee_uses_rotated_box() {
        let mut bar = rect("hit_marquee_bar", 0.0, 0.0, 100.0, 10.0);
        bar.transform.rotation = 90.0;
        let id = bar.id;
        let other = rect("hit_marquee_far", 400.0, 400.0, 10.0, 10.0);
        let elements = vec![bar, other];
        let hits = hit_test_rect(
            &elements,
            Bounds {
                x: 45.0,
                y: 50.0,
                width: 10.0,
                height: 5.0,
            },
        );
        assert_eq!(hits, vec![id]);
    }
}
