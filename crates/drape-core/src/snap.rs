//! Midline snapping for dragged elements.
//!
//! A moving box snaps per axis: when its center comes within the snap zone
//! of the surface's vertical or horizontal midline, the position is
//! corrected so the center sits exactly on the midline and a guide is
//! reported for display.

use crate::model::SurfaceSize;
use serde::Serialize;
use smallvec::SmallVec;

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuideAxis {
    /// A vertical line at `position` on the x-axis.
    Vertical,
    /// A horizontal line at `position` on the y-axis.
    Horizontal,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuideLine {
    pub axis: GuideAxis,
    pub position: f32,
}

/// Corrected top-left position plus any guides to show.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub x: f32,
    pub y: f32,
    pub guides: SmallVec<[GuideLine; 2]>,
}

impl SnapResult {
    pub fn snapped_x(&self) -> bool {
        self.guides.iter().any(|g| g.axis == GuideAxis::Vertical)
    }

    pub fn snapped_y(&self) -> bool {
        self.guides.iter().any(|g| g.axis == GuideAxis::Horizontal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapEngine {
    size: SurfaceSize,
    zone: f32,
}

impl SnapEngine {
    pub fn new(size: SurfaceSize, zone: f32) -> Self {
        Self {
            size,
            zone: zone.max(0.0),
        }
    }

    pub fn zone(&self) -> f32 {
        self.zone
    }

    /// Snap a box of `width` x `height` whose raw top-left is (`x`, `y`).
    #[must_use]
    pub fn snap(&self, x: f32, y: f32, width: f32, height: f32) -> SnapResult {
        let mut guides = SmallVec::new();
        let (mid_x, mid_y) = self.size.center();

        let x = match snap_axis(x, width, mid_x, self.zone) {
            Some(snapped) => {
                guides.push(GuideLine {
                    axis: GuideAxis::Vertical,
                    position: mid_x,
                });
                snapped
            }
            None => x,
        };
        let y = match snap_axis(y, height, mid_y, self.zone) {
            Some(snapped) => {
                guides.push(GuideLine {
                    axis: GuideAxis::Horizontal,
                    position: mid_y,
                });
                snapped
            }
            None => y,
        };

        SnapResult { x, y, guides }
    }
}

/// Start coordinate that centers an extent on `mid`, if within `zone`.
fn snap_axis(start: f32, extent: f32, mid: f32, zone: f32) -> Option<f32> {
    let center = start + extent / 2.0;
    ((center - mid).abs() <= zone).then(|| mid - extent / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SnapEngine {
        SnapEngine::new(SurfaceSize::DEFAULT, 15.0)
    }

    #[test]
    fn snaps_center_onto_vertical_midline() {
        // Surface is 500 wide; a 100-wide box centered at 255 is 5 off.
        let r = engine().snap(205.0, 10.0, 100.0, 40.0);
        assert_eq!(r.x, 200.0);
        assert_eq!(r.x + 50.0, 250.0);
        assert_eq!(r.y, 10.0);
        assert!(r.snapped_x());
        assert!(!r.snapped_y());
        assert_eq!(
            r.guides.as_slice(),
            &[GuideLine {
                axis: GuideAxis::Vertical,
                position: 250.0
            }]
        );
    }

    #[test]
    fn outside_zone_is_unchanged() {
        let r = engine().snap(10.0, 20.0, 100.0, 40.0);
        assert_eq!((r.x, r.y), (10.0, 20.0));
        assert!(r.guides.is_empty());
    }

    #[test]
    fn zone_edge_is_inclusive() {
        // Center at 265: exactly 15 from the midline.
        let r = engine().snap(215.0, 0.0, 100.0, 10.0);
        assert_eq!(r.x, 200.0);
        let r = engine().snap(215.5, 0.0, 100.0, 10.0);
        assert_eq!(r.x, 215.5);
    }

    #[test]
    fn axes_snap_independently() {
        // Height 600 surface: midline y = 300.
        let r = engine().snap(0.0, 271.0, 50.0, 50.0);
        assert_eq!((r.x, r.y), (0.0, 275.0));
        assert!(r.snapped_y());

        let r = engine().snap(222.0, 278.0, 50.0, 50.0);
        assert_eq!((r.x, r.y), (225.0, 275.0));
        assert_eq!(r.guides.len(), 2);
    }
}
