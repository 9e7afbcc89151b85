//! Texture calibration: where each surface lands on the garment mesh.
//!
//! The bundled garment mesh packs its UV atlas as two islands side by side:
//! the front panel in `u ∈ [0, 0.5)` and the back panel in `u ∈ [0.5, 1)`.
//! Each side's texture is sampled with repeat wrapping at
//! `fract(uv * repeat + offset)`, which stretches its island over the whole
//! surface raster. The shader applies the same mapping.

use drape_core::model::SurfaceSide;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextureCalibration {
    pub repeat: [f32; 2],
    pub offset: [f32; 2],
}

impl TextureCalibration {
    pub const FRONT: TextureCalibration = TextureCalibration {
        repeat: [2.0, 1.0],
        offset: [0.0, 0.0],
    };

    pub const BACK: TextureCalibration = TextureCalibration {
        repeat: [2.0, 1.0],
        offset: [-1.0, 0.0],
    };

    /// No remapping; used for untextured islands.
    pub const IDENTITY: TextureCalibration = TextureCalibration {
        repeat: [1.0, 1.0],
        offset: [0.0, 0.0],
    };

    pub fn for_side(side: SurfaceSide) -> Self {
        match side {
            SurfaceSide::Front => Self::FRONT,
            SurfaceSide::Back => Self::BACK,
        }
    }

    /// Texture coordinate sampled for a mesh UV, after repeat wrapping.
    pub fn apply(&self, uv: [f32; 2]) -> [f32; 2] {
        [
            wrap(uv[0] * self.repeat[0] + self.offset[0]),
            wrap(uv[1] * self.repeat[1] + self.offset[1]),
        ]
    }

    /// Surface raster pixel sampled for a mesh UV. `v = 0` is the top row.
    pub fn uv_to_surface(&self, uv: [f32; 2], width: u32, height: u32) -> (f32, f32) {
        let [u, v] = self.apply(uv);
        (u * width as f32, v * height as f32)
    }

    /// Packed as `[repeat.x, repeat.y, offset.x, offset.y]` for the shader.
    pub fn to_uniform(&self) -> [f32; 4] {
        [self.repeat[0], self.repeat[1], self.offset[0], self.offset[1]]
    }
}

fn wrap(v: f32) -> f32 {
    v - v.floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn front_island_covers_whole_surface() {
        let c = TextureCalibration::FRONT;
        assert_eq!(c.uv_to_surface([0.0, 0.0], 1000, 1200), (0.0, 0.0));
        assert_eq!(c.uv_to_surface([0.25, 0.5], 1000, 1200), (500.0, 600.0));
    }

    #[test]
    fn back_island_maps_to_same_raster_space() {
        let c = TextureCalibration::BACK;
        assert_eq!(c.uv_to_surface([0.75, 0.5], 1000, 1200), (500.0, 600.0));
        assert_eq!(c.apply([0.5, 0.0]), [0.0, 0.0]);
    }

    #[test]
    fn repeat_wraps_out_of_range_uvs() {
        let c = TextureCalibration::IDENTITY;
        let [u, v] = c.apply([1.25, -0.25]);
        assert!((u - 0.25).abs() < 1e-6);
        assert!((v - 0.75).abs() < 1e-6);
    }

    #[test]
    fn uniform_layout() {
        assert_eq!(
            TextureCalibration::BACK.to_uniform(),
            [2.0, 1.0, -1.0, 0.0]
        );
    }
}
