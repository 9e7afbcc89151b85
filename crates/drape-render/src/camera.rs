//! Orbit camera for the garment preview.
//!
//! Pointer drags queue rotation which is eased in over the following
//! frames: each frame applies `damping` of the pending delta and keeps the
//! rest, so the model keeps turning briefly after release. Zoom changes the
//! orbit distance directly, clamped to the configured range.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub fov_y_degrees: f32,
    pub initial_distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Fraction of pending rotation applied per 60 Hz frame.
    pub damping: f32,
    /// Radians per dragged pixel.
    pub rotate_speed: f32,
    /// Distance scale per scroll unit.
    pub zoom_speed: f32,
    /// Elevation limit either side of the horizon, in degrees.
    pub max_elevation_degrees: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 45.0,
            initial_distance: 3.0,
            min_distance: 1.2,
            max_distance: 8.0,
            damping: 0.05,
            rotate_speed: 0.01,
            zoom_speed: 0.001,
            max_elevation_degrees: 85.0,
        }
    }
}

const NEAR: f32 = 0.01;
const FAR: f32 = 100.0;
/// Pending rotation below this is dropped.
const SETTLE_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    config: CameraConfig,
    /// Radians around the vertical axis; 0 looks at the front.
    azimuth: f32,
    /// Radians above the horizon.
    elevation: f32,
    distance: f32,
    target: Vec3,
    pending_azimuth: f32,
    pending_elevation: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let distance = config
            .initial_distance
            .clamp(config.min_distance, config.max_distance);
        Self {
            config,
            azimuth: 0.0,
            elevation: 0.0,
            distance,
            target: Vec3::ZERO,
            pending_azimuth: 0.0,
            pending_elevation: 0.0,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Queue a rotation from a pointer drag of (`dx`, `dy`) pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_azimuth -= dx * self.config.rotate_speed;
        self.pending_elevation += dy * self.config.rotate_speed;
    }

    /// Scroll zoom; positive `delta` moves away.
    pub fn zoom(&mut self, delta: f32) {
        let factor = (delta * self.config.zoom_speed).exp();
        self.set_distance(self.distance * factor);
    }

    /// Pinch zoom; `scale > 1` moves closer.
    pub fn pinch(&mut self, scale: f32) {
        if scale > 0.0 {
            self.set_distance(self.distance / scale);
        }
    }

    fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(self.config.min_distance, self.config.max_distance);
    }

    /// Advance damping by `dt` seconds. Returns whether the camera is still
    /// moving.
    pub fn update(&mut self, dt: f32) -> bool {
        // Scale the per-frame factor so the easing is frame-rate independent.
        let frames = (dt * 60.0).max(0.0);
        let keep = (1.0 - self.config.damping.clamp(0.0, 1.0)).powf(frames);
        let applied = 1.0 - keep;

        self.azimuth += self.pending_azimuth * applied;
        self.elevation += self.pending_elevation * applied;
        self.pending_azimuth *= keep;
        self.pending_elevation *= keep;

        let limit = self.config.max_elevation_degrees.to_radians();
        self.elevation = self.elevation.clamp(-limit, limit);
        self.azimuth = self.azimuth.rem_euclid(std::f32::consts::TAU);

        if self.pending_azimuth.abs() < SETTLE_EPSILON {
            self.pending_azimuth = 0.0;
        }
        if self.pending_elevation.abs() < SETTLE_EPSILON {
            self.pending_elevation = 0.0;
        }
        self.is_moving()
    }

    pub fn is_moving(&self) -> bool {
        self.pending_azimuth != 0.0 || self.pending_elevation != 0.0
    }

    /// Camera position from spherical coordinates around the target.
    pub fn eye(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        self.target
            + self.distance * Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(
            self.config.fov_y_degrees.to_radians(),
            aspect.max(1e-3),
            NEAR,
            FAR,
        )
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_front_of_the_model() {
        let cam = OrbitCamera::default();
        let eye = cam.eye();
        assert!((eye - Vec3::new(0.0, 0.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn rotation_eases_in_with_damping() {
        let mut cam = OrbitCamera::default();
        cam.rotate(-10.0, 0.0); // queues +0.1 rad
        cam.update(1.0 / 60.0);
        assert!((cam.azimuth() - 0.005).abs() < 1e-5);
        assert!(cam.is_moving());

        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        assert!((cam.azimuth() - 0.1).abs() < 1e-3);
        assert!(!cam.is_moving());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut cam = OrbitCamera::default();
        cam.zoom(1e6);
        assert_eq!(cam.distance(), 8.0);
        cam.pinch(100.0);
        assert_eq!(cam.distance(), 1.2);
    }

    #[test]
    fn elevation_is_limited() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 100_000.0);
        for _ in 0..600 {
            cam.update(1.0 / 60.0);
        }
        assert!(cam.elevation() <= 85f32.to_radians() + 1e-6);
    }

    #[test]
    fn origin_projects_to_center() {
        let cam = OrbitCamera::default();
        let clip = cam.view_projection(1.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((clip.x / clip.w).abs() < 1e-5);
        assert!((clip.y / clip.w).abs() < 1e-5);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
    }
}
