//! The 3D projection viewer.
//!
//! Owns the garment mesh on a `GpuBackend`, one texture per surface, and an
//! orbit camera. The frame loop is explicit: the host calls `start()`, then
//! `frame()` from its animation callback until `stop()` or `unmount()`.
//! Surfaces are re-rasterized and re-uploaded only when their revision or
//! the rasterizer's asset generation changes.

use crate::camera::{CameraConfig, OrbitCamera};
use crate::mesh::{GarmentMesh, MeshError};
use crate::projection::TextureCalibration;
use crate::raster::{RasterError, Rasterizer};
use drape_core::model::SurfaceSide;
use drape_core::surface::SceneSurface;
use glam::Mat4;
use image::RgbaImage;
use log::{debug, error, trace};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error("gpu backend: {0}")]
    Backend(String),
    #[error("viewer is not mounted")]
    NotMounted,
}

/// What the viewer needs from a graphics API.
pub trait GpuBackend {
    /// Upload the static garment mesh, replacing any previous one.
    fn upload_mesh(&mut self, mesh: &GarmentMesh) -> Result<(), ViewerError>;

    /// Upload (or replace) the texture for one side.
    fn upload_texture(
        &mut self,
        side: SurfaceSide,
        image: &RgbaImage,
        calibration: &TextureCalibration,
    ) -> Result<(), ViewerError>;

    /// Draw the mesh with the current textures.
    fn draw(&mut self, view_projection: Mat4) -> Result<(), ViewerError>;

    /// Drop every GPU resource: mesh, textures, and pipeline state.
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Unmounted,
    /// Mounted without a usable mesh. The 2D surfaces keep working.
    Empty,
    Ready,
}

/// Result of one `frame()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub uploads: u32,
    pub drawn: bool,
}

pub struct ProjectionViewer<B: GpuBackend> {
    backend: B,
    rasterizer: Rasterizer,
    camera: OrbitCamera,
    state: ViewerState,
    running: bool,
    aspect: f32,
    /// (surface revision, asset generation) last uploaded per side,
    /// indexed front then back.
    uploaded: [Option<(u64, u64)>; 2],
}

fn slot(side: SurfaceSide) -> usize {
    match side {
        SurfaceSide::Front => 0,
        SurfaceSide::Back => 1,
    }
}

impl<B: GpuBackend> ProjectionViewer<B> {
    pub fn new(backend: B, rasterizer: Rasterizer, camera: CameraConfig) -> Self {
        Self {
            backend,
            rasterizer,
            camera: OrbitCamera::new(camera),
            state: ViewerState::Unmounted,
            running: false,
            aspect: 1.0,
            uploaded: [None; 2],
        }
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn rasterizer_mut(&mut self) -> &mut Rasterizer {
        &mut self.rasterizer
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    // ── Lifecycle ──

    /// Parse OBJ text and mount it.
    pub fn mount_obj(&mut self, source: &str) -> Result<(), ViewerError> {
        match GarmentMesh::parse_obj(source) {
            Ok(mesh) => self.mount(&mesh),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    pub fn mount_file(&mut self, path: impl AsRef<Path>) -> Result<(), ViewerError> {
        match GarmentMesh::load(path) {
            Ok(mesh) => self.mount(&mesh),
            Err(err) => Err(self.fail(err.into())),
        }
    }

    /// Upload the mesh. On failure the viewer is left `Empty`.
    pub fn mount(&mut self, mesh: &GarmentMesh) -> Result<(), ViewerError> {
        if let Err(err) = self.backend.upload_mesh(mesh) {
            return Err(self.fail(err));
        }
        self.uploaded = [None; 2];
        self.state = ViewerState::Ready;
        debug!("viewer mounted ({} triangles)", mesh.triangle_count());
        Ok(())
    }

    fn fail(&mut self, err: ViewerError) -> ViewerError {
        error!("garment mesh failed to load: {err}");
        self.state = ViewerState::Empty;
        self.running = false;
        err
    }

    /// Begin the frame loop. Only a mounted mesh can run.
    pub fn start(&mut self) -> bool {
        self.running = self.state == ViewerState::Ready;
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Release every GPU resource and stop the loop.
    pub fn unmount(&mut self) {
        if self.state == ViewerState::Unmounted {
            return;
        }
        self.running = false;
        self.backend.release();
        self.uploaded = [None; 2];
        self.state = ViewerState::Unmounted;
        debug!("viewer unmounted");
    }

    // ── Frames ──

    /// Advance the camera by `dt` seconds, refresh stale textures, and draw.
    /// Does nothing unless the loop is running.
    pub fn frame(
        &mut self,
        dt: f32,
        surfaces: &[&SceneSurface],
    ) -> Result<FrameStats, ViewerError> {
        if !self.running {
            return Ok(FrameStats::default());
        }
        if self.state != ViewerState::Ready {
            return Err(ViewerError::NotMounted);
        }

        self.camera.update(dt);

        let mut stats = FrameStats::default();
        let assets = self.rasterizer.asset_generation();
        for surface in surfaces {
            let side = surface.side();
            let key = (surface.revision(), assets);
            if self.uploaded[slot(side)] == Some(key) {
                continue;
            }
            trace!(
                "re-rasterizing {} at revision {} (assets {assets})",
                side.as_str(),
                key.0
            );
            let image = self.rasterizer.rasterize(surface)?;
            self.backend
                .upload_texture(side, &image, &TextureCalibration::for_side(side))?;
            self.uploaded[slot(side)] = Some(key);
            stats.uploads += 1;
        }

        self.backend
            .draw(self.camera.view_projection(self.aspect))?;
        stats.drawn = true;
        Ok(stats)
    }
}

impl<B: GpuBackend> Drop for ProjectionViewer<B> {
    fn drop(&mut self) {
        self.unmount();
    }
}
