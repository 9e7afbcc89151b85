pub mod camera;
pub mod gpu;
pub mod hit;
pub mod mesh;
pub mod projection;
pub mod raster;
pub mod viewer;

pub use camera::{CameraConfig, OrbitCamera};
pub use gpu::WgpuBackend;
pub use hit::{hit_test, hit_test_rect, rotated_bounds};
pub use mesh::{GarmentMesh, Island, MeshError, MeshVertex, Submesh};
pub use projection::TextureCalibration;
pub use raster::{FontBook, ImageStore, RasterConfig, RasterError, Rasterizer};
pub use viewer::{FrameStats, GpuBackend, ProjectionViewer, ViewerError, ViewerState};
