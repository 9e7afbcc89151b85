//! wgpu implementation of `GpuBackend`.
//!
//! One pipeline draws the whole garment. Each submesh binds the texture
//! group for its island: the front or back surface raster, or a 1×1 white
//! texture for plain fabric.

use crate::mesh::{GarmentMesh, Island, MeshVertex};
use crate::projection::TextureCalibration;
use crate::viewer::{GpuBackend, ViewerError};
use drape_core::model::SurfaceSide;
use glam::Mat4;
use image::RgbaImage;
use log::{debug, trace};
use std::sync::Arc;
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.93,
    g: 0.93,
    b: 0.94,
    a: 1.0,
};

/// Per-island uniform, mirrors `Calibration` in the shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct CalibrationUniform {
    repeat_offset: [f32; 4],
    textured: [f32; 4],
}

impl CalibrationUniform {
    fn new(calibration: &TextureCalibration, textured: bool) -> Self {
        let flag = if textured { 1.0 } else { 0.0 };
        Self {
            repeat_offset: calibration.to_uniform(),
            textured: [flag, 0.0, 0.0, 0.0],
        }
    }
}

struct IslandBinding {
    texture: wgpu::Texture,
    size: (u32, u32),
    bind_group: wgpu::BindGroup,
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    /// One index buffer per submesh, with its island and index count.
    submeshes: Vec<(Island, wgpu::Buffer, u32)>,
}

struct Target {
    view: wgpu::TextureView,
    depth: wgpu::TextureView,
    size: (u32, u32),
}

/// Everything built from the device that does not depend on the mesh.
struct Pipeline {
    pipeline: wgpu::RenderPipeline,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    camera_buffer: wgpu::Buffer,
    camera_group: wgpu::BindGroup,
    plain: IslandBinding,
}

/// Device handles and, once a mesh has been uploaded, the pipeline.
struct Context {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: Option<Pipeline>,
}

/// `release` drops the context along with every resource, including the
/// device and queue handles. `attach` hands new ones back; the pipeline is
/// rebuilt on the next `upload_mesh`.
pub struct WgpuBackend {
    format: wgpu::TextureFormat,
    context: Option<Context>,
    sides: [Option<IslandBinding>; 2],
    mesh: Option<MeshBuffers>,
    target: Option<Target>,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("attached", &self.is_attached())
            .field("pipeline", &self.has_pipeline())
            .field("mesh", &self.mesh.is_some())
            .field("front", &self.sides[0].is_some())
            .field("back", &self.sides[1].is_some())
            .field("target", &self.target.as_ref().map(|t| t.size))
            .finish()
    }
}

impl WgpuBackend {
    /// A backend rendering into targets of `format`. Nothing is built
    /// until the first mesh upload.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self {
            format,
            context: Some(Context {
                device,
                queue,
                pipeline: None,
            }),
            sides: [None, None],
            mesh: None,
            target: None,
        }
    }

    /// Hand device handles back after `release`.
    pub fn attach(&mut self, device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) {
        self.context = Some(Context {
            device,
            queue,
            pipeline: None,
        });
    }

    pub fn is_attached(&self) -> bool {
        self.context.is_some()
    }

    pub fn has_pipeline(&self) -> bool {
        self.context.as_ref().is_some_and(|c| c.pipeline.is_some())
    }

    /// Set the view the next `draw` renders into. The depth buffer is
    /// recreated when the size changes.
    pub fn set_target(&mut self, view: wgpu::TextureView, width: u32, height: u32) {
        let Some(context) = &self.context else {
            debug!("render target ignored: backend is released");
            return;
        };
        let size = (width.max(1), height.max(1));
        let depth = match self.target.take() {
            Some(old) if old.size == size => old.depth,
            _ => {
                debug!("depth buffer {}x{}", size.0, size.1);
                context
                    .device
                    .create_texture(&wgpu::TextureDescriptor {
                        label: Some("drape-depth"),
                        size: wgpu::Extent3d {
                            width: size.0,
                            height: size.1,
                            depth_or_array_layers: 1,
                        },
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: DEPTH_FORMAT,
                        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                        view_formats: &[],
                    })
                    .create_view(&wgpu::TextureViewDescriptor::default())
            }
        };
        self.target = Some(Target { view, depth, size });
    }

    fn context(&self) -> Result<&Context, ViewerError> {
        self.context
            .as_ref()
            .ok_or_else(|| ViewerError::Backend("backend is released".into()))
    }
}

fn binding_for<'a>(
    sides: &'a [Option<IslandBinding>; 2],
    plain: &'a IslandBinding,
    island: Island,
) -> &'a IslandBinding {
    let uploaded = match island {
        Island::Surface(SurfaceSide::Front) => sides[0].as_ref(),
        Island::Surface(SurfaceSide::Back) => sides[1].as_ref(),
        Island::Plain => None,
    };
    uploaded.unwrap_or(plain)
}

impl Pipeline {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("drape-garment-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("drape-camera-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("drape-island-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("drape-garment-layout"),
            bind_group_layouts: &[&camera_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let vertex_attributes =
            wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("drape-garment-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &vertex_attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Garments are open shells; both faces are visible.
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("drape-camera"),
            contents: bytemuck::cast_slice(&Mat4::IDENTITY.to_cols_array()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("drape-camera-group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("drape-surface-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = [255u8; 4];
        let plain = island_binding(
            device,
            queue,
            &texture_layout,
            &sampler,
            (1, 1),
            &white,
            CalibrationUniform::new(&TextureCalibration::IDENTITY, false),
        );

        Self {
            pipeline,
            texture_layout,
            sampler,
            camera_buffer,
            camera_group,
            plain,
        }
    }
}

fn island_binding(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    size: (u32, u32),
    pixels: &[u8],
    calibration: CalibrationUniform,
) -> IslandBinding {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some("drape-surface-texture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SURFACE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        pixels,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("drape-calibration"),
        contents: bytemuck::bytes_of(&calibration),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("drape-island-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
        ],
    });
    IslandBinding {
        texture,
        size,
        bind_group,
    }
}

impl GpuBackend for WgpuBackend {
    fn upload_mesh(&mut self, mesh: &GarmentMesh) -> Result<(), ViewerError> {
        if mesh.vertices.is_empty() {
            return Err(ViewerError::Backend("mesh has no vertices".into()));
        }
        let Some(context) = self.context.as_mut() else {
            return Err(ViewerError::Backend("backend is released".into()));
        };
        if context.pipeline.is_none() {
            debug!("building garment pipeline");
            context.pipeline = Some(Pipeline::new(&context.device, &context.queue, self.format));
        }
        let device = &context.device;
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("drape-garment-vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let submeshes = mesh
            .submeshes
            .iter()
            .filter(|sub| !sub.indices.is_empty())
            .map(|sub| {
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("drape-garment-indices"),
                    contents: bytemuck::cast_slice(&sub.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
                (sub.island, buffer, sub.indices.len() as u32)
            })
            .collect();
        self.mesh = Some(MeshBuffers {
            vertices,
            submeshes,
        });
        Ok(())
    }

    fn upload_texture(
        &mut self,
        side: SurfaceSide,
        image: &RgbaImage,
        calibration: &TextureCalibration,
    ) -> Result<(), ViewerError> {
        let size = image.dimensions();
        if size.0 == 0 || size.1 == 0 {
            return Err(ViewerError::Backend(format!(
                "empty {} texture",
                side.as_str()
            )));
        }
        let context = self.context()?;
        let Some(pipeline) = &context.pipeline else {
            return Err(ViewerError::NotMounted);
        };
        let slot = match side {
            SurfaceSide::Front => 0,
            SurfaceSide::Back => 1,
        };
        if let Some(existing) = &self.sides[slot]
            && existing.size == size
        {
            trace!("rewriting {} texture in place", side.as_str());
            context.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &existing.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size.0),
                    rows_per_image: Some(size.1),
                },
                wgpu::Extent3d {
                    width: size.0,
                    height: size.1,
                    depth_or_array_layers: 1,
                },
            );
            return Ok(());
        }
        debug!("creating {} texture {}x{}", side.as_str(), size.0, size.1);
        let binding = island_binding(
            &context.device,
            &context.queue,
            &pipeline.texture_layout,
            &pipeline.sampler,
            size,
            image.as_raw(),
            CalibrationUniform::new(calibration, true),
        );
        self.sides[slot] = Some(binding);
        Ok(())
    }

    fn draw(&mut self, view_projection: Mat4) -> Result<(), ViewerError> {
        let context = self.context()?;
        let (Some(pipeline), Some(mesh)) = (&context.pipeline, &self.mesh) else {
            return Err(ViewerError::NotMounted);
        };
        let Some(target) = &self.target else {
            return Err(ViewerError::Backend("no render target".into()));
        };

        context.queue.write_buffer(
            &pipeline.camera_buffer,
            0,
            bytemuck::cast_slice(&view_projection.to_cols_array()),
        );

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("drape-garment-encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("drape-garment-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&pipeline.pipeline);
            pass.set_bind_group(0, &pipeline.camera_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            for (island, indices, count) in &mesh.submeshes {
                let binding = binding_for(&self.sides, &pipeline.plain, *island);
                pass.set_bind_group(1, &binding.bind_group, &[]);
                pass.set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..*count, 0, 0..1);
            }
        }
        context.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn release(&mut self) {
        self.mesh = None;
        self.sides = [None, None];
        self.target = None;
        self.context = None;
        debug!("gpu resources released");
    }
}
