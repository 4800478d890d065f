use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::collections::BTreeMap;
use vantage_common::{BackendKind, MeshData, RenderConfig, Vertex};
use vantage_render::{
    BackendState, BindCache, Lifecycle, MatrixCache, MeshHandle, RenderBackend, RenderError,
};
use wgpu::util::DeviceExt;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const INITIAL_DRAW_CAPACITY: u64 = 256;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

const DRAW_UNIFORM_SIZE: u64 = std::mem::size_of::<DrawUniforms>() as u64;

/// Map the configured API onto wgpu's backend set.
pub fn backends_for(kind: BackendKind) -> wgpu::Backends {
    match kind {
        BackendKind::Auto => wgpu::Backends::all(),
        BackendKind::Gl => wgpu::Backends::GL,
        BackendKind::Vulkan => wgpu::Backends::VULKAN,
        BackendKind::Metal => wgpu::Backends::METAL,
        BackendKind::Dx12 => wgpu::Backends::DX12,
    }
}

/// Construction-time options for [`WgpuBackend`].
#[derive(Debug, Clone)]
pub struct WgpuSettings {
    pub backends: wgpu::Backends,
    pub present_mode: wgpu::PresentMode,
    pub clear_color: wgpu::Color,
}

impl Default for WgpuSettings {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl WgpuSettings {
    pub fn from_config(config: &RenderConfig) -> Self {
        let [r, g, b, a] = config.clear_color;
        Self {
            backends: backends_for(config.backend),
            present_mode: if config.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// One uniform buffer holding every draw's matrices at aligned offsets.
struct DrawUniformBuffer {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: u64,
}

impl DrawUniformBuffer {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: u64,
    ) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("draw_uniform_buffer"),
            size: stride * capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("draw_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
        }
    }

    fn ensure_capacity(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        draws: usize,
    ) {
        let draws = draws as u64;
        if draws <= self.capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        tracing::debug!(from = self.capacity, to = capacity, "growing draw uniform buffer");
        *self = Self::new(device, layout, self.stride, capacity);
    }

    /// Pack per-draw uniforms at `stride` intervals.
    fn pack(&self, draws: &[DrawCommand]) -> Vec<u8> {
        pack_uniforms(draws, self.stride as usize)
    }
}

fn pack_uniforms(draws: &[DrawCommand], stride: usize) -> Vec<u8> {
    let mut staging = vec![0u8; stride * draws.len()];
    for (i, draw) in draws.iter().enumerate() {
        let bytes = bytemuck::bytes_of(&draw.uniforms);
        let start = i * stride;
        staging[start..start + bytes.len()].copy_from_slice(bytes);
    }
    staging
}

struct DrawCommand {
    mesh: MeshHandle,
    uniforms: DrawUniforms,
}

struct PendingFrame {
    surface_texture: wgpu::SurfaceTexture,
    draws: Vec<DrawCommand>,
}

struct GpuContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    uniforms: DrawUniformBuffer,
    depth_view: wgpu::TextureView,
    adapter_info: wgpu::AdapterInfo,
}

impl GpuContext {
    fn create(
        settings: &WgpuSettings,
        target: wgpu::SurfaceTarget<'static>,
        width: u32,
        height: u32,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: settings.backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(target)
            .map_err(|e| RenderError::ContextCreation(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("vantage_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: settings.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let (bind_group_layout, pipeline) = create_pipeline(&device, format);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("default shader failed to build: {err}");
            return Err(RenderError::Shader(err.to_string()));
        }

        let stride = wgpu::util::align_to(
            DRAW_UNIFORM_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let uniforms =
            DrawUniformBuffer::new(&device, &bind_group_layout, stride, INITIAL_DRAW_CAPACITY);
        let depth_view = create_depth_view(&device, config.width, config.height);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            bind_group_layout,
            pipeline,
            uniforms,
            depth_view,
            adapter_info: adapter.get_info(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, self.config.width, self.config.height);
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
) -> (wgpu::BindGroupLayout, wgpu::RenderPipeline) {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("draw_bind_group_layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: wgpu::BufferSize::new(DRAW_UNIFORM_SIZE),
            },
            count: None,
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("default_pipeline_layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("default_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::DEFAULT_SHADER.into()),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("default_pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    });

    (bind_group_layout, pipeline)
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

/// GPU backend over a window surface.
pub struct WgpuBackend {
    settings: WgpuSettings,
    lifecycle: Lifecycle,
    matrices: MatrixCache,
    bind_cache: BindCache,
    context: Option<GpuContext>,
    meshes: BTreeMap<MeshHandle, GpuMesh>,
    next_mesh_id: u64,
    frame: Option<PendingFrame>,
}

impl WgpuBackend {
    pub fn new(settings: WgpuSettings) -> Self {
        Self {
            settings,
            lifecycle: Lifecycle::new(),
            matrices: MatrixCache::new(),
            bind_cache: BindCache::new(),
            context: None,
            meshes: BTreeMap::new(),
            next_mesh_id: 0,
            frame: None,
        }
    }

    pub fn adapter_info(&self) -> Option<&wgpu::AdapterInfo> {
        self.context.as_ref().map(|c| &c.adapter_info)
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.context
            .as_ref()
            .map(|c| (c.config.width, c.config.height))
    }

    fn context(&self, op: &'static str) -> Result<&GpuContext, RenderError> {
        self.context.as_ref().ok_or(RenderError::InvalidState {
            op,
            state: self.lifecycle.state(),
        })
    }
}

impl RenderBackend for WgpuBackend {
    type Target = wgpu::SurfaceTarget<'static>;

    fn init(
        &mut self,
        target: wgpu::SurfaceTarget<'static>,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        self.lifecycle.check_init()?;
        let context = GpuContext::create(&self.settings, target, width, height)
            .inspect_err(|e| tracing::error!("render backend init failed: {e}"))?;
        tracing::info!(
            "GPU initialized with {} backend ({})",
            context.adapter_info.backend.to_str(),
            context.adapter_info.name
        );
        self.context = Some(context);
        self.matrices = MatrixCache::new();
        self.bind_cache.reset();
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.check_begin_frame()?;
        let ctx = self.context("begin_frame")?;
        let surface_texture = match ctx.surface.get_current_texture() {
            Ok(t) => t,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                ctx.surface.configure(&ctx.device, &ctx.config);
                return Err(RenderError::Surface(e.to_string()));
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };

        self.matrices.view_projection();
        self.bind_cache.reset();
        self.frame = Some(PendingFrame {
            surface_texture,
            draws: Vec::new(),
        });
        self.lifecycle.enter_frame();
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.check_in_frame("end_frame")?;
        let state = self.lifecycle.state();
        let (Some(frame), Some(ctx)) = (self.frame.take(), self.context.as_mut()) else {
            return Err(RenderError::InvalidState {
                op: "end_frame",
                state,
            });
        };

        ctx.uniforms
            .ensure_capacity(&ctx.device, &ctx.bind_group_layout, frame.draws.len());
        if !frame.draws.is_empty() {
            let staging = ctx.uniforms.pack(&frame.draws);
            ctx.queue.write_buffer(&ctx.uniforms.buffer, 0, &staging);
        }

        let view = frame
            .surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.settings.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&ctx.pipeline);
            let stride = ctx.uniforms.stride;
            for (i, draw) in frame.draws.iter().enumerate() {
                let Some(mesh) = self.meshes.get(&draw.mesh) else {
                    tracing::warn!("skipping draw of released {}", draw.mesh);
                    continue;
                };
                pass.set_bind_group(0, &ctx.uniforms.bind_group, &[(i as u64 * stride) as u32]);
                if self.bind_cache.bind(draw.mesh) {
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                }
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        frame.surface_texture.present();
        self.lifecycle.leave_frame();
        Ok(())
    }

    fn set_view_matrix(&mut self, view: Mat4) {
        self.matrices.set_view(view);
    }

    fn set_projection_matrix(&mut self, projection: Mat4) {
        self.matrices.set_projection(projection);
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, RenderError> {
        self.lifecycle.check_ready("create_mesh")?;
        if mesh.is_empty() {
            return Err(RenderError::EmptyMesh);
        }
        let ctx = self.context("create_mesh")?;
        let vertex_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertex_buffer"),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_index_buffer"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        let handle = MeshHandle(self.next_mesh_id);
        self.next_mesh_id += 1;
        self.meshes.insert(
            handle,
            GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.index_count(),
            },
        );
        tracing::debug!(%handle, indices = mesh.index_count(), "mesh uploaded");
        Ok(handle)
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) -> bool {
        self.bind_cache.invalidate(mesh);
        self.meshes.remove(&mesh).is_some()
    }

    fn mesh_index_count(&self, mesh: MeshHandle) -> Option<u32> {
        self.meshes.get(&mesh).map(|m| m.index_count)
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, model: Mat4) -> Result<(), RenderError> {
        self.lifecycle.check_in_frame("draw_mesh")?;
        if !self.meshes.contains_key(&mesh) {
            tracing::warn!("draw of unknown {mesh}");
            return Err(RenderError::UnknownMesh(mesh));
        }
        let mvp = self.matrices.view_projection() * model;
        if let Some(frame) = self.frame.as_mut() {
            frame.draws.push(DrawCommand {
                mesh,
                uniforms: DrawUniforms {
                    mvp: mvp.to_cols_array_2d(),
                    model: model.to_cols_array_2d(),
                },
            });
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(ctx) = self.context.as_mut() {
            ctx.resize(width, height);
            tracing::debug!(width, height, "surface resized");
        }
    }

    fn shutdown(&mut self) {
        if self.lifecycle.shutdown() {
            let released = self.meshes.len();
            self.frame = None;
            self.meshes.clear();
            self.bind_cache.reset();
            self.context = None;
            tracing::info!(released, "render backend shut down");
        }
    }

    fn state(&self) -> BackendState {
        self.lifecycle.state()
    }
}
