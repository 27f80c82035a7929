//! A lit 3D mesh renderer.
//!
//! Draws a list of scene draw items (`scene::DrawItem3D`) with a single lit pipeline:
//! an ambient term, the key and fill directional lights, and a metalness/roughness
//! specular lobe (`shaders/lit_mesh.wgsl`).
//!
//! Frame protocol:
//! - `prepare(...)` packs every item's geometry into one vertex/index upload and every
//!   item's uniforms into one buffer addressed through dynamic offsets.
//! - `draw(...)` replays the prepared draws into a render pass that has a depth attachment.
//!
//! Meshes keep u16 indices; each draw uses `base_vertex`, so only individual meshes (not
//! the packed buffer) are limited to 65535 vertices.

use std::{borrow::Cow, mem};

use log::trace;

use crate::render::gpu::{DEPTH_FORMAT, Gpu};
use crate::scene::{Camera3D, DrawItem3D, Lighting};

fn round_up_to(v: u64, align: u64) -> u64 {
    debug_assert!(align.is_power_of_two());
    (v + (align - 1)) & !(align - 1)
}

/// GPU vertex format: position + normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LitVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl LitVertex {
    pub const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    #[inline]
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LitVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Per-item uniforms. Mirrors `Uniforms` in `lit_mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
struct LitUniforms {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
    params: [f32; 4],
    light0: [f32; 4],
    light1: [f32; 4],
    eye: [f32; 4],
}

impl LitUniforms {
    fn new(camera: &Camera3D, lighting: &Lighting, item: &DrawItem3D<'_>) -> Self {
        let model = item.world_from_local;
        let mvp = camera.clip_from_world() * model;
        let m = item.material;
        Self {
            mvp: mvp.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color: m.color.to_array(),
            params: [m.metalness, m.roughness, lighting.ambient, lighting.exposure],
            light0: lighting.key.direction.extend(lighting.key.intensity).to_array(),
            light1: lighting
                .fill
                .direction
                .extend(lighting.fill.intensity)
                .to_array(),
            eye: camera.position.extend(1.0).to_array(),
        }
    }
}

/// One prepared draw call.
#[derive(Debug, Copy, Clone)]
struct PreparedDraw {
    first_index: u32,
    index_count: u32,
    base_vertex: i32,
    uniform_offset: u32,
}

/// Lit mesh renderer with reusable, grow-on-demand GPU buffers.
pub struct MeshRenderer {
    pipeline: wgpu::RenderPipeline,

    uniform_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_capacity_bytes: u64,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity_bytes: u64,

    index_buffer: wgpu::Buffer,
    index_capacity_bytes: u64,

    draws: Vec<PreparedDraw>,
    // Reused staging vectors.
    vertices: Vec<LitVertex>,
    indices: Vec<u16>,
    uniform_bytes: Vec<u8>,
}

impl MeshRenderer {
    /// Create the lit pipeline, targeting `gpu.surface_format.add_srgb_suffix()` with
    /// a `DEPTH_FORMAT` depth attachment.
    pub fn new(gpu: &Gpu) -> anyhow::Result<Self> {
        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("MeshRenderer Lit Shader"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!(
                    "shaders/lit_mesh.wgsl"
                ))),
            });

        let uniform_size = mem::size_of::<LitUniforms>() as u64;
        let uniform_layout =
            gpu.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("MeshRenderer Uniform BGL"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: true,
                            min_binding_size: wgpu::BufferSize::new(uniform_size),
                        },
                        count: None,
                    }],
                });

        let align = gpu.device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = round_up_to(uniform_size, align.max(1).next_power_of_two());
        let uniform_capacity_bytes = uniform_stride * 64;
        let uniform_buffer = Self::make_uniform_buffer(gpu, uniform_capacity_bytes);
        let uniform_bind_group =
            Self::make_uniform_bind_group(gpu, &uniform_layout, &uniform_buffer);

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("MeshRenderer Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout],
                immediate_size: 0,
            });

        let pipeline = gpu
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("MeshRenderer Lit Pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[LitVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format.add_srgb_suffix(),
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    // Glyph caps and the globe are both viewed from inside at times.
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            });

        let initial_vb = 1024u64;
        let initial_ib = 1024u64;

        Ok(Self {
            pipeline,
            uniform_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_capacity_bytes,
            vertex_buffer: Self::make_buffer(
                gpu,
                "MeshRenderer Vertex Buffer",
                initial_vb,
                wgpu::BufferUsages::VERTEX,
            ),
            vertex_capacity_bytes: initial_vb,
            index_buffer: Self::make_buffer(
                gpu,
                "MeshRenderer Index Buffer",
                initial_ib,
                wgpu::BufferUsages::INDEX,
            ),
            index_capacity_bytes: initial_ib,
            draws: Vec::new(),
            vertices: Vec::new(),
            indices: Vec::new(),
            uniform_bytes: Vec::new(),
        })
    }

    fn make_buffer(gpu: &Gpu, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn make_uniform_buffer(gpu: &Gpu, size: u64) -> wgpu::Buffer {
        Self::make_buffer(
            gpu,
            "MeshRenderer Uniform Buffer",
            size,
            wgpu::BufferUsages::UNIFORM,
        )
    }

    fn make_uniform_bind_group(
        gpu: &Gpu,
        layout: &wgpu::BindGroupLayout,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("MeshRenderer Uniform BG"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(mem::size_of::<LitUniforms>() as u64),
                }),
            }],
        })
    }

    /// Ensure the internal buffers can hold the given byte sizes.
    fn ensure_capacity(&mut self, gpu: &Gpu, vb_bytes: u64, ib_bytes: u64, ub_bytes: u64) {
        if vb_bytes > self.vertex_capacity_bytes {
            let new_size = vb_bytes.next_power_of_two().max(1024);
            self.vertex_buffer = Self::make_buffer(
                gpu,
                "MeshRenderer Vertex Buffer (resized)",
                new_size,
                wgpu::BufferUsages::VERTEX,
            );
            self.vertex_capacity_bytes = new_size;
        }

        if ib_bytes > self.index_capacity_bytes {
            let new_size = ib_bytes.next_power_of_two().max(1024);
            self.index_buffer = Self::make_buffer(
                gpu,
                "MeshRenderer Index Buffer (resized)",
                new_size,
                wgpu::BufferUsages::INDEX,
            );
            self.index_capacity_bytes = new_size;
        }

        if ub_bytes > self.uniform_capacity_bytes {
            let new_size = ub_bytes.next_power_of_two();
            self.uniform_buffer = Self::make_uniform_buffer(gpu, new_size);
            self.uniform_bind_group =
                Self::make_uniform_bind_group(gpu, &self.uniform_layout, &self.uniform_buffer);
            self.uniform_capacity_bytes = new_size;
        }
    }

    /// Pack `items` and upload them for the next `draw`.
    ///
    /// Empty meshes are skipped. Item vertices are in local coordinates; each item's
    /// `world_from_local` is combined with the camera's `clip_from_world`.
    pub fn prepare(
        &mut self,
        gpu: &Gpu,
        camera: &Camera3D,
        lighting: &Lighting,
        items: &[DrawItem3D<'_>],
    ) {
        self.draws.clear();
        self.vertices.clear();
        self.indices.clear();
        self.uniform_bytes.clear();

        for item in items {
            let mesh = item.mesh;
            if mesh.is_empty() || mesh.indices.is_empty() {
                continue;
            }

            let uniform_offset = self.uniform_bytes.len() as u64;
            let uniforms = LitUniforms::new(camera, lighting, item);
            self.uniform_bytes
                .extend_from_slice(bytemuck::bytes_of(&uniforms));
            self.uniform_bytes
                .resize((uniform_offset + self.uniform_stride) as usize, 0);

            self.draws.push(PreparedDraw {
                first_index: self.indices.len() as u32,
                index_count: mesh.indices.len() as u32,
                base_vertex: self.vertices.len() as i32,
                uniform_offset: uniform_offset as u32,
            });

            self.vertices.extend(
                mesh.positions
                    .iter()
                    .zip(&mesh.normals)
                    .map(|(&position, &normal)| LitVertex { position, normal }),
            );
            self.indices.extend_from_slice(&mesh.indices);
        }

        if self.draws.is_empty() {
            return;
        }

        // `write_buffer` sizes must be multiples of COPY_BUFFER_ALIGNMENT; only the index
        // stream (2-byte elements) can be misaligned.
        if self.indices.len() % 2 == 1 {
            self.indices.push(0);
        }

        let vb_bytes = (self.vertices.len() * mem::size_of::<LitVertex>()) as u64;
        let ib_bytes = (self.indices.len() * mem::size_of::<u16>()) as u64;
        let ub_bytes = self.uniform_bytes.len() as u64;
        self.ensure_capacity(gpu, vb_bytes, ib_bytes, ub_bytes);

        gpu.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        gpu.queue
            .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&self.indices));
        gpu.queue
            .write_buffer(&self.uniform_buffer, 0, &self.uniform_bytes);

        trace!(
            "mesh_renderer: {} draws, {} vertices, {} indices",
            self.draws.len(),
            self.vertices.len(),
            self.indices.len()
        );
    }

    /// Number of draws recorded by the last `prepare`.
    #[inline]
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Replay the prepared draws. The pass must have a `DEPTH_FORMAT` depth attachment.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.draws.is_empty() {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);

        for d in &self.draws {
            pass.set_bind_group(0, &self.uniform_bind_group, &[d.uniform_offset]);
            pass.draw_indexed(
                d.first_index..d.first_index + d.index_count,
                d.base_vertex,
                0..1,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_up_to() {
        assert_eq!(round_up_to(0, 256), 0);
        assert_eq!(round_up_to(1, 256), 256);
        assert_eq!(round_up_to(256, 256), 256);
        assert_eq!(round_up_to(257, 4), 260);
    }

    #[test]
    fn test_uniform_layout_matches_wgsl() {
        // 2 x mat4x4 + 5 x vec4, no implicit padding.
        assert_eq!(mem::size_of::<LitUniforms>(), 2 * 64 + 5 * 16);
        assert_eq!(mem::size_of::<LitVertex>(), 24);
    }
}
