use std::collections::HashMap;

use glam::Mat4;

use super::context::RenderState;
use super::error::{ShaderError, ShaderErrorKind};
use super::reflect::{self, ShaderReflection, UniformBlock, UniformKind, UniformMember};
use super::texture::Texture;
use super::vertices::VertexLayout;

pub const DEFAULT_VERTEX_ENTRY: &str = "vs_main";
pub const DEFAULT_FRAGMENT_ENTRY: &str = "fs_main";

/// WGSL source of a program: one module holding both stages.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    pub label: &'a str,
    pub wgsl: &'a str,
    pub vertex_entry: &'a str,
    pub fragment_entry: &'a str,
}

impl<'a> ProgramSource<'a> {
    /// Source using the `vs_main` / `fs_main` entry points.
    pub fn new(label: &'a str, wgsl: &'a str) -> Self {
        Self {
            label,
            wgsl,
            vertex_entry: DEFAULT_VERTEX_ENTRY,
            fragment_entry: DEFAULT_FRAGMENT_ENTRY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PipelineKey {
    state: RenderState,
    vertex_layout: VertexLayout,
}

/// Shader program: shader module, its uniform block and texture bindings, and
/// the render pipeline built from it.
///
/// Uniforms are set by name into a CPU copy of the block and uploaded by
/// [`Program::prepare`]. Name lookups are cached, misses included, so an
/// unknown name costs one reflection scan and one warning.
///
/// The pipeline is created lazily and rebuilt when the render state or the
/// vertex layout changes.
pub struct Program {
    label: String,
    vertex_entry: String,
    fragment_entry: String,
    module: wgpu::ShaderModule,
    reflection: ShaderReflection,

    uniforms: UniformStaging,

    uniform_ubo: Option<wgpu::Buffer>,
    uniform_bgl: Option<wgpu::BindGroupLayout>,
    uniform_bind_group: Option<wgpu::BindGroup>,

    texture_bgl: Option<wgpu::BindGroupLayout>,
    texture_bind_group: Option<wgpu::BindGroup>,
    bound_textures: Vec<u64>,

    pipeline_key: Option<PipelineKey>,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl Program {
    /// Checks and compiles `source`.
    ///
    /// Parse/validation failures, missing entry points and resource layout
    /// violations are returned with the diagnostic log.
    pub fn compile(device: &wgpu::Device, source: ProgramSource<'_>) -> Result<Self, ShaderError> {
        let reflection = reflect::reflect_wgsl(
            source.label,
            source.wgsl,
            source.vertex_entry,
            source.fragment_entry,
        )?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.wgsl.into()),
        });

        let uniforms = UniformStaging::new(source.label, reflection.uniforms.clone());

        log::debug!(
            "compiled program '{}': {} uniform bytes, {} texture unit(s)",
            source.label,
            uniforms.len(),
            reflection.texture_units.len()
        );

        Ok(Self {
            label: source.label.to_string(),
            vertex_entry: source.vertex_entry.to_string(),
            fragment_entry: source.fragment_entry.to_string(),
            module,
            reflection,
            uniforms,
            uniform_ubo: None,
            uniform_bgl: None,
            uniform_bind_group: None,
            texture_bgl: None,
            texture_bind_group: None,
            bound_textures: Vec::new(),
            pipeline_key: None,
            pipeline: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn reflection(&self) -> &ShaderReflection {
        &self.reflection
    }

    /// Writes an `i32` uniform. Unknown names and type mismatches are logged and ignored.
    pub fn set_uniform_i32(&mut self, name: &str, value: i32) {
        self.uniforms.write(name, UniformKind::Int, bytemuck::bytes_of(&value));
    }

    pub fn set_uniform_f32(&mut self, name: &str, value: f32) {
        self.uniforms.write(name, UniformKind::Float, bytemuck::bytes_of(&value));
    }

    pub fn set_uniform_mat4(&mut self, name: &str, value: &Mat4) {
        self.uniforms.write(name, UniformKind::Mat4, bytemuck::bytes_of(value));
    }

    /// Unit number of the texture variable `name`.
    pub fn texture_unit(&self, name: &str) -> Option<u32> {
        self.reflection.texture_unit(name)
    }

    /// Builds whatever GPU state is missing or stale and uploads dirty uniforms.
    ///
    /// `textures` must cover every texture unit the shader declares; each
    /// texture is placed at its own unit.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        state: &RenderState,
        vertex_layout: &VertexLayout,
        textures: &mut [&mut Texture],
    ) -> Result<(), ShaderError> {
        self.ensure_layouts(device);
        self.ensure_pipeline(device, state, vertex_layout);
        self.ensure_uniforms(device);
        self.ensure_texture_bindings(device, textures)?;

        if let Some(ubo) = self.uniform_ubo.as_ref() {
            if let Some(bytes) = self.uniforms.take_dirty() {
                queue.write_buffer(ubo, 0, bytes);
            }
        }
        Ok(())
    }

    /// Sets the pipeline and bind groups on `pass`.
    ///
    /// Does nothing until [`Program::prepare`] has succeeded once.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(pipeline) = self.pipeline.as_ref() else { return };
        pass.set_pipeline(pipeline);

        if let Some(bg) = self.uniform_bind_group.as_ref() {
            pass.set_bind_group(reflect::UNIFORM_GROUP, bg, &[]);
        }
        if let Some(bg) = self.texture_bind_group.as_ref() {
            pass.set_bind_group(reflect::TEXTURE_GROUP, bg, &[]);
        }
    }

    fn ensure_layouts(&mut self, device: &wgpu::Device) {
        if self.uniform_bgl.is_none() && self.reflection.uniforms.is_some() {
            self.uniform_bgl = Some(device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("glimplify program uniform bgl"),
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: reflect::UNIFORM_BINDING,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(self.uniforms.len() as u64),
                        },
                        count: None,
                    }],
                },
            ));
        }

        if self.texture_bgl.is_none() && !self.reflection.texture_units.is_empty() {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = self
                .reflection
                .texture_units
                .iter()
                .flat_map(|t| {
                    [
                        wgpu::BindGroupLayoutEntry {
                            binding: t.unit * 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: t.unit * 2 + 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                    ]
                })
                .collect();

            self.texture_bgl = Some(device.create_bind_group_layout(
                &wgpu::BindGroupLayoutDescriptor {
                    label: Some("glimplify program texture bgl"),
                    entries: &entries,
                },
            ));
        }
    }

    fn ensure_pipeline(
        &mut self,
        device: &wgpu::Device,
        state: &RenderState,
        vertex_layout: &VertexLayout,
    ) {
        let key = PipelineKey {
            state: state.clone(),
            vertex_layout: vertex_layout.clone(),
        };
        if self.pipeline.is_some() && self.pipeline_key.as_ref() == Some(&key) {
            return;
        }

        // Group indices are fixed, so an empty layout fills a gap at group 0.
        let empty_bgl;
        let mut groups: Vec<&wgpu::BindGroupLayout> = Vec::new();
        match (self.uniform_bgl.as_ref(), self.texture_bgl.as_ref()) {
            (Some(u), Some(t)) => groups.extend([u, t]),
            (Some(u), None) => groups.push(u),
            (None, Some(t)) => {
                empty_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("glimplify program empty bgl"),
                    entries: &[],
                });
                groups.extend([&empty_bgl, t]);
            }
            (None, None) => {}
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("glimplify program pipeline layout"),
            bind_group_layouts: &groups,
            immediate_size: 0,
        });

        let attributes = vertex_layout.attributes();

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&self.label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some(&self.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[vertex_layout.buffer_layout(&attributes)],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some(&self.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: state.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: state.polygon_mode,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: state.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        log::debug!("program '{}': pipeline built for {:?}", self.label, state);

        self.pipeline = Some(pipeline);
        self.pipeline_key = Some(key);
    }

    fn ensure_uniforms(&mut self, device: &wgpu::Device) {
        if self.uniform_bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.uniform_bgl.as_ref() else { return };

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("glimplify program ubo"),
            size: self.uniforms.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.uniform_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glimplify program uniform bind group"),
            layout: bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: reflect::UNIFORM_BINDING,
                resource: ubo.as_entire_binding(),
            }],
        }));
        self.uniform_ubo = Some(ubo);
        self.uniforms.mark_dirty();
    }

    fn ensure_texture_bindings(
        &mut self,
        device: &wgpu::Device,
        textures: &mut [&mut Texture],
    ) -> Result<(), ShaderError> {
        let Some(bgl) = self.texture_bgl.as_ref() else { return Ok(()) };

        let mut ordered: Vec<Option<usize>> = vec![None; self.reflection.texture_units.len()];
        for (i, tex) in textures.iter().enumerate() {
            if let Some(slot) = ordered.get_mut(tex.unit() as usize) {
                *slot = Some(i);
            }
        }

        let mut ids = Vec::with_capacity(ordered.len());
        for (unit, slot) in ordered.iter().enumerate() {
            let Some(i) = *slot else {
                return Err(self.binding_error(format!("no texture supplied for unit {unit}")));
            };
            if !textures[i].is_loaded() {
                return Err(self.binding_error(format!("texture for unit {unit} has no pixel data")));
            }
            ids.push(textures[i].id());
        }

        if self.texture_bind_group.is_some() && ids == self.bound_textures {
            return Ok(());
        }

        // Samplers invalidated by a mode change are rebuilt here.
        for i in ordered.iter().flatten() {
            textures[*i].ensure_sampler(device);
        }

        let mut entries = Vec::with_capacity(ordered.len() * 2);
        for (unit, slot) in ordered.iter().enumerate() {
            let Some(i) = *slot else { continue };
            let tex: &Texture = &*textures[i];
            let (Some(view), Some(sampler)) = (tex.view(), tex.sampler()) else {
                return Err(self.binding_error(format!("texture for unit {unit} is incomplete")));
            };
            entries.push(wgpu::BindGroupEntry {
                binding: unit as u32 * 2,
                resource: wgpu::BindingResource::TextureView(view),
            });
            entries.push(wgpu::BindGroupEntry {
                binding: unit as u32 * 2 + 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            });
        }

        self.texture_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glimplify program texture bind group"),
            layout: bgl,
            entries: &entries,
        }));
        self.bound_textures = ids;
        Ok(())
    }

    fn binding_error(&self, log: String) -> ShaderError {
        ShaderError::new(ShaderErrorKind::Binding, &self.label, log)
    }
}

/// CPU copy of a uniform block, written member by member.
///
/// Name lookups are cached, misses included, so an unknown name is reported once.
struct UniformStaging {
    label: String,
    block: Option<UniformBlock>,
    locations: HashMap<String, Option<UniformMember>>,
    bytes: Vec<u8>,
    dirty: bool,
}

impl UniformStaging {
    fn new(label: &str, block: Option<UniformBlock>) -> Self {
        let bytes = vec![0; block.as_ref().map_or(0, |b| b.size as usize)];
        Self {
            label: label.to_string(),
            block,
            locations: HashMap::new(),
            dirty: !bytes.is_empty(),
            bytes,
        }
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    fn location(&mut self, name: &str) -> Option<UniformMember> {
        if let Some(cached) = self.locations.get(name) {
            return cached.clone();
        }

        let found = self.block.as_ref().and_then(|b| b.member(name)).cloned();
        if found.is_none() {
            log::warn!("program '{}': no uniform named '{name}'", self.label);
        }
        self.locations.insert(name.to_string(), found.clone());
        found
    }

    fn write(&mut self, name: &str, kind: UniformKind, value: &[u8]) -> bool {
        let Some(member) = self.location(name) else { return false };

        if member.kind != kind || member.size as usize != value.len() {
            log::warn!(
                "program '{}': uniform '{name}' is {:?}, not {kind:?}",
                self.label,
                member.kind
            );
            return false;
        }

        let start = member.offset as usize;
        let Some(slot) = self.bytes.get_mut(start..start + value.len()) else { return false };
        slot.copy_from_slice(value);
        self.dirty = true;
        true
    }

    fn mark_dirty(&mut self) {
        self.dirty = !self.bytes.is_empty();
    }

    /// Block contents if anything changed since the last call.
    fn take_dirty(&mut self) -> Option<&[u8]> {
        if !std::mem::take(&mut self.dirty) {
            return None;
        }
        Some(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block() -> UniformBlock {
        let member = |name: &str, offset, size, kind| UniformMember {
            name: name.to_string(),
            offset,
            size,
            kind,
        };
        UniformBlock {
            size: 80,
            members: vec![
                member("model", 0, 64, UniformKind::Mat4),
                member("texture_index", 64, 4, UniformKind::Int),
                member("mix_factor", 68, 4, UniformKind::Float),
            ],
        }
    }

    #[test]
    fn writes_land_at_member_offsets() {
        let mut u = UniformStaging::new("test", Some(block()));
        assert!(u.write("mix_factor", UniformKind::Float, bytemuck::bytes_of(&0.2f32)));
        assert!(u.write("model", UniformKind::Mat4, bytemuck::bytes_of(&Mat4::IDENTITY)));

        let bytes = u.take_dirty().unwrap();
        assert_eq!(&bytes[68..72], &0.2f32.to_ne_bytes());
        assert_eq!(&bytes[0..4], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &0.0f32.to_ne_bytes());
    }

    #[test]
    fn unknown_name_is_cached_as_miss() {
        let mut u = UniformStaging::new("test", Some(block()));
        assert!(!u.write("missing", UniformKind::Int, bytemuck::bytes_of(&1i32)));
        assert_eq!(u.locations.get("missing"), Some(&None));
        assert!(!u.write("missing", UniformKind::Int, bytemuck::bytes_of(&1i32)));
        assert_eq!(u.locations.len(), 1);
    }

    #[test]
    fn hit_is_cached() {
        let mut u = UniformStaging::new("test", Some(block()));
        u.write("texture_index", UniformKind::Int, bytemuck::bytes_of(&1i32));
        assert_eq!(u.locations.get("texture_index").cloned().flatten().map(|m| m.offset), Some(64));
    }

    #[test]
    fn kind_mismatch_leaves_bytes_untouched() {
        let mut u = UniformStaging::new("test", Some(block()));
        let _ = u.take_dirty();
        assert!(!u.write("mix_factor", UniformKind::Int, bytemuck::bytes_of(&7i32)));
        assert!(u.take_dirty().is_none());
    }

    #[test]
    fn dirty_is_reported_once() {
        let mut u = UniformStaging::new("test", Some(block()));
        assert!(u.take_dirty().is_some());
        assert!(u.take_dirty().is_none());
        u.write("texture_index", UniformKind::Int, bytemuck::bytes_of(&0i32));
        assert!(u.take_dirty().is_some());
    }

    #[test]
    fn program_without_uniforms_never_dirty() {
        let mut u = UniformStaging::new("test", None);
        assert_eq!(u.len(), 0);
        assert!(u.take_dirty().is_none());
        assert!(!u.write("model", UniformKind::Mat4, bytemuck::bytes_of(&Mat4::IDENTITY)));
    }

    #[test]
    fn default_entry_points() {
        let src = ProgramSource::new("cube", "");
        assert_eq!(src.vertex_entry, "vs_main");
        assert_eq!(src.fragment_entry, "fs_main");
    }
}
