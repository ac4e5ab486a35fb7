//! CPU-side shader reflection.
//!
//! WGSL is parsed and validated with naga before it reaches the device, so a
//! broken shader turns into a `ShaderError` with a readable log instead of a
//! device error. The parsed module is then walked for the two resource groups
//! programs use:
//!
//! - group 0, binding 0: one uniform struct, addressed by member name
//! - group 1: texture units, unit `n` = texture at binding `2n`, sampler at `2n + 1`

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::error::{ShaderError, ShaderErrorKind};

pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

/// Scalar/vector/matrix shape of a uniform member.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformKind {
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Other,
}

/// A named member of the uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub offset: u32,
    pub size: u32,
    pub kind: UniformKind,
}

/// Layout of the group 0 uniform struct.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UniformBlock {
    pub size: u32,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    pub fn member(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// A texture unit declared in group 1.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureUnit {
    pub unit: u32,
    pub name: String,
}

/// Everything a program needs to know about its shader's interface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShaderReflection {
    pub uniforms: Option<UniformBlock>,
    pub texture_units: Vec<TextureUnit>,
}

impl ShaderReflection {
    /// Unit number of the texture variable `name`.
    pub fn texture_unit(&self, name: &str) -> Option<u32> {
        self.texture_units
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.unit)
    }
}

/// Parses, validates and reflects `source`.
///
/// `vertex_entry` and `fragment_entry` must name entry points of the matching stage.
pub fn reflect_wgsl(
    label: &str,
    source: &str,
    vertex_entry: &str,
    fragment_entry: &str,
) -> Result<ShaderReflection, ShaderError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderError::new(ShaderErrorKind::Parse, label, e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| {
            ShaderError::new(ShaderErrorKind::Validation, label, e.emit_to_string(source))
        })?;

    require_entry_point(&module, label, vertex_entry, naga::ShaderStage::Vertex)?;
    require_entry_point(&module, label, fragment_entry, naga::ShaderStage::Fragment)?;

    let mut reflection = ShaderReflection::default();
    let mut images = Vec::new();
    let mut samplers = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else { continue };
        let name = var.name.clone().unwrap_or_default();
        let inner = &module.types[var.ty].inner;

        match (binding.group, var.space) {
            (UNIFORM_GROUP, naga::AddressSpace::Uniform) if binding.binding == UNIFORM_BINDING => {
                reflection.uniforms = Some(uniform_block(&module, label, &name, inner)?);
            }
            (TEXTURE_GROUP, naga::AddressSpace::Handle) => match inner {
                naga::TypeInner::Image { .. } if binding.binding % 2 == 0 => {
                    images.push((binding.binding / 2, name));
                }
                naga::TypeInner::Sampler { .. } if binding.binding % 2 == 1 => {
                    samplers.push(binding.binding / 2);
                }
                _ => {
                    return Err(ShaderError::new(
                        ShaderErrorKind::Layout,
                        label,
                        format!(
                            "'{name}' at @group(1) @binding({}) breaks the texture/sampler pairing \
                             (textures on even bindings, samplers on odd)",
                            binding.binding
                        ),
                    ));
                }
            },
            (group, _) => {
                return Err(ShaderError::new(
                    ShaderErrorKind::Layout,
                    label,
                    format!(
                        "'{name}' at @group({group}) @binding({}) is not a supported resource slot",
                        binding.binding
                    ),
                ));
            }
        }
    }

    images.sort_by_key(|(unit, _)| *unit);
    for (expected, (unit, name)) in images.into_iter().enumerate() {
        if unit != expected as u32 {
            return Err(ShaderError::new(
                ShaderErrorKind::Layout,
                label,
                format!("texture units must be contiguous from 0; found unit {unit} for '{name}'"),
            ));
        }
        if !samplers.contains(&unit) {
            return Err(ShaderError::new(
                ShaderErrorKind::Layout,
                label,
                format!("texture '{name}' (unit {unit}) has no sampler at binding {}", unit * 2 + 1),
            ));
        }
        reflection.texture_units.push(TextureUnit { unit, name });
    }

    Ok(reflection)
}

fn require_entry_point(
    module: &naga::Module,
    label: &str,
    name: &str,
    stage: naga::ShaderStage,
) -> Result<(), ShaderError> {
    if module
        .entry_points
        .iter()
        .any(|ep| ep.name == name && ep.stage == stage)
    {
        return Ok(());
    }
    Err(ShaderError::new(
        ShaderErrorKind::EntryPoint,
        label,
        format!("no {stage:?} entry point named '{name}'"),
    ))
}

fn uniform_block(
    module: &naga::Module,
    label: &str,
    var_name: &str,
    inner: &naga::TypeInner,
) -> Result<UniformBlock, ShaderError> {
    let naga::TypeInner::Struct { members, span } = inner else {
        return Err(ShaderError::new(
            ShaderErrorKind::Layout,
            label,
            format!("uniform '{var_name}' at @group(0) @binding(0) must be a struct"),
        ));
    };

    let members = members
        .iter()
        .map(|m| {
            let ty = &module.types[m.ty].inner;
            UniformMember {
                name: m.name.clone().unwrap_or_default(),
                offset: m.offset,
                size: ty.size(module.to_ctx()),
                kind: uniform_kind(ty),
            }
        })
        .collect();

    Ok(UniformBlock {
        size: *span,
        members,
    })
}

fn uniform_kind(ty: &naga::TypeInner) -> UniformKind {
    use naga::{ScalarKind, TypeInner, VectorSize};

    match ty {
        TypeInner::Scalar(s) => match s.kind {
            ScalarKind::Sint => UniformKind::Int,
            ScalarKind::Uint => UniformKind::UInt,
            ScalarKind::Float => UniformKind::Float,
            _ => UniformKind::Other,
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => match size {
            VectorSize::Bi => UniformKind::Vec2,
            VectorSize::Tri => UniformKind::Vec3,
            VectorSize::Quad => UniformKind::Vec4,
        },
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => UniformKind::Mat4,
        _ => UniformKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUBE: &str = r#"
struct Transforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    mix_factor: f32,
};

@group(0) @binding(0) var<uniform> transforms: Transforms;
@group(1) @binding(0) var texture1: texture_2d<f32>;
@group(1) @binding(1) var texture1_sampler: sampler;
@group(1) @binding(2) var texture2: texture_2d<f32>;
@group(1) @binding(3) var texture2_sampler: sampler;

struct VsOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) pos: vec3<f32>, @location(1) uv: vec2<f32>) -> VsOut {
    var out: VsOut;
    out.clip = transforms.projection * transforms.view * transforms.model * vec4<f32>(pos, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VsOut) -> @location(0) vec4<f32> {
    let a = textureSample(texture1, texture1_sampler, in.uv);
    let b = textureSample(texture2, texture2_sampler, in.uv);
    return mix(a, b, transforms.mix_factor);
}
"#;

    fn reflect(src: &str) -> Result<ShaderReflection, ShaderError> {
        reflect_wgsl("test", src, "vs_main", "fs_main")
    }

    #[test]
    fn uniform_members_have_std140_offsets() {
        let r = reflect(CUBE).unwrap();
        let block = r.uniforms.unwrap();
        assert_eq!(block.member("model").unwrap().offset, 0);
        assert_eq!(block.member("view").unwrap().offset, 64);
        let projection = block.member("projection").unwrap();
        assert_eq!(projection.offset, 128);
        assert_eq!(projection.size, 64);
        assert_eq!(projection.kind, UniformKind::Mat4);
        let mix = block.member("mix_factor").unwrap();
        assert_eq!(mix.offset, 192);
        assert_eq!(mix.kind, UniformKind::Float);
        assert_eq!(block.size, 208);
        assert!(block.member("missing").is_none());
    }

    #[test]
    fn texture_units_follow_binding_pairs() {
        let r = reflect(CUBE).unwrap();
        assert_eq!(r.texture_unit("texture1"), Some(0));
        assert_eq!(r.texture_unit("texture2"), Some(1));
        assert_eq!(r.texture_unit("texture1_sampler"), None);
    }

    #[test]
    fn parse_error_carries_log() {
        let err = reflect("fn vs_main( {").unwrap_err();
        assert_eq!(err.kind, ShaderErrorKind::Parse);
        assert!(!err.log.is_empty());
        assert!(err.to_string().contains("compile"));
    }

    #[test]
    fn type_error_is_validation_failure() {
        let src = r#"
@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }
@fragment fn fs_main() -> @location(0) vec4<f32> { let x: f32 = 1.0; return x; }
"#;
        let err = reflect(src).unwrap_err();
        assert!(matches!(err.kind, ShaderErrorKind::Parse | ShaderErrorKind::Validation));
    }

    #[test]
    fn missing_fragment_entry_point() {
        let src = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let err = reflect(src).unwrap_err();
        assert_eq!(err.kind, ShaderErrorKind::EntryPoint);
        assert!(err.log.contains("fs_main"));
    }

    #[test]
    fn sampler_without_texture_pairing_rejected() {
        let src = r#"
@group(1) @binding(0) var s: sampler;
@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }
@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
"#;
        let err = reflect(src).unwrap_err();
        assert_eq!(err.kind, ShaderErrorKind::Layout);
    }

    #[test]
    fn shader_without_resources_reflects_empty() {
        let src = r#"
@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }
@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }
"#;
        let r = reflect(src).unwrap();
        assert!(r.uniforms.is_none());
        assert!(r.texture_units.is_empty());
    }
}
