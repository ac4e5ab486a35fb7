//! GPU resource wrappers and pass setup.
//!
//! Each wrapper owns its wgpu objects and releases them on drop:
//! - `Program`: WGSL module, named uniforms, texture units, pipeline
//! - `Vertices`: vertex/index buffers with an interleaved layout
//! - `Texture`: 2D image bound to a texture unit
//! - `RenderContext`: clear color, depth buffer, wireframe fill
//!
//! Shader resource convention: the uniform struct lives at `@group(0)
//! @binding(0)`; texture unit `n` is `@group(1) @binding(2n)` with its sampler
//! at `@binding(2n + 1)`.

mod context;
mod ctx;
mod error;
mod program;
mod reflect;
mod texture;
mod vertices;

pub use context::{RenderContext, RenderState, DEPTH_FORMAT};
pub use ctx::{RenderCtx, RenderTarget};
pub use error::{ShaderError, ShaderErrorKind, TextureError, VertexFormatError};
pub use program::{Program, ProgramSource, DEFAULT_FRAGMENT_ENTRY, DEFAULT_VERTEX_ENTRY};
pub use reflect::{
    reflect_wgsl, ShaderReflection, TextureUnit, UniformBlock, UniformKind, UniformMember,
};
pub use texture::{ImageData, Texture};
pub use vertices::{AttribType, VertexLayout, Vertices};
