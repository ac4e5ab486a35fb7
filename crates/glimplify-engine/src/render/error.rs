use std::fmt;
use std::path::PathBuf;

/// Stage of shader processing that failed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderErrorKind {
    /// WGSL did not parse.
    Parse,
    /// Parsed, but failed validation (types, bindings, control flow).
    Validation,
    /// A required entry point is missing or has the wrong stage.
    EntryPoint,
    /// Resource declarations do not follow the binding conventions.
    Layout,
    /// The resources supplied at draw time do not satisfy the shader.
    Binding,
}

/// Shader compile/link failure carrying the diagnostic log.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderError {
    pub kind: ShaderErrorKind,
    /// Program label the error belongs to.
    pub label: String,
    /// Human-readable diagnostic text, possibly multi-line.
    pub log: String,
}

impl ShaderError {
    pub(crate) fn new(kind: ShaderErrorKind, label: &str, log: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.to_string(),
            log: log.into(),
        }
    }
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.kind {
            ShaderErrorKind::Parse => "compile",
            ShaderErrorKind::Validation => "validation",
            ShaderErrorKind::EntryPoint => "link",
            ShaderErrorKind::Layout => "layout",
            ShaderErrorKind::Binding => "binding",
        };
        write!(f, "shader {stage} failed for '{}': {}", self.label, self.log)
    }
}

impl std::error::Error for ShaderError {}

/// Texture loading failure.
#[derive(Debug)]
pub enum TextureError {
    /// The file could not be opened or decoded.
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    /// The image has a zero dimension.
    Empty { width: u32, height: u32 },
    /// Raw pixel data length does not match `width * height * 4`.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode { path, source } => {
                write!(f, "failed to load image '{}': {source}", path.display())
            }
            Self::Empty { width, height } => write!(f, "image has zero size ({width}x{height})"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "pixel data is {actual} bytes, expected {expected}")
            }
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Vertex attribute description rejected by the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VertexFormatError {
    /// No API vertex format exists for this scalar type and component count.
    Unsupported { ty: &'static str, components: u32 },
    /// `location` is not below the attribute count the layout was created with.
    LocationOutOfRange { location: u32, attributes: u32 },
    /// The attribute would extend past the vertex stride.
    ExceedsStride { location: u32, end: u64, stride: u64 },
}

impl fmt::Display for VertexFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { ty, components } => {
                write!(f, "unsupported vertex attribute {ty}x{components}")
            }
            Self::LocationOutOfRange { location, attributes } => {
                write!(f, "attribute location {location} out of range (layout has {attributes})")
            }
            Self::ExceedsStride { location, end, stride } => write!(
                f,
                "attribute {location} ends at byte {end}, past the {stride}-byte stride"
            ),
        }
    }
}

impl std::error::Error for VertexFormatError {}
