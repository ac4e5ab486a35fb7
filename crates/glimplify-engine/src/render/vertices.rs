use std::ops::Range;

use bytemuck::Pod;
use wgpu::util::DeviceExt;

use super::error::VertexFormatError;

/// Scalar type of a vertex attribute component.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AttribType {
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Float,
}

impl AttribType {
    /// Size of one component in bytes.
    pub const fn size_of(self) -> u32 {
        match self {
            Self::Byte | Self::UByte => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::UByte => "ubyte",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Float => "float",
        }
    }

    /// API vertex format for `components` values of this type.
    ///
    /// 8- and 16-bit types only come in pairs and quads.
    pub fn vertex_format(self, components: u32) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;

        let format = match (self, components) {
            (Self::Byte, 2) => F::Sint8x2,
            (Self::Byte, 4) => F::Sint8x4,
            (Self::UByte, 2) => F::Uint8x2,
            (Self::UByte, 4) => F::Uint8x4,
            (Self::Short, 2) => F::Sint16x2,
            (Self::Short, 4) => F::Sint16x4,
            (Self::UShort, 2) => F::Uint16x2,
            (Self::UShort, 4) => F::Uint16x4,
            (Self::Int, 1) => F::Sint32,
            (Self::Int, 2) => F::Sint32x2,
            (Self::Int, 3) => F::Sint32x3,
            (Self::Int, 4) => F::Sint32x4,
            (Self::UInt, 1) => F::Uint32,
            (Self::UInt, 2) => F::Uint32x2,
            (Self::UInt, 3) => F::Uint32x3,
            (Self::UInt, 4) => F::Uint32x4,
            (Self::Float, 1) => F::Float32,
            (Self::Float, 2) => F::Float32x2,
            (Self::Float, 3) => F::Float32x3,
            (Self::Float, 4) => F::Float32x4,
            _ => return None,
        };
        Some(format)
    }
}

/// Interleaved vertex layout: a fixed stride and one slot per shader location.
///
/// An attribute's byte offset is the sum of the sizes of all lower locations,
/// so attributes must be described in the order they are packed.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    stride: u64,
    sizes: Vec<u32>,
    attributes: Vec<Option<wgpu::VertexAttribute>>,
}

impl VertexLayout {
    pub fn new(attributes: u32, stride: u64) -> Self {
        Self {
            stride,
            sizes: vec![0; attributes as usize],
            attributes: vec![None; attributes as usize],
        }
    }

    /// Describes attribute `location` as `components` values of `ty`.
    pub fn format(
        &mut self,
        location: u32,
        ty: AttribType,
        components: u32,
    ) -> Result<(), VertexFormatError> {
        let index = location as usize;
        if index >= self.sizes.len() {
            return Err(VertexFormatError::LocationOutOfRange {
                location,
                attributes: self.sizes.len() as u32,
            });
        }

        let format = ty.vertex_format(components).ok_or(VertexFormatError::Unsupported {
            ty: ty.name(),
            components,
        })?;

        let size = ty.size_of() * components;
        let offset: u64 = self.sizes[..index].iter().map(|&s| s as u64).sum();
        let end = offset + size as u64;
        if end > self.stride {
            return Err(VertexFormatError::ExceedsStride {
                location,
                end,
                stride: self.stride,
            });
        }

        self.sizes[index] = size;
        self.attributes[index] = Some(wgpu::VertexAttribute {
            format,
            offset,
            shader_location: location,
        });
        Ok(())
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// Described attributes in location order.
    pub fn attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes.iter().flatten().copied().collect()
    }

    /// Borrowing view for pipeline creation; `attributes` must come from
    /// [`VertexLayout::attributes`].
    pub fn buffer_layout<'a>(
        &self,
        attributes: &'a [wgpu::VertexAttribute],
    ) -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        }
    }
}

/// Vertex buffer plus optional index buffer sharing one layout.
///
/// Buffers are released when the value is dropped.
pub struct Vertices {
    layout: VertexLayout,

    vbo: Option<wgpu::Buffer>,
    vertex_count: u32,

    ibo: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Vertices {
    /// Creates an empty vertex array with `attributes` locations and a fixed `stride` in bytes.
    pub fn new(attributes: u32, stride: u64) -> Self {
        Self {
            layout: VertexLayout::new(attributes, stride),
            vbo: None,
            vertex_count: 0,
            ibo: None,
            index_count: 0,
        }
    }

    /// Uploads vertex data, replacing any previous buffer.
    pub fn allocate_vertices<T: Pod>(&mut self, device: &wgpu::Device, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.vertex_count = vertex_count_for(bytes.len() as u64, self.layout.stride);
        self.vbo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glimplify vertices vbo"),
            contents: bytes,
            usage: wgpu::BufferUsages::VERTEX,
        }));
        log::debug!("vertex buffer: {} bytes, {} vertices", bytes.len(), self.vertex_count);
    }

    /// Uploads 32-bit indices, replacing any previous index buffer.
    pub fn allocate_index(&mut self, device: &wgpu::Device, indices: &[u32]) {
        self.index_count = indices.len() as u32;
        self.ibo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glimplify vertices ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    /// See [`VertexLayout::format`].
    pub fn format_vertices(
        &mut self,
        location: u32,
        ty: AttribType,
        components: u32,
    ) -> Result<(), VertexFormatError> {
        self.layout.format(location, ty, components)
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Binds the vertex buffer (slot 0) and the index buffer if present.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        if let Some(vbo) = self.vbo.as_ref() {
            pass.set_vertex_buffer(0, vbo.slice(..));
        }
        if let Some(ibo) = self.ibo.as_ref() {
            pass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);
        }
    }

    /// Non-indexed draw of `first..first + count`, clipped to the uploaded vertices.
    pub fn draw_arrays(&self, pass: &mut wgpu::RenderPass<'_>, first: u32, count: u32) {
        if self.vbo.is_none() {
            return;
        }
        if let Some(range) = array_range(first, count, self.vertex_count) {
            pass.draw(range, 0..1);
        }
    }

    /// Indexed draw of the first `count` indices.
    pub fn draw_elements(&self, pass: &mut wgpu::RenderPass<'_>, count: u32) {
        let count = element_count(count, self.index_count);
        if self.vbo.is_none() || self.ibo.is_none() || count == 0 {
            return;
        }
        pass.draw_indexed(0..count, 0, 0..1);
    }
}

/// Whole vertices contained in `bytes` at `stride`; a partial trailing vertex is dropped.
fn vertex_count_for(bytes: u64, stride: u64) -> u32 {
    (bytes / stride.max(1)) as u32
}

/// `first..first + count` clipped to `vertex_count`, or `None` when nothing is left.
fn array_range(first: u32, count: u32, vertex_count: u32) -> Option<Range<u32>> {
    let end = first.saturating_add(count).min(vertex_count);
    (first < end).then_some(first..end)
}

fn element_count(count: u32, index_count: u32) -> u32 {
    count.min(index_count)
}
