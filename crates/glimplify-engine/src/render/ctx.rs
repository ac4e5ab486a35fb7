use crate::coords::Viewport;

/// Renderer-facing context: device, queue and the current surface description.
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub features: wgpu::Features,
    /// Surface size in physical pixels.
    pub size: (u32, u32),
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        features: wgpu::Features,
        size: (u32, u32),
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            features,
            size,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::from_pixels(self.size.0, self.size.1)
    }
}

/// Target for drawing (encoder + color view).
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(encoder: &'a mut wgpu::CommandEncoder, color_view: &'a wgpu::TextureView) -> Self {
        Self { encoder, color_view }
    }
}
