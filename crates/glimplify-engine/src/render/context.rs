use super::ctx::{RenderCtx, RenderTarget};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Fixed-function state a pipeline is built against.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub polygon_mode: wgpu::PolygonMode,
}

struct DepthTarget {
    size: (u32, u32),
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Per-frame pass setup: clear color, depth testing and wireframe fill.
///
/// The depth buffer is created lazily and recreated when the target size
/// changes. Wireframe needs `Features::POLYGON_MODE_LINE`; without it the
/// request is refused and fill stays solid.
pub struct RenderContext {
    clear_color: wgpu::Color,
    depth_testing: bool,
    wireframe: bool,
    depth: Option<DepthTarget>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    pub fn new() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            depth_testing: false,
            wireframe: false,
            depth: None,
        }
    }

    /// Requests line or solid fill. Returns whether wireframe is now active.
    pub fn wireframe_mode(&mut self, enabled: bool, features: wgpu::Features) -> bool {
        if enabled && !features.contains(wgpu::Features::POLYGON_MODE_LINE) {
            log::warn!("wireframe requested but POLYGON_MODE_LINE is not enabled on the device");
            self.wireframe = false;
            return false;
        }
        self.wireframe = enabled;
        enabled
    }

    /// Enables the depth buffer, its clear and the depth test.
    pub fn testing_depth(&mut self, enabled: bool) {
        self.depth_testing = enabled;
        if !enabled {
            self.depth = None;
        }
    }

    pub fn clear(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = wgpu::Color { r, g, b, a };
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    pub fn is_testing_depth(&self) -> bool {
        self.depth_testing
    }

    pub fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    /// Pipeline state matching the passes this context begins.
    pub fn state(&self, color_format: wgpu::TextureFormat) -> RenderState {
        RenderState {
            color_format,
            depth_format: self.depth_testing.then_some(DEPTH_FORMAT),
            polygon_mode: if self.wireframe {
                wgpu::PolygonMode::Line
            } else {
                wgpu::PolygonMode::Fill
            },
        }
    }

    /// Begins a pass on `target` that clears color, and depth when testing.
    pub fn begin_pass<'e>(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &'e mut RenderTarget<'_>,
    ) -> wgpu::RenderPass<'e> {
        let clear_color = self.clear_color;
        let depth_view = if self.depth_testing {
            Some(self.ensure_depth(ctx.device, ctx.size))
        } else {
            None
        };

        target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glimplify pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: depth_view.map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn ensure_depth(&mut self, device: &wgpu::Device, size: (u32, u32)) -> &wgpu::TextureView {
        let size = depth_extent(size);
        let depth = match self.depth.take() {
            Some(depth) if depth.size == size => depth,
            _ => DepthTarget::new(device, size),
        };
        &self.depth.insert(depth).view
    }

    /// Extent of the allocated depth buffer, if any.
    pub fn depth_size(&self) -> Option<(u32, u32)> {
        self.depth.as_ref().map(|d| d.size)
    }
}

/// Depth attachment extent for a surface of `size`; never zero.
fn depth_extent(size: (u32, u32)) -> (u32, u32) {
    (size.0.max(1), size.1.max(1))
}

impl DepthTarget {
    fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glimplify depth"),
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
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!("depth buffer {}x{}", size.0, size.1);
        Self {
            size,
            _texture: texture,
            view,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    #[test]
    fn default_state_is_solid_without_depth() {
        let ctx = RenderContext::new();
        let state = ctx.state(FORMAT);
        assert_eq!(state.color_format, FORMAT);
        assert_eq!(state.depth_format, None);
        assert_eq!(state.polygon_mode, wgpu::PolygonMode::Fill);
    }

    #[test]
    fn depth_testing_adds_depth_format() {
        let mut ctx = RenderContext::new();
        ctx.testing_depth(true);
        assert_eq!(ctx.state(FORMAT).depth_format, Some(DEPTH_FORMAT));
        ctx.testing_depth(false);
        assert_eq!(ctx.state(FORMAT).depth_format, None);
    }

    #[test]
    fn wireframe_refused_without_feature() {
        let mut ctx = RenderContext::new();
        assert!(!ctx.wireframe_mode(true, wgpu::Features::empty()));
        assert_eq!(ctx.state(FORMAT).polygon_mode, wgpu::PolygonMode::Fill);

        assert!(ctx.wireframe_mode(true, wgpu::Features::POLYGON_MODE_LINE));
        assert_eq!(ctx.state(FORMAT).polygon_mode, wgpu::PolygonMode::Line);

        assert!(!ctx.wireframe_mode(false, wgpu::Features::POLYGON_MODE_LINE));
        assert!(!ctx.is_wireframe());
    }

    #[test]
    fn clear_stores_color() {
        let mut ctx = RenderContext::new();
        ctx.clear(0.2, 0.3, 0.3, 1.0);
        assert_eq!(
            ctx.clear_color(),
            wgpu::Color { r: 0.2, g: 0.3, b: 0.3, a: 1.0 }
        );
    }

    #[test]
    fn depth_extent_never_zero() {
        assert_eq!(depth_extent((0, 0)), (1, 1));
        assert_eq!(depth_extent((800, 0)), (800, 1));
        assert_eq!(depth_extent((800, 600)), (800, 600));
    }

    #[test]
    fn depth_target_absent_until_first_pass() {
        let mut ctx = RenderContext::new();
        ctx.testing_depth(true);
        assert_eq!(ctx.depth_size(), None);
        ctx.testing_depth(false);
        assert_eq!(ctx.depth_size(), None);
    }

    #[test]
    fn pipeline_state_changes_with_mode() {
        let mut ctx = RenderContext::new();
        let before = ctx.state(FORMAT);
        ctx.testing_depth(true);
        assert_ne!(before, ctx.state(FORMAT));
    }
}
