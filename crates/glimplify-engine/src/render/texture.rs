use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use image::{imageops, DynamicImage, RgbaImage};

use super::error::TextureError;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

/// Decoded RGBA8 pixels ready for upload.
///
/// The API has no 3-channel texture formats, so RGB sources are expanded to
/// RGBA with opaque alpha. `channels` keeps the source channel count.
#[derive(Debug, Clone)]
pub struct ImageData {
    pixels: RgbaImage,
    channels: u8,
}

impl ImageData {
    /// Decodes the file at `path`, optionally flipping it vertically.
    ///
    /// Flipping moves the first stored row to the bottom, which makes `uv.y = 0`
    /// address the bottom of images authored top-down.
    pub fn open(path: impl AsRef<Path>, flip_vertical: bool) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| TextureError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_dynamic(img, flip_vertical)
    }

    pub fn from_dynamic(img: DynamicImage, flip_vertical: bool) -> Result<Self, TextureError> {
        if img.width() == 0 || img.height() == 0 {
            return Err(TextureError::Empty {
                width: img.width(),
                height: img.height(),
            });
        }

        let channels = img.color().channel_count();
        let img = if flip_vertical { img.flipv() } else { img };

        Ok(Self {
            pixels: img.to_rgba8(),
            channels,
        })
    }

    /// Wraps raw RGBA8 bytes (row-major, top row first).
    pub fn from_rgba8(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize * 4;
        let actual = bytes.len();
        let pixels = RgbaImage::from_raw(width, height, bytes)
            .ok_or(TextureError::SizeMismatch { expected, actual })?;
        Ok(Self {
            pixels,
            channels: 4,
        })
    }

    /// Square two-color checkerboard, used as a stand-in when an image is missing.
    pub fn checkerboard(size: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let size = size.max(1);
        let cell = cell.max(1);
        let pixels = RgbaImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                image::Rgba(a)
            } else {
                image::Rgba(b)
            }
        });
        Self {
            pixels,
            channels: 4,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Channel count of the source image (3 for RGB, 4 for RGBA, ...).
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn rgba(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Number of levels in a full mip chain down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width().max(self.height()).leading_zeros()
    }

    /// Full mip chain, level 0 first. Each level halves both sides (min 1).
    pub fn mip_chain(&self) -> Vec<RgbaImage> {
        let mut levels = vec![self.pixels.clone()];
        for _ in 1..self.mip_level_count() {
            let Some(prev) = levels.last() else { break };
            let w = (prev.width() / 2).max(1);
            let h = (prev.height() / 2).max(1);
            let next = imageops::resize(prev, w, h, imageops::FilterType::Triangle);
            levels.push(next);
        }
        levels
    }
}

/// 2D texture bound to a fixed texture unit.
///
/// Wrap and filter modes can be set before or after loading; the sampler is
/// rebuilt the next time the texture is bound after a change.
/// GPU objects are released on drop.
pub struct Texture {
    unit: u32,
    id: u64,

    wrap: (wgpu::AddressMode, wgpu::AddressMode),
    filter: (wgpu::FilterMode, wgpu::FilterMode),

    texture: Option<wgpu::Texture>,
    view: Option<wgpu::TextureView>,
    sampler: Option<wgpu::Sampler>,
    mip_levels: u32,

    width: u32,
    height: u32,
    channels: u8,
}

impl Texture {
    pub fn new(unit: u32) -> Self {
        Self {
            unit,
            id: 0,
            wrap: (wgpu::AddressMode::Repeat, wgpu::AddressMode::Repeat),
            filter: (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear),
            texture: None,
            view: None,
            sampler: None,
            mip_levels: 0,
            width: 0,
            height: 0,
            channels: 0,
        }
    }

    pub fn unit(&self) -> u32 {
        self.unit
    }

    /// Changes whenever new pixel data is uploaded or the sampler changes; 0 until loaded.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_loaded(&self) -> bool {
        self.view.is_some()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Addressing outside `[0, 1]` along s (u) and t (v).
    pub fn wrap_mode(&mut self, s: wgpu::AddressMode, t: wgpu::AddressMode) {
        if self.wrap != (s, t) {
            self.wrap = (s, t);
            self.invalidate_sampler();
        }
    }

    /// Minification and magnification filters.
    pub fn filter_mode(&mut self, min: wgpu::FilterMode, mag: wgpu::FilterMode) {
        if self.filter != (min, mag) {
            self.filter = (min, mag);
            self.invalidate_sampler();
        }
    }

    /// Decodes `path` and uploads it, optionally with a generated mip chain.
    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: impl AsRef<Path>,
        flip_vertical: bool,
        generate_mipmap: bool,
    ) -> Result<(), TextureError> {
        let path = path.as_ref();
        let image = ImageData::open(path, flip_vertical)?;
        log::debug!(
            "loaded '{}': {}x{} {} channel(s)",
            path.display(),
            image.width(),
            image.height(),
            image.channels()
        );
        self.upload(device, queue, &image, generate_mipmap);
        Ok(())
    }

    /// Uploads already decoded pixels, replacing any previous texture.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &ImageData,
        generate_mipmap: bool,
    ) {
        let levels = if generate_mipmap {
            image.mip_chain()
        } else {
            vec![image.pixels.clone()]
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glimplify texture"),
            size: wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, pixels) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * pixels.width()),
                    rows_per_image: Some(pixels.height()),
                },
                wgpu::Extent3d {
                    width: pixels.width(),
                    height: pixels.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        self.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
        self.texture = Some(texture);
        if self.mip_levels != levels.len() as u32 {
            // Mip filtering depends on the level count.
            self.sampler = None;
            self.mip_levels = levels.len() as u32;
        }
        self.width = image.width();
        self.height = image.height();
        self.channels = image.channels();
        self.ensure_sampler(device);
        self.id = NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed);
    }

    /// Levels in the uploaded texture; 0 until loaded.
    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub(crate) fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    pub(crate) fn sampler(&self) -> Option<&wgpu::Sampler> {
        self.sampler.as_ref()
    }

    fn invalidate_sampler(&mut self) {
        self.sampler = None;
        if self.is_loaded() {
            self.id = NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Rebuilds the sampler if a wrap or filter change dropped it.
    pub(crate) fn ensure_sampler(&mut self, device: &wgpu::Device) {
        if self.sampler.is_some() {
            return;
        }
        let (address_mode_u, address_mode_v) = self.wrap;
        let (min_filter, mag_filter) = self.filter;

        self.sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("glimplify sampler"),
            address_mode_u,
            address_mode_v,
            mag_filter,
            min_filter,
            mipmap_filter: mipmap_filter(min_filter, self.mip_levels),
            ..Default::default()
        }));
    }
}

/// Blend between mip levels the same way texels are blended on minification.
/// A single-level texture has nothing to blend.
fn mipmap_filter(min: wgpu::FilterMode, mip_levels: u32) -> wgpu::MipmapFilterMode {
    match min {
        wgpu::FilterMode::Linear if mip_levels > 1 => wgpu::MipmapFilterMode::Linear,
        _ => wgpu::MipmapFilterMode::Nearest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(width: u32, height: u32) -> DynamicImage {
        let mut img = image::RgbImage::new(width, height);
        // Top row red, everything else blue.
        for (_, y, px) in img.enumerate_pixels_mut() {
            *px = if y == 0 { image::Rgb([255, 0, 0]) } else { image::Rgb([0, 0, 255]) };
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn rgb_expands_to_opaque_rgba() {
        let data = ImageData::from_dynamic(rgb(2, 2), false).unwrap();
        assert_eq!(data.channels(), 3);
        assert_eq!(data.rgba().len(), 2 * 2 * 4);
        assert_eq!(&data.rgba()[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn flip_moves_top_row_to_bottom() {
        let data = ImageData::from_dynamic(rgb(1, 3), true).unwrap();
        let rows: Vec<&[u8]> = data.rgba().chunks(4).collect();
        assert_eq!(rows[0], &[0, 0, 255, 255]);
        assert_eq!(rows[2], &[255, 0, 0, 255]);
    }

    #[test]
    fn empty_image_rejected() {
        let err = ImageData::from_dynamic(DynamicImage::new_rgba8(0, 4), false).unwrap_err();
        assert!(matches!(err, TextureError::Empty { width: 0, height: 4 }));
    }

    #[test]
    fn raw_length_checked() {
        let err = ImageData::from_rgba8(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TextureError::SizeMismatch { expected: 16, actual: 15 }));
        assert!(ImageData::from_rgba8(2, 2, vec![0; 16]).is_ok());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ImageData::open("definitely/not/here.png", true).unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.png"));
    }

    #[test]
    fn mip_chain_halves_to_one_pixel() {
        let data = ImageData::checkerboard(8, 2, [255; 4], [0, 0, 0, 255]);
        assert_eq!(data.mip_level_count(), 4);
        let sizes: Vec<_> = data.mip_chain().iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 8), (4, 4), (2, 2), (1, 1)]);
    }

    #[test]
    fn mip_chain_of_non_square_clamps_short_side() {
        let data = ImageData::from_rgba8(4, 1, vec![7; 16]).unwrap();
        let sizes: Vec<_> = data.mip_chain().iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let data = ImageData::checkerboard(4, 2, [1, 1, 1, 1], [2, 2, 2, 2]);
        let px = |x: usize, y: usize| data.rgba()[(y * 4 + x) * 4];
        assert_eq!(px(0, 0), 1);
        assert_eq!(px(2, 0), 2);
        assert_eq!(px(0, 2), 2);
        assert_eq!(px(3, 3), 1);
    }

    #[test]
    fn new_texture_defaults() {
        let tex = Texture::new(1);
        assert_eq!(tex.unit(), 1);
        assert_eq!(tex.id(), 0);
        assert!(!tex.is_loaded());
    }

    #[test]
    fn mip_blending_follows_min_filter() {
        use wgpu::{FilterMode, MipmapFilterMode};
        assert_eq!(mipmap_filter(FilterMode::Linear, 9), MipmapFilterMode::Linear);
        assert_eq!(mipmap_filter(FilterMode::Nearest, 9), MipmapFilterMode::Nearest);
        assert_eq!(mipmap_filter(FilterMode::Linear, 1), MipmapFilterMode::Nearest);
        assert_eq!(mipmap_filter(FilterMode::Linear, 0), MipmapFilterMode::Nearest);
    }

    #[test]
    fn unloaded_texture_has_no_mips() {
        let mut tex = Texture::new(0);
        tex.filter_mode(wgpu::FilterMode::Nearest, wgpu::FilterMode::Linear);
        assert_eq!(tex.mip_levels(), 0);
        // No upload yet, so a mode change must not mint an id.
        assert_eq!(tex.id(), 0);
    }
}
