/// Viewport size in physical pixels.
///
/// Cameras only read it for the aspect ratio; the renderer reads it for the
/// depth attachment extent.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Builds a viewport from integer window dimensions.
    #[inline]
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Width over height.
    ///
    /// Both sides are floored at 1 so a minimized (0x0) window yields a finite ratio.
    #[inline]
    pub fn aspect_ratio(self) -> f32 {
        self.width.max(1.0) / self.height.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_of_800_by_600() {
        let vp = Viewport::from_pixels(800, 600);
        assert!((vp.aspect_ratio() - 4.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        let vp = Viewport::new(640.0, 0.0);
        assert!(!vp.is_valid());
        assert_eq!(vp.aspect_ratio(), 640.0);
    }

    #[test]
    fn zero_sized_is_square() {
        assert_eq!(Viewport::default().aspect_ratio(), 1.0);
    }
}
