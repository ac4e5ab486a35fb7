use glam::{Mat4, Vec3};

use crate::coords::Viewport;

/// Translation speed in world units per second.
pub const MOVE_SPEED: f32 = 2.5;

/// Pitch is kept strictly inside ±90° so `front` never becomes parallel to `up`.
pub const PITCH_LIMIT: f32 = 89.0;

pub const FOV_MIN: f32 = 1.0;
pub const FOV_MAX: f32 = 45.0;

const DEFAULT_YAW: f32 = -90.0;
const DEFAULT_NEAR: f32 = 0.1;
const DEFAULT_FAR: f32 = 100.0;

/// Euler-angle fly camera.
///
/// Holds a position plus yaw/pitch (degrees) and keeps the view and projection
/// matrices in sync with them. Every mutating call recomputes the affected
/// matrix before returning, so accessors are plain field reads.
///
/// `up` stays fixed at +Y. Roll is therefore not representable; pitch is
/// clamped to `[-89, 89]` to keep the look-at basis well defined.
///
/// A yaw of 0° looks down +X, which is why the camera starts at -90° (looking
/// down -Z).
#[derive(Debug)]
pub struct FlyCamera {
    viewport: Viewport,

    position: Vec3,
    front: Vec3,
    up: Vec3,
    view: Mat4,

    pitch: f32,
    yaw: f32,

    fov: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl FlyCamera {
    /// Creates a camera at the origin looking down -Z with a 45° field of view.
    ///
    /// The viewport is fixed for the camera's lifetime and only feeds the
    /// aspect ratio.
    pub fn new(viewport: Viewport) -> Self {
        let position = Vec3::ZERO;
        let front = Vec3::NEG_Z;
        let up = Vec3::Y;

        Self {
            viewport,
            position,
            front,
            up,
            view: look_at(position, front, up),
            pitch: 0.0,
            yaw: DEFAULT_YAW,
            fov: FOV_MAX,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            projection: perspective(FOV_MAX, viewport, DEFAULT_NEAR, DEFAULT_FAR),
        }
    }

    /// Teleports the camera without changing its orientation.
    pub fn move_to(&mut self, position: Vec3) {
        self.position = position;
        self.update_view();
    }

    /// Replaces the projection parameters.
    ///
    /// `fov` is clamped to `[1, 45]` degrees. `near`/`far` are stored untouched;
    /// keeping `0 < near < far` is the caller's job.
    pub fn set_perspective(&mut self, fov: f32, near: f32, far: f32) {
        self.fov = fov.clamp(FOV_MIN, FOV_MAX);
        self.near = near;
        self.far = far;
        self.update_projection();
    }

    /// Adds `fov_delta` degrees to the field of view, clamped to `[1, 45]`.
    ///
    /// Negative deltas zoom in. Scroll-wheel callers pass the negated wheel
    /// offset so that scrolling up zooms in.
    pub fn zoom(&mut self, fov_delta: f32) {
        self.fov = (self.fov + fov_delta).clamp(FOV_MIN, FOV_MAX);
        self.update_projection();
    }

    pub fn move_forward(&mut self, dt: f32) -> Mat4 {
        self.position += MOVE_SPEED * dt * self.front;
        self.update_view()
    }

    pub fn move_backward(&mut self, dt: f32) -> Mat4 {
        self.position -= MOVE_SPEED * dt * self.front;
        self.update_view()
    }

    pub fn strafe_left(&mut self, dt: f32) -> Mat4 {
        self.position -= MOVE_SPEED * dt * self.right();
        self.update_view()
    }

    pub fn strafe_right(&mut self, dt: f32) -> Mat4 {
        self.position += MOVE_SPEED * dt * self.right();
        self.update_view()
    }

    /// Accumulates pitch/yaw offsets (degrees) and re-derives the look direction.
    ///
    /// Pitch saturates at ±89°; yaw is left unbounded and wraps through the
    /// trigonometry.
    pub fn rotate(&mut self, pitch_delta: f32, yaw_delta: f32) -> Mat4 {
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw += yaw_delta;
        self.front = front_from_euler(self.yaw, self.pitch);
        self.update_view()
    }

    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Unit vector pointing to the camera's right, `normalize(front × up)`.
    #[inline]
    pub fn right(&self) -> Vec3 {
        self.front.cross(self.up).normalize()
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn front(&self) -> Vec3 {
        self.front
    }

    #[inline]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    #[inline]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    pub fn far(&self) -> f32 {
        self.far
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.viewport.aspect_ratio()
    }

    fn update_view(&mut self) -> Mat4 {
        self.view = look_at(self.position, self.front, self.up);
        self.view
    }

    fn update_projection(&mut self) {
        self.projection = perspective(self.fov, self.viewport, self.near, self.far);
    }
}

/// Look direction for the given yaw/pitch in degrees.
pub fn front_from_euler(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(
        yaw.cos() * pitch.cos(),
        pitch.sin(),
        yaw.sin() * pitch.cos(),
    )
    .normalize()
}

fn look_at(position: Vec3, front: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, position + front, up)
}

// wgpu clip space has depth in [0, 1], which is what `perspective_rh` targets.
fn perspective(fov: f32, viewport: Viewport, near: f32, far: f32) -> Mat4 {
    Mat4::perspective_rh(fov.to_radians(), viewport.aspect_ratio(), near, far)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn camera() -> FlyCamera {
        FlyCamera::new(Viewport::from_pixels(800, 600))
    }

    fn assert_vec_near(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, EPS), "{a:?} != {b:?}");
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn defaults_look_down_negative_z() {
        let cam = camera();
        assert_eq!(cam.yaw(), -90.0);
        assert_eq!(cam.pitch(), 0.0);
        assert_eq!(cam.fov(), 45.0);
        assert_eq!(cam.near(), 0.1);
        assert_eq!(cam.far(), 100.0);
        assert_vec_near(cam.front(), Vec3::NEG_Z);
        assert_eq!(cam.up(), Vec3::Y);
    }

    #[test]
    fn euler_default_matches_initial_front() {
        assert_vec_near(front_from_euler(-90.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn initial_matrices_are_computed() {
        let cam = camera();
        assert_eq!(cam.view_matrix(), Mat4::look_at_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y));
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(45f32.to_radians(), 800.0 / 600.0, 0.1, 100.0)
        );
    }

    #[test]
    fn zero_height_viewport_gives_finite_projection() {
        let cam = FlyCamera::new(Viewport::from_pixels(800, 0));
        assert!(cam.projection_matrix().is_finite());
    }

    // ── fov ───────────────────────────────────────────────────────────────

    #[test]
    fn zoom_past_max_stays_at_max() {
        let mut cam = camera();
        cam.zoom(10.0);
        assert_eq!(cam.fov(), 45.0);
    }

    #[test]
    fn zoom_past_min_stays_at_min() {
        let mut cam = camera();
        cam.zoom(-50.0);
        assert_eq!(cam.fov(), 1.0);
    }

    #[test]
    fn fov_always_clamped() {
        let mut cam = camera();
        for fov in [-1000.0, -1.0, 0.0, 0.5, 1.0, 20.0, 45.0, 45.1, 90.0, 1e9] {
            cam.set_perspective(fov, 0.1, 100.0);
            assert!((FOV_MIN..=FOV_MAX).contains(&cam.fov()), "fov {fov}");
            cam.zoom(fov);
            assert!((FOV_MIN..=FOV_MAX).contains(&cam.fov()), "zoom {fov}");
        }
    }

    #[test]
    fn set_perspective_stores_planes_as_is() {
        let mut cam = camera();
        cam.set_perspective(30.0, 0.5, 500.0);
        assert_eq!(cam.fov(), 30.0);
        assert_eq!(cam.near(), 0.5);
        assert_eq!(cam.far(), 500.0);
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(30f32.to_radians(), 800.0 / 600.0, 0.5, 500.0)
        );
    }

    #[test]
    fn zoom_recomputes_projection() {
        let mut cam = camera();
        cam.zoom(-15.0);
        assert_eq!(
            cam.projection_matrix(),
            Mat4::perspective_rh(30f32.to_radians(), 800.0 / 600.0, 0.1, 100.0)
        );
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn yaw_to_zero_looks_down_positive_x() {
        let mut cam = camera();
        cam.rotate(0.0, 90.0);
        assert!(cam.yaw().abs() < EPS);
        assert_vec_near(cam.front(), Vec3::X);
    }

    #[test]
    fn pitch_saturates() {
        let mut cam = camera();
        cam.rotate(1000.0, 0.0);
        assert_eq!(cam.pitch(), 89.0);
        cam.rotate(-5000.0, 0.0);
        assert_eq!(cam.pitch(), -89.0);

        for step in [30.0, 30.0, 30.0, 30.0, -200.0, 7.5] {
            cam.rotate(step, 0.0);
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&cam.pitch()));
        }
    }

    #[test]
    fn yaw_is_unbounded() {
        let mut cam = camera();
        cam.rotate(0.0, 720.0);
        assert_eq!(cam.yaw(), 630.0);
        assert_vec_near(cam.front(), Vec3::NEG_Z);
    }

    #[test]
    fn rotate_zero_is_idempotent() {
        let mut cam = camera();
        cam.rotate(12.0, 33.0);
        let (front, view) = (cam.front(), cam.view_matrix());
        cam.rotate(0.0, 0.0);
        assert_vec_near(cam.front(), front);
        assert!(cam.view_matrix().abs_diff_eq(view, EPS));
    }

    #[test]
    fn front_stays_unit_length() {
        let mut cam = camera();
        for (p, y) in [(10.0, 5.0), (80.0, -300.0), (-170.0, 1.0)] {
            cam.rotate(p, y);
            assert!((cam.front().length() - 1.0).abs() < EPS);
        }
    }

    // ── movement ──────────────────────────────────────────────────────────

    #[test]
    fn forward_then_backward_returns_home() {
        let mut cam = camera();
        cam.move_to(Vec3::new(0.0, 0.0, 20.0));
        cam.rotate(20.0, 40.0);
        let start = cam.position();
        for t in [0.0, 0.016, 1.0, 3.5] {
            cam.move_forward(t);
            cam.move_backward(t);
            assert!(cam.position().abs_diff_eq(start, 1e-4));
        }
    }

    #[test]
    fn forward_moves_along_front() {
        let mut cam = camera();
        cam.move_forward(2.0);
        assert_vec_near(cam.position(), Vec3::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn strafing_uses_right_vector() {
        let mut cam = camera();
        assert_vec_near(cam.right(), Vec3::X);

        cam.strafe_right(1.0);
        assert_vec_near(cam.position(), Vec3::new(2.5, 0.0, 0.0));
        cam.strafe_left(2.0);
        assert_vec_near(cam.position(), Vec3::new(-2.5, 0.0, 0.0));
    }

    #[test]
    fn movement_returns_current_view() {
        let mut cam = camera();
        let returned = cam.strafe_left(0.5);
        assert_eq!(returned, cam.view_matrix());
        let returned = cam.rotate(3.0, 4.0);
        assert_eq!(returned, cam.view_matrix());
    }

    // ── consistency ───────────────────────────────────────────────────────

    #[test]
    fn view_is_never_stale() {
        let mut cam = camera();
        let fresh = |c: &FlyCamera| {
            Mat4::look_at_rh(c.position(), c.position() + c.front(), c.up())
        };

        cam.move_to(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(cam.view_matrix(), fresh(&cam));
        cam.rotate(-30.0, 15.0);
        assert_eq!(cam.view_matrix(), fresh(&cam));
        cam.move_forward(0.25);
        assert_eq!(cam.view_matrix(), fresh(&cam));
        cam.strafe_right(0.25);
        assert_eq!(cam.view_matrix(), fresh(&cam));
        cam.zoom(-3.0);
        assert_eq!(cam.view_matrix(), fresh(&cam));
    }
}
