//! Fly controls: mouse look, keyboard movement, scroll zoom.

use glimplify_engine::camera::FlyCamera;
use glimplify_engine::core::AppControl;
use glimplify_engine::input::{InputFrame, InputState, Key};

pub const MOUSE_SENSITIVITY: f32 = 0.1;

/// Turns raw mouse motion and held keys into camera movement.
///
/// Look uses relative device motion rather than cursor positions, so turning
/// keeps working once the cursor would have reached a window edge.
#[derive(Debug, Clone)]
pub struct InputContext {
    sensitivity: f32,
}

impl Default for InputContext {
    fn default() -> Self {
        Self::new()
    }
}

impl InputContext {
    pub fn new() -> Self {
        Self {
            sensitivity: MOUSE_SENSITIVITY,
        }
    }

    /// Converts a mouse delta into `(pitch_delta, yaw_delta)` in degrees.
    ///
    /// Screen y grows downward, so it is reversed for pitch.
    pub fn look(&self, dx: f32, dy: f32) -> (f32, f32) {
        (-dy * self.sensitivity, dx * self.sensitivity)
    }

    /// Applies one frame of input to `camera`. Escape requests exit.
    pub fn update(
        &self,
        camera: &mut FlyCamera,
        input: &InputState,
        frame: &InputFrame,
        dt: f32,
    ) -> AppControl {
        if input.key_down(Key::Escape) {
            return AppControl::Exit;
        }

        let (dx, dy) = frame.mouse_delta;
        if dx != 0.0 || dy != 0.0 {
            let (pitch, yaw) = self.look(dx, dy);
            camera.rotate(pitch, yaw);
        }

        let scroll_y = frame.wheel.1;
        if scroll_y != 0.0 {
            camera.zoom(-scroll_y);
        }

        if input.key_down(Key::W) {
            camera.move_forward(dt);
        }
        if input.key_down(Key::S) {
            camera.move_backward(dt);
        }
        if input.key_down(Key::A) {
            camera.strafe_left(dt);
        }
        if input.key_down(Key::D) {
            camera.strafe_right(dt);
        }

        AppControl::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::Vec3;
    use glimplify_engine::coords::Viewport;
    use glimplify_engine::input::{InputEvent, KeyState, MouseWheelDelta, PointerMoveEvent};

    fn camera() -> FlyCamera {
        FlyCamera::new(Viewport::from_pixels(800, 600))
    }

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(
            frame,
            InputEvent::Key {
                key,
                state: KeyState::Pressed,
                repeat: false,
            },
        );
    }

    fn motion(state: &mut InputState, frame: &mut InputFrame, dx: f32, dy: f32) {
        state.apply_event(frame, InputEvent::MouseMotion { dx, dy });
    }

    #[test]
    fn no_motion_produces_no_rotation() {
        let ctx = InputContext::new();
        assert_eq!(ctx.look(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn deltas_scaled_and_y_reversed() {
        let ctx = InputContext::new();
        let (pitch, yaw) = ctx.look(10.0, -20.0);
        assert!((yaw - 1.0).abs() < 1e-5);
        assert!((pitch - 2.0).abs() < 1e-5);
    }

    #[test]
    fn mouse_motion_rotates_camera() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        motion(&mut state, &mut frame, 60.0, 0.0);
        motion(&mut state, &mut frame, 40.0, 0.0);
        ctx.update(&mut cam, &state, &frame, 0.016);

        assert!((cam.yaw() - (-80.0)).abs() < 1e-4);
        assert_eq!(cam.pitch(), 0.0);
    }

    #[test]
    fn look_continues_past_window_width() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        // 2000 px of travel on an 800 px wide window, spread over frames.
        for _ in 0..20 {
            motion(&mut state, &mut frame, 100.0, 0.0);
            ctx.update(&mut cam, &state, &frame, 0.016);
            frame.clear();
        }

        assert!((cam.yaw() - 110.0).abs() < 1e-3);
    }

    #[test]
    fn cursor_positions_do_not_rotate() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::PointerMoved(PointerMoveEvent { x: 10.0, y: 10.0 }));
        state.apply_event(&mut frame, InputEvent::PointerMoved(PointerMoveEvent { x: 500.0, y: 10.0 }));
        ctx.update(&mut cam, &state, &frame, 0.016);

        assert_eq!(cam.yaw(), -90.0);
    }

    #[test]
    fn w_moves_forward_scaled_by_dt() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        press(&mut state, &mut frame, Key::W);
        ctx.update(&mut cam, &state, &frame, 0.5);

        assert!(cam.position().abs_diff_eq(Vec3::new(0.0, 0.0, -1.25), 1e-5));
    }

    #[test]
    fn a_and_d_cancel() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        press(&mut state, &mut frame, Key::A);
        press(&mut state, &mut frame, Key::D);
        ctx.update(&mut cam, &state, &frame, 1.0);

        assert!(cam.position().abs_diff_eq(Vec3::ZERO, 1e-5));
    }

    #[test]
    fn scroll_up_narrows_fov() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        state.apply_event(&mut frame, InputEvent::MouseWheel(MouseWheelDelta::Line { x: 0.0, y: 5.0 }));
        ctx.update(&mut cam, &state, &frame, 0.016);

        assert_eq!(cam.fov(), 40.0);
    }

    #[test]
    fn escape_requests_exit() {
        let ctx = InputContext::new();
        let mut cam = camera();
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        assert_eq!(ctx.update(&mut cam, &state, &frame, 0.016), AppControl::Continue);
        press(&mut state, &mut frame, Key::Escape);
        assert_eq!(ctx.update(&mut cam, &state, &frame, 0.016), AppControl::Exit);
    }
}
