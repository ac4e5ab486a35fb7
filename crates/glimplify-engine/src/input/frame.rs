use std::collections::HashSet;

use super::types::{InputEvent, Key, MouseButton};

/// Per-frame input deltas.
///
/// `InputState` provides the current state (held keys/buttons, pointer position).
/// `InputFrame` provides events and transition sets for the current frame.
#[derive(Debug, Default)]
pub struct InputFrame {
    /// Raw events in arrival order.
    pub events: Vec<InputEvent>,

    /// Keys pressed this frame.
    pub keys_pressed: HashSet<Key>,

    /// Keys released this frame.
    pub keys_released: HashSet<Key>,

    /// Mouse buttons pressed this frame.
    pub buttons_pressed: HashSet<MouseButton>,

    /// Wheel movement accumulated this frame, in lines.
    pub wheel: (f32, f32),

    /// Raw mouse motion accumulated this frame, +Y down.
    pub mouse_delta: (f32, f32),
}

impl InputFrame {
    pub fn clear(&mut self) {
        self.events.clear();
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.wheel = (0.0, 0.0);
        self.mouse_delta = (0.0, 0.0);
    }

    pub fn push_event(&mut self, ev: InputEvent) {
        self.events.push(ev);
    }

    /// Pointer positions received this frame, oldest first.
    pub fn pointer_moves(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.events.iter().filter_map(|ev| match ev {
            InputEvent::PointerMoved(p) => Some((p.x, p.y)),
            _ => None,
        })
    }
}
