//! Camera models.
//!
//! Cameras convert per-frame input deltas into a pose and the two matrices the
//! renderer consumes each frame (`view`, `projection`).

mod fly;

pub use fly::{front_from_euler, FlyCamera, FOV_MAX, FOV_MIN, MOVE_SPEED, PITCH_LIMIT};
