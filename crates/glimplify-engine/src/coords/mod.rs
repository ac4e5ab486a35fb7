//! Coordinate and geometry types shared by the camera and the renderer.
//!
//! World space is right-handed, +Y up, and the camera looks down -Z by default.

mod viewport;

pub use viewport::Viewport;
