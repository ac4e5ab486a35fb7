//! glimplify engine crate.
//!
//! Thin owners of wgpu objects (program, vertices, texture, render context),
//! a fly camera, and the winit runtime that drives an [`core::App`].

pub mod camera;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
