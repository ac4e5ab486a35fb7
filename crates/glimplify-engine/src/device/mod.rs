//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain)
//! - acquiring frames and providing encoders/views for rendering
//! - routing uncaptured API errors to the logger

mod debug;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use debug::DebugOutput;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
