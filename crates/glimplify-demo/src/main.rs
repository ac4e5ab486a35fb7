mod app;
mod config;
mod cube;
mod input;

use glimplify_engine::coords::Viewport;
use glimplify_engine::device::GpuInit;
use glimplify_engine::logging::{init_logging, LoggingConfig};
use glimplify_engine::window::{Runtime, RuntimeConfig};

use crate::app::CubeApp;
use crate::config::DemoConfig;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::parse();
    log::info!(
        "textures: '{}', '{}'",
        config.texture1.display(),
        config.texture2.display()
    );

    let runtime = RuntimeConfig::default();
    let viewport = Viewport::new(
        runtime.initial_size.width as f32,
        runtime.initial_size.height as f32,
    );

    Runtime::run(runtime, GpuInit::default(), CubeApp::new(config, viewport))
}
