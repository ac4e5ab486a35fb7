//! Command-line configuration for the cube demo.

use std::path::PathBuf;

pub const DEFAULT_TEXTURE1: &str = "assets/container.jpg";
pub const DEFAULT_TEXTURE2: &str = "assets/awesomeface.png";

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub texture1: PathBuf,
    pub texture2: PathBuf,
    pub wireframe: bool,
    pub depth_test: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            texture1: PathBuf::from(DEFAULT_TEXTURE1),
            texture2: PathBuf::from(DEFAULT_TEXTURE2),
            wireframe: false,
            depth_test: true,
        }
    }
}

impl DemoConfig {
    /// Parses the process arguments.
    pub fn parse() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    /// Supported arguments:
    /// - `--texture1 <path>` / `--texture2 <path>`: images for units 0 and 1
    /// - `--wireframe`: draw edges only
    /// - `--no-depth`: disable the depth test
    ///
    /// Unknown arguments are logged and skipped.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--texture1" | "--texture2" => match args.next() {
                    Some(path) if arg == "--texture1" => config.texture1 = path.into(),
                    Some(path) => config.texture2 = path.into(),
                    None => log::warn!("{arg} expects a path; keeping the default"),
                },
                "--wireframe" => config.wireframe = true,
                "--no-depth" => config.depth_test = false,
                other => log::warn!("unknown argument '{other}' ignored"),
            }
        }

        config
    }
}
