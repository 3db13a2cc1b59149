//! Command-line and environment configuration.

use clap::Parser;
use compute::grid::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use compute::{BackendKind, ComputeError, GridDims, ShaderSource};
use std::path::PathBuf;

pub const DEFAULT_OUTPUT: &str = "scheduleviz.ppm";

/// Run one compute dispatch over a pixel grid and save the result as an image.
#[derive(Debug, Clone, Parser)]
#[command(name = "scheduleviz", version, about)]
pub struct Config {
    /// Grid width in pixels.
    #[arg(long, env = "SCHEDULEVIZ_WIDTH", default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Grid height in pixels.
    #[arg(long, env = "SCHEDULEVIZ_HEIGHT", default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// WGSL kernel to run instead of the bundled pass-through.
    #[arg(long, env = "SCHEDULEVIZ_SHADER")]
    pub shader: Option<PathBuf>,

    /// Output image; `.png` writes PNG, anything else binary PPM.
    #[arg(short, long, env = "SCHEDULEVIZ_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Compute backend: auto, gpu or cpu.
    #[arg(long, env = "SCHEDULEVIZ_BACKEND", default_value_t = BackendKind::Auto)]
    pub backend: BackendKind,

    /// Wait for Enter before exiting.
    #[arg(long)]
    pub pause: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            shader: None,
            output: PathBuf::from(DEFAULT_OUTPUT),
            backend: BackendKind::Auto,
            pause: false,
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// Returns [`ComputeError::InvalidDimensions`] if either side is zero.
    pub fn grid(&self) -> Result<GridDims, ComputeError> {
        GridDims::new(self.width, self.height)
    }

    #[must_use]
    pub fn shader_source(&self) -> ShaderSource {
        self.shader.clone().map_or(ShaderSource::Embedded, ShaderSource::File)
    }
}
