use crate::{ComputeError, GridDims, PassInput, PassOutput, ShaderSource};
use std::fmt;
use std::str::FromStr;

pub trait ComputeBackend: Send + Sync + 'static {
    /// Runs one compute pass over `input.grid` and returns the read-back grid.
    ///
    /// The pass uploads `input.data` to device memory, binds it together with
    /// the grid dimensions and a zeroed lock word (see [`crate::layout`]),
    /// dispatches `shader` once over the grid and copies the storage buffer
    /// back to the host.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::UnsupportedShader`] when the backend cannot run
    /// `shader`, [`ComputeError::ShaderLoad`] when a shader file cannot be
    /// read, and backend-specific variants for device, pipeline and mapping
    /// failures.
    fn run_compute_pass(
        &self,
        shader: &ShaderSource,
        input: &PassInput,
    ) -> Result<PassOutput, ComputeError>;

    /// Checks that a pass over `grid` fits the backend's limits, so callers
    /// can reject a grid before allocating its host buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::BufferTooLarge`] or
    /// [`ComputeError::DispatchTooLarge`] when a device limit is exceeded.
    fn check_grid(&self, _grid: &GridDims) -> Result<(), ComputeError> {
        Ok(())
    }

    /// Short backend name used in logs.
    fn name(&self) -> &'static str;
}

/// Which backend the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// GPU when available, otherwise CPU.
    #[default]
    Auto,
    Gpu,
    Cpu,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Auto => write!(f, "auto"),
            BackendKind::Gpu => write!(f, "gpu"),
            BackendKind::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(BackendKind::Auto),
            "gpu" | "wgpu" => Ok(BackendKind::Gpu),
            "cpu" => Ok(BackendKind::Cpu),
            other => Err(format!("unknown backend `{other}` (expected auto, gpu or cpu)")),
        }
    }
}
