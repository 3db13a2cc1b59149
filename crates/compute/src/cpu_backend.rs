use crate::{ComputeBackend, ComputeError, PassInput, PassOutput, ShaderSource};

/// Host reference for the embedded kernel.
///
/// Only [`ShaderSource::Embedded`] is understood; its pass-through semantics
/// make the output identical to the input.
#[derive(Default, Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn run_compute_pass(
        &self,
        shader: &ShaderSource,
        input: &PassInput,
    ) -> Result<PassOutput, ComputeError> {
        if input.data.len() != input.grid.element_count() {
            return Err(ComputeError::ShapeMismatch(
                "input length does not match width * height * components",
            ));
        }
        match shader {
            ShaderSource::Embedded => {
                tracing::debug!(
                    width = input.grid.width,
                    height = input.grid.height,
                    "running pass-through kernel on CPU"
                );
                Ok(PassOutput { grid: input.grid, data: input.data.clone() })
            }
            ShaderSource::Inline(_) | ShaderSource::File(_) => {
                tracing::warn!("CPU backend cannot run external shader {}", shader.label());
                Err(ComputeError::UnsupportedShader)
            }
        }
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}
