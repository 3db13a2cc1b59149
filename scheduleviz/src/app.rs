//! # scheduleviz application logic
//!
//! [`run`] drives one pass end to end: build the zeroed grid, open the
//! requested backend, dispatch, read back and save the image.

use crate::config::Config;
use crate::output;
use anyhow::{Context, Result};
use compute::{ComputeBackend, PassInput};
use std::path::PathBuf;

/// Runs the pass described by `config` and returns the path of the saved image.
///
/// # Errors
///
/// Returns an error if the grid is invalid, the backend cannot be opened, the
/// dispatch fails or the image cannot be written.
pub fn run(config: &Config) -> Result<PathBuf> {
    tracing::info!("Running scheduleviz compute");
    let backend = compute::backend_by_kind(config.backend)
        .with_context(|| format!("failed to open {} backend", config.backend))?;
    run_with_backend(config, backend.as_ref())
}

/// Same as [`run`] with an already opened backend.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_backend(config: &Config, backend: &dyn ComputeBackend) -> Result<PathBuf> {
    let grid = config.grid().context("invalid grid dimensions")?;
    let shader = config.shader_source();
    tracing::info!(
        backend = backend.name(),
        shader = %shader.label(),
        "{}x{} grid, {} elements",
        grid.width,
        grid.height,
        grid.element_count()
    );

    backend
        .check_grid(&grid)
        .with_context(|| format!("grid does not fit the {} backend", backend.name()))?;
    let input = PassInput::zeroed(grid);
    let result = backend
        .run_compute_pass(&shader, &input)
        .with_context(|| format!("compute pass on {} backend failed", backend.name()))?;

    output::save_output_as_image(&config.output, &result)
        .with_context(|| format!("failed to save {}", config.output.display()))?;
    Ok(config.output.clone())
}
