#![deny(clippy::all, clippy::pedantic)]

//! Headless single-dispatch compute pass.
//!
//! A pass uploads a `width × height × 4` grid of `u32` through a staging
//! buffer, runs one compute kernel over the grid, and reads the grid back.
//! [`ComputeBackend`] is the only seam: [`CpuBackend`] is the golden master
//! for the bundled pass-through kernel, and `WgpuBackend` (feature `gpu`)
//! drives a real device.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub mod grid;
pub mod layout;
pub mod pass;
pub mod shader;

mod backend;
#[cfg(feature = "cpu")]
mod cpu_backend;
#[cfg(feature = "gpu")]
mod wgpu_backend;

pub use backend::{BackendKind, ComputeBackend};
#[cfg(feature = "cpu")]
pub use cpu_backend::CpuBackend;
pub use grid::{pixel_offset, Dimensions, GridDims, WorkgroupSize, COMPONENTS_PP};
pub use pass::{PassInput, PassOutput};
pub use shader::{ShaderSource, SpecializationConstants};
#[cfg(feature = "gpu")]
pub use wgpu_backend::WgpuBackend;

#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(&'static str),
    #[error("grid dimensions must be non-zero")]
    InvalidDimensions,
    #[error("backend not available")]
    BackendUnavailable,
    #[error("failed to request device: {0}")]
    DeviceRequest(String),
    #[error("failed to build compute pipeline: {0}")]
    Pipeline(String),
    #[error("device validation failed: {0}")]
    Validation(String),
    #[error("failed to map readback buffer: {0}")]
    BufferMap(String),
    #[error("buffer of {requested} bytes exceeds device limit of {limit} bytes")]
    BufferTooLarge { requested: u64, limit: u64 },
    #[error("dispatch of {requested} workgroups per dimension exceeds device limit of {limit}")]
    DispatchTooLarge { requested: u32, limit: u32 },
    #[error("failed to read shader {path:?}")]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader is not supported by this backend")]
    UnsupportedShader,
}

/// Returns the backend for `kind`, falling back to the CPU implementation.
///
/// `BackendKind::Auto` prefers the GPU when the `gpu` feature is enabled and
/// an adapter can be opened.
///
/// # Errors
///
/// Returns [`ComputeError::BackendUnavailable`] when `BackendKind::Gpu` is
/// requested and no device can be opened, or when the requested backend was
/// not compiled in.
pub fn backend_by_kind(kind: BackendKind) -> Result<Arc<dyn ComputeBackend>, ComputeError> {
    match kind {
        BackendKind::Gpu => open_gpu(),
        BackendKind::Cpu => open_cpu(),
        BackendKind::Auto => {
            #[cfg(feature = "gpu")]
            {
                match WgpuBackend::try_new() {
                    Ok(gpu) => {
                        tracing::info!("Using wgpu backend.");
                        return Ok(Arc::new(gpu));
                    }
                    Err(e) => {
                        tracing::warn!("wgpu backend initialization failed ({e}), falling back...");
                    }
                }
            }
            open_cpu()
        }
    }
}

/// Returns a compute backend if available, falling back to the CPU implementation.
///
/// # Panics
///
/// Panics when neither the `gpu` nor the `cpu` feature yields a backend.
#[must_use]
pub fn default_backend() -> Arc<dyn ComputeBackend> {
    match backend_by_kind(BackendKind::Auto) {
        Ok(backend) => backend,
        Err(e) => panic!("no compute backend available: {e}"),
    }
}

#[cfg(feature = "gpu")]
fn open_gpu() -> Result<Arc<dyn ComputeBackend>, ComputeError> {
    let gpu = WgpuBackend::try_new()?;
    tracing::info!("Using wgpu backend.");
    Ok(Arc::new(gpu))
}

#[cfg(not(feature = "gpu"))]
fn open_gpu() -> Result<Arc<dyn ComputeBackend>, ComputeError> {
    tracing::error!("wgpu backend requested but the `gpu` feature is disabled");
    Err(ComputeError::BackendUnavailable)
}

#[cfg(feature = "cpu")]
#[allow(clippy::unnecessary_wraps)]
fn open_cpu() -> Result<Arc<dyn ComputeBackend>, ComputeError> {
    tracing::info!("Using CPU backend.");
    Ok(Arc::new(CpuBackend::new()))
}

#[cfg(not(feature = "cpu"))]
fn open_cpu() -> Result<Arc<dyn ComputeBackend>, ComputeError> {
    tracing::error!("CPU backend requested but the `cpu` feature is disabled");
    Err(ComputeError::BackendUnavailable)
}
