//! Kernel sources and pipeline constants.
//!
//! Every kernel must match the binding interface in [`crate::layout`]: the
//! grid dimensions as a uniform at binding 0, the pixel buffer as
//! `array<u32>` at binding 1 and an `atomic<u32>` lock at binding 2, all in
//! group 0. The entry point is [`ENTRY_POINT`] and the pixel count is
//! injected through the pipeline-overridable constant `buffer_elements`.

use crate::ComputeError;
use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

pub const ENTRY_POINT: &str = "main";

/// Name of the WGSL `override` carrying the pixel buffer length.
pub const BUFFER_ELEMENTS_CONSTANT: &str = "buffer_elements";

const EMBEDDED_SCHEDULEVIZ: &str = include_str!("../../../shaders/scheduleviz.wgsl");

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderSource {
    /// The bundled pass-through kernel.
    #[default]
    Embedded,
    Inline(String),
    /// WGSL read from disk each time the pass runs.
    File(PathBuf),
}

impl ShaderSource {
    /// Returns the WGSL text of the kernel.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::ShaderLoad`] if a `File` source cannot be read.
    pub fn load(&self) -> Result<Cow<'_, str>, ComputeError> {
        match self {
            ShaderSource::Embedded => Ok(Cow::Borrowed(EMBEDDED_SCHEDULEVIZ)),
            ShaderSource::Inline(src) => Ok(Cow::Borrowed(src.as_str())),
            ShaderSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| ComputeError::ShaderLoad { path: path.clone(), source }),
        }
    }

    #[must_use]
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            ShaderSource::Embedded => Cow::Borrowed("scheduleviz (embedded)"),
            ShaderSource::Inline(_) => Cow::Borrowed("inline"),
            ShaderSource::File(path) => path.to_string_lossy(),
        }
    }
}

/// Identifies a compiled kernel by its source text, so an edited file gets a
/// fresh pipeline.
#[must_use]
pub fn cache_key(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// Values baked into the pipeline at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecializationConstants {
    pub buffer_elements: u32,
}

impl SpecializationConstants {
    /// Override table in the form `PipelineCompilationOptions` expects.
    #[must_use]
    pub fn to_overrides(&self) -> HashMap<String, f64> {
        HashMap::from([(BUFFER_ELEMENTS_CONSTANT.to_owned(), f64::from(self.buffer_elements))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_kernel_declares_interface() {
        let src = ShaderSource::Embedded.load().unwrap();
        assert!(src.contains("@binding(0) var<uniform> dims"));
        assert!(src.contains("@binding(1) var<storage, read_write> pixels"));
        assert!(src.contains("@binding(2) var<storage, read_write> sched_lock"));
        assert!(src.contains("override buffer_elements"));
        assert!(src.contains("fn main"));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = PathBuf::from("does/not/exist.wgsl");
        let err = ShaderSource::File(path.clone()).load().unwrap_err();
        match err {
            ComputeError::ShaderLoad { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected ShaderLoad, got {other:?}"),
        }
    }

    #[test]
    fn cache_key_tracks_source_text() {
        assert_eq!(cache_key("a"), cache_key("a"));
        assert_ne!(cache_key("a"), cache_key("b"));
    }

    #[test]
    fn overrides_use_constant_name() {
        let overrides = SpecializationConstants { buffer_elements: 7168 }.to_overrides();
        assert_eq!(overrides.get(BUFFER_ELEMENTS_CONSTANT), Some(&7168.0));
        assert_eq!(overrides.len(), 1);
    }
}
