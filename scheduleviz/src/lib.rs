//! # scheduleviz
//!
//! A headless program that issues exactly one compute dispatch and saves the
//! result as an image.
//!
//! ## Overview
//!
//! The run is a single linear sequence:
//!
//! ```text
//! host buffer → device buffer → compute shader → device buffer → host buffer → file
//! ```
//!
//! A `width × height × 4` grid of `u32` (56 × 32 by default, all zeros) is
//! uploaded through a staging buffer, one kernel runs over the grid with one
//! invocation per pixel, and the grid is read back and written out as an RGB
//! image. The kernel also sees the grid dimensions as a uniform and a single
//! lock word that starts at zero.
//!
//! The bundled kernel is a pass-through. Pass `--shader path/to/kernel.wgsl`
//! to run a different kernel against the same bindings; see
//! [`compute::shader`] for the interface it must declare.
//!
//! ### The Crates
//!
//! -   **`scheduleviz`:** The crate you are currently viewing. It parses the
//!     command line, runs the pass and writes the image.
//! -   **[`compute`]:** The pass itself. It provides a CPU reference backend
//!     and a `wgpu`-based backend behind the `gpu` feature.

pub mod app;
pub mod config;
pub mod output;

pub use compute;
