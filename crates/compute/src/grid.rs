//! Grid geometry shared by the host and the kernel.

use crate::ComputeError;
use bytemuck::{Pod, Zeroable};

/// Components stored per pixel (RGBA, one `u32` each).
pub const COMPONENTS_PP: u32 = 4;

pub const DEFAULT_WIDTH: u32 = 56;
pub const DEFAULT_HEIGHT: u32 = 32;

/// Width and height of the pixel grid the kernel runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
}

impl Default for GridDims {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT }
    }
}

impl GridDims {
    /// # Errors
    ///
    /// Returns [`ComputeError::InvalidDimensions`] if either side is zero or
    /// the pixel buffer would hold more than `u32::MAX` elements.
    pub fn new(width: u32, height: u32) -> Result<Self, ComputeError> {
        if width == 0 || height == 0 {
            return Err(ComputeError::InvalidDimensions);
        }
        // `buffer_elements` is a u32 in the kernel.
        width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(COMPONENTS_PP))
            .ok_or(ComputeError::InvalidDimensions)?;
        Ok(Self { width, height })
    }

    /// Number of `u32` elements in the pixel buffer.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.width as usize * self.height as usize * COMPONENTS_PP as usize
    }

    /// Size of the pixel buffer in bytes.
    #[must_use]
    pub fn byte_size(&self) -> u64 {
        (self.element_count() * std::mem::size_of::<u32>()) as u64
    }

    #[must_use]
    pub fn uniform(&self) -> Dimensions {
        Dimensions { width: self.width, height: self.height }
    }
}

/// Uniform block bound at [`crate::layout::UNIFORM_DIMS`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

const _: () = assert!(std::mem::size_of::<Dimensions>() == 2 * std::mem::size_of::<u32>());

/// Local workgroup size; must match `@workgroup_size` in the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl Default for WorkgroupSize {
    fn default() -> Self {
        Self { x: 1, y: 1 }
    }
}

impl WorkgroupSize {
    /// Workgroups needed to cover `grid`, rounding partial groups up.
    #[must_use]
    pub fn workgroup_count(&self, grid: &GridDims) -> [u32; 3] {
        [grid.width.div_ceil(self.x), grid.height.div_ceil(self.y), 1]
    }
}

/// Index of the first component of pixel `(x, y)`.
#[must_use]
pub fn pixel_offset(grid: &GridDims, x: u32, y: u32) -> usize {
    (y as usize * grid.width as usize + x as usize) * COMPONENTS_PP as usize
}
