use crate::grid::{pixel_offset, GridDims, COMPONENTS_PP};
use crate::ComputeError;

/// Host-side contents of the pixel buffer before the dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassInput {
    pub grid: GridDims,
    pub data: Vec<u32>,
}

impl PassInput {
    /// # Errors
    ///
    /// Returns [`ComputeError::ShapeMismatch`] unless `data` holds exactly
    /// `grid.element_count()` elements.
    pub fn new(grid: GridDims, data: Vec<u32>) -> Result<Self, ComputeError> {
        if data.len() != grid.element_count() {
            return Err(ComputeError::ShapeMismatch(
                "input length does not match width * height * components",
            ));
        }
        Ok(Self { grid, data })
    }

    /// All-zero input, which is what the visualiser uploads.
    #[must_use]
    pub fn zeroed(grid: GridDims) -> Self {
        Self { grid, data: vec![0; grid.element_count()] }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// Pixel buffer as read back after the dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassOutput {
    pub grid: GridDims,
    pub data: Vec<u32>,
}

impl PassOutput {
    /// # Errors
    ///
    /// Returns [`ComputeError::ShapeMismatch`] if `bytes` is not exactly one
    /// pixel buffer for `grid`.
    pub fn from_bytes(grid: GridDims, bytes: &[u8]) -> Result<Self, ComputeError> {
        if bytes.len() as u64 != grid.byte_size() {
            return Err(ComputeError::ShapeMismatch("readback size does not match grid"));
        }
        // Mapped ranges are not guaranteed to be u32-aligned on the host.
        let data = bytes
            .chunks_exact(4)
            .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { grid, data })
    }

    /// The four components of pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u32; 4] {
        assert!(x < self.grid.width && y < self.grid.height, "pixel ({x}, {y}) out of range");
        let o = pixel_offset(&self.grid, x, y);
        [self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3]]
    }

    /// Packs the grid into 8-bit RGB, row-major.
    ///
    /// Each of the first three components keeps only its low byte; the fourth
    /// component is dropped.
    #[must_use]
    pub fn to_rgb8(&self) -> Vec<u8> {
        let pixels = self.grid.width as usize * self.grid.height as usize;
        let mut rgb = Vec::with_capacity(pixels * 3);
        for px in self.data.chunks_exact(COMPONENTS_PP as usize) {
            rgb.extend(px[..3].iter().map(|c| c.to_le_bytes()[0]));
        }
        rgb
    }
}
