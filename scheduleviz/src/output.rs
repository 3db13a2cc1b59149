//! Writes the read-back grid to disk as an 8-bit RGB image.

use compute::PassOutput;
use image::codecs::png::PngEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, ImageEncoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unsupported image format for {0:?} (expected .ppm, .pnm or .png)")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// Binary PPM (`P6`), maxval 255.
    Ppm,
    Png,
}

impl ImageKind {
    /// Picks the format from the file extension; no extension means PPM.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, OutputError> {
        let ext = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            None | Some("ppm" | "pnm") => Ok(ImageKind::Ppm),
            Some("png") => Ok(ImageKind::Png),
            Some(_) => Err(OutputError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Saves `output` to `path` as RGB; the fourth component of each pixel is
/// dropped and the rest keep their low byte.
///
/// # Errors
///
/// Returns an [`OutputError`] if the format is unknown, the file cannot be
/// created or written, or encoding fails.
pub fn save_output_as_image(path: &Path, output: &PassOutput) -> Result<(), OutputError> {
    let kind = ImageKind::from_path(path)?;
    let rgb = output.to_rgb8();
    let (width, height) = (output.grid.width, output.grid.height);

    let io_err = |source| OutputError::Io { path: path.to_path_buf(), source };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);

    let encoded = match kind {
        ImageKind::Ppm => PnmEncoder::new(&mut writer)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(&rgb, width, height, ColorType::Rgb8),
        ImageKind::Png => PngEncoder::new(&mut writer).write_image(&rgb, width, height, ColorType::Rgb8),
    };
    encoded.map_err(|source| OutputError::Encode { path: path.to_path_buf(), source })?;
    writer.flush().map_err(io_err)?;

    tracing::info!("Image saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute::GridDims;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ImageKind::from_path(Path::new("a.ppm")).unwrap(), ImageKind::Ppm);
        assert_eq!(ImageKind::from_path(Path::new("a.PNM")).unwrap(), ImageKind::Ppm);
        assert_eq!(ImageKind::from_path(Path::new("a")).unwrap(), ImageKind::Ppm);
        assert_eq!(ImageKind::from_path(Path::new("a.png")).unwrap(), ImageKind::Png);
        assert!(matches!(
            ImageKind::from_path(Path::new("a.jpg")),
            Err(OutputError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn ppm_holds_truncated_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.ppm");
        let grid = GridDims::new(2, 1).unwrap();
        let output = PassOutput { grid, data: vec![0x1ff, 2, 3, 4, 10, 20, 30, 40] };

        save_output_as_image(&path, &output).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"P6"));
        let decoded = image::load_from_memory_with_format(&bytes, image::ImageFormat::Pnm)
            .unwrap()
            .to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert_eq!(decoded.into_raw(), vec![0xff, 2, 3, 10, 20, 30]);
    }

    #[test]
    fn png_round_trips_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.png");
        let grid = GridDims::new(1, 2).unwrap();
        let output = PassOutput { grid, data: vec![1, 2, 3, 0, 250, 251, 252, 0] };

        save_output_as_image(&path, &output).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (1, 2));
        assert_eq!(decoded.into_raw(), vec![1, 2, 3, 250, 251, 252]);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.ppm");
        let output = PassOutput { grid: GridDims::new(1, 1).unwrap(), data: vec![0; 4] };
        assert!(matches!(save_output_as_image(&path, &output), Err(OutputError::Io { .. })));
    }
}
