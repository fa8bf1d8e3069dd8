//! Image header inspection.
//!
//! Only the dimensions are read; pixel data is never decoded.

use std::{io::Cursor, path::Path};

use {
    image::{ImageFormat, ImageReader},
    tracing::error,
};

use crate::{Error, Result};

/// Image metadata.
#[derive(Debug, Clone)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

/// Get metadata about an in-memory image without fully decoding it.
pub fn get_image_metadata(data: &[u8]) -> Result<ImageMetadata> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| Error::external("failed to guess image format", e))?;

    let format = reader.format();
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| Error::external("failed to read image dimensions", e))?;

    Ok(ImageMetadata {
        width,
        height,
        format,
    })
}

fn read_file_metadata(path: &Path) -> Result<ImageMetadata> {
    let reader = ImageReader::open(path)
        .map_err(|e| Error::external(format!("failed to open {}", path.display()), e))?
        .with_guessed_format()
        .map_err(|e| Error::external("failed to guess image format", e))?;

    let format = reader.format();
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| Error::external("failed to read image dimensions", e))?;

    Ok(ImageMetadata {
        width,
        height,
        format,
    })
}

/// Best-effort `(width, height)` of a staged file.
///
/// Anything that cannot be read as an image yields `(0, 0)` and an error log.
pub fn read_dimensions(path: &Path) -> (u32, u32) {
    match read_file_metadata(path) {
        Ok(meta) => (meta.width, meta.height),
        Err(e) => {
            error!(path = %path.display(), error = %e, "could not read image dimensions");
            #[cfg(feature = "metrics")]
            phoso_metrics::counter!(phoso_metrics::media::DECODE_FAILURES_TOTAL).increment(1);
            (0, 0)
        },
    }
}
