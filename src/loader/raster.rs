//! Raster image loader (PNG, JPEG)
//!
//! Grayscale sources keep a single channel. Everything else is converted
//! to 8-bit RGB, dropping alpha.

use super::{identity_of, LoadError};
use crate::core::pixel::PixelBuffer;
use image::{ColorType, DynamicImage, ImageError};
use std::path::Path;

/// Decode an image file into a pixel buffer
pub fn load(path: &Path) -> Result<PixelBuffer, LoadError> {
    let img = image::open(path).map_err(|e| map_image_error(path, e))?;
    from_dynamic(&img, path)
}

/// Convert an already decoded image
pub fn from_dynamic(img: &DynamicImage, path: &Path) -> Result<PixelBuffer, LoadError> {
    let (height, width) = (img.height() as usize, img.width() as usize);

    let (channels, samples) = match img.color() {
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => {
            (1, img.to_luma8().into_raw())
        }
        _ => (3, img.to_rgb8().into_raw()),
    };

    PixelBuffer::new(identity_of(path), height, width, channels, samples)
        .map_err(|e| LoadError::corrupt(path, e.to_string()))
}

fn map_image_error(path: &Path, err: ImageError) -> LoadError {
    match err {
        ImageError::IoError(e) => LoadError::io(path, e),
        ImageError::Unsupported(_) => LoadError::UnsupportedFormat(path.to_path_buf()),
        other => LoadError::corrupt(path, other.to_string()),
    }
}
