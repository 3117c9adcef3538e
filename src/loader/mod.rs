//! Pixel loaders
//!
//! Turn files on disk into [`PixelBuffer`]s. The buffer identity is the path
//! exactly as given by the caller.
//!
//! # Submodules
//!
//! - `raster` - PNG/JPEG decoding through the `image` crate
//! - `text` - the textual pixel-array format (`M N K` header plus samples)

pub mod raster;
pub mod text;

use crate::core::pixel::PixelBuffer;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions the loaders understand (lowercase, without the dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "txt"];

/// Errors raised while turning a file into a pixel buffer
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The extension is not handled by any loader
    #[error("Unsupported file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The content could not be decoded
    #[error("Corrupt data in '{}': {message}", path.display())]
    Corrupt { path: PathBuf, message: String },

    /// Declared dimensions and sample count disagree
    #[error("Dimension mismatch in '{}': expected {expected} samples, found {actual}", path.display())]
    DimensionMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// Channel count other than 1 or 3
    #[error("Unsupported channel count {channels} in '{}'", path.display())]
    UnsupportedChannels { path: PathBuf, channels: usize },

    /// Reading the file failed
    #[error("Failed to read '{}': {message}", path.display())]
    Io { path: PathBuf, message: String },
}

impl LoadError {
    pub(crate) fn corrupt(path: &Path, message: impl Into<String>) -> Self {
        LoadError::Corrupt {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        }
    }
}

/// Lowercase extension of `path`, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Whether some loader handles this path's extension
pub fn is_supported(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Load any supported file, choosing the loader by extension
pub fn load_pixels(path: &Path) -> Result<PixelBuffer, LoadError> {
    match extension_of(path).as_deref() {
        Some("txt") => text::load(path),
        Some("png") | Some("jpg") | Some("jpeg") => raster::load(path),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Identity string used for a path
pub(crate) fn identity_of(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
