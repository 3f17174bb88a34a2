use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading the input FITS files
#[derive(Debug, Error)]
pub enum FitsError {
    #[error("Failed to open FITS file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        source: fitsio::errors::Error,
    },

    #[error("Failed to read image data from '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: fitsio::errors::Error,
    },

    #[error("Primary HDU of '{}' is not an image", path.display())]
    NotAnImage { path: PathBuf },

    #[error("Unsupported image shape {shape:?} in '{}'", path.display())]
    UnsupportedShape { path: PathBuf, shape: Vec<usize> },

    #[error("Missing header keyword {keyword} in '{}'", path.display())]
    MissingKeyword {
        path: PathBuf,
        keyword: &'static str,
    },

    #[error("Invalid value '{value}' for header keyword {keyword} in '{}'", path.display())]
    InvalidKeyword {
        path: PathBuf,
        keyword: &'static str,
        value: String,
    },
}
