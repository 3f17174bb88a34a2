//! FITS input
//!
//! This module consolidates:
//! - Sky image loading with its WCS keywords (image.rs)
//! - Slit pointing from the spectrum header (header.rs)
//! - Error types shared by both (error.rs)

pub mod error;
pub mod header;
pub mod image;

pub use error::FitsError;
pub use header::read_slit_pointing;
pub use image::{load_sky_image, SkyImage};

use fitsio::hdu::FitsHdu;
use fitsio::FitsFile;

/// Read an optional header key, treating any read failure as absent
fn read_key_optional<T: fitsio::headers::ReadsKey>(
    hdu: &FitsHdu,
    fptr: &mut FitsFile,
    key: &str,
) -> Option<T> {
    hdu.read_key(fptr, key).ok()
}
