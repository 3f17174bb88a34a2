//! Pure domain types with minimal dependencies
//!
//! Angles and units, the slit pointing, quadrangle geometry, and the
//! overlays built from them. Overlay styles come from `config`; nothing
//! here reads FITS files or touches pixels.

pub mod angle;
pub mod annotation;
pub mod geometry;
pub mod pointing;

pub use angle::*;
pub use annotation::*;
pub use geometry::*;
pub use pointing::*;
