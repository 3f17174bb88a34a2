//! Plot rendering
//!
//! This module contains:
//! - Colormaps and canvas coordinate math (geometry.rs)
//! - Sky image and overlay drawing using tiny-skia (image.rs)
//! - PNG encoding (export.rs)

pub mod export;
pub mod geometry;
pub mod image;
