//! Core application module
//!
//! This module contains the end-to-end plotting run: inputs are read,
//! the overlays built, and the PNG written.

pub mod app;
