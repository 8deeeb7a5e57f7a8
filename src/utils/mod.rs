//! Utility functions for image processing
//!
//! This module provides helper functions for puck and symbol location:
//! - Grayscale conversion (RGB/RGBA to luminance)
//! - Binarization (Otsu's method, window statistics)
//! - Geometry (perspective transforms onto module grids)

pub mod binarization;
pub mod geometry;
pub mod grayscale;
