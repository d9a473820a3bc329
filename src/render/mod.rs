//! Layer rendering module
//!
//! This module contains:
//! - Stroke rasterization onto the overlay using tiny-skia
//! - Cutout and stencil derivation for export
//! - PNG encoding

pub mod encode;
pub mod mask;
pub mod stroke;
