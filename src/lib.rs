//! `mask_canvas` lets a user paint over an image and derives two masks from
//! the strokes: an alpha cutout and a black/white stencil.
//!
//! The editor works at the image's native resolution, converts pointer
//! input from display space, and hands encoded PNGs to an injected
//! [`upload::ImageUploader`].

pub mod config;
pub mod domain;
pub mod editor;
pub mod render;
pub mod source;
pub mod upload;

pub use editor::{ExportError, MaskDialog, MaskEditor, MaskUrls};
