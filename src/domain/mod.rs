//! Pure domain types with minimal dependencies
//!
//! Types here carry no rendering or network dependencies so the editor,
//! renderer and uploaders can share them freely.

pub mod geometry;
pub mod stroke;

pub use geometry::*;
pub use stroke::*;
