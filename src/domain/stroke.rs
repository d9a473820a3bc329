//! Brush settings and recorded pointer input

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::config::BrushColor;

/// Smallest brush the size slider allows
pub const MIN_BRUSH_SIZE: f32 = 1.0;
/// Largest brush the size slider allows
pub const MAX_BRUSH_SIZE: f32 = 100.0;
/// Brush size used by the bare canvas widget
pub const DEFAULT_BRUSH_SIZE: f32 = 20.0;

/// Brush applied to every new stroke segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
    /// Line width in native canvas pixels
    pub size: f32,
    pub color: BrushColor,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            size: DEFAULT_BRUSH_SIZE,
            color: BrushColor::default(),
        }
    }
}

impl Brush {
    pub fn new(size: f32, color: BrushColor) -> Self {
        Self {
            size: clamp_brush_size(size),
            color,
        }
    }
}

/// Clamp a brush size into the slider range; NaN falls back to the minimum
pub fn clamp_brush_size(size: f32) -> f32 {
    if size.is_nan() {
        return MIN_BRUSH_SIZE;
    }
    size.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE)
}

/// Pointer events delivered by the host UI
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    /// Button pressed at a display-space position
    Down(Point),
    /// Pointer moved to a display-space position
    Move(Point),
    /// Button released
    Up,
    /// Pointer left the canvas
    Leave { button_down: bool },
}

/// A single recorded stroke in display coordinates
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedStroke {
    /// Brush size for this stroke; the current brush is kept when absent
    #[serde(default)]
    pub brush_size: Option<f32>,
    pub points: Vec<[f32; 2]>,
}

/// Recorded strokes that can be replayed onto an editor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeScript {
    pub strokes: Vec<ScriptedStroke>,
}

impl StrokeScript {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
