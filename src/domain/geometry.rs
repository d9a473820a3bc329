//! Geometric types for canvas and display coordinates

use serde::{Deserialize, Serialize};

/// A 2D point in either display (pointer) or canvas (native pixel) space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

/// A size in fractional display pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Fixed container budget the canvas is fitted into
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        // Dialog is 539 wide with 32px padding on each side, content area 375 high
        Self {
            width: 475.0,
            height: 375.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Both sides are positive and finite
    pub fn is_valid(&self) -> bool {
        [self.width, self.height]
            .iter()
            .all(|side| side.is_finite() && *side > 0.0)
    }

    /// Fit an image of native size `width`×`height` into this viewport,
    /// preserving aspect ratio
    pub fn fit(&self, width: u32, height: u32) -> DisplayScale {
        let scale_x = self.width / f64::from(width);
        let scale_y = self.height / f64::from(height);
        DisplayScale(scale_x.min(scale_y))
    }
}

/// Ratio between on-screen size and native image size
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayScale(pub f64);

impl Default for DisplayScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl DisplayScale {
    pub fn get(self) -> f64 {
        self.0
    }

    /// Convert a pointer position in display space to native canvas space
    pub fn to_canvas(self, display: Point) -> Point {
        Point {
            x: (f64::from(display.x) / self.0) as f32,
            y: (f64::from(display.y) / self.0) as f32,
        }
    }

    /// On-screen size of a canvas of native size `width`×`height`
    pub fn display_size(self, width: u32, height: u32) -> Size {
        Size {
            width: f64::from(width) * self.0,
            height: f64::from(height) * self.0,
        }
    }
}
