//! Freehand mask editor
//!
//! Two layers at the image's native resolution: the background holding the
//! loaded image, and a transparent overlay the user paints on. Pointer input
//! arrives in display space and is divided by the display scale before it
//! touches either layer.

use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use tiny_skia::Pixmap;

use crate::domain::{
    Brush, DisplayScale, Point, PointerEvent, Size, StrokeScript, Viewport, clamp_brush_size,
};
use crate::render::{mask, stroke};
use crate::source::ImageSource;
use crate::upload::ImageUploader;

pub mod dialog;
pub mod export;

pub use dialog::{LoadingFlag, MaskDialog};
pub use export::{ExportError, MaskImages, MaskUrls};

/// Pointer interaction state
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EditorState {
    /// Nothing loaded yet, or the last load failed
    #[default]
    Unloaded,
    Idle,
    /// Button held; `last` is the previous point in canvas space
    Stroking { last: Point },
}

/// Both drawing layers, always the same size
///
/// Strokes only ever touch the overlay, so the background stays the decoded
/// source image for the editor's whole lifetime.
struct Layers {
    background: RgbaImage,
    overlay: Pixmap,
}

pub struct MaskEditor {
    viewport: Viewport,
    brush: Brush,
    scale: DisplayScale,
    state: EditorState,
    layers: Option<Layers>,
}

impl Default for MaskEditor {
    fn default() -> Self {
        Self::new(Viewport::default(), Brush::default())
    }
}

impl MaskEditor {
    pub fn new(viewport: Viewport, brush: Brush) -> Self {
        Self {
            viewport,
            brush,
            scale: DisplayScale::default(),
            state: EditorState::Unloaded,
            layers: None,
        }
    }

    /// Fetch `image_url` and make it the background
    ///
    /// On failure the editor is left unloaded.
    pub async fn load(&mut self, image_url: &str) -> Result<()> {
        let loaded = ImageSource::parse(image_url)
            .load()
            .await
            .with_context(|| format!("Failed to load background image: {image_url}"));
        match loaded {
            Ok(image) => self.load_image(image),
            Err(err) => {
                log::error!("{:#}", err);
                self.unload();
                Err(err)
            }
        }
    }

    /// Make an already decoded image the background
    pub fn load_image(&mut self, image: RgbaImage) -> Result<()> {
        let (width, height) = image.dimensions();
        let Some(overlay) = Pixmap::new(width, height) else {
            self.unload();
            return Err(anyhow!("Cannot edit an image of size {width}x{height}"));
        };

        self.scale = self.viewport.fit(width, height);
        log::debug!(
            "Loaded {}x{} background, display scale {}",
            width,
            height,
            self.scale.get()
        );
        self.layers = Some(Layers {
            background: image,
            overlay,
        });
        self.state = EditorState::Idle;
        Ok(())
    }

    fn unload(&mut self) {
        self.layers = None;
        self.scale = DisplayScale::default();
        self.state = EditorState::Unloaded;
    }

    pub fn is_loaded(&self) -> bool {
        self.layers.is_some()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn display_scale(&self) -> DisplayScale {
        self.scale
    }

    /// Native canvas size shared by both layers
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| l.background.dimensions())
    }

    pub fn overlay_size(&self) -> Option<(u32, u32)> {
        self.layers
            .as_ref()
            .map(|l| (l.overlay.width(), l.overlay.height()))
    }

    /// On-screen size of the canvas
    pub fn display_size(&self) -> Option<Size> {
        self.canvas_size()
            .map(|(w, h)| self.scale.display_size(w, h))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush.size = clamp_brush_size(size);
    }

    /// Start a stroke at a display-space position
    pub fn begin_stroke(&mut self, pointer: Point) {
        if self.layers.is_none() {
            return;
        }
        self.state = EditorState::Stroking {
            last: self.scale.to_canvas(pointer),
        };
    }

    /// Extend the current stroke to a display-space position
    pub fn continue_stroke(&mut self, pointer: Point) {
        let EditorState::Stroking { last } = self.state else {
            return;
        };
        let Some(layers) = self.layers.as_mut() else {
            return;
        };
        let next = self.scale.to_canvas(pointer);
        stroke::draw_segment(&mut layers.overlay, last, next, &self.brush);
        self.state = EditorState::Stroking { last: next };
    }

    pub fn end_stroke(&mut self) {
        if matches!(self.state, EditorState::Stroking { .. }) {
            self.state = EditorState::Idle;
        }
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down(p) => self.begin_stroke(p),
            PointerEvent::Move(p) => self.continue_stroke(p),
            PointerEvent::Up => self.end_stroke(),
            PointerEvent::Leave { button_down } => {
                // Strokes survive leaving the canvas while the button is held
                if !button_down {
                    self.end_stroke();
                }
            }
        }
    }

    /// Replay recorded strokes through the pointer handler
    pub fn replay(&mut self, script: &StrokeScript) {
        for stroke in &script.strokes {
            if let Some(size) = stroke.brush_size {
                self.set_brush_size(size);
            }
            let mut points = stroke.points.iter().copied().map(Point::from);
            let Some(first) = points.next() else {
                continue;
            };
            self.handle_pointer(PointerEvent::Down(first));
            for p in points {
                self.handle_pointer(PointerEvent::Move(p));
            }
            self.handle_pointer(PointerEvent::Up);
        }
    }

    /// Erase every stroke, leaving the untouched background
    pub fn clear(&mut self) {
        let Some(layers) = self.layers.as_mut() else {
            return;
        };
        layers.overlay.fill(tiny_skia::Color::TRANSPARENT);
        self.state = EditorState::Idle;
    }

    /// Overlay alpha at a canvas pixel
    pub fn overlay_alpha(&self, x: u32, y: u32) -> Option<u8> {
        let layers = self.layers.as_ref()?;
        layers.overlay.pixel(x, y).map(|p| p.alpha())
    }

    pub fn background(&self) -> Option<&RgbaImage> {
        self.layers.as_ref().map(|l| &l.background)
    }

    /// Rasterize cutout and stencil from the current pixels
    pub fn render_masks(&self) -> Result<MaskImages, ExportError> {
        let layers = self.layers.as_ref().ok_or(ExportError::NotLoaded)?;
        Ok(MaskImages {
            cutout: mask::cutout(&layers.background, &layers.overlay),
            stencil: mask::stencil(&layers.overlay),
        })
    }

    /// Background with strokes drawn on top, as the user sees it
    pub fn composite_preview(&self) -> Option<RgbaImage> {
        let layers = self.layers.as_ref()?;
        Some(mask::composite(&layers.background, &layers.overlay))
    }

    /// Render both masks, upload the cutout then the stencil, return their URLs
    pub async fn export_masks<U: ImageUploader>(
        &self,
        uploader: &U,
    ) -> Result<MaskUrls, ExportError> {
        let masks = self.render_masks()?;
        masks.upload(uploader).await
    }
}
