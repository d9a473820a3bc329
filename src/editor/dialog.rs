//! Mask dialog wrapping the editor
//!
//! Holds the brush-size slider, visibility and the saving flag. A failed save
//! keeps the dialog open so the user can try the whole export again.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{MaskEditor, MaskUrls};
use crate::config::MaskCanvasConfig;
use crate::domain::{Brush, clamp_brush_size};
use crate::upload::ImageUploader;

/// Shared view of the dialog's saving flag
///
/// Clones stay readable from other tasks while `save_mask` holds the dialog.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, loading: bool) {
        self.0.store(loading, Ordering::SeqCst);
    }
}

/// Clears the flag when the save finishes or its future is dropped
struct LoadingGuard<'a>(&'a LoadingFlag);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a LoadingFlag) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct MaskDialog {
    editor: MaskEditor,
    visible: bool,
    loading: LoadingFlag,
    brush_size: f32,
}

impl MaskDialog {
    pub fn new(config: &MaskCanvasConfig) -> Self {
        let brush = Brush::new(config.brush_size, config.brush_color);
        Self {
            editor: MaskEditor::new(config.viewport, brush),
            visible: false,
            loading: LoadingFlag::default(),
            brush_size: brush.size,
        }
    }

    pub fn editor(&self) -> &MaskEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut MaskEditor {
        &mut self.editor
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// True while a save is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn loading_flag(&self) -> LoadingFlag {
        self.loading.clone()
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Slider input, clamped to 1-100
    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = clamp_brush_size(size);
        self.editor.set_brush_size(self.brush_size);
    }

    pub fn clear_canvas(&mut self) {
        self.editor.clear();
    }

    /// Export both masks; closes on success, stays open on failure
    pub async fn save_mask<U: ImageUploader>(&mut self, uploader: &U) -> Option<MaskUrls> {
        let result = {
            let _loading = LoadingGuard::start(&self.loading);
            self.editor.export_masks(uploader).await
        };

        match result {
            Ok(urls) => {
                self.close();
                Some(urls)
            }
            Err(err) => {
                log::error!("Failed to save mask: {}", err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Point;
    use crate::upload::testing::ScriptedUploader;
    use crate::upload::{UploadError, UploadFile, UploadedImage};
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;

    /// Records the dialog's loading flag at the moment each file arrives
    struct FlagRecorder {
        flag: LoadingFlag,
        seen: Mutex<Vec<bool>>,
    }

    impl ImageUploader for FlagRecorder {
        async fn upload(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
            self.seen.lock().unwrap().push(self.flag.get());
            Ok(UploadedImage::new(
                format!("https://cdn.example.com/{}", file.name),
                file.name,
                file.bytes.len(),
            ))
        }
    }

    fn open_dialog() -> MaskDialog {
        let mut dialog = MaskDialog::new(&MaskCanvasConfig::default());
        dialog
            .editor_mut()
            .load_image(RgbaImage::from_pixel(40, 30, Rgba([10, 20, 30, 255])))
            .unwrap();
        dialog.open();
        dialog
    }

    #[test]
    fn test_starts_with_configured_brush() {
        let dialog = MaskDialog::new(&MaskCanvasConfig::default());
        assert_eq!(dialog.brush_size(), 10.0);
        assert_eq!(dialog.editor().brush().size, 10.0);
        assert!(!dialog.is_visible());
    }

    #[test]
    fn test_slider_is_clamped_and_forwarded() {
        let mut dialog = open_dialog();
        dialog.set_brush_size(0.0);
        assert_eq!(dialog.brush_size(), 1.0);
        dialog.set_brush_size(64.0);
        assert_eq!(dialog.editor().brush().size, 64.0);
    }

    #[test]
    fn test_clear_canvas_erases_strokes() {
        let mut dialog = open_dialog();
        let editor = dialog.editor_mut();
        editor.begin_stroke(Point::new(5.0, 5.0));
        editor.continue_stroke(Point::new(30.0, 5.0));
        editor.end_stroke();
        assert!(dialog.editor().render_masks().unwrap().stencil.pixels().any(|p| p[0] == 255));

        dialog.clear_canvas();
        assert!(dialog.editor().render_masks().unwrap().stencil.pixels().all(|p| p[0] == 0));
    }

    #[tokio::test]
    async fn test_successful_save_closes_dialog() {
        let mut dialog = open_dialog();
        let uploader = ScriptedUploader::default();

        let urls = dialog.save_mask(&uploader).await;
        assert!(urls.is_some());
        assert!(!dialog.is_visible());
        assert!(!dialog.is_loading());
    }

    #[tokio::test]
    async fn test_loading_flag_is_set_while_uploading() {
        let mut dialog = open_dialog();
        let uploader = FlagRecorder {
            flag: dialog.loading_flag(),
            seen: Mutex::new(Vec::new()),
        };

        assert!(dialog.save_mask(&uploader).await.is_some());
        assert_eq!(*uploader.seen.lock().unwrap(), vec![true, true]);
        assert!(!dialog.loading_flag().get());
    }

    /// Never answers, keeping the save suspended
    struct StalledUploader;

    impl ImageUploader for StalledUploader {
        async fn upload(&self, _file: UploadFile) -> Result<UploadedImage, UploadError> {
            std::future::pending().await
        }
    }

    #[test]
    fn test_abandoned_save_resets_loading_flag() {
        let mut dialog = open_dialog();
        let flag = dialog.loading_flag();

        {
            let mut save = std::pin::pin!(dialog.save_mask(&StalledUploader));
            let mut cx = std::task::Context::from_waker(std::task::Waker::noop());
            assert!(save.as_mut().poll(&mut cx).is_pending());
            assert!(flag.get());
        }
        assert!(!flag.get());
        assert!(dialog.is_visible());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_dialog_open() {
        let mut dialog = open_dialog();
        let uploader = ScriptedUploader::failing_on(vec![None, Some("denied".into())]);

        assert!(dialog.save_mask(&uploader).await.is_none());
        assert!(dialog.is_visible());
        assert!(!dialog.is_loading());

        // Retrying re-runs the whole export
        assert!(dialog.save_mask(&uploader).await.is_some());
        assert_eq!(uploader.received().len(), 4);
    }
}
