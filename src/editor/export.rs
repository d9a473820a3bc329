//! Mask export: encode both masks and push them through an uploader

use std::fmt;

use image::RgbaImage;
use serde::Serialize;

use crate::render::encode::encode_png;
use crate::upload::{ImageUploader, UploadError, UploadFile, UploadedImage};

/// Freshly rendered masks at native resolution
#[derive(Clone, Debug, PartialEq)]
pub struct MaskImages {
    /// Background with painted regions erased
    pub cutout: RgbaImage,
    /// White where painted, black elsewhere
    pub stencil: RgbaImage,
}

/// Remote locations of an exported mask pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MaskUrls {
    pub cutout_url: String,
    pub stencil_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    /// No background image has been loaded
    NotLoaded,
    /// PNG encoding failed
    Encode(String),
    /// Cutout upload failed; the stencil was not attempted
    CutoutUpload(UploadError),
    /// Stencil upload failed after the cutout was stored
    StencilUpload {
        source: UploadError,
        /// The cutout that was already uploaded and is now orphaned
        orphaned_cutout: UploadedImage,
    },
}

impl ExportError {
    /// The upload failure reason, if this was an upload failure
    pub fn upload_reason(&self) -> Option<&str> {
        match self {
            ExportError::CutoutUpload(err) | ExportError::StencilUpload { source: err, .. } => {
                Some(err.reason())
            }
            _ => None,
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NotLoaded => write!(f, "No image loaded"),
            ExportError::Encode(msg) => write!(f, "Failed to encode mask: {}", msg),
            ExportError::CutoutUpload(err) => write!(f, "Failed to upload cutout: {}", err),
            ExportError::StencilUpload { source, .. } => {
                write!(f, "Failed to upload stencil: {}", source)
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::CutoutUpload(err) | ExportError::StencilUpload { source: err, .. } => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl From<png::EncodingError> for ExportError {
    fn from(err: png::EncodingError) -> Self {
        ExportError::Encode(err.to_string())
    }
}

/// Upper bound of the per-export tag; five digits keep both names short
/// enough that key shortening leaves them untouched
const TAG_RANGE: u32 = 100_000;

/// Shared per-export tag so both files of a pair can be matched up
fn export_tag() -> u32 {
    chrono::Utc::now().timestamp_subsec_micros() % TAG_RANGE
}

fn cutout_name(tag: u32) -> String {
    format!("alpha-{tag:05}.png")
}

fn stencil_name(tag: u32) -> String {
    format!("bw-{tag:05}.png")
}

impl MaskImages {
    /// Encode and upload cutout then stencil, one after the other
    pub async fn upload<U: ImageUploader>(&self, uploader: &U) -> Result<MaskUrls, ExportError> {
        let tag = export_tag();

        let cutout = UploadFile::png(cutout_name(tag), encode_png(&self.cutout)?).temporary();
        let cutout = uploader
            .upload(cutout)
            .await
            .map_err(ExportError::CutoutUpload)?;

        let stencil = UploadFile::png(stencil_name(tag), encode_png(&self.stencil)?).temporary();
        let stencil = match uploader.upload(stencil).await {
            Ok(stencil) => stencil,
            Err(source) => {
                log::warn!(
                    "Stencil upload failed, cutout left orphaned at {}",
                    cutout.url
                );
                return Err(ExportError::StencilUpload {
                    source,
                    orphaned_cutout: cutout,
                });
            }
        };

        Ok(MaskUrls {
            cutout_url: cutout.url,
            stencil_url: stencil.url,
        })
    }
}
