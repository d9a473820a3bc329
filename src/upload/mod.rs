//! Upload service boundary
//!
//! The editor never talks to storage directly. It hands encoded files to an
//! [`ImageUploader`] owned by the embedding application and gets URLs back.
//!
//! Implementations:
//! - [`UploadSession`]: HTTP `PUT` against an object endpoint
//! - [`DirectoryUploader`]: writes into a local directory

use std::fmt;
use std::future::Future;

pub mod local;
pub mod naming;
pub mod session;

pub use local::DirectoryUploader;
pub use session::{UploadSession, UploadState, UploadTask};

/// Message used when a collaborator fails without saying why
pub const GENERIC_FAILURE: &str = "upload failed";

/// An encoded file ready for upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Temporary files go under the temp prefix and are not reported
    pub temp: bool,
}

impl UploadFile {
    pub fn png(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: crate::render::encode::MIME_TYPE.to_string(),
            bytes,
            temp: false,
        }
    }

    pub fn temporary(mut self) -> Self {
        self.temp = true;
        self
    }
}

/// A successfully stored file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadedImage {
    /// Publicly reachable URL
    pub url: String,
    /// Final object name (after key shortening and timestamping)
    pub name: String,
    /// Lowercase extension of `name`, if any
    pub format: Option<String>,
    /// Size in bytes
    pub size: usize,
}

impl UploadedImage {
    pub fn new(url: String, name: String, size: usize) -> Self {
        let format = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        Self {
            url,
            name,
            format,
            size,
        }
    }
}

/// Errors an upload collaborator can report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The storage side refused the file
    Rejected(String),
    /// The request never completed
    Network(String),
    /// Local filesystem failure
    Io(String),
    /// The task was canceled before it finished
    Canceled,
}

impl UploadError {
    /// The collaborator's failure reason, or the generic fallback
    pub fn reason(&self) -> &str {
        let reason = match self {
            UploadError::Rejected(msg) | UploadError::Network(msg) | UploadError::Io(msg) => {
                msg.as_str()
            }
            UploadError::Canceled => "upload canceled",
        };
        if reason.trim().is_empty() {
            GENERIC_FAILURE
        } else {
            reason
        }
    }
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

impl std::error::Error for UploadError {}

impl From<std::io::Error> for UploadError {
    fn from(err: std::io::Error) -> Self {
        UploadError::Io(err.to_string())
    }
}

/// Accepts a file and returns where it can be fetched from
pub trait ImageUploader {
    fn upload(
        &self,
        file: UploadFile,
    ) -> impl Future<Output = Result<UploadedImage, UploadError>> + Send;
}
