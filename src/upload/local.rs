//! Upload into a local directory
//!
//! Uses the same key layout as the HTTP session, rooted at `dir`.

use std::path::{Path, PathBuf};

use super::naming;
use super::{ImageUploader, UploadError, UploadFile, UploadedImage};

#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    dir: PathBuf,
    upload_path: String,
}

impl DirectoryUploader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            upload_path: "/user/".to_string(),
        }
    }

    pub fn with_upload_path(mut self, upload_path: impl Into<String>) -> Self {
        self.upload_path = upload_path.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn store(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
        let key = naming::object_key(&self.upload_path, &file.name, file.temp, naming::now_ms());
        let path = self.dir.join(key.trim_start_matches('/'));
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let size = file.bytes.len();
        tokio::fs::write(&path, &file.bytes).await?;
        log::info!("Stored {} ({} bytes) at {}", file.name, size, path.display());

        let absolute = std::path::absolute(&path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(UploadedImage::new(
            format!("file://{}", absolute.display()),
            name,
            size,
        ))
    }
}

impl ImageUploader for DirectoryUploader {
    async fn upload(&self, file: UploadFile) -> Result<UploadedImage, UploadError> {
        self.store(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_file_under_temp_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = DirectoryUploader::new(dir.path()).with_upload_path("/user/9/");

        let file = UploadFile::png("mask.png", vec![1, 2, 3]).temporary();
        let uploaded = uploader.upload(file).await.unwrap();

        assert!(uploaded.url.starts_with("file://"));
        assert!(uploaded.name.starts_with("mask_") && uploaded.name.ends_with(".png"));
        assert_eq!(uploaded.size, 3);

        let stored = dir.path().join("user/temp/9").join(&uploaded.name);
        assert_eq!(std::fs::read(stored).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a dir").unwrap();

        let uploader = DirectoryUploader::new(&blocker);
        let err = uploader
            .upload(UploadFile::png("a.png", vec![0]))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }
}
