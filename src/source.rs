//! Background image sources
//!
//! Remote images are fetched anonymously: no cookies, no credentials.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use image::RgbaImage;

/// Where a background image comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Local(PathBuf),
}

impl ImageSource {
    /// Classify an image URL: `http(s)://` is remote, `file://` and bare
    /// paths are local
    pub fn parse(url: &str) -> Self {
        if url.starts_with("http://") || url.starts_with("https://") {
            return ImageSource::Remote(url.to_string());
        }
        let path = url.strip_prefix("file://").unwrap_or(url);
        ImageSource::Local(PathBuf::from(path))
    }

    /// Read the raw encoded bytes of the image
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Remote(url) => fetch_remote(url).await,
            ImageSource::Local(path) => tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read image: {}", path.display())),
        }
    }

    /// Fetch and decode the image into RGBA8
    pub async fn load(&self) -> Result<RgbaImage> {
        let bytes = self.fetch().await?;
        decode(&bytes)
    }
}

async fn fetch_remote(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(10))
        .user_agent(concat!("mask-canvas/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch image: {url}"))?;

    if !response.status().is_success() {
        bail!("Failed to fetch image {url}: HTTP status {}", response.status());
    }

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read image body: {url}"))?;
    Ok(bytes.to_vec())
}

/// Decode encoded image bytes into RGBA8
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let rgba = image::load_from_memory(bytes)
        .context("Failed to decode image")?
        .to_rgba8();
    log::debug!("Decoded image: {}x{} pixels", rgba.width(), rgba.height());
    Ok(rgba)
}
