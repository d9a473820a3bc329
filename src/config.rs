//! Configuration persistence for mask-canvas settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::Viewport;

/// Serializable brush color (RGB, 0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Default for BrushColor {
    fn default() -> Self {
        // #32fb2c, the bright green the mask is painted with
        Self::from_rgb_u8(0x32, 0xfb, 0x2c)
    }
}

impl BrushColor {
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
        }
    }

    /// Parse a `#rrggbb` (or `rrggbb`) hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::from_rgb_u8(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Convert to image crate RGBA format (0-255), always opaque
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            255,
        ]
    }
}

/// Where exported masks go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// HTTP endpoint objects are PUT under; local export when unset
    pub endpoint: Option<String>,
    /// Public base URL uploaded objects are reachable at (defaults to `endpoint`)
    pub public_base: Option<String>,
    /// Key prefix for uploaded objects
    pub upload_path: String,
    /// Endpoint notified about non-temporary uploads
    pub report_endpoint: Option<String>,
    /// Directory used for local export
    pub output_dir: Option<PathBuf>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            public_base: None,
            upload_path: "/user/".to_string(),
            report_endpoint: None,
            output_dir: None,
        }
    }
}

/// Application configuration persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskCanvasConfig {
    /// Initial brush size of the mask dialog (1-100)
    pub brush_size: f32,
    /// Brush color for mask strokes
    pub brush_color: BrushColor,
    /// Viewport budget the canvas is fitted into
    pub viewport: Viewport,
    pub upload: UploadConfig,
}

impl Default for MaskCanvasConfig {
    fn default() -> Self {
        Self {
            brush_size: 10.0,
            brush_color: BrushColor::default(),
            viewport: Viewport::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl MaskCanvasConfig {
    /// Application directory name under the user config dir
    pub const ID: &'static str = "mask-canvas";

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::ID).join("config.json"))
    }

    /// Load configuration from disk, or return defaults if unavailable
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("No config directory available, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Error loading config, using defaults: {:?}", err);
                Self::default()
            }
        }
    }

    /// Save configuration to disk
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            log::error!("No config directory available for saving");
            return;
        };
        if let Err(err) = self.save_to(&path) {
            log::error!("Failed to save config: {:?}", err);
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if !config.viewport.is_valid() {
            log::warn!(
                "Invalid viewport {}x{} in {}, using default",
                config.viewport.width,
                config.viewport.height,
                path.display()
            );
            config.viewport = Viewport::default();
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_brush_color_round_trips_to_hex_bytes() {
        assert_eq!(BrushColor::default().to_rgba_u8(), [0x32, 0xfb, 0x2c, 255]);
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(BrushColor::from_hex("#32fb2c"), Some(BrushColor::default()));
        assert_eq!(
            BrushColor::from_hex("000000").map(BrushColor::to_rgba_u8),
            Some([0, 0, 0, 255])
        );
        assert_eq!(BrushColor::from_hex("#32fb2"), None);
        assert_eq!(BrushColor::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn test_defaults() {
        let config = MaskCanvasConfig::default();
        assert_eq!(config.brush_size, 10.0);
        assert_eq!(config.viewport, Viewport::new(475.0, 375.0));
        assert_eq!(config.upload.upload_path, "/user/");
        assert!(config.upload.endpoint.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = MaskCanvasConfig::default();
        config.brush_size = 42.0;
        config.upload.endpoint = Some("https://uploads.example.com".to_string());
        config.save_to(&path).unwrap();

        let loaded = MaskCanvasConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"brush_size": 30}"#).unwrap();

        let loaded = MaskCanvasConfig::load_from(&path).unwrap();
        assert_eq!(loaded.brush_size, 30.0);
        assert_eq!(loaded.brush_color, BrushColor::default());
        assert_eq!(loaded.upload.upload_path, "/user/");
    }

    #[test]
    fn test_degenerate_viewport_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"viewport": {"width": 0, "height": -20}}"#).unwrap();

        let loaded = MaskCanvasConfig::load_from(&path).unwrap();
        assert_eq!(loaded.viewport, Viewport::default());
    }

    #[test]
    fn test_load_from_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(MaskCanvasConfig::load_from(&path).is_err());
    }
}
