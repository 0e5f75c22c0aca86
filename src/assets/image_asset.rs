use std::path::Path;
use std::sync::Arc;

use image::RgbaImage;
use tracing::{debug, info};

use crate::error::{AssetError, Result};
use crate::video::Frame;

/// Raw, still-encoded image bytes with a display name
#[derive(Debug, Clone)]
pub struct ImageSource {
    /// Name used in logs and error messages (usually the upload's file name)
    pub name: String,

    /// Encoded image bytes (PNG, JPEG, ...)
    pub bytes: Vec<u8>,
}

impl ImageSource {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Read an image file into memory
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| AssetError::DecodeFailed {
            name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// Read every supported image in `directory`, ordered by file name
    pub fn from_directory<P: AsRef<Path>>(directory: P) -> Result<Vec<Self>> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            return Err(AssetError::DecodeFailed {
                name: directory.display().to_string(),
                reason: "not a directory".to_string(),
            }.into());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(directory)? {
            let path = entry?.path();
            if path.is_file() && !is_hidden_file(&path) && is_supported(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(AssetError::NoImages.into());
        }

        info!("Found {} images in {:?}", paths.len(), directory);
        paths.iter().map(Self::from_path).collect()
    }
}

/// Check if a file extension is a supported still image format
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "bmp" | "webp" | "gif"
        ))
        .unwrap_or(false)
}

fn is_hidden_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// A decoded, immutable input image
///
/// Pixels sit behind an `Arc` so that the background and foreground layers
/// built from the same image share one buffer.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    name: String,
    pixels: Arc<RgbaImage>,
}

impl ImageAsset {
    /// Decode an image. Undecodable or zero-sized images are fatal for the job.
    pub fn decode(source: &ImageSource) -> Result<Self> {
        let decoded = image::load_from_memory(&source.bytes)
            .map_err(|e| AssetError::DecodeFailed {
                name: source.name.clone(),
                reason: e.to_string(),
            })?;

        Self::from_rgba(source.name.clone(), decoded.to_rgba8())
    }

    /// Wrap an already-decoded buffer
    pub fn from_rgba<S: Into<String>>(name: S, pixels: RgbaImage) -> Result<Self> {
        let name = name.into();
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::ZeroDimension { name, width, height }.into());
        }

        debug!("Decoded image '{}' ({}x{})", name, width, height);
        Ok(Self { name, pixels: Arc::new(pixels) })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Copy of the pixels as a frame
    pub fn to_frame(&self) -> Frame {
        Frame::new(self.pixels.as_ref().clone())
    }

    /// Resize to `width` x `height` without copying the source first
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        Frame::new(image::imageops::resize(
            self.pixels.as_ref(),
            width.max(1),
            height.max(1),
            image::imageops::FilterType::Triangle,
        ))
    }
}
