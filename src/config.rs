use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Main configuration for the Vlog-Compositor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output container settings
    pub output: OutputConfig,

    /// Per-image motion settings
    pub motion: MotionConfig,

    /// Caption styling
    pub caption: CaptionConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|_| ConfigError::ParseFailed { path: path.display().to_string() })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.motion.validate()?;
        self.caption.validate()?;
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Output canvas and encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    /// Output frame rate
    pub fps: f64,

    /// Video codec identifier handed to the encoder
    pub video_codec: String,

    /// Audio codec identifier handed to the encoder
    pub audio_codec: String,

    /// Quality setting (0-100, higher is better)
    pub quality: u8,

    /// Sample rate of the aligned audio track (Hz)
    pub audio_sample_rate: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fps: 24.0,
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            quality: 85,
            audio_sample_rate: 44100,
        }
    }
}

impl OutputConfig {
    /// Canvas size as `(width, height)`
    pub fn canvas(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn validate(&self) -> Result<()> {
        // yuv420p needs even dimensions
        if self.width == 0 || self.width % 2 != 0 {
            return Err(invalid("output.width", self.width).into());
        }
        if self.height == 0 || self.height % 2 != 0 {
            return Err(invalid("output.height", self.height).into());
        }
        if !(self.fps > 0.0) {
            return Err(invalid("output.fps", self.fps).into());
        }
        if self.quality > 100 {
            return Err(invalid("output.quality", self.quality).into());
        }
        if self.video_codec.trim().is_empty() {
            return Err(invalid("output.video_codec", &self.video_codec).into());
        }
        if self.audio_codec.trim().is_empty() {
            return Err(invalid("output.audio_codec", &self.audio_codec).into());
        }
        if self.audio_sample_rate == 0 {
            return Err(invalid("output.audio_sample_rate", self.audio_sample_rate).into());
        }
        Ok(())
    }
}

/// Per-image motion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Seconds each image stays on screen
    pub image_duration: f64,

    /// Crossfade-in applied at the start of every image clip (seconds)
    pub crossfade_duration: f64,

    /// Images with width/height below this get the background composite
    pub portrait_threshold: f64,

    /// Color multiplier for the darkened background layer
    pub background_dim: f32,

    /// Foreground height as a fraction of canvas height
    pub foreground_height_ratio: f64,

    /// Foreground zoom growth per second
    pub foreground_zoom_rate: f64,

    /// Landscape zoom growth per second
    pub landscape_zoom_rate: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            image_duration: 3.0,
            crossfade_duration: 0.5,
            portrait_threshold: 1.5,
            background_dim: 0.3,
            foreground_height_ratio: 0.9,
            foreground_zoom_rate: 0.015,
            landscape_zoom_rate: 0.02,
        }
    }
}

impl MotionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.image_duration > 0.0) {
            return Err(invalid("motion.image_duration", self.image_duration).into());
        }
        if !(0.0..=self.image_duration).contains(&self.crossfade_duration) {
            return Err(invalid("motion.crossfade_duration", self.crossfade_duration).into());
        }
        if !(self.portrait_threshold > 0.0) {
            return Err(invalid("motion.portrait_threshold", self.portrait_threshold).into());
        }
        if !(0.0..=1.0).contains(&self.background_dim) {
            return Err(invalid("motion.background_dim", self.background_dim).into());
        }
        if !(self.foreground_height_ratio > 0.0 && self.foreground_height_ratio <= 1.0) {
            return Err(invalid("motion.foreground_height_ratio", self.foreground_height_ratio).into());
        }
        if self.foreground_zoom_rate < 0.0 || self.landscape_zoom_rate < 0.0 {
            return Err(invalid(
                "motion.zoom_rate",
                format!("{}/{}", self.foreground_zoom_rate, self.landscape_zoom_rate),
            ).into());
        }
        Ok(())
    }
}

/// Caption styling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// TrueType/OpenType font used for captions. Without one, captions are skipped.
    pub font_path: Option<PathBuf>,

    /// Font size in pixels
    pub font_size: f32,

    /// Text fill color
    pub fill: [u8; 3],

    /// Outline color
    pub stroke: [u8; 3],

    /// Outline width in pixels
    pub stroke_width: u32,

    /// Horizontal and vertical padding around the text
    pub margin: (u32, u32),

    /// Top edge of the caption as a fraction of canvas height
    pub vertical_anchor: f64,

    /// Caption fade-in (seconds)
    pub fade_in: f64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 50.0,
            fill: [255, 255, 255],
            stroke: [0, 0, 0],
            stroke_width: 2,
            margin: (20, 20),
            vertical_anchor: 0.80,
            fade_in: 0.5,
        }
    }
}

impl CaptionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.font_size > 0.0) {
            return Err(invalid("caption.font_size", self.font_size).into());
        }
        if !(0.0..=1.0).contains(&self.vertical_anchor) {
            return Err(invalid("caption.vertical_anchor", self.vertical_anchor).into());
        }
        if self.fade_in < 0.0 {
            return Err(invalid("caption.fade_in", self.fade_in).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.output.canvas(), (1280, 720));
        assert_eq!(config.output.fps, 24.0);
        assert_eq!(config.motion.image_duration, 3.0);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.caption.font_path = Some(PathBuf::from("/fonts/caption.ttf"));

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.output.fps, loaded_config.output.fps);
        assert_eq!(original_config.caption.font_path, loaded_config.caption.font_path);
        assert_eq!(original_config.motion.portrait_threshold, loaded_config.motion.portrait_threshold);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(&file_path, "[output]\nfps = 30.0\n").unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.output.fps, 30.0);
        assert_eq!(config.output.width, 1280);
        assert_eq!(config.motion.crossfade_duration, 0.5);
    }

    #[test]
    fn test_odd_canvas_rejected() {
        let mut config = Config::default();
        config.output.width = 1281;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_crossfade_longer_than_clip_rejected() {
        let mut config = Config::default();
        config.motion.crossfade_duration = 4.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/definitely/not/here.toml");
        assert!(matches!(
            result,
            Err(crate::error::CompositorError::Config(ConfigError::FileNotFound { .. }))
        ));
    }
}
