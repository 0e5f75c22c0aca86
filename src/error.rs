use thiserror::Error;

/// Main error type for the Vlog-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Image asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Image input errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to decode image '{name}': {reason}")]
    DecodeFailed { name: String, reason: String },

    #[error("Image '{name}' has zero dimension ({width}x{height})")]
    ZeroDimension { name: String, width: u32, height: u32 },

    #[error("No images supplied")]
    NoImages,
}

/// Audio-specific errors
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio: {source_name}")]
    LoadFailed { source_name: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Audio track '{source_name}' is empty")]
    Empty { source_name: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Caption layer errors. These never abort a job.
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Caption font unavailable: {reason}")]
    FontUnavailable { reason: String },

    #[error("Caption font has no glyph for {ch:?}")]
    UnsupportedGlyph { ch: char },

    #[error("Caption text is empty")]
    EmptyText,
}

/// Rendering and encoding errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Encoder unavailable: {reason}")]
    EncoderUnavailable { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame size mismatch: got {got:?}, expected {expected:?}")]
    FrameSizeMismatch { got: (u32, u32), expected: (u32, u32) },
}

/// Composition-specific errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("Clip sequencing failed: {reason}")]
    SequencingFailed { reason: String },

    #[error("Output generation failed: {reason}")]
    OutputFailed { reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Whether this error aborts a render job.
    ///
    /// Caption failures degrade to an uncaptioned clip; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Caption(_))
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Asset(AssetError::DecodeFailed { name, .. }) => {
                format!("Could not read image '{}'. Please check it is a supported image format.", name)
            }
            Self::Asset(AssetError::NoImages) => {
                "At least one image is required to render a video.".to_string()
            }
            Self::Audio(AudioError::LoadFailed { source_name }) => {
                format!("Could not load audio '{}'. Please check it is a supported format.", source_name)
            }
            Self::Audio(AudioError::Empty { source_name }) => {
                format!("Audio '{}' contains no samples.", source_name)
            }
            Self::Video(VideoError::EncoderUnavailable { .. }) => {
                "FFmpeg was not found. Please install FFmpeg and make sure it is on PATH.".to_string()
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_errors_are_not_fatal() {
        let err: CompositorError = CaptionError::EmptyText.into();
        assert!(!err.is_fatal());

        let err: CompositorError = AudioError::Empty { source_name: "song.wav".into() }.into();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_user_message_names_the_input() {
        let err: CompositorError = AssetError::DecodeFailed {
            name: "beach.jpg".into(),
            reason: "bad header".into(),
        }.into();
        assert!(err.user_message().contains("beach.jpg"));
    }
}
