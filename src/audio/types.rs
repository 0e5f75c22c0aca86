use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AudioError, Result};
use crate::resources::{ResourceHandle, ResourceKind, ResourceTracker};

/// Encoded audio as supplied by the caller
#[derive(Debug, Clone)]
pub struct AudioSource {
    /// Display name, usually the file name; its extension hints the format
    pub name: String,
    pub bytes: Vec<u8>,
}

impl AudioSource {
    pub fn new<S: Into<String>>(name: S, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }

    /// Read an audio file from disk
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|_| AudioError::LoadFailed {
            source_name: path.display().to_string(),
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, bytes })
    }
}

/// Decoded audio with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Audio samples (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,

    /// Name of the source the samples came from
    pub source_name: String,

    /// Audio format information
    pub format: AudioFormat,
}

impl AudioData {
    /// Number of sample frames (one sample per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }
}

/// Audio file format information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFormat {
    /// File extension (wav, mp3, flac, etc.)
    pub extension: String,

    /// Bit depth (16, 24, 32, etc.)
    pub bit_depth: Option<u16>,

    /// Compression type (if any)
    pub compression: Option<String>,
}

/// How a track was fitted to the video duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentPolicy {
    /// Source shorter than the video: repeated, then cut
    Loop,
    /// Source at least as long as the video: cut from the start
    Trim,
}

impl AlignmentPolicy {
    pub fn for_durations(source: f64, target: f64) -> Self {
        if source < target {
            Self::Loop
        } else {
            Self::Trim
        }
    }
}

impl fmt::Display for AlignmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loop => f.write_str("loop"),
            Self::Trim => f.write_str("trim"),
        }
    }
}

/// A decoded track paired with the duration it has to fill
pub struct AudioTrack {
    data: AudioData,
    target_duration: f64,
    policy: AlignmentPolicy,
    _handle: ResourceHandle,
}

impl AudioTrack {
    pub fn new(data: AudioData, target_duration: f64, tracker: &ResourceTracker) -> Self {
        let policy = AlignmentPolicy::for_durations(data.duration, target_duration);
        Self {
            data,
            target_duration,
            policy,
            _handle: tracker.acquire(ResourceKind::AudioTrack),
        }
    }

    pub fn data(&self) -> &AudioData {
        &self.data
    }

    pub fn source_duration(&self) -> f64 {
        self.data.duration
    }

    pub fn target_duration(&self) -> f64 {
        self.target_duration
    }

    pub fn policy(&self) -> AlignmentPolicy {
        self.policy
    }
}

/// Audio cut or looped to exactly the video duration
pub struct AlignedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Equal to the timeline duration
    pub duration: f64,
    pub policy: AlignmentPolicy,
    pub(crate) _handle: ResourceHandle,
}

impl AlignedAudio {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Write the samples as a 32-bit float WAV file
    pub fn write_wav<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let failed = |e: hound::Error| AudioError::InvalidParameters {
            details: format!("failed to write aligned audio: {}", e),
        };

        let mut writer = hound::WavWriter::create(path.as_ref(), spec).map_err(failed)?;
        for &sample in &self.samples {
            writer.write_sample(sample).map_err(failed)?;
        }
        writer.finalize().map_err(failed)?;
        Ok(())
    }
}
