use std::path::PathBuf;

use crate::error::{Result, VideoError};
use crate::video::frame::Frame;

/// Geometry and audio handed to a [`FrameSink`] before the first frame
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Aligned audio to mux, if any
    pub audio: Option<AudioInput>,
}

/// WAV file carrying the aligned audio track
#[derive(Debug, Clone)]
pub struct AudioInput {
    pub path: PathBuf,
    pub duration: f64,
}

/// What a sink produced once every frame was pushed
#[derive(Debug, Clone, Default)]
pub struct EncodedOutput {
    /// Encoded container bytes; empty for sinks that do not encode
    pub bytes: Vec<u8>,
    pub frame_count: usize,
}

/// Consumer of rendered frames in timeline order
///
/// `push_frame` is called with strictly increasing indices between one
/// `begin` and one `finish`.
pub trait FrameSink: Send {
    fn begin(&mut self, config: SinkConfig) -> Result<()>;

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()>;

    fn finish(&mut self) -> Result<EncodedOutput>;
}

/// Keeps every frame in memory. Used by tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    config: Option<SinkConfig>,
    frames: Vec<Frame>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.config.as_ref()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, config: SinkConfig) -> Result<()> {
        self.config = Some(config);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        let config = self.config.as_ref().ok_or_else(|| VideoError::EncodingFailed {
            reason: "sink not started".to_string(),
        })?;
        if index != self.frames.len() {
            return Err(VideoError::EncodingFailed {
                reason: format!("frame {} pushed out of order", index),
            }.into());
        }
        if frame.size() != (config.width, config.height) {
            return Err(VideoError::FrameSizeMismatch {
                got: frame.size(),
                expected: (config.width, config.height),
            }.into());
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<EncodedOutput> {
        self.finished = true;
        Ok(EncodedOutput {
            bytes: Vec::new(),
            frame_count: self.frames.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SinkConfig {
        SinkConfig { width: 4, height: 2, fps: 24.0, audio: None }
    }

    #[test]
    fn test_records_frames_in_order() {
        let mut sink = InMemorySink::new();
        sink.begin(config()).unwrap();
        sink.push_frame(0, &Frame::new_black(4, 2)).unwrap();
        sink.push_frame(1, &Frame::new_black(4, 2)).unwrap();

        let output = sink.finish().unwrap();
        assert_eq!(output.frame_count, 2);
        assert!(output.bytes.is_empty());
        assert!(sink.is_finished());
    }

    #[test]
    fn test_rejects_wrong_size() {
        let mut sink = InMemorySink::new();
        sink.begin(config()).unwrap();
        assert!(sink.push_frame(0, &Frame::new_black(2, 2)).is_err());
    }

    #[test]
    fn test_rejects_out_of_order() {
        let mut sink = InMemorySink::new();
        sink.begin(config()).unwrap();
        assert!(sink.push_frame(3, &Frame::new_black(4, 2)).is_err());
    }
}
