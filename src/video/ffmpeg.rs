use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::error::{Result, VideoError};
use crate::video::frame::Frame;
use crate::video::sink::{EncodedOutput, FrameSink, SinkConfig};

/// Encoder settings for [`FfmpegSink`]
#[derive(Debug, Clone)]
pub struct FfmpegOptions {
    /// Container file written by ffmpeg
    pub out_path: PathBuf,
    pub video_codec: String,
    pub audio_codec: String,
    pub crf: u8,
    pub audio_sample_rate: u32,
}

impl FfmpegOptions {
    pub fn from_config(output: &OutputConfig, out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            video_codec: output.video_codec.clone(),
            audio_codec: output.audio_codec.clone(),
            crf: quality_to_crf(output.quality),
            audio_sample_rate: output.audio_sample_rate,
        }
    }
}

/// Map a 0-100 quality setting onto the x264 CRF scale (lower is better)
pub fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

/// Streams raw frames into a system `ffmpeg` process
///
/// Frames go over stdin as packed rgb24; the aligned audio is read from the
/// WAV file named in [`SinkConfig::audio`]. Once encoding succeeds the
/// container is read back into memory.
pub struct FfmpegSink {
    options: FfmpegOptions,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    config: Option<SinkConfig>,
    frames_written: usize,
}

impl FfmpegSink {
    pub fn new(options: FfmpegOptions) -> Self {
        Self {
            options,
            child: None,
            stdin: None,
            stderr_drain: None,
            config: None,
            frames_written: 0,
        }
    }

    /// Whether an `ffmpeg` binary can be run
    pub fn is_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn command(&self, config: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel", "error",
            "-f", "rawvideo",
            "-pix_fmt", "rgb24",
            "-s", &format!("{}x{}", config.width, config.height),
            "-r", &config.fps.to_string(),
            "-i", "pipe:0",
        ]);

        if let Some(audio) = &config.audio {
            cmd.arg("-i").arg(&audio.path);
        }

        cmd.args([
            "-c:v", &self.options.video_codec,
            "-pix_fmt", "yuv420p",
            "-crf", &self.options.crf.to_string(),
        ]);

        match &config.audio {
            Some(audio) => {
                cmd.args([
                    "-c:a", &self.options.audio_codec,
                    "-ar", &self.options.audio_sample_rate.to_string(),
                    "-t", &format!("{:.6}", audio.duration),
                ]);
            }
            None => {
                cmd.arg("-an");
            }
        }

        cmd.args(["-movflags", "+faststart"]);
        cmd.arg(&self.options.out_path);
        cmd
    }

    fn join_stderr(&mut self) -> String {
        match self.stderr_drain.take().map(|handle| handle.join()) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            Some(Ok(Err(e))) => format!("failed to read ffmpeg stderr: {}", e),
            Some(Err(_)) => "ffmpeg stderr reader panicked".to_string(),
            None => String::new(),
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, config: SinkConfig) -> Result<()> {
        if config.width % 2 != 0 || config.height % 2 != 0 {
            return Err(VideoError::EncodingFailed {
                reason: format!("yuv420p needs even dimensions, got {}x{}", config.width, config.height),
            }.into());
        }
        if !Self::is_available() {
            return Err(VideoError::EncoderUnavailable {
                reason: "ffmpeg not found on PATH".to_string(),
            }.into());
        }

        let mut child = self.command(&config).spawn().map_err(|e| VideoError::EncoderUnavailable {
            reason: format!("failed to spawn ffmpeg: {}", e),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "ffmpeg stdin unavailable".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "ffmpeg stderr unavailable".to_string(),
        })?;
        // ffmpeg blocks once its stderr pipe fills, so drain it off-thread
        self.stderr_drain = Some(std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        }));

        debug!(
            "Started ffmpeg ({} / {}, crf {}) writing {:?}",
            self.options.video_codec, self.options.audio_codec, self.options.crf, self.options.out_path
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.config = Some(config);
        self.frames_written = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        let config = self.config.as_ref().ok_or_else(|| VideoError::EncodingFailed {
            reason: "ffmpeg sink not started".to_string(),
        })?;
        if index != self.frames_written {
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

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodingFailed {
            reason: "ffmpeg sink already finished".to_string(),
        })?;
        if let Err(e) = stdin.write_all(&frame.to_rgb_bytes()) {
            let stderr = self.join_stderr();
            return Err(VideoError::EncodingFailed {
                reason: format!("failed to write frame {} to ffmpeg: {} {}", index, e, stderr),
            }.into());
        }

        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<EncodedOutput> {
        drop(self.stdin.take());
        let mut child = self.child.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "ffmpeg sink not started".to_string(),
        })?;

        let status = child.wait().map_err(|e| VideoError::EncodingFailed {
            reason: format!("failed to wait for ffmpeg: {}", e),
        })?;
        let stderr = self.join_stderr();

        if !status.success() {
            return Err(VideoError::EncodingFailed {
                reason: format!("ffmpeg exited with {}: {}", status, stderr),
            }.into());
        }

        let bytes = std::fs::read(&self.options.out_path)?;
        info!(
            "Encoded {} frames into {} KB",
            self.frames_written,
            bytes.len() / 1024
        );

        Ok(EncodedOutput {
            bytes,
            frame_count: self.frames_written,
        })
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            warn!("Stopping unfinished ffmpeg process");
            if let Err(e) = child.kill() {
                debug!("ffmpeg already exited: {}", e);
            }
            let _ = child.wait();
        }
        let _ = self.join_stderr();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_to_crf() {
        assert_eq!(quality_to_crf(100), 0);
        assert_eq!(quality_to_crf(85), 8);
        assert_eq!(quality_to_crf(0), 51);
        assert_eq!(quality_to_crf(250), 0);
    }

    #[test]
    fn test_command_carries_codecs_and_audio() {
        let output = OutputConfig::default();
        let sink = FfmpegSink::new(FfmpegOptions::from_config(&output, "/tmp/out.mp4"));
        let config = SinkConfig {
            width: 1280,
            height: 720,
            fps: 24.0,
            audio: Some(crate::video::sink::AudioInput {
                path: PathBuf::from("/tmp/audio.wav"),
                duration: 9.0,
            }),
        };

        let cmd = sink.command(&config);
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        let joined = args.join(" ");
        assert!(joined.contains("-s 1280x720"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-c:a aac"));
        assert!(joined.contains("-i /tmp/audio.wav"));
        assert!(joined.contains("-t 9.000000"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        let mut sink = FfmpegSink::new(FfmpegOptions::from_config(&OutputConfig::default(), "/tmp/x.mp4"));
        let result = sink.begin(SinkConfig { width: 3, height: 2, fps: 24.0, audio: None });
        assert!(result.is_err());
    }

    #[test]
    fn test_encodes_when_ffmpeg_present() {
        if !FfmpegSink::is_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("clip.mp4");
        let mut sink = FfmpegSink::new(FfmpegOptions::from_config(&OutputConfig::default(), &out));

        sink.begin(SinkConfig { width: 16, height: 16, fps: 4.0, audio: None }).unwrap();
        for i in 0..4 {
            sink.push_frame(i, &Frame::new_filled(16, 16, [200, 10, 10, 255])).unwrap();
        }
        let encoded = sink.finish().unwrap();
        assert_eq!(encoded.frame_count, 4);
        assert!(!encoded.bytes.is_empty());
    }
}
