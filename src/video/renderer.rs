use std::path::Path;

use tracing::{debug, info};

use crate::audio::AlignedAudio;
use crate::config::OutputConfig;
use crate::error::{CompositionError, Result};
use crate::video::clip::Clip;
use crate::video::sequence::Timeline;
use crate::video::sink::{AudioInput, EncodedOutput, FrameSink, SinkConfig};

/// File name of the aligned soundtrack inside the job's working area
pub const ALIGNED_AUDIO_FILE: &str = "aligned_audio.wav";

/// Number of frames rendered for `duration` seconds at `fps`
pub fn frame_count(duration: f64, fps: f64) -> usize {
    (duration * fps).round().max(0.0) as usize
}

/// Drives a timeline frame by frame into a [`FrameSink`] with its audio
pub struct Renderer {
    output: OutputConfig,
}

impl Renderer {
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Render every frame of `timeline` and mux `audio` under it.
    ///
    /// Frame `i` samples the timeline at `i / fps`. The aligned audio is
    /// written into `workdir` for the sink to pick up.
    pub fn render(
        &self,
        timeline: &Timeline,
        audio: &AlignedAudio,
        workdir: &Path,
        sink: &mut dyn FrameSink,
    ) -> Result<EncodedOutput> {
        let canvas = self.output.canvas();
        if timeline.size() != canvas {
            return Err(CompositionError::OutputFailed {
                reason: format!("timeline is {:?}, output is {:?}", timeline.size(), canvas),
            }.into());
        }

        let audio_path = workdir.join(ALIGNED_AUDIO_FILE);
        audio.write_wav(&audio_path)?;
        debug!("Wrote aligned audio to {:?}", audio_path);

        let fps = self.output.fps;
        let frames = frame_count(timeline.duration(), fps);
        info!(
            "Rendering {} frames ({}x{} @ {} fps, {:.2}s)",
            frames, canvas.0, canvas.1, fps, timeline.duration()
        );

        sink.begin(SinkConfig {
            width: canvas.0,
            height: canvas.1,
            fps,
            audio: Some(AudioInput {
                path: audio_path,
                duration: audio.duration,
            }),
        })?;

        let progress_step = (fps.round() as usize).max(1) * 5;
        for index in 0..frames {
            let frame = timeline.frame_at(index as f64 / fps)?;
            sink.push_frame(index, &frame)?;

            if (index + 1) % progress_step == 0 {
                debug!("Rendered {}/{} frames", index + 1, frames);
            }
        }

        let encoded = sink.finish()?;
        info!("Render finished: {} frames", encoded.frame_count);
        Ok(encoded)
    }
}
