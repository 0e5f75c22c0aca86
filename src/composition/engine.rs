use tracing::{debug, info, info_span};
use uuid::Uuid;

use crate::{
    assets::{ImageAsset, ImageSource},
    audio::{AlignmentPolicy, AudioAligner, AudioLoader, AudioSource, AudioTrack},
    captions::CaptionCompositor,
    config::Config,
    effects::{EffectSelector, MotionClipBuilder},
    error::{AssetError, Result},
    resources::{JobScope, ResourceTracker},
    video::{
        Clip, FfmpegOptions, FfmpegSink, Frame, FrameSink, Renderer, SequenceAssembler, Timeline,
        Transition,
    },
};

/// File name of the encoded container inside the job's working area
const OUTPUT_FILE: &str = "output.mp4";

/// Everything one render job consumes
#[derive(Debug, Clone)]
pub struct RenderInput {
    /// Images in playback order
    pub images: Vec<ImageSource>,
    pub audio: AudioSource,
    /// Caption `i` belongs to image `i`; extra entries are ignored
    pub captions: Vec<String>,
}

/// Result of a finished render job
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Encoded container bytes
    pub video: Vec<u8>,
    /// Timeline duration in seconds
    pub duration: f64,
    pub frame_count: usize,
    pub transitions: Vec<Transition>,
    pub audio_policy: AlignmentPolicy,
}

/// Orchestrates one image-and-audio to video job
///
/// The pipeline:
/// 1. Decode images and audio
/// 2. Select and build a motion clip per image, adding its caption
/// 3. Sequence the clips into one timeline
/// 4. Fit the audio to the timeline
/// 5. Render and encode
///
/// Every job runs inside a [`JobScope`]; clips and audio tracks are dropped
/// before the scope, on success and on failure alike.
pub struct CompositionEngine {
    config: Config,
}

impl CompositionEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Render `input` to an encoded video with the system ffmpeg
    pub fn render(&self, input: &RenderInput) -> Result<RenderOutput> {
        let scope = JobScope::open(ResourceTracker::new())?;
        let out_path = scope.workdir().join(OUTPUT_FILE);
        let mut sink = FfmpegSink::new(FfmpegOptions::from_config(&self.config.output, out_path));

        self.run_job(input, &scope, &mut sink)
    }

    /// Render `input` into a caller-supplied sink, counting resources on `tracker`
    pub fn render_with_sink(
        &self,
        input: &RenderInput,
        sink: &mut dyn FrameSink,
        tracker: &ResourceTracker,
    ) -> Result<RenderOutput> {
        let scope = JobScope::open(tracker.clone())?;
        self.run_job(input, &scope, sink)
    }

    /// Render the single timeline frame at `t` seconds. Needs no audio.
    pub fn preview_frame(&self, images: &[ImageSource], captions: &[String], t: f64) -> Result<Frame> {
        self.config.validate()?;
        let scope = JobScope::open(ResourceTracker::new())?;

        let timeline = self.build_timeline(images, captions, scope.tracker())?;
        let frame = timeline.frame_at(t.clamp(0.0, timeline.duration()))?;
        debug!("Preview frame at {:.2}s of {:.2}s", t, timeline.duration());
        Ok(frame)
    }

    fn run_job(&self, input: &RenderInput, scope: &JobScope, sink: &mut dyn FrameSink) -> Result<RenderOutput> {
        let span = info_span!("render_job", job = %Uuid::new_v4());
        let _enter = span.enter();

        self.config.validate()?;
        info!("🎬 Starting render job");
        info!("   Images: {}", input.images.len());
        info!("   Captions: {}", input.captions.len());
        info!("   Audio: {}", input.audio.name);

        let tracker = scope.tracker();

        // Audio problems are fatal, so surface them before any frame work
        let audio_data = AudioLoader::decode(&input.audio)?;
        info!(
            "🎵 Loaded audio: {:.1}s, {} Hz, {} channels",
            audio_data.duration, audio_data.sample_rate, audio_data.channels
        );

        let timeline = self.build_timeline(&input.images, &input.captions, tracker)?;

        let track = AudioTrack::new(audio_data, timeline.duration(), tracker);
        let aligned = AudioAligner::new(tracker.clone()).align(&track)?;

        info!("📼 Rendering {:.1}s timeline", timeline.duration());
        let renderer = Renderer::new(self.config.output.clone());
        let encoded = renderer.render(&timeline, &aligned, scope.workdir(), sink)?;

        info!("🎉 Render job complete: {} frames", encoded.frame_count);
        Ok(RenderOutput {
            video: encoded.bytes,
            duration: timeline.duration(),
            frame_count: encoded.frame_count,
            transitions: timeline.transitions(),
            audio_policy: aligned.policy,
        })
    }

    /// Decode the images and turn them into one captioned, crossfaded timeline
    fn build_timeline(
        &self,
        images: &[ImageSource],
        captions: &[String],
        tracker: &ResourceTracker,
    ) -> Result<Timeline> {
        if images.is_empty() {
            return Err(AssetError::NoImages.into());
        }

        let canvas = self.config.output.canvas();
        let selector = EffectSelector::new(canvas, self.config.motion.clone());
        let builder = MotionClipBuilder::new(canvas, self.config.motion.clone(), tracker.clone());
        let caption_compositor = CaptionCompositor::new(canvas, self.config.caption.clone(), tracker.clone());

        if !captions.is_empty() && !caption_compositor.is_available() {
            info!("Caption font unavailable; captions will be skipped");
        }

        // One decoded source alive at a time; each clip keeps only its working copy
        let mut clips: Vec<Box<dyn Clip>> = Vec::with_capacity(images.len());
        for (index, source) in images.iter().enumerate() {
            let asset = ImageAsset::decode(source)?;
            let plan = selector.select(&asset);
            debug!(
                "Image {} '{}' ({}x{}, ratio {:.3}) -> {}",
                index, asset.name(), asset.width(), asset.height(), asset.aspect_ratio(), plan.name()
            );

            let clip = builder.build(&asset, &plan)?;
            clips.push(caption_compositor.apply(clip, index, captions));
        }

        SequenceAssembler::new(canvas, tracker.clone()).assemble(clips)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::loader::tests::wav_bytes;
    use crate::captions::text::tests::system_font;
    use crate::config::{CaptionConfig, OutputConfig};
    use crate::error::{CompositorError, VideoError};
    use crate::video::{EncodedOutput, InMemorySink, SinkConfig};
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn small_config() -> Config {
        Config {
            output: OutputConfig { width: 32, height: 18, fps: 4.0, ..OutputConfig::default() },
            ..Config::default()
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 120, 255])
        });
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png).unwrap();
        bytes
    }

    fn input(images: &[(u32, u32)], audio_seconds: f64, captions: &[&str]) -> RenderInput {
        RenderInput {
            images: images
                .iter()
                .enumerate()
                .map(|(i, &(w, h))| ImageSource::new(format!("image_{}.png", i), png(w, h)))
                .collect(),
            audio: AudioSource::new("track.wav", wav_bytes(audio_seconds, 8000)),
            captions: captions.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Accepts `fail_at` frames, then reports an encoder failure
    struct FailingSink {
        fail_at: usize,
    }

    impl FrameSink for FailingSink {
        fn begin(&mut self, _config: SinkConfig) -> Result<()> {
            Ok(())
        }

        fn push_frame(&mut self, index: usize, _frame: &Frame) -> Result<()> {
            if index >= self.fail_at {
                return Err(VideoError::EncodingFailed { reason: "disk full".to_string() }.into());
            }
            Ok(())
        }

        fn finish(&mut self) -> Result<EncodedOutput> {
            Ok(EncodedOutput::default())
        }
    }

    fn captioned_config() -> Config {
        let mut config = small_config();
        config.output.width = 160;
        config.output.height = 90;
        config.caption = CaptionConfig {
            font_path: system_font(),
            font_size: 20.0,
            margin: (4, 4),
            stroke_width: 1,
            ..CaptionConfig::default()
        };
        config
    }

    #[test]
    fn test_three_landscape_images_trim_long_audio() {
        let config = captioned_config();
        let has_font = config.caption.font_path.is_some();
        let engine = CompositionEngine::new(config.clone());
        let tracker = ResourceTracker::new();
        let mut sink = InMemorySink::new();

        let job = input(&[(1920, 1080); 3], 10.0, &["a", "b", "c"]);
        let output = engine.render_with_sink(&job, &mut sink, &tracker).unwrap();

        assert_eq!(output.duration, 9.0);
        assert_eq!(output.frame_count, 36);
        assert_eq!(output.audio_policy, AlignmentPolicy::Trim);
        assert_eq!(
            output.transitions,
            vec![
                Transition { start: 0.0, duration: 0.5 },
                Transition { start: 3.0, duration: 0.5 },
                Transition { start: 6.0, duration: 0.5 },
            ]
        );
        assert_eq!(sink.config().and_then(|c| c.audio.as_ref()).map(|a| a.duration), Some(9.0));

        // First frame fades in from black
        assert_eq!(sink.frames()[0].get_pixel(80, 45), [0, 0, 0, 255]);
        assert_eq!(tracker.live(), 0);
        assert!(tracker.acquired() > 0);

        if !has_font {
            return;
        }
        // Same job without captions, to isolate the caption pixels
        let mut plain = InMemorySink::new();
        let uncaptioned = input(&[(1920, 1080); 3], 10.0, &[]);
        CompositionEngine::new(config)
            .render_with_sink(&uncaptioned, &mut plain, &ResourceTracker::new())
            .unwrap();

        // Middle of each image's span, well past both fades
        for index in [8, 20, 32] {
            let captioned = &sink.frames()[index];
            let bare = &plain.frames()[index];
            let differs = |rows: std::ops::Range<u32>| {
                rows.flat_map(|y| (0..160).map(move |x| (x, y)))
                    .filter(|&(x, y)| captioned.get_pixel(x, y) != bare.get_pixel(x, y))
                    .count()
            };
            assert_eq!(differs(0..45), 0, "frame {} changed above the caption", index);
            assert!(differs(45..90) > 0, "frame {} has no caption pixels", index);
        }
    }

    #[test]
    fn test_single_portrait_image_loops_short_audio() {
        let engine = CompositionEngine::new(small_config());
        let tracker = ResourceTracker::new();
        let mut sink = InMemorySink::new();

        let output = engine
            .render_with_sink(&input(&[(108, 192)], 2.0, &[]), &mut sink, &tracker)
            .unwrap();

        assert_eq!(output.duration, 3.0);
        assert_eq!(output.frame_count, 12);
        assert_eq!(output.audio_policy, AlignmentPolicy::Loop);
        assert!(sink.frames().iter().all(|f| f.size() == (32, 18)));
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_extra_captions_do_not_fail() {
        let engine = CompositionEngine::new(small_config());
        let tracker = ResourceTracker::new();
        let mut sink = InMemorySink::new();

        let job = input(&[(64, 64)], 3.0, &["", "", "", "", "", "sixth"]);
        let output = engine.render_with_sink(&job, &mut sink, &tracker).unwrap();
        assert_eq!(output.duration, 3.0);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_duration_ignores_captions() {
        let engine = CompositionEngine::new(small_config());
        let images = [(40, 30); 5];

        let with = engine
            .render_with_sink(&input(&images, 1.0, &["x"; 5]), &mut InMemorySink::new(), &ResourceTracker::new())
            .unwrap();
        let without = engine
            .render_with_sink(&input(&images, 1.0, &[]), &mut InMemorySink::new(), &ResourceTracker::new())
            .unwrap();

        assert_eq!(with.duration, 15.0);
        assert_eq!(without.duration, 15.0);
    }

    #[test]
    fn test_failed_encode_releases_everything() {
        let engine = CompositionEngine::new(small_config());
        let tracker = ResourceTracker::new();
        let mut sink = FailingSink { fail_at: 5 };

        let result = engine.render_with_sink(&input(&[(1920, 1080), (100, 200)], 1.0, &["a"]), &mut sink, &tracker);

        assert!(matches!(result, Err(CompositorError::Video(VideoError::EncodingFailed { .. }))));
        assert!(tracker.acquired() > 0);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_bad_image_is_fatal_and_clean() {
        let engine = CompositionEngine::new(small_config());
        let tracker = ResourceTracker::new();
        let mut job = input(&[(64, 36)], 3.0, &[]);
        job.images.push(ImageSource::new("broken.png", b"not an image".to_vec()));

        let result = engine.render_with_sink(&job, &mut InMemorySink::new(), &tracker);
        assert!(matches!(result, Err(CompositorError::Asset(AssetError::DecodeFailed { .. }))));
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn test_empty_audio_is_fatal() {
        let engine = CompositionEngine::new(small_config());
        let mut job = input(&[(64, 36)], 3.0, &[]);
        job.audio = AudioSource::new("empty.wav", Vec::new());

        let result = engine.render_with_sink(&job, &mut InMemorySink::new(), &ResourceTracker::new());
        assert!(result.unwrap_err().is_fatal());
    }

    #[test]
    fn test_no_images_is_fatal() {
        let engine = CompositionEngine::new(small_config());
        let mut job = input(&[], 3.0, &[]);
        job.images.clear();

        let result = engine.render_with_sink(&job, &mut InMemorySink::new(), &ResourceTracker::new());
        assert!(matches!(result, Err(CompositorError::Asset(AssetError::NoImages))));
    }

    #[test]
    fn test_preview_frame_needs_no_audio() {
        let engine = CompositionEngine::new(small_config());
        let images = vec![
            ImageSource::new("wide.png", png(64, 36)),
            ImageSource::new("tall.png", png(36, 64)),
        ];

        let frame = engine.preview_frame(&images, &[], 4.5).unwrap();
        assert_eq!(frame.size(), (32, 18));
        assert_eq!(frame.get_pixel(0, 0)[3], 255);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.output.width = 31;
        let engine = CompositionEngine::new(config);

        let result = engine.render_with_sink(&input(&[(64, 36)], 3.0, &[]), &mut InMemorySink::new(), &ResourceTracker::new());
        assert!(matches!(result, Err(CompositorError::Config(_))));
    }
}
