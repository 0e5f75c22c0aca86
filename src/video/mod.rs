//! # Video
//!
//! Frames, clips and the path from a finished timeline to encoded bytes.
//!
//! Per-image clips are joined by the [`SequenceAssembler`] into a
//! [`Timeline`], which the [`Renderer`] samples at the output frame rate and
//! streams into a [`FrameSink`]. [`FfmpegSink`] is the production sink.

pub mod clip;
pub mod ffmpeg;
pub mod frame;
pub mod renderer;
pub mod sequence;
pub mod sink;

pub use clip::{Clip, CompositeClip, FadeIn, Position, StillClip, ZoomClip};
pub use ffmpeg::{FfmpegOptions, FfmpegSink};
pub use frame::Frame;
pub use renderer::Renderer;
pub use sequence::{SequenceAssembler, Timeline, Transition};
pub use sink::{AudioInput, EncodedOutput, FrameSink, InMemorySink, SinkConfig};
