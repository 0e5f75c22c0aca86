//! # Vlog-Compositor
//!
//! Turn an ordered set of still images and a soundtrack into a video.
//!
//! Each image gets a motion effect chosen from its shape: wide images zoom
//! slowly with the canvas cropping the overflow, while square and portrait
//! images float over a dimmed, canvas-filling copy of themselves. Every clip
//! crossfades in, optional captions fade in near the bottom, and the audio is
//! looped or trimmed to the exact video length.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vlog_compositor::{
//!     assets::ImageSource,
//!     audio::AudioSource,
//!     composition::{CompositionEngine, RenderInput},
//!     config::Config,
//! };
//!
//! # fn main() -> vlog_compositor::Result<()> {
//! let input = RenderInput {
//!     images: ImageSource::from_directory("photos/")?,
//!     audio: AudioSource::from_path("song.mp3")?,
//!     captions: vec!["Day one".to_string(), "The coast".to_string()],
//! };
//!
//! let engine = CompositionEngine::new(Config::default());
//! let output = engine.render(&input)?;
//! std::fs::write("vlog.mp4", &output.video)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`assets`] - Input image decoding
//! - [`effects`] - Effect selection and per-image motion clips
//! - [`captions`] - Caption rasterizing and overlay
//! - [`video`] - Frames, clips, sequencing, rendering and encoding
//! - [`audio`] - Audio decoding and alignment
//! - [`resources`] - Per-job resource tracking and cleanup
//! - [`composition`] - The render job pipeline
//! - [`config`] - Configuration management

pub mod assets;
pub mod audio;
pub mod captions;
pub mod composition;
pub mod config;
pub mod effects;
pub mod error;
pub mod resources;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{CompositionEngine, RenderInput, RenderOutput},
    config::Config,
    error::{CompositorError, Result},
};
