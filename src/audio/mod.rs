//! # Audio
//!
//! Decodes the job's soundtrack and fits it to the video duration.
//!
//! ```rust,no_run
//! use vlog_compositor::audio::{AudioAligner, AudioLoader, AudioTrack};
//! use vlog_compositor::resources::ResourceTracker;
//!
//! # fn main() -> vlog_compositor::Result<()> {
//! let tracker = ResourceTracker::new();
//! let data = AudioLoader::load("song.mp3")?;
//!
//! // Three images at three seconds each
//! let track = AudioTrack::new(data, 9.0, &tracker);
//! let aligned = AudioAligner::new(tracker.clone()).align(&track)?;
//! assert_eq!(aligned.duration, 9.0);
//! # Ok(())
//! # }
//! ```

pub mod aligner;
pub mod loader;
pub mod types;

pub use aligner::AudioAligner;
pub use loader::AudioLoader;
pub use types::{AlignedAudio, AlignmentPolicy, AudioData, AudioFormat, AudioSource, AudioTrack};
