//! # Composition Engine
//!
//! Runs one render job end to end: images and audio in, encoded video out.

pub mod engine;

// Re-exports for convenience
pub use engine::{CompositionEngine, RenderInput, RenderOutput};
