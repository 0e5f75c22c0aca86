//! # Captions
//!
//! Rasterizes caption text and overlays it, fading in, near the bottom of a
//! per-image clip. Caption problems degrade to an uncaptioned clip.

pub mod compositor;
pub mod text;

pub use compositor::{caption_top, parse_caption_list, CaptionCompositor, CaptionSpec};
pub use text::CaptionRenderer;
