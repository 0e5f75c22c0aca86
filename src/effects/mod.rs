//! # Motion Effects
//!
//! Chooses how each image is animated and builds the resulting clip.
//!
//! - [`selector`] classifies an image into an [`EffectPlan`] by aspect ratio
//! - [`motion`] holds the pure cover, crop, zoom and fade functions of time
//! - [`builder`] turns a plan into a canvas-sized [`Clip`](crate::video::Clip)

pub mod builder;
pub mod motion;
pub mod selector;

pub use builder::MotionClipBuilder;
pub use motion::{CropWindow, ZoomCurve};
pub use selector::{BackgroundParams, EffectPlan, EffectSelector, ForegroundParams};
