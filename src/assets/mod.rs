//! # Image Assets
//!
//! Decodes the job's input images into immutable RGBA buffers.

pub mod image_asset;

pub use image_asset::{ImageAsset, ImageSource};
