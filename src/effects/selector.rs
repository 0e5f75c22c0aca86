use crate::assets::ImageAsset;
use crate::config::MotionConfig;
use crate::effects::motion::{cover_size, full_coverage_scale};

/// Parameters for the darkened, canvas-filling background layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundParams {
    /// Size the image is scaled to before the center crop
    pub cover_size: (u32, u32),
    /// Uniform color multiplier
    pub dim: f32,
}

/// Parameters for the centered, slowly zooming foreground layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForegroundParams {
    /// Scale relative to the source image at `t = 0`
    pub base_scale: f64,
    /// Zoom growth per second
    pub zoom_rate: f64,
}

/// How one image is animated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectPlan {
    /// Blurred-style background composite for portrait and near-square images
    PortraitComposite(BackgroundParams, ForegroundParams),
    /// Ken Burns zoom with the canvas clipping the overflow
    LandscapeZoomCrop { scale_start: f64, zoom_rate: f64 },
}

impl EffectPlan {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PortraitComposite(..) => "portrait-composite",
            Self::LandscapeZoomCrop { .. } => "landscape-zoom-crop",
        }
    }
}

/// True when an image of `aspect_ratio` gets the background composite
pub fn is_portrait_like(aspect_ratio: f64, threshold: f64) -> bool {
    aspect_ratio < threshold
}

/// Picks an [`EffectPlan`] from an image's geometry
#[derive(Debug, Clone)]
pub struct EffectSelector {
    canvas: (u32, u32),
    motion: MotionConfig,
}

impl EffectSelector {
    pub fn new(canvas: (u32, u32), motion: MotionConfig) -> Self {
        Self { canvas, motion }
    }

    pub fn select(&self, asset: &ImageAsset) -> EffectPlan {
        let image = (asset.width(), asset.height());

        if is_portrait_like(asset.aspect_ratio(), self.motion.portrait_threshold) {
            let foreground_height = self.canvas.1 as f64 * self.motion.foreground_height_ratio;
            EffectPlan::PortraitComposite(
                BackgroundParams {
                    cover_size: cover_size(image, self.canvas),
                    dim: self.motion.background_dim,
                },
                ForegroundParams {
                    base_scale: foreground_height / image.1 as f64,
                    zoom_rate: self.motion.foreground_zoom_rate,
                },
            )
        } else {
            EffectPlan::LandscapeZoomCrop {
                scale_start: full_coverage_scale(image, self.canvas),
                zoom_rate: self.motion.landscape_zoom_rate,
            }
        }
    }
}
