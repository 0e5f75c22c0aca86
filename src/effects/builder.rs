use tracing::debug;

use crate::assets::ImageAsset;
use crate::config::MotionConfig;
use crate::effects::motion::{center_crop_window, ZoomCurve};
use crate::effects::selector::{BackgroundParams, EffectPlan, ForegroundParams};
use crate::error::Result;
use crate::resources::{ResourceKind, ResourceTracker};
use crate::video::clip::{Clip, CompositeClip, FadeIn, Position, StillClip, ZoomClip};

/// Builds the animated clip for one image from its [`EffectPlan`]
pub struct MotionClipBuilder {
    canvas: (u32, u32),
    motion: MotionConfig,
    tracker: ResourceTracker,
}

impl MotionClipBuilder {
    pub fn new(canvas: (u32, u32), motion: MotionConfig, tracker: ResourceTracker) -> Self {
        Self { canvas, motion, tracker }
    }

    /// Build the canvas-sized clip, crossfading in at its own start
    pub fn build(&self, asset: &ImageAsset, plan: &EffectPlan) -> Result<Box<dyn Clip>> {
        let duration = self.motion.image_duration;

        let composite = match *plan {
            EffectPlan::PortraitComposite(background, foreground) => {
                self.portrait_composite(asset, background, foreground)
            }
            EffectPlan::LandscapeZoomCrop { scale_start, zoom_rate } => {
                let layer = ZoomClip::new(
                    asset,
                    ZoomCurve::new(scale_start, zoom_rate),
                    duration,
                    ResourceKind::ZoomLayer,
                    &self.tracker,
                )
                .clipped_to(self.canvas);
                CompositeClip::new(self.canvas, duration, &self.tracker)
                    .with_layer(Box::new(layer), Position::Center)
            }
        };

        debug!(
            "Built {} clip for '{}' ({:.1}s, crossfade {:.1}s)",
            plan.name(), asset.name(), duration, self.motion.crossfade_duration
        );

        Ok(Box::new(FadeIn::new(
            Box::new(composite),
            self.motion.crossfade_duration,
            &self.tracker,
        )))
    }

    fn portrait_composite(
        &self,
        asset: &ImageAsset,
        background: BackgroundParams,
        foreground: ForegroundParams,
    ) -> CompositeClip {
        let duration = self.motion.image_duration;

        let (cover_w, cover_h) = background.cover_size;
        let window = center_crop_window(background.cover_size, self.canvas);
        let mut backdrop = asset
            .resized(cover_w, cover_h)
            .cropped(window.x, window.y, window.width, window.height);
        backdrop.multiply_color(background.dim);
        let backdrop = StillClip::new(backdrop, duration, ResourceKind::Background, &self.tracker);

        let subject = ZoomClip::new(
            asset,
            ZoomCurve::new(foreground.base_scale, foreground.zoom_rate),
            duration,
            ResourceKind::Foreground,
            &self.tracker,
        )
        .clipped_to(self.canvas);

        CompositeClip::new(self.canvas, duration, &self.tracker)
            .with_layer(Box::new(backdrop), Position::Center)
            .with_layer(Box::new(subject), Position::Center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::selector::EffectSelector;
    use image::{Rgba, RgbaImage};

    const CANVAS: (u32, u32) = (64, 36);

    fn asset(width: u32, height: u32, color: [u8; 4]) -> ImageAsset {
        ImageAsset::from_rgba("test", RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
    }

    fn build(image: &ImageAsset, tracker: &ResourceTracker) -> Box<dyn Clip> {
        let motion = MotionConfig::default();
        let plan = EffectSelector::new(CANVAS, motion.clone()).select(image);
        MotionClipBuilder::new(CANVAS, motion, tracker.clone())
            .build(image, &plan)
            .unwrap()
    }

    #[test]
    fn test_landscape_clip_fills_canvas() {
        let tracker = ResourceTracker::new();
        let clip = build(&asset(192, 108, [0, 200, 0, 255]), &tracker);

        assert_eq!(clip.duration(), 3.0);
        assert_eq!(clip.size(), CANVAS);
        assert_eq!(clip.fade_in(), 0.5);

        let frame = clip.frame_at(2.0).unwrap();
        assert_eq!(frame.size(), CANVAS);
        // Fully faded in and the zoomed layer covers every corner
        assert_eq!(frame.get_pixel(0, 0), [0, 200, 0, 255]);
        assert_eq!(frame.get_pixel(63, 35), [0, 200, 0, 255]);
    }

    #[test]
    fn test_portrait_clip_has_dimmed_background() {
        let tracker = ResourceTracker::new();
        let clip = build(&asset(108, 192, [200, 100, 50, 255]), &tracker);

        let frame = clip.frame_at(1.0).unwrap();
        assert_eq!(frame.size(), CANVAS);
        // Corner shows the darkened backdrop, center the full-brightness subject
        assert_eq!(frame.get_pixel(0, 0), [60, 30, 15, 255]);
        assert_eq!(frame.get_pixel(32, 18), [200, 100, 50, 255]);
    }

    #[test]
    fn test_first_frame_is_transparent() {
        let tracker = ResourceTracker::new();
        let clip = build(&asset(192, 108, [255, 255, 255, 255]), &tracker);
        assert_eq!(clip.frame_at(0.0).unwrap().get_pixel(10, 10)[3], 0);
    }

    #[test]
    fn test_built_clip_registers_every_layer() {
        let tracker = ResourceTracker::new();
        let clip = build(&asset(108, 192, [1, 2, 3, 255]), &tracker);
        // background + foreground + composite + fade
        assert_eq!(tracker.live(), 4);
        drop(clip);
        assert_eq!(tracker.live(), 0);
    }
}
