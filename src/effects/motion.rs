//! Pure geometry and time functions behind the motion effects.
//!
//! Nothing here holds state: every function maps sizes and elapsed seconds to
//! a scale, a size, a crop window, or an opacity.

/// Scale that makes an image cover the canvas.
///
/// Fits the height first; if the scaled width still falls short of the canvas
/// width, fits the width instead.
pub fn cover_scale(image: (u32, u32), canvas: (u32, u32)) -> f64 {
    let by_height = canvas.1 as f64 / image.1 as f64;
    if (image.0 as f64 * by_height).round() < canvas.0 as f64 {
        canvas.0 as f64 / image.0 as f64
    } else {
        by_height
    }
}

/// Image size after [`cover_scale`], never smaller than the canvas
pub fn cover_size(image: (u32, u32), canvas: (u32, u32)) -> (u32, u32) {
    let scale = cover_scale(image, canvas);
    (
        scaled(image.0, scale).max(canvas.0),
        scaled(image.1, scale).max(canvas.1),
    )
}

/// Smallest uniform scale at which the image covers the canvas on both axes
pub fn full_coverage_scale(image: (u32, u32), canvas: (u32, u32)) -> f64 {
    (canvas.0 as f64 / image.0 as f64).max(canvas.1 as f64 / image.1 as f64)
}

/// Axis-aligned crop rectangle in source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Canvas-sized window around the center of a `size` image
pub fn center_crop_window(size: (u32, u32), canvas: (u32, u32)) -> CropWindow {
    let width = canvas.0.min(size.0);
    let height = canvas.1.min(size.1);
    CropWindow {
        x: (size.0 - width) / 2,
        y: (size.1 - height) / 2,
        width,
        height,
    }
}

/// Linear zoom: `scale(t) = scale_start * (1 + rate * t)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomCurve {
    pub scale_start: f64,
    pub rate: f64,
}

impl ZoomCurve {
    pub fn new(scale_start: f64, rate: f64) -> Self {
        Self { scale_start, rate }
    }

    /// Scale relative to the source image `t` seconds into the clip
    pub fn scale_at(&self, t: f64) -> f64 {
        self.scale_start * (1.0 + self.rate * t)
    }

    /// Pixel size of a `source`-sized image at time `t`
    pub fn size_at(&self, source: (u32, u32), t: f64) -> (u32, u32) {
        let scale = self.scale_at(t);
        (scaled(source.0, scale), scaled(source.1, scale))
    }
}

/// Opacity of a fade-in `t` seconds after the clip starts
pub fn fade_in_opacity(t: f64, fade: f64) -> f32 {
    if fade <= 0.0 {
        return 1.0;
    }
    (t / fade).clamp(0.0, 1.0) as f32
}

fn scaled(length: u32, scale: f64) -> u32 {
    ((length as f64 * scale).round() as u32).max(1)
}
