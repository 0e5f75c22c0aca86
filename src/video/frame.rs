use image::{imageops, ImageBuffer, Rgba, RgbaImage};
use image::imageops::FilterType;

/// Represents a single video frame
///
/// A thin wrapper around an RGBA image buffer. Layers carry straight alpha;
/// the timeline flattens everything onto an opaque canvas before encoding.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbaImage,
}

impl Frame {
    /// Create a new frame from an RGBA image buffer
    pub fn new(buffer: RgbaImage) -> Self {
        Self { buffer }
    }

    /// Create an opaque black frame
    pub fn new_black(width: u32, height: u32) -> Self {
        Self::new_filled(width, height, [0, 0, 0, 255])
    }

    /// Create a fully transparent frame
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgba(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Get a pixel at the given coordinates
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.buffer.get_pixel(x, y).0
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Resize to exactly `width` x `height`
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.size() == (width, height) {
            return self.clone();
        }
        Frame::new(imageops::resize(&self.buffer, width.max(1), height.max(1), FilterType::Triangle))
    }

    /// Copy out a `width` x `height` window whose top-left corner is `(x, y)`
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> Frame {
        Frame::new(imageops::crop_imm(&self.buffer, x, y, width, height).to_image())
    }

    /// Multiply the color channels, leaving alpha untouched
    pub fn multiply_color(&mut self, factor: f32) {
        for pixel in self.buffer.pixels_mut() {
            for channel in &mut pixel.0[..3] {
                *channel = (*channel as f32 * factor).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    /// Multiply the alpha channel (used by fades)
    pub fn multiply_alpha(&mut self, factor: f32) {
        if factor >= 1.0 {
            return;
        }
        let factor = factor.max(0.0);
        for pixel in self.buffer.pixels_mut() {
            pixel.0[3] = (pixel.0[3] as f32 * factor).round() as u8;
        }
    }

    /// Alpha-blend `top` over this frame with its top-left corner at `(x, y)`.
    /// Parts of `top` outside this frame are clipped.
    pub fn overlay(&mut self, top: &Frame, x: i64, y: i64) {
        imageops::overlay(&mut self.buffer, &top.buffer, x, y);
    }

    /// Alpha-blend `top` centered over this frame
    pub fn overlay_centered(&mut self, top: &Frame) {
        let (x, y) = centered_offset(self.size(), top.size());
        self.overlay(top, x, y);
    }

    /// Convert the frame to packed RGB bytes, dropping alpha
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity((self.width() * self.height() * 3) as usize);
        for pixel in self.buffer.pixels() {
            out.extend_from_slice(&pixel.0[..3]);
        }
        out
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save_with_format(path, image::ImageFormat::Png)
    }
}

/// Top-left offset that centers a `layer`-sized box on a `canvas`-sized one.
/// Negative when the layer is larger than the canvas.
pub fn centered_offset(canvas: (u32, u32), layer: (u32, u32)) -> (i64, i64) {
    (
        (canvas.0 as i64 - layer.0 as i64) / 2,
        (canvas.1 as i64 - layer.1 as i64) / 2,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiply_color_keeps_alpha() {
        let mut frame = Frame::new_filled(2, 2, [200, 100, 50, 255]);
        frame.multiply_color(0.3);
        assert_eq!(frame.get_pixel(0, 0), [60, 30, 15, 255]);
    }

    #[test]
    fn test_overlay_clips_oversized_layer() {
        let mut canvas = Frame::new_black(4, 4);
        let layer = Frame::new_filled(8, 8, [255, 255, 255, 255]);
        canvas.overlay_centered(&layer);
        assert_eq!(canvas.get_pixel(0, 0), [255, 255, 255, 255]);
        assert_eq!(canvas.get_pixel(3, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_transparent_overlay_leaves_canvas() {
        let mut canvas = Frame::new_black(4, 4);
        let mut layer = Frame::new_filled(4, 4, [255, 255, 255, 255]);
        layer.multiply_alpha(0.0);
        canvas.overlay_centered(&layer);
        assert_eq!(canvas.get_pixel(1, 1), [0, 0, 0, 255]);
    }

    #[test]
    fn test_centered_offset() {
        assert_eq!(centered_offset((1280, 720), (648, 648)), (316, 36));
        assert_eq!(centered_offset((1280, 720), (1360, 765)), (-40, -22));
    }

    #[test]
    fn test_rgb_bytes_len() {
        let frame = Frame::new_black(3, 2);
        assert_eq!(frame.to_rgb_bytes().len(), 18);
    }
}
