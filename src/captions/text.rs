use std::path::Path;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle, WrapStyle};
use fontdue::{Font, FontSettings};
use image::{ImageBuffer, Rgba};
use tracing::debug;

use crate::config::CaptionConfig;
use crate::error::{CaptionError, Result};
use crate::video::Frame;

/// Rasterizes caption strings into padded, outlined RGBA bitmaps
pub struct CaptionRenderer {
    font: Font,
    style: CaptionConfig,
}

impl CaptionRenderer {
    /// Load the configured caption font
    pub fn load(style: &CaptionConfig) -> Result<Self> {
        let path = style.font_path.as_deref().ok_or_else(|| CaptionError::FontUnavailable {
            reason: "no caption font configured".to_string(),
        })?;
        let font = load_font(path)?;
        debug!("Loaded caption font {:?}", path);

        Ok(Self { font, style: style.clone() })
    }

    /// Render `text` no wider than `max_width` pixels (padding included)
    pub fn render(&self, text: &str, max_width: u32) -> Result<Frame> {
        if text.trim().is_empty() {
            return Err(CaptionError::EmptyText.into());
        }
        if let Some(ch) = text
            .chars()
            .find(|c| !c.is_whitespace() && !c.is_control() && self.font.lookup_glyph_index(*c) == 0)
        {
            return Err(CaptionError::UnsupportedGlyph { ch }.into());
        }

        let stroke = self.style.stroke_width;
        let (margin_x, margin_y) = self.style.margin;
        let wrap_width = max_width.saturating_sub(2 * (margin_x + stroke)).max(1) as f32;

        let coverage = self.layout_coverage(text, wrap_width);
        let coverage = coverage.padded(stroke);
        let outline = coverage.dilated(stroke);

        let width = coverage.width + 2 * margin_x;
        let height = coverage.height + 2 * margin_y;
        let fill = self.style.fill;
        let stroke_color = self.style.stroke;

        let buffer = ImageBuffer::from_fn(width, height, |x, y| {
            if x < margin_x || y < margin_y || x >= margin_x + coverage.width || y >= margin_y + coverage.height {
                return Rgba([0, 0, 0, 0]);
            }
            let (mx, my) = (x - margin_x, y - margin_y);
            blend_fill_over_stroke(
                fill,
                coverage.get(mx, my),
                stroke_color,
                outline.get(mx, my),
            )
        });

        Ok(Frame::new(buffer))
    }

    fn layout_coverage(&self, text: &str, wrap_width: f32) -> Coverage {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            max_width: Some(wrap_width),
            wrap_style: WrapStyle::Word,
            ..LayoutSettings::default()
        });
        layout.append(&[&self.font], &TextStyle::new(text, self.style.font_size, 0));

        let glyphs = layout.glyphs();
        let inked = || glyphs.iter().filter(|g| g.width > 0 && g.height > 0);

        let left = inked().map(|g| g.x.floor()).fold(0.0f32, f32::min);
        let right = inked().map(|g| g.x + g.width as f32).fold(0.0f32, f32::max);
        let top = inked().map(|g| g.y.floor()).fold(0.0f32, f32::min);
        let bottom = inked().map(|g| g.y + g.height as f32).fold(layout.height(), f32::max);

        let mut coverage = Coverage::new(
            (right - left).ceil().max(1.0) as u32,
            (bottom - top).ceil().max(1.0) as u32,
        );

        for glyph in inked() {
            let (metrics, bitmap) = self.font.rasterize_config(glyph.key);
            let ox = (glyph.x - left).round() as i64;
            let oy = (glyph.y - top).round() as i64;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    coverage.max_at(ox + col as i64, oy + row as i64, bitmap[row * metrics.width + col]);
                }
            }
        }

        coverage
    }
}

/// Load a TrueType/OpenType font file
pub fn load_font(path: &Path) -> Result<Font> {
    let bytes = std::fs::read(path).map_err(|e| CaptionError::FontUnavailable {
        reason: format!("{}: {}", path.display(), e),
    })?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| CaptionError::FontUnavailable {
            reason: format!("{}: {}", path.display(), e),
        }.into())
}

fn blend_fill_over_stroke(fill: [u8; 3], fill_alpha: u8, stroke: [u8; 3], stroke_alpha: u8) -> Rgba<u8> {
    let f = fill_alpha as f32 / 255.0;
    let s = stroke_alpha as f32 / 255.0;
    let alpha = f + s * (1.0 - f);
    if alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |i: usize| {
        let value = (fill[i] as f32 * f + stroke[i] as f32 * s * (1.0 - f)) / alpha;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([channel(0), channel(1), channel(2), (alpha * 255.0).round() as u8])
}

/// Single-channel glyph coverage mask
struct Coverage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Coverage {
    fn new(width: u32, height: u32) -> Self {
        Self { width, height, data: vec![0; (width * height) as usize] }
    }

    fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    fn max_at(&mut self, x: i64, y: i64, value: u8) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = (y as u32 * self.width + x as u32) as usize;
        self.data[idx] = self.data[idx].max(value);
    }

    /// Grow the mask by `pad` empty pixels on every side
    fn padded(&self, pad: u32) -> Self {
        let mut out = Self::new(self.width + 2 * pad, self.height + 2 * pad);
        for y in 0..self.height {
            for x in 0..self.width {
                out.data[((y + pad) * out.width + x + pad) as usize] = self.get(x, y);
            }
        }
        out
    }

    /// Max filter over a disc of `radius`, giving the outline mask
    fn dilated(&self, radius: u32) -> Self {
        if radius == 0 {
            return Self::new(self.width, self.height);
        }
        let r = radius as i64;
        let mut out = Self::new(self.width, self.height);
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let mut best = 0u8;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if dx * dx + dy * dy > r * r {
                            continue;
                        }
                        let (sx, sy) = (x + dx, y + dy);
                        if sx < 0 || sy < 0 || sx >= self.width as i64 || sy >= self.height as i64 {
                            continue;
                        }
                        best = best.max(self.get(sx as u32, sy as u32));
                    }
                }
                out.data[(y as u32 * self.width + x as u32) as usize] = best;
            }
        }
        out
    }
}
