//! Renderable clips.
//!
//! A clip spans a fixed duration on a fixed frame size and renders a [`Frame`]
//! for any local time `t` in `[0, duration]`. Composite clips own their
//! children outright, so a job's clips always form a tree.

use crate::assets::ImageAsset;
use crate::effects::motion::{fade_in_opacity, ZoomCurve};
use crate::error::Result;
use crate::resources::{release_in_reverse, ResourceHandle, ResourceKind, ResourceTracker};
use crate::video::frame::{centered_offset, Frame};

/// Core trait for everything that can be placed on the timeline
pub trait Clip: Send {
    /// Length of the clip in seconds
    fn duration(&self) -> f64;

    /// Frame size produced by [`Clip::frame_at`]
    fn size(&self) -> (u32, u32);

    /// Render the frame `t` seconds into the clip
    fn frame_at(&self, t: f64) -> Result<Frame>;

    /// Length of the fade-in applied at the clip's own start
    fn fade_in(&self) -> f64 {
        0.0
    }
}

fn clamp_time(t: f64, duration: f64) -> f64 {
    t.clamp(0.0, duration.max(0.0))
}

/// A single precomputed image shown for the whole duration
pub struct StillClip {
    frame: Frame,
    duration: f64,
    _handle: ResourceHandle,
}

impl StillClip {
    pub fn new(frame: Frame, duration: f64, kind: ResourceKind, tracker: &ResourceTracker) -> Self {
        Self {
            frame,
            duration,
            _handle: tracker.acquire(kind),
        }
    }
}

impl Clip for StillClip {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn size(&self) -> (u32, u32) {
        self.frame.size()
    }

    fn frame_at(&self, _t: f64) -> Result<Frame> {
        Ok(self.frame.clone())
    }
}

/// An image whose scale follows a [`ZoomCurve`] over time
///
/// The source is downscaled once to the largest size the curve reaches, so
/// per-frame resizes start from a buffer close to the output size. With a
/// viewport, only the part left visible after centering is resized.
pub struct ZoomClip {
    source_size: (u32, u32),
    working: Frame,
    curve: ZoomCurve,
    duration: f64,
    viewport: Option<(u32, u32)>,
    _handle: ResourceHandle,
}

impl ZoomClip {
    pub fn new(
        asset: &ImageAsset,
        curve: ZoomCurve,
        duration: f64,
        kind: ResourceKind,
        tracker: &ResourceTracker,
    ) -> Self {
        let source_size = (asset.width(), asset.height());
        // Zoom rates are non-negative, so the last frame is the largest
        let largest = curve.size_at(source_size, duration);

        let working = if largest.0 < source_size.0 && largest.1 < source_size.1 {
            asset.resized(largest.0, largest.1)
        } else {
            asset.to_frame()
        };

        Self {
            source_size,
            working,
            curve,
            duration,
            viewport: None,
            _handle: tracker.acquire(kind),
        }
    }

    /// Only render what a centered placement on a `viewport`-sized canvas shows
    pub fn clipped_to(mut self, viewport: (u32, u32)) -> Self {
        self.viewport = Some(viewport);
        self
    }
}

/// The slice of one axis that survives centering a zoomed layer on a view
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisWindow {
    /// Range read from the working buffer
    start: u32,
    len: u32,
    /// Length that range is resized to
    scaled: u32,
    /// Where the visible part begins inside the resized range
    offset: u32,
    visible: u32,
}

fn axis_window(zoomed: u32, view: u32, working: u32) -> AxisWindow {
    if zoomed <= view {
        return AxisWindow { start: 0, len: working, scaled: zoomed, offset: 0, visible: zoomed };
    }

    // Working pixels per zoomed pixel
    let k = working as f64 / zoomed as f64;
    let first = ((zoomed - view) / 2) as f64;
    let start = ((first * k).floor() as u32).min(working - 1);
    let end = (((first + view as f64) * k).ceil() as u32).clamp(start + 1, working);
    let scaled = (((end - start) as f64 / k).round() as u32).max(view);
    let offset = ((first - start as f64 / k).round().max(0.0) as u32).min(scaled - view);

    AxisWindow { start, len: end - start, scaled, offset, visible: view }
}

impl Clip for ZoomClip {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn size(&self) -> (u32, u32) {
        let (width, height) = self.curve.size_at(self.source_size, 0.0);
        match self.viewport {
            Some((vw, vh)) => (width.min(vw), height.min(vh)),
            None => (width, height),
        }
    }

    fn frame_at(&self, t: f64) -> Result<Frame> {
        let (width, height) = self.curve.size_at(self.source_size, clamp_time(t, self.duration));
        let Some((vw, vh)) = self.viewport else {
            return Ok(self.working.resized(width, height));
        };

        let (ww, wh) = self.working.size();
        let x = axis_window(width, vw, ww);
        let y = axis_window(height, vh, wh);
        let region = self
            .working
            .cropped(x.start, y.start, x.len, y.len)
            .resized(x.scaled, y.scaled);

        if (x.scaled, y.scaled) == (x.visible, y.visible) {
            return Ok(region);
        }
        Ok(region.cropped(x.offset, y.offset, x.visible, y.visible))
    }
}

/// Fades its child in from transparent over the first `fade` seconds
pub struct FadeIn {
    inner: Box<dyn Clip>,
    fade: f64,
    _handle: ResourceHandle,
}

impl FadeIn {
    pub fn new(inner: Box<dyn Clip>, fade: f64, tracker: &ResourceTracker) -> Self {
        Self {
            inner,
            fade: fade.max(0.0),
            _handle: tracker.acquire(ResourceKind::Fade),
        }
    }
}

impl Clip for FadeIn {
    fn duration(&self) -> f64 {
        self.inner.duration()
    }

    fn size(&self) -> (u32, u32) {
        self.inner.size()
    }

    fn frame_at(&self, t: f64) -> Result<Frame> {
        let mut frame = self.inner.frame_at(t)?;
        frame.multiply_alpha(fade_in_opacity(t, self.fade));
        Ok(frame)
    }

    fn fade_in(&self) -> f64 {
        self.fade
    }
}

/// Where a layer sits on a composite canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position {
    /// Centered on both axes
    Center,
    /// Centered horizontally with the top edge at `y`
    CenterHorizontal { y: i64 },
}

struct Layer {
    clip: Box<dyn Clip>,
    position: Position,
}

/// Stacks layers, first at the bottom, onto a transparent canvas
pub struct CompositeClip {
    size: (u32, u32),
    duration: f64,
    layers: Vec<Layer>,
    _handle: ResourceHandle,
}

impl CompositeClip {
    pub fn new(size: (u32, u32), duration: f64, tracker: &ResourceTracker) -> Self {
        Self {
            size,
            duration,
            layers: Vec::new(),
            _handle: tracker.acquire(ResourceKind::Composite),
        }
    }

    /// Add a layer on top of the existing ones
    pub fn with_layer(mut self, clip: Box<dyn Clip>, position: Position) -> Self {
        self.layers.push(Layer { clip, position });
        self
    }

    fn offset(&self, position: Position, layer_size: (u32, u32)) -> (i64, i64) {
        let (cx, cy) = centered_offset(self.size, layer_size);
        match position {
            Position::Center => (cx, cy),
            Position::CenterHorizontal { y } => (cx, y),
        }
    }
}

impl Clip for CompositeClip {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn frame_at(&self, t: f64) -> Result<Frame> {
        let t = clamp_time(t, self.duration);
        let mut canvas = Frame::new_transparent(self.size.0, self.size.1);

        for layer in &self.layers {
            if t > layer.clip.duration() {
                continue;
            }
            let frame = layer.clip.frame_at(t)?;
            let (x, y) = self.offset(layer.position, frame.size());
            canvas.overlay(&frame, x, y);
        }

        Ok(canvas)
    }

    fn fade_in(&self) -> f64 {
        // A caption composite inherits the transition of the clip it decorates
        self.layers.first().map(|l| l.clip.fade_in()).unwrap_or(0.0)
    }
}

impl Drop for CompositeClip {
    fn drop(&mut self) {
        // Top layer first
        release_in_reverse(&mut self.layers);
    }
}
