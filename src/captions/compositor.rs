use tracing::{debug, warn};

use crate::captions::text::CaptionRenderer;
use crate::config::CaptionConfig;
use crate::error::Result;
use crate::resources::{ResourceKind, ResourceTracker};
use crate::video::clip::{Clip, CompositeClip, FadeIn, Position, StillClip};

/// One realized caption for one image clip
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionSpec {
    pub text: String,
    /// Index of the image the caption belongs to
    pub index: usize,
    /// Equal to the host clip's duration
    pub duration: f64,
    /// Top edge as a fraction of canvas height
    pub vertical_anchor: f64,
    pub fade_in: f64,
}

/// Parse a caption list sent as a JSON array.
///
/// Malformed input yields no captions rather than an error. Non-string
/// entries keep their slot so later captions stay aligned with their images.
pub fn parse_caption_list(raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => values
            .into_iter()
            .map(|value| match value {
                serde_json::Value::String(text) => text,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect(),
        Err(e) => {
            warn!("Ignoring malformed caption list: {}", e);
            Vec::new()
        }
    }
}

/// Overlays fading captions onto per-image clips
///
/// Caption failures never abort a job: the host clip is returned unchanged.
pub struct CaptionCompositor {
    canvas: (u32, u32),
    style: CaptionConfig,
    renderer: Option<CaptionRenderer>,
    unavailable_reason: Option<String>,
    tracker: ResourceTracker,
}

impl CaptionCompositor {
    pub fn new(canvas: (u32, u32), style: CaptionConfig, tracker: ResourceTracker) -> Self {
        let (renderer, unavailable_reason) = match CaptionRenderer::load(&style) {
            Ok(renderer) => (Some(renderer), None),
            Err(e) => (None, Some(e.to_string())),
        };

        Self {
            canvas,
            style,
            renderer,
            unavailable_reason,
            tracker,
        }
    }

    /// Whether captions can be drawn at all
    pub fn is_available(&self) -> bool {
        self.renderer.is_some()
    }

    /// Caption for image `index`, if the list has one
    pub fn spec_for(&self, index: usize, captions: &[String], host_duration: f64) -> Option<CaptionSpec> {
        captions.get(index).map(|text| CaptionSpec {
            text: text.clone(),
            index,
            duration: host_duration,
            vertical_anchor: self.style.vertical_anchor,
            fade_in: self.style.fade_in,
        })
    }

    /// Return `host` with its caption composited on top, or `host` unchanged
    /// when there is no caption for `index` or the caption cannot be drawn.
    pub fn apply(&self, host: Box<dyn Clip>, index: usize, captions: &[String]) -> Box<dyn Clip> {
        let Some(spec) = self.spec_for(index, captions, host.duration()) else {
            return host;
        };

        match self.caption_layer(&spec) {
            Ok((layer, top)) => {
                debug!("Caption for image {} placed at y={}", index, top);
                let composite = CompositeClip::new(self.canvas, spec.duration, &self.tracker)
                    .with_layer(host, Position::Center)
                    .with_layer(layer, Position::CenterHorizontal { y: top });
                Box::new(composite)
            }
            Err(e) => {
                warn!("Skipping caption for image {}: {}", index, e);
                host
            }
        }
    }

    fn caption_layer(&self, spec: &CaptionSpec) -> Result<(Box<dyn Clip>, i64)> {
        let renderer = match &self.renderer {
            Some(renderer) => renderer,
            None => {
                return Err(crate::error::CaptionError::FontUnavailable {
                    reason: self.unavailable_reason.clone().unwrap_or_default(),
                }.into());
            }
        };

        let bitmap = renderer.render(&spec.text, self.canvas.0)?;
        let top = caption_top(self.canvas.1, bitmap.height(), spec.vertical_anchor);

        let text = StillClip::new(bitmap, spec.duration, ResourceKind::Caption, &self.tracker);
        let faded = FadeIn::new(Box::new(text), spec.fade_in, &self.tracker);
        Ok((Box::new(faded), top))
    }
}

/// Top edge of a caption anchored at `anchor` of the canvas height, pulled up
/// so the whole layer stays on screen
pub fn caption_top(canvas_height: u32, layer_height: u32, anchor: f64) -> i64 {
    let anchored = (canvas_height as f64 * anchor).round() as i64;
    let lowest = canvas_height as i64 - layer_height as i64;
    anchored.min(lowest).max(0)
}
