use tracing::{debug, info};

use crate::error::{CompositionError, Result};
use crate::resources::{release_in_reverse, ResourceHandle, ResourceKind, ResourceTracker};
use crate::video::clip::Clip;
use crate::video::frame::Frame;

/// A crossfade into the clip starting at `start`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub start: f64,
    pub duration: f64,
}

struct TimelineEntry {
    start: f64,
    clip: Box<dyn Clip>,
}

impl TimelineEntry {
    fn end(&self) -> f64 {
        self.start + self.clip.duration()
    }
}

/// Per-image clips played back to back
///
/// Each clip keeps its own span and size. Crossfades happen inside a clip's
/// span, over opaque black, so the total duration is the plain sum.
pub struct Timeline {
    canvas: (u32, u32),
    entries: Vec<TimelineEntry>,
    duration: f64,
    _handle: ResourceHandle,
}

impl Timeline {
    /// Start times of every clip, in order
    pub fn starts(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.start).collect()
    }

    /// One crossfade-in per clip, including the first
    pub fn transitions(&self) -> Vec<Transition> {
        self.entries
            .iter()
            .filter(|e| e.clip.fade_in() > 0.0)
            .map(|e| Transition { start: e.start, duration: e.clip.fade_in() })
            .collect()
    }

    fn entry_at(&self, t: f64) -> Option<&TimelineEntry> {
        self.entries
            .iter()
            .find(|e| t < e.end())
            .or_else(|| self.entries.last())
    }
}

impl Clip for Timeline {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn size(&self) -> (u32, u32) {
        self.canvas
    }

    fn frame_at(&self, t: f64) -> Result<Frame> {
        let t = t.clamp(0.0, self.duration);
        let mut canvas = Frame::new_black(self.canvas.0, self.canvas.1);

        if let Some(entry) = self.entry_at(t) {
            let local = (t - entry.start).clamp(0.0, entry.clip.duration());
            canvas.overlay_centered(&entry.clip.frame_at(local)?);
        }

        Ok(canvas)
    }

    fn fade_in(&self) -> f64 {
        self.entries.first().map(|e| e.clip.fade_in()).unwrap_or(0.0)
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        release_in_reverse(&mut self.entries);
    }
}

/// Joins per-image clips into one [`Timeline`]
pub struct SequenceAssembler {
    canvas: (u32, u32),
    tracker: ResourceTracker,
}

impl SequenceAssembler {
    pub fn new(canvas: (u32, u32), tracker: ResourceTracker) -> Self {
        Self { canvas, tracker }
    }

    /// Concatenate `clips` in order, without rescaling or overlapping them
    pub fn assemble(&self, clips: Vec<Box<dyn Clip>>) -> Result<Timeline> {
        if clips.is_empty() {
            return Err(CompositionError::SequencingFailed {
                reason: "no clips to sequence".to_string(),
            }.into());
        }

        let mut entries = Vec::with_capacity(clips.len());
        let mut cursor = 0.0;

        for (index, clip) in clips.into_iter().enumerate() {
            if clip.size() != self.canvas {
                release_in_reverse(&mut entries);
                return Err(CompositionError::SequencingFailed {
                    reason: format!(
                        "clip {} is {:?}, timeline canvas is {:?}",
                        index, clip.size(), self.canvas
                    ),
                }.into());
            }
            debug!("Clip {} at {:.2}s for {:.2}s", index, cursor, clip.duration());
            let duration = clip.duration();
            entries.push(TimelineEntry { start: cursor, clip });
            cursor += duration;
        }

        info!("Sequenced {} clips into {:.2}s timeline", entries.len(), cursor);

        Ok(Timeline {
            canvas: self.canvas,
            entries,
            duration: cursor,
            _handle: self.tracker.acquire(ResourceKind::Timeline),
        })
    }
}
