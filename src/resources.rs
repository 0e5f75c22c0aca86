//! # Render Job Resources
//!
//! Every clip and audio track a job builds is registered with the job's
//! [`ResourceTracker`] when it is constructed and released when it is dropped.
//! The [`JobScope`] owns the job's private working directory and is the first
//! thing a job creates, so it is the last thing dropped on every exit path.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, trace, warn};

use crate::error::Result;

/// Kind of renderable resource a handle stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Background,
    Foreground,
    ZoomLayer,
    Caption,
    Fade,
    Composite,
    Timeline,
    AudioTrack,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Background => "background",
            Self::Foreground => "foreground",
            Self::ZoomLayer => "zoom-layer",
            Self::Caption => "caption",
            Self::Fade => "fade",
            Self::Composite => "composite",
            Self::Timeline => "timeline",
            Self::AudioTrack => "audio-track",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Default)]
struct Counters {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

/// Counts live renderable resources for one job
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    counters: Arc<Counters>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new resource. It stays live until the handle is dropped.
    pub fn acquire(&self, kind: ResourceKind) -> ResourceHandle {
        let id = self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        trace!("acquired {} #{}", kind, id);
        ResourceHandle {
            kind,
            id,
            counters: Arc::clone(&self.counters),
        }
    }

    /// Total handles ever issued
    pub fn acquired(&self) -> usize {
        self.counters.acquired.load(Ordering::SeqCst)
    }

    /// Total handles released
    pub fn released(&self) -> usize {
        self.counters.released.load(Ordering::SeqCst)
    }

    /// Handles currently outstanding
    pub fn live(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }
}

/// Registration of one clip or audio track with its job's tracker
#[derive(Debug)]
pub struct ResourceHandle {
    kind: ResourceKind,
    id: usize,
    counters: Arc<Counters>,
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, Ordering::SeqCst);
        trace!("released {} #{}", self.kind, self.id);
    }
}

/// Drop `items` last to first, so later clips go before the ones they follow
pub fn release_in_reverse<T>(items: &mut Vec<T>) {
    while let Some(item) = items.pop() {
        drop(item);
    }
}

/// Disposal scope for a single render job
///
/// Owns the job's working directory and its tracker. Dropping the scope
/// removes the directory exactly once; a failed removal is logged and never
/// surfaced to the caller.
pub struct JobScope {
    tracker: ResourceTracker,
    workdir: Option<TempDir>,
}

impl JobScope {
    /// Open a scope with a fresh working directory
    pub fn open(tracker: ResourceTracker) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("vlog-job-")
            .tempdir()?;
        debug!("Opened job working area {:?}", workdir.path());

        Ok(Self {
            tracker,
            workdir: Some(workdir),
        })
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// The job's private working directory
    pub fn workdir(&self) -> &Path {
        // Only `close` takes the directory, and it consumes the scope.
        self.workdir
            .as_ref()
            .map(|dir| dir.path())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Close the scope now instead of waiting for drop
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dir) = self.workdir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!("Removed job working area {:?}", path),
                Err(e) => warn!("Failed to remove job working area {:?}: {}", path, e),
            }
        }

        let live = self.tracker.live();
        if live > 0 {
            warn!("{} renderable resources still live at job exit", live);
        } else {
            debug!("All {} renderable resources released", self.tracker.acquired());
        }
    }
}

impl Drop for JobScope {
    fn drop(&mut self) {
        self.release();
    }
}
