//! Virtual frame bookkeeping and the frameskip decision

use serde::{Serialize, Deserialize};

/// Pacing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Length of one virtual frame (33 ms ~ 30 fps)
    pub frame_period_ms: u32,
    /// Upper bound on frames simulated without display per batch
    pub max_skip: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            frame_period_ms: 33,
            max_skip: 2,
        }
    }
}

/// How a single frame invocation should be treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Advance the simulation, bypass the draw-to-display step
    Skip,
    /// Advance and present
    Render,
}

impl FrameKind {
    pub fn skips_display(self) -> bool {
        self == FrameKind::Skip
    }
}

/// Work decided for one tick: `to_skip` skipped frames, then one render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Virtual frame index this batch catches up to
    pub virtual_frame: u64,
    /// Frames elapsed since the last processed frame
    pub new_frames: u64,
    pub to_skip: u32,
}

impl Batch {
    /// Invocations in order: every skip first, the render last
    pub fn kinds(&self) -> impl Iterator<Item = FrameKind> {
        let to_skip = self.to_skip;
        (0..=to_skip).map(move |i| if i < to_skip { FrameKind::Skip } else { FrameKind::Render })
    }

    pub fn invocations(&self) -> u32 {
        self.to_skip + 1
    }

    /// Elapsed frames neither rendered nor simulated
    pub fn dropped(&self) -> u64 {
        self.new_frames.saturating_sub(self.invocations() as u64)
    }
}

/// Virtual frame counters.
///
/// `last_processed_frame` never decreases and never passes
/// `elapsed_virtual_frames`.
#[derive(Debug, Clone)]
pub struct FrameClock {
    elapsed_virtual_frames: u64,
    last_processed_frame: u64,
    frame_period_ms: u32,
    max_skip: u32,
}

impl FrameClock {
    pub fn new(config: PacingConfig) -> Self {
        Self {
            elapsed_virtual_frames: 0,
            last_processed_frame: 0,
            frame_period_ms: config.frame_period_ms.max(1),
            max_skip: config.max_skip,
        }
    }

    pub fn elapsed_virtual_frames(&self) -> u64 {
        self.elapsed_virtual_frames
    }

    pub fn last_processed_frame(&self) -> u64 {
        self.last_processed_frame
    }

    pub fn frame_period_ms(&self) -> u32 {
        self.frame_period_ms
    }

    pub fn max_skip(&self) -> u32 {
        self.max_skip
    }

    /// Update the virtual frame count and return the pending batch, if any
    pub fn poll(&mut self, now_ms: u64) -> Option<Batch> {
        let virtual_now = now_ms / self.frame_period_ms as u64;
        self.elapsed_virtual_frames = self.elapsed_virtual_frames.max(virtual_now);

        let new_frames = self.elapsed_virtual_frames.saturating_sub(self.last_processed_frame);
        if new_frames == 0 {
            return None;
        }

        let to_skip = (new_frames - 1).min(self.max_skip as u64) as u32;
        Some(Batch {
            virtual_frame: self.elapsed_virtual_frames,
            new_frames,
            to_skip,
        })
    }

    /// Mark a batch as handled. Frames beyond `max_skip` are forgotten.
    pub fn commit(&mut self, batch: &Batch) {
        self.last_processed_frame = self.last_processed_frame.max(batch.virtual_frame);
    }
}
