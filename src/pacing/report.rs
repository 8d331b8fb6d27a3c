//! Timing statistics shown on the diagnostic pause screen

use std::fmt;

/// Counters the render callback exposes about its last rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderCounters {
    /// Time spent in the display sink (conversion + blit)
    pub backend_ms: u32,
    /// Rasterization plus backend time
    pub full_render_ms: u32,
    /// Primitives drawn
    pub triangles: u32,
}

/// Snapshot taken when the loop enters the diagnostic pause
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    /// Running clock reading, pauses excluded
    pub total_elapsed_ms: u64,
    pub counters: RenderCounters,
    /// Wall time of the last batch
    pub batch_ms: u64,
    /// Displayed frames per second
    pub fps_physical: f32,
    /// Frames per second counting skipped frames
    pub fps_virtual: f32,
    pub frames_skipped: u32,
}

impl DiagnosticReport {
    pub fn new(total_elapsed_ms: u64, batch_ms: u64, frames_skipped: u32, counters: RenderCounters) -> Self {
        // a batch faster than the clock resolution still counts as 1 ms
        let fps_physical = 1000.0 / batch_ms.max(1) as f32;
        Self {
            total_elapsed_ms,
            counters,
            batch_ms,
            fps_physical,
            fps_virtual: fps_physical * (frames_skipped + 1) as f32,
            frames_skipped,
        }
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total elapsed (ms): {}", self.total_elapsed_ms)?;
        writeln!(f, "Backend gfx time (ms): {}", self.counters.backend_ms)?;
        writeln!(f, "Front + backend gfx time (ms): {}", self.counters.full_render_ms)?;
        writeln!(f, "Total frame time (ms): {}", self.batch_ms)?;
        writeln!(f, "FPS, physical: {:.2}", self.fps_physical)?;
        writeln!(f, "FPS, virtual: {:.2} (includes skipped frames)", self.fps_virtual)?;
        writeln!(f, "Tris this frame: {}", self.counters.triangles)?;
        write!(f, "Frames skipped: {}", self.frames_skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_math() {
        let report = DiagnosticReport::new(5_000, 50, 2, RenderCounters::default());
        assert_eq!(report.fps_physical, 20.0);
        assert_eq!(report.fps_virtual, 60.0);
    }

    #[test]
    fn test_zero_length_batch() {
        let report = DiagnosticReport::new(0, 0, 0, RenderCounters::default());
        assert_eq!(report.fps_physical, 1000.0);
        assert!(report.fps_virtual.is_finite());
    }

    #[test]
    fn test_display_lists_every_stat() {
        let counters = RenderCounters { backend_ms: 3, full_render_ms: 21, triangles: 12 };
        let text = DiagnosticReport::new(1_234, 40, 1, counters).to_string();
        assert!(text.contains("Total elapsed (ms): 1234"));
        assert!(text.contains("Backend gfx time (ms): 3"));
        assert!(text.contains("Front + backend gfx time (ms): 21"));
        assert!(text.contains("FPS, physical: 25.00"));
        assert!(text.contains("FPS, virtual: 50.00"));
        assert!(text.contains("Tris this frame: 12"));
        assert!(text.ends_with("Frames skipped: 1"));
    }
}
