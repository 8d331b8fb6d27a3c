//! Adaptive frameskip loop
//!
//! Each tick converts the clock into virtual frames and runs the frame
//! callback once per elapsed frame, up to `max_skip` display-less frames
//! followed by one full render. The simulation always advances one virtual
//! frame per invocation, so it keeps pace with wall time even when display
//! updates are dropped.

use super::clock::{Clock, PausableClock};
use super::frame_clock::{FrameClock, FrameKind, PacingConfig};
use super::report::{DiagnosticReport, RenderCounters};

/// Render-one-frame callback
pub trait FrameRunner {
    /// Run one simulation frame. `FrameKind::Skip` must bypass the display
    /// update.
    fn run_frame(&mut self, kind: FrameKind);

    /// Stats about the last rendered frame
    fn counters(&self) -> RenderCounters {
        RenderCounters::default()
    }
}

impl<F: FnMut(FrameKind)> FrameRunner for F {
    fn run_frame(&mut self, kind: FrameKind) {
        self(kind)
    }
}

/// Operator signals polled by the loop
pub trait LoopControl {
    /// Checked after every frame invocation
    fn cancel_requested(&mut self) -> bool;

    /// Checked after every batch
    fn diagnostic_requested(&mut self) -> bool;

    /// Present the pause-screen statistics
    fn report(&mut self, report: &DiagnosticReport);

    /// Polled while paused, true resumes the loop
    fn acknowledged(&mut self) -> bool;

    /// Called by `FramePacer::run` when a tick had nothing to do
    fn idle(&mut self) {
        std::thread::yield_now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerState {
    Running,
    /// Diagnostic snapshot, clock frozen
    Paused,
    Terminated,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No virtual frame elapsed
    Idle,
    /// A batch ran to completion
    Batch { virtual_frame: u64, skipped: u32 },
    /// Entered or still in the diagnostic pause
    Paused,
    Resumed,
    Terminated,
}

/// Frame pacing scheduler.
///
/// Owns the pausable clock and the virtual frame counters; independent
/// instances do not share state.
pub struct FramePacer<C> {
    clock: PausableClock<C>,
    frames: FrameClock,
    state: PacerState,
    last_report: Option<DiagnosticReport>,
}

impl<C: Clock> FramePacer<C> {
    /// Start pacing. The clock reads zero from this point.
    pub fn new(source: C, config: PacingConfig) -> Self {
        let frames = FrameClock::new(config);
        log::debug!(
            "frame pacer: period={}ms max_skip={}",
            frames.frame_period_ms(),
            frames.max_skip()
        );
        Self {
            clock: PausableClock::new(source),
            frames,
            state: PacerState::Running,
            last_report: None,
        }
    }

    pub fn state(&self) -> PacerState {
        self.state
    }

    pub fn frames(&self) -> &FrameClock {
        &self.frames
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Report from the most recent diagnostic pause
    pub fn last_report(&self) -> Option<&DiagnosticReport> {
        self.last_report.as_ref()
    }

    /// Advance the loop by one step
    pub fn tick<R, L>(&mut self, runner: &mut R, control: &mut L) -> TickOutcome
    where
        R: FrameRunner + ?Sized,
        L: LoopControl + ?Sized,
    {
        match self.state {
            PacerState::Terminated => return TickOutcome::Terminated,
            PacerState::Paused => {
                if !control.acknowledged() {
                    return TickOutcome::Paused;
                }
                self.clock.resume();
                self.state = PacerState::Running;
                log::info!("resumed at {} ms (paused {} ms total)", self.clock.now_ms(), self.clock.paused_ms());
                return TickOutcome::Resumed;
            }
            PacerState::Running => {}
        }

        let batch_start = self.clock.now_ms();
        let Some(batch) = self.frames.poll(batch_start) else {
            return TickOutcome::Idle;
        };
        if batch.dropped() > 0 {
            log::trace!("frame {}: dropping {} frames", batch.virtual_frame, batch.dropped());
        }

        for kind in batch.kinds() {
            runner.run_frame(kind);
            if control.cancel_requested() {
                log::info!("cancelled at virtual frame {}", batch.virtual_frame);
                self.state = PacerState::Terminated;
                return TickOutcome::Terminated;
            }
        }
        self.frames.commit(&batch);

        if control.diagnostic_requested() {
            self.clock.pause();
            let report = DiagnosticReport::new(
                self.clock.now_ms(),
                self.clock.now_ms().saturating_sub(batch_start),
                batch.to_skip,
                runner.counters(),
            );
            log::debug!("diagnostic pause at virtual frame {}", batch.virtual_frame);
            control.report(&report);
            self.last_report = Some(report);
            self.state = PacerState::Paused;
            return TickOutcome::Paused;
        }

        TickOutcome::Batch {
            virtual_frame: batch.virtual_frame,
            skipped: batch.to_skip,
        }
    }

    /// Tick until cancelled, idling between empty ticks and while paused
    pub fn run<R, L>(&mut self, runner: &mut R, control: &mut L)
    where
        R: FrameRunner + ?Sized,
        L: LoopControl + ?Sized,
    {
        loop {
            match self.tick(runner, control) {
                TickOutcome::Terminated => return,
                TickOutcome::Idle | TickOutcome::Paused => control.idle(),
                TickOutcome::Batch { .. } | TickOutcome::Resumed => {}
            }
        }
    }
}
