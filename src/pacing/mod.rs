//! Fixed-rate frame pacing with bounded frameskip

mod clock;
mod frame_clock;
mod report;
mod scheduler;

pub use clock::{self_test, Clock, ClockCheck, PausableClock, SystemClock};
pub use frame_clock::{Batch, FrameClock, FrameKind, PacingConfig};
pub use report::{DiagnosticReport, RenderCounters};
pub use scheduler::{FramePacer, FrameRunner, LoopControl, PacerState, TickOutcome};
