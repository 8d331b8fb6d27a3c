//! Application entry: picks headless or windowed mode and drives the pacer
//!
//! Headless mode blocks in `FramePacer::run` until ctrl-c, the frame limit,
//! or a display failure. Windowed mode ticks the pacer once per presented
//! macroquad frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use macroquad::prelude::*;

use crate::config::EngineConfig;
use crate::display::{CaptureSink, DisplayError, DisplaySink, WindowSink, NATIVE_HEIGHT, NATIVE_WIDTH};
use crate::pacing::{self, DiagnosticReport, FramePacer, LoopControl, SystemClock, TickOutcome};
use crate::scene::CubeScene;

pub const NAME: &str = "fixpace";
/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const SELF_TEST_NAP: Duration = Duration::from_millis(100);

const STARTUP_TEXT: &str = "fixpace\n\n\
    Press any key to start\n\
    Esc: quit\n\
    Ctrl: pause with timing stats";

/// Run the configured mode to completion
pub fn run(config: EngineConfig) {
    log::info!("{NAME} v{VERSION}");
    if config.clock_self_test {
        pacing::self_test(&SystemClock::new(), SELF_TEST_NAP);
    }

    if config.headless {
        let cancel = Arc::new(AtomicBool::new(false));
        install_interrupt(cancel.clone());
        match run_headless(&config, cancel) {
            Ok(summary) => log::info!(
                "done: {} virtual frames, {} rendered, {} diagnostic pauses",
                summary.virtual_frames,
                summary.rendered,
                summary.reports
            ),
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        }
    } else {
        let conf = window_conf(&config);
        macroquad::Window::from_config(conf, run_windowed(config));
    }
}

/// Ctrl-c raises `cancel` instead of killing the process
fn install_interrupt(cancel: Arc<AtomicBool>) {
    let result = ctrlc::set_handler(move || {
        cancel.store(true, Ordering::SeqCst);
    });
    if let Err(e) = result {
        log::warn!("ctrl-c handler not installed: {e}");
    }
}

pub fn window_conf(config: &EngineConfig) -> Conf {
    Conf {
        window_title: format!("{NAME} v{VERSION}"),
        window_width: NATIVE_WIDTH as i32 * 3,
        window_height: NATIVE_HEIGHT as i32 * 3,
        window_resizable: true,
        fullscreen: config.fullscreen,
        high_dpi: true,
        ..Default::default()
    }
}

/// Counts from a finished headless run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub virtual_frames: u64,
    pub rendered: u64,
    pub reports: u32,
}

/// Operator signals for the headless loop.
///
/// Cancels on the shared flag or after `max_frames` invocations. Diagnostic
/// pauses (if enabled) are logged and acknowledged on the next poll.
pub struct HeadlessControl {
    cancel: Arc<AtomicBool>,
    max_frames: Option<u64>,
    diagnostic_every: Option<u32>,
    invocations: u64,
    batches: u32,
    reports: u32,
}

impl HeadlessControl {
    pub fn new(cancel: Arc<AtomicBool>, max_frames: Option<u64>, diagnostic_every: Option<u32>) -> Self {
        Self {
            cancel,
            max_frames,
            diagnostic_every,
            invocations: 0,
            batches: 0,
            reports: 0,
        }
    }

    pub fn reports(&self) -> u32 {
        self.reports
    }
}

impl LoopControl for HeadlessControl {
    fn cancel_requested(&mut self) -> bool {
        self.invocations += 1;
        self.cancel.load(Ordering::SeqCst) || self.max_frames.is_some_and(|max| self.invocations >= max)
    }

    fn diagnostic_requested(&mut self) -> bool {
        self.batches += 1;
        self.diagnostic_every.is_some_and(|n| self.batches % n == 0)
    }

    fn report(&mut self, report: &DiagnosticReport) {
        self.reports += 1;
        for line in report.to_string().lines() {
            log::info!("{line}");
        }
    }

    fn acknowledged(&mut self) -> bool {
        true
    }

    fn idle(&mut self) {
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Blocking run into a capture sink
pub fn run_headless(config: &EngineConfig, cancel: Arc<AtomicBool>) -> Result<HeadlessSummary, DisplayError> {
    let mut sink = CaptureSink::new(config.resolution);
    if let Some(dir) = &config.capture_dir {
        sink = sink.with_capture(dir, config.capture_every);
    }
    sink.init(NAME, false)?;

    let mut scene = CubeScene::new(sink).with_abort(cancel.clone());
    let mut control = HeadlessControl::new(cancel, config.max_frames, config.diagnostic_every);
    let mut pacer = FramePacer::new(SystemClock::new(), config.pacing);

    pacer.run(&mut scene, &mut control);
    scene.display_mut().shutdown();

    if let Some(e) = scene.take_error() {
        return Err(e);
    }
    Ok(HeadlessSummary {
        virtual_frames: scene.frame(),
        rendered: scene.rendered(),
        reports: control.reports(),
    })
}

/// Keyboard signals for the windowed loop, sampled once per presented frame
#[derive(Debug, Default)]
struct WindowControl {
    escape: bool,
    ctrl: bool,
    other_key: bool,
    report: Option<String>,
}

impl WindowControl {
    fn poll(&mut self) {
        self.escape = is_key_pressed(KeyCode::Escape);
        self.ctrl = is_key_pressed(KeyCode::LeftControl) || is_key_pressed(KeyCode::RightControl);
        self.other_key = get_keys_pressed().iter().any(|k| {
            !matches!(k, KeyCode::Escape | KeyCode::LeftControl | KeyCode::RightControl)
        });
    }
}

impl LoopControl for WindowControl {
    fn cancel_requested(&mut self) -> bool {
        self.escape || is_quit_requested()
    }

    fn diagnostic_requested(&mut self) -> bool {
        std::mem::take(&mut self.ctrl)
    }

    fn report(&mut self, report: &DiagnosticReport) {
        log::debug!("diagnostic pause:\n{report}");
        self.report = Some(format!("{report}\n\nPress any key to continue"));
    }

    fn acknowledged(&mut self) -> bool {
        std::mem::take(&mut self.other_key)
    }
}

/// Wait on the startup screen. False if the user asked to quit.
async fn startup_screen(sink: &mut WindowSink) -> bool {
    sink.set_overlay(STARTUP_TEXT);
    loop {
        sink.present_last();
        if is_key_pressed(KeyCode::Escape) || is_quit_requested() {
            return false;
        }
        if get_last_key_pressed().is_some() {
            sink.clear_overlay();
            return true;
        }
        next_frame().await;
    }
}

pub async fn run_windowed(config: EngineConfig) {
    prevent_quit();

    let mut sink = WindowSink::new(config.resolution);
    if let Err(e) = sink.init(NAME, config.fullscreen) {
        log::error!("{e}");
        std::process::exit(1);
    }
    if !startup_screen(&mut sink).await {
        sink.shutdown();
        return;
    }
    next_frame().await;

    let mut scene = CubeScene::new(sink);
    let mut control = WindowControl::default();
    let mut pacer = FramePacer::new(SystemClock::new(), config.pacing);

    loop {
        control.poll();
        match pacer.tick(&mut scene, &mut control) {
            TickOutcome::Terminated => break,
            TickOutcome::Paused if control.escape => break,
            TickOutcome::Batch { .. } => {}
            TickOutcome::Resumed => {
                scene.display_mut().clear_overlay();
                scene.display_mut().present_last();
            }
            TickOutcome::Idle | TickOutcome::Paused => {
                if let Some(text) = control.report.take() {
                    scene.display_mut().set_overlay(&text);
                }
                scene.display_mut().present_last();
            }
        }
        if let Some(e) = scene.take_error() {
            log::error!("{e}");
            std::process::exit(1);
        }
        next_frame().await;
    }

    scene.display_mut().shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::ResolutionMode;
    use crate::pacing::RenderCounters;

    #[test]
    fn test_headless_control_frame_limit() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut control = HeadlessControl::new(cancel, Some(3), None);
        assert!(!control.cancel_requested());
        assert!(!control.cancel_requested());
        assert!(control.cancel_requested());
    }

    #[test]
    fn test_headless_control_cancel_flag() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut control = HeadlessControl::new(cancel.clone(), None, None);
        assert!(!control.cancel_requested());
        cancel.store(true, Ordering::SeqCst);
        assert!(control.cancel_requested());
    }

    #[test]
    fn test_headless_control_diagnostics() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut control = HeadlessControl::new(cancel, None, Some(3));
        let due: Vec<bool> = (0..6).map(|_| control.diagnostic_requested()).collect();
        assert_eq!(due, [false, false, true, false, false, true]);

        control.report(&DiagnosticReport::new(10, 5, 0, RenderCounters::default()));
        assert_eq!(control.reports(), 1);
        assert!(control.acknowledged());
    }

    #[test]
    fn test_run_headless_to_frame_limit() {
        let config = EngineConfig {
            headless: true,
            resolution: ResolutionMode::Quarter,
            max_frames: Some(12),
            diagnostic_every: Some(2),
            pacing: crate::pacing::PacingConfig { frame_period_ms: 1, max_skip: 2 },
            ..EngineConfig::default()
        };
        let summary = run_headless(&config, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(summary.virtual_frames, 12);
        assert!(summary.rendered >= 4 && summary.rendered <= 12);
        assert!(summary.reports >= 1);
    }

    #[test]
    fn test_run_headless_writes_captures() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            headless: true,
            resolution: ResolutionMode::Half,
            max_frames: Some(4),
            capture_dir: Some(dir.path().to_path_buf()),
            capture_every: 1,
            pacing: crate::pacing::PacingConfig { frame_period_ms: 1, max_skip: 0 },
            ..EngineConfig::default()
        };
        let summary = run_headless(&config, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(summary.virtual_frames, 4);
        // the cancelling invocation still rendered
        assert_eq!(summary.rendered, 4);
        assert!(dir.path().join("frame_000004.png").exists());
    }

    #[test]
    fn test_run_headless_precancelled() {
        let config = EngineConfig {
            resolution: ResolutionMode::Quarter,
            pacing: crate::pacing::PacingConfig { frame_period_ms: 1, max_skip: 2 },
            ..EngineConfig::default()
        };
        let summary = run_headless(&config, Arc::new(AtomicBool::new(true))).unwrap();
        assert_eq!(summary.virtual_frames, 1);
    }
}
