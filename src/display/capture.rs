//! Headless sink: keeps the last frame as native RGB565, optionally dumps PNGs

use std::path::{Path, PathBuf};

use super::convert::{abgr8888_to_rgb565, rgb565_to_rgb888, upscale, NATIVE_HEIGHT, NATIVE_WIDTH};
use super::{check_frame, DisplayError, DisplaySink, ResolutionMode};

pub struct CaptureSink {
    mode: ResolutionMode,
    /// Last presented frame, native resolution
    native: Vec<u16>,
    /// Render-resolution scratch for the format conversion
    scratch: Vec<u16>,
    frames: u64,
    dump: Option<(PathBuf, u32)>,
    initialized: bool,
}

impl CaptureSink {
    pub fn new(mode: ResolutionMode) -> Self {
        let (w, h) = mode.dimensions();
        Self {
            mode,
            native: vec![0; NATIVE_WIDTH * NATIVE_HEIGHT],
            scratch: vec![0; w * h],
            frames: 0,
            dump: None,
            initialized: false,
        }
    }

    /// Write every `every`th presented frame into `dir` as PNG
    pub fn with_capture(mut self, dir: impl Into<PathBuf>, every: u32) -> Self {
        self.dump = Some((dir.into(), every.max(1)));
        self
    }

    /// Frames presented so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Native-resolution RGB565 contents of the last frame
    pub fn native(&self) -> &[u16] {
        &self.native
    }

    fn write_png(&self, dir: &Path) -> Result<PathBuf, DisplayError> {
        let path = dir.join(format!("frame_{:06}.png", self.frames));
        let bytes: Vec<u8> = self.native.iter().flat_map(|&c| rgb565_to_rgb888(c)).collect();
        let written = image::save_buffer(
            &path,
            &bytes,
            NATIVE_WIDTH as u32,
            NATIVE_HEIGHT as u32,
            image::ExtendedColorType::Rgb8,
        );
        match written {
            Ok(()) => Ok(path),
            Err(source) => Err(DisplayError::Write { path, source }),
        }
    }
}

impl DisplaySink for CaptureSink {
    fn init(&mut self, name: &str, _fullscreen: bool) -> Result<(), DisplayError> {
        if let Some((dir, every)) = &self.dump {
            std::fs::create_dir_all(dir).map_err(|source| DisplayError::CaptureDir {
                path: dir.clone(),
                source,
            })?;
            log::info!("{name}: capturing every {every} frame(s) to {}", dir.display());
        }
        let (w, h) = self.mode.dimensions();
        log::info!("{name}: headless {w}x{h} ({:?})", self.mode);
        self.initialized = true;
        Ok(())
    }

    fn dimensions(&self) -> (usize, usize) {
        self.mode.dimensions()
    }

    fn end_swap(&mut self, pixels: &[u32]) -> Result<(), DisplayError> {
        if !self.initialized {
            return Err(DisplayError::NotInitialized);
        }
        check_frame(pixels, self.mode)?;

        for (dst, &src) in self.scratch.iter_mut().zip(pixels) {
            *dst = abgr8888_to_rgb565(src);
        }
        upscale(&self.scratch, self.mode, &mut self.native);
        self.frames += 1;

        if let Some((dir, every)) = &self.dump {
            if self.frames % *every as u64 == 0 {
                let path = self.write_png(dir)?;
                log::debug!("captured {}", path.display());
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        log::info!("headless display closed after {} frames", self.frames);
        self.initialized = false;
    }
}
