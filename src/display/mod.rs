//! Display sinks: where rendered frames go
//!
//! The renderer draws at the resolution reported by `dimensions()` and hands
//! packed `0xAABBGGRR` pixels to `end_swap`. Every sink presents at the native
//! 320x240, upscaling lower render resolutions by pixel replication.

mod capture;
mod convert;
mod window;

pub use capture::CaptureSink;
pub use convert::{
    abgr8888_to_rgb565, rgb565_to_rgb888, upscale, ResolutionMode, NATIVE_HEIGHT, NATIVE_WIDTH,
};
pub use window::WindowSink;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("display used before init")]
    NotInitialized,

    #[error("frame has {got} pixels, expected {expected}")]
    FrameSize { got: usize, expected: usize },

    #[error("cannot create capture directory {path}: {source}")]
    CaptureDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Presentation target for rendered frames
pub trait DisplaySink {
    /// Prepare the output. Called once before the first swap.
    fn init(&mut self, name: &str, fullscreen: bool) -> Result<(), DisplayError>;

    /// Render resolution the frame producer must use
    fn dimensions(&self) -> (usize, usize);

    fn begin_swap(&mut self) {}

    /// Present a frame of `width * height` packed pixels
    fn end_swap(&mut self, pixels: &[u32]) -> Result<(), DisplayError>;

    fn shutdown(&mut self) {}
}

/// Reject frames whose size does not match the render resolution
pub(crate) fn check_frame(pixels: &[u32], mode: ResolutionMode) -> Result<(), DisplayError> {
    let (w, h) = mode.dimensions();
    if pixels.len() != w * h {
        return Err(DisplayError::FrameSize { got: pixels.len(), expected: w * h });
    }
    Ok(())
}
