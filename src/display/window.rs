//! Windowed sink on macroquad
//!
//! Must run inside the macroquad event loop: `end_swap` draws to the current
//! frame and the caller presents it with `next_frame().await`.

use macroquad::prelude::*;

use super::convert::{upscale, NATIVE_HEIGHT, NATIVE_WIDTH};
use super::{check_frame, DisplayError, DisplaySink, ResolutionMode};

const BACKGROUND: Color = Color::new(0.0, 0.0, 0.0, 1.0);
const TEXT_COLOR: Color = Color::new(0.85, 0.85, 0.85, 1.0);
const PANEL_COLOR: Color = Color::new(0.0, 0.0, 0.0, 0.7);
const FONT_SIZE: f32 = 20.0;
const LINE_HEIGHT: f32 = 22.0;

pub struct WindowSink {
    mode: ResolutionMode,
    /// Native-resolution packed pixels
    native: Vec<u32>,
    /// Lines drawn over the frame until cleared
    overlay: Vec<String>,
    initialized: bool,
}

impl WindowSink {
    pub fn new(mode: ResolutionMode) -> Self {
        Self {
            mode,
            native: vec![0; NATIVE_WIDTH * NATIVE_HEIGHT],
            overlay: Vec::new(),
            initialized: false,
        }
    }

    /// Show text over the presented frame (diagnostics, prompts)
    pub fn set_overlay(&mut self, text: &str) {
        self.overlay = text.lines().map(str::to_owned).collect();
    }

    pub fn clear_overlay(&mut self) {
        self.overlay.clear();
    }

    /// Redraw the last frame, e.g. while the loop is paused
    pub fn present_last(&self) {
        let bytes: Vec<u8> = self.native.iter().flat_map(|p| p.to_le_bytes()).collect();
        let texture = Texture2D::from_rgba8(NATIVE_WIDTH as u16, NATIVE_HEIGHT as u16, &bytes);
        texture.set_filter(FilterMode::Nearest);

        clear_background(BACKGROUND);

        // Letterbox to 4:3
        let scale = (screen_width() / NATIVE_WIDTH as f32).min(screen_height() / NATIVE_HEIGHT as f32);
        let draw_w = NATIVE_WIDTH as f32 * scale;
        let draw_h = NATIVE_HEIGHT as f32 * scale;
        let draw_x = (screen_width() - draw_w) / 2.0;
        let draw_y = (screen_height() - draw_h) / 2.0;

        draw_texture_ex(
            &texture,
            draw_x,
            draw_y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );

        self.draw_overlay(draw_x, draw_y);
    }

    fn draw_overlay(&self, x: f32, y: f32) {
        if self.overlay.is_empty() {
            return;
        }
        let width = self
            .overlay
            .iter()
            .map(|line| measure_text(line, None, FONT_SIZE as u16, 1.0).width)
            .fold(0.0, f32::max);
        let height = self.overlay.len() as f32 * LINE_HEIGHT + 8.0;
        draw_rectangle(x + 8.0, y + 8.0, width + 16.0, height, PANEL_COLOR);

        for (i, line) in self.overlay.iter().enumerate() {
            draw_text(line, x + 16.0, y + 8.0 + LINE_HEIGHT * (i as f32 + 1.0), FONT_SIZE, TEXT_COLOR);
        }
    }
}

impl DisplaySink for WindowSink {
    fn init(&mut self, name: &str, fullscreen: bool) -> Result<(), DisplayError> {
        if fullscreen {
            set_fullscreen(true);
        }
        let (w, h) = self.mode.dimensions();
        log::info!("{name}: window {}x{}, rendering at {w}x{h}", screen_width(), screen_height());
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
        upscale(pixels, self.mode, &mut self.native);
        self.present_last();
        Ok(())
    }

    fn shutdown(&mut self) {
        log::info!("window closed");
        self.initialized = false;
    }
}
