//! Spinning test cube driven by the frame pacer

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::display::{DisplayError, DisplaySink};
use crate::fixed::Fix;
use crate::pacing::{FrameKind, FrameRunner, RenderCounters};
use crate::rasterizer::{
    create_test_cube, render_mesh, Camera, Color, Face, Framebuffer, RasterSettings, Texture, Vec3, Vertex,
};

/// Yaw added per virtual frame, radians
const SPIN_PER_FRAME: f32 = 0.05;
/// Pitch added per virtual frame, radians
const TUMBLE_PER_FRAME: f32 = 0.021;
const CLEAR_COLOR: Color = Color { r: 24, g: 24, b: 32, a: 255 };

/// Rotate `v` about Y then X by precomputed sines/cosines
fn rotate(v: Vec3, (sy, cy): (Fix, Fix), (sx, cx): (Fix, Fix)) -> Vec3 {
    let x = v.x * cy + v.z * sy;
    let z = v.z * cy - v.x * sy;
    Vec3::new(x, v.y * cx - z * sx, v.y * sx + z * cx)
}

pub struct CubeScene<D> {
    display: D,
    fb: Framebuffer,
    camera: Camera,
    settings: RasterSettings,
    mesh: (Vec<Vertex>, Vec<Face>),
    textures: Vec<Texture>,
    /// Scratch for the rotated mesh
    posed: Vec<Vertex>,
    frame: u64,
    rendered: u64,
    counters: RenderCounters,
    last_error: Option<DisplayError>,
    abort: Option<Arc<AtomicBool>>,
}

impl<D: DisplaySink> CubeScene<D> {
    /// The display must already be initialized
    pub fn new(display: D) -> Self {
        let (width, height) = display.dimensions();
        let mesh = create_test_cube();
        Self {
            display,
            fb: Framebuffer::new(width, height),
            camera: Camera::at(Vec3::new(Fix::ZERO, Fix::ZERO, Fix::from_int(-5))),
            settings: RasterSettings::default(),
            posed: mesh.0.clone(),
            mesh,
            textures: vec![Texture::checkerboard(32, 32, Color::new(220, 180, 60), Color::new(60, 40, 140))],
            frame: 0,
            rendered: 0,
            counters: RenderCounters::default(),
            last_error: None,
            abort: None,
        }
    }

    /// Raise `flag` when the display fails, so the loop can stop
    pub fn with_abort(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_display(self) -> D {
        self.display
    }

    /// Simulation frames run, skipped or not
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Frames that reached the display
    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    /// First display failure, if any. Later failures are dropped.
    pub fn take_error(&mut self) -> Option<DisplayError> {
        self.last_error.take()
    }

    fn pose(&mut self) {
        let yaw = self.frame as f32 * SPIN_PER_FRAME;
        let pitch = self.frame as f32 * TUMBLE_PER_FRAME;
        let (sy, cy) = yaw.sin_cos();
        let (sx, cx) = pitch.sin_cos();
        let yaw = (Fix::from_f32(sy), Fix::from_f32(cy));
        let pitch = (Fix::from_f32(sx), Fix::from_f32(cx));

        for (out, v) in self.posed.iter_mut().zip(&self.mesh.0) {
            out.pos = rotate(v.pos, yaw, pitch);
            out.normal = rotate(v.normal, yaw, pitch);
        }
    }

    fn render(&mut self) {
        let start = Instant::now();
        self.pose();

        let (width, height) = self.display.dimensions();
        if (self.fb.width, self.fb.height) != (width, height) {
            self.fb.resize(width, height);
        }
        self.fb.clear(CLEAR_COLOR);
        let triangles = render_mesh(
            &mut self.fb,
            &self.posed,
            &self.mesh.1,
            &self.textures,
            &self.camera,
            &self.settings,
        );

        let backend_start = Instant::now();
        self.display.begin_swap();
        if let Err(e) = self.display.end_swap(&self.fb.pixels) {
            if self.last_error.is_none() {
                log::error!("display swap failed: {e}");
                self.last_error = Some(e);
                if let Some(flag) = &self.abort {
                    flag.store(true, Ordering::SeqCst);
                }
            }
        }
        self.rendered += 1;

        self.counters = RenderCounters {
            backend_ms: backend_start.elapsed().as_millis() as u32,
            full_render_ms: start.elapsed().as_millis() as u32,
            triangles: triangles as u32,
        };
        log::trace!("frame {}: {} tris", self.frame, triangles);
    }
}

impl<D: DisplaySink> FrameRunner for CubeScene<D> {
    fn run_frame(&mut self, kind: FrameKind) {
        self.frame += 1;
        if !kind.skips_display() {
            self.render();
        }
    }

    fn counters(&self) -> RenderCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{CaptureSink, ResolutionMode};

    fn scene(mode: ResolutionMode) -> CubeScene<CaptureSink> {
        let mut sink = CaptureSink::new(mode);
        sink.init("test", false).unwrap();
        CubeScene::new(sink)
    }

    #[test]
    fn test_skip_does_not_touch_display() {
        let mut scene = scene(ResolutionMode::Half);
        scene.run_frame(FrameKind::Skip);
        scene.run_frame(FrameKind::Skip);
        assert_eq!(scene.frame(), 2);
        assert_eq!(scene.rendered(), 0);
        assert_eq!(scene.display().frames(), 0);
        assert_eq!(scene.counters(), RenderCounters::default());

        scene.run_frame(FrameKind::Render);
        assert_eq!(scene.frame(), 3);
        assert_eq!(scene.rendered(), 1);
        assert_eq!(scene.display().frames(), 1);
        assert!(scene.counters().triangles > 0);
        assert!(scene.take_error().is_none());
    }

    #[test]
    fn test_renders_into_native_buffer() {
        let mut scene = scene(ResolutionMode::Quarter);
        scene.run_frame(FrameKind::Render);
        let sink = scene.into_display();
        let native = sink.native();
        let clear = crate::display::abgr8888_to_rgb565(CLEAR_COLOR.to_packed());
        assert_eq!(native[0], clear);
        assert_ne!(native[120 * 320 + 160], clear);
    }

    #[test]
    fn test_display_error_raises_abort() {
        // never initialized
        let flag = Arc::new(AtomicBool::new(false));
        let mut scene = CubeScene::new(CaptureSink::new(ResolutionMode::Full)).with_abort(flag.clone());
        scene.run_frame(FrameKind::Render);
        assert!(flag.load(Ordering::SeqCst));
        assert!(scene.take_error().is_some());
    }

    #[test]
    fn test_rotation_keeps_length() {
        let v = Vec3::new(Fix::ONE, Fix::ONE, Fix::ONE);
        let (s, c) = 0.7f32.sin_cos();
        let r = rotate(v, (Fix::from_f32(s), Fix::from_f32(c)), (Fix::from_f32(c), Fix::from_f32(s)));
        assert!((r.len().to_f64() - 3f64.sqrt()).abs() < 1e-4);
    }
}
