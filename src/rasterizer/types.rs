//! Core types for the rasterizer

use super::math::{Vec2, Vec3};
use crate::fixed::Fix;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn with_alpha(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Apply shading (multiply by intensity 0.0-1.0)
    pub fn shade(self, intensity: Fix) -> Self {
        let i = intensity.clamp(Fix::ZERO, Fix::ONE);
        let channel = |c: u8| i.mul_fast_int(Fix::from_int(c as i32)).clamp(0, 255) as u8;
        Self {
            r: channel(self.r),
            g: channel(self.g),
            b: channel(self.b),
            a: self.a,
        }
    }

    /// Pack as `0xAABBGGRR`, the byte order of an RGBA8 buffer in memory
    pub fn to_packed(self) -> u32 {
        ((self.a as u32) << 24) | ((self.b as u32) << 16) | ((self.g as u32) << 8) | (self.r as u32)
    }

    pub fn from_packed(c: u32) -> Self {
        let [r, g, b, a] = c.to_le_bytes();
        Self { r, g, b, a }
    }
}

/// A vertex with position, texture coordinate, and normal
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    pub pos: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl Vertex {
    pub fn new(pos: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self { pos, uv, normal }
    }
}

/// A triangle face (indices into vertex array)
#[derive(Debug, Clone, Copy)]
pub struct Face {
    pub v0: usize,
    pub v1: usize,
    pub v2: usize,
    pub texture_id: Option<usize>,
}

impl Face {
    pub fn with_texture(v0: usize, v1: usize, v2: usize, texture_id: usize) -> Self {
        Self {
            v0,
            v1,
            v2,
            texture_id: Some(texture_id),
        }
    }
}

/// Simple texture (array of colors)
#[derive(Debug, Clone)]
pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Color>,
}

impl Texture {
    /// Create a checkerboard test texture
    pub fn checkerboard(width: usize, height: usize, color1: Color, color2: Color) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / 4) + (y / 4)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels }
    }

    /// Sample texture at UV coordinates (no filtering, wraps).
    ///
    /// Texel indices only need the integer product, so the fast path is used.
    pub fn sample(&self, u: Fix, v: Fix) -> Color {
        let tx = u.mul_fast_int(Fix::from_int(self.width as i32)).rem_euclid(self.width as i32) as usize;
        let ty = v.mul_fast_int(Fix::from_int(self.height as i32)).rem_euclid(self.height as i32) as usize;
        self.pixels[ty * self.width + tx]
    }

    /// Get pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x]
        } else {
            Color::BLACK
        }
    }
}

/// Shading mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingMode {
    None,     // No shading, raw texture/vertex colors
    Flat,     // One light calculation per face
    Gouraud,  // Interpolate vertex colors (PS1 style)
}

/// Rasterizer settings
#[derive(Debug, Clone)]
pub struct RasterSettings {
    /// Use affine texture mapping (true = PS1 warping, false = perspective correct)
    pub affine_textures: bool,
    /// Snap vertices to integer coordinates (PS1 jitter)
    pub vertex_snap: bool,
    /// Use Z-buffer (false = painter's algorithm)
    pub use_zbuffer: bool,
    /// Shading mode
    pub shading: ShadingMode,
    /// Backface culling
    pub backface_cull: bool,
    /// Light direction (for shading)
    pub light_dir: Vec3,
    /// Ambient light intensity (0.0-1.0)
    pub ambient: Fix,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            affine_textures: false,
            vertex_snap: true,
            use_zbuffer: true,
            shading: ShadingMode::Gouraud,
            backface_cull: true,
            light_dir: Vec3::from_f32(-1.0, -1.0, -1.0).normalize(),
            ambient: Fix::from_f32(0.3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout() {
        let c = Color::with_alpha(0x11, 0x22, 0x33, 0x44);
        assert_eq!(c.to_packed(), 0x4433_2211);
        assert_eq!(Color::from_packed(0x4433_2211), c);
        assert_eq!(c.to_packed().to_le_bytes(), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_shade() {
        let c = Color::new(200, 100, 0);
        assert_eq!(c.shade(Fix::ONE), c);
        assert_eq!(c.shade(Fix::ONE_HALF), Color::new(100, 50, 0));
        assert_eq!(c.shade(Fix::from_int(-3)), Color::new(0, 0, 0));
        assert_eq!(c.shade(Fix::from_int(7)), c);
    }

    #[test]
    fn test_sample_wraps() {
        let tex = Texture::checkerboard(8, 8, Color::WHITE, Color::BLACK);
        assert_eq!(tex.sample(Fix::ZERO, Fix::ZERO), Color::WHITE);
        // u = 0.5 lands on texel 4, the second checker column
        assert_eq!(tex.sample(Fix::ONE_HALF, Fix::ZERO), Color::BLACK);
        assert_eq!(tex.sample(Fix::ONE_HALF, Fix::ONE_HALF), Color::WHITE);
        assert_eq!(tex.sample(Fix::from_f32(1.5), Fix::ZERO), tex.get_pixel(4, 0));
        assert_eq!(tex.sample(Fix::from_f32(-0.5), Fix::ZERO), tex.get_pixel(4, 0));
    }
}
