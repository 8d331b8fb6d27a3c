//! Pixel format conversion and integer upscaling

use serde::{Deserialize, Serialize};

pub const NATIVE_WIDTH: usize = 320;
pub const NATIVE_HEIGHT: usize = 240;

/// Render resolution relative to the native output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionMode {
    /// 320x240
    #[default]
    Full,
    /// 160x120
    Half,
    /// 80x60
    Quarter,
}

impl ResolutionMode {
    /// Native pixels per render pixel along each axis
    pub fn factor(self) -> usize {
        match self {
            ResolutionMode::Full => 1,
            ResolutionMode::Half => 2,
            ResolutionMode::Quarter => 4,
        }
    }

    pub fn dimensions(self) -> (usize, usize) {
        (NATIVE_WIDTH / self.factor(), NATIVE_HEIGHT / self.factor())
    }
}

/// Packed `0xAABBGGRR` to RGB565 (red in the top bits), alpha dropped
#[inline]
pub fn abgr8888_to_rgb565(c: u32) -> u16 {
    (((c & 0xF8) << 8) | ((c & 0xFC00) >> 5) | ((c >> 19) & 0x1F)) as u16
}

/// RGB565 to 8-bit channels, low bits filled by replicating the high bits
#[inline]
pub fn rgb565_to_rgb888(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Nearest-neighbour upscale of a frame at `mode` into a native-size buffer.
///
/// Source pixel `(x, y)` fills the `factor x factor` block at
/// `(x * factor, y * factor)`.
pub fn upscale<T: Copy>(src: &[T], mode: ResolutionMode, dst: &mut [T]) {
    let factor = mode.factor();
    let (w, h) = mode.dimensions();
    debug_assert!(src.len() >= w * h && dst.len() >= NATIVE_WIDTH * NATIVE_HEIGHT);

    if factor == 1 {
        dst[..w * h].copy_from_slice(&src[..w * h]);
        return;
    }

    for (y, src_row) in src.chunks_exact(w).take(h).enumerate() {
        let first = y * factor * NATIVE_WIDTH;
        let row = &mut dst[first..first + NATIVE_WIDTH];
        for (x, &px) in src_row.iter().enumerate() {
            row[x * factor..(x + 1) * factor].fill(px);
        }
        // Remaining rows of the block repeat the first one
        for dy in 1..factor {
            let start = first + dy * NATIVE_WIDTH;
            dst.copy_within(first..first + NATIVE_WIDTH, start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_dimensions() {
        assert_eq!(ResolutionMode::Full.dimensions(), (320, 240));
        assert_eq!(ResolutionMode::Half.dimensions(), (160, 120));
        assert_eq!(ResolutionMode::Quarter.dimensions(), (80, 60));
    }

    #[test]
    fn test_rgb565_channels() {
        // 0xAABBGGRR: pure red, green, blue
        assert_eq!(abgr8888_to_rgb565(0xFF00_00FF), 0xF800);
        assert_eq!(abgr8888_to_rgb565(0xFF00_FF00), 0x07E0);
        assert_eq!(abgr8888_to_rgb565(0xFFFF_0000), 0x001F);
        assert_eq!(abgr8888_to_rgb565(0x00FF_FFFF), 0xFFFF);
        assert_eq!(abgr8888_to_rgb565(0xFF07_0307), 0x0000);
    }

    #[test]
    fn test_rgb565_expand() {
        assert_eq!(rgb565_to_rgb888(0xFFFF), [255, 255, 255]);
        assert_eq!(rgb565_to_rgb888(0x0000), [0, 0, 0]);
        assert_eq!(rgb565_to_rgb888(0xF800), [255, 0, 0]);
        let c = 0xFF30_80C0u32;
        let [r, g, b] = rgb565_to_rgb888(abgr8888_to_rgb565(c));
        assert_eq!((r & 0xF8, g & 0xFC, b & 0xF8), (0xC0, 0x80, 0x30));
    }

    #[test]
    fn test_upscale_full_is_copy() {
        let src: Vec<u32> = (0..(320 * 240) as u32).collect();
        let mut dst = vec![0u32; 320 * 240];
        upscale(&src, ResolutionMode::Full, &mut dst);
        assert_eq!(src, dst);
    }

    #[test]
    fn test_upscale_replicates_blocks() {
        for mode in [ResolutionMode::Half, ResolutionMode::Quarter] {
            let (w, h) = mode.dimensions();
            let f = mode.factor();
            let src: Vec<u32> = (0..(w * h) as u32).collect();
            let mut dst = vec![u32::MAX; NATIVE_WIDTH * NATIVE_HEIGHT];
            upscale(&src, mode, &mut dst);
            for y in 0..NATIVE_HEIGHT {
                for x in 0..NATIVE_WIDTH {
                    assert_eq!(dst[y * NATIVE_WIDTH + x], src[(y / f) * w + x / f], "{mode:?} at {x},{y}");
                }
            }
        }
    }

    #[test]
    fn test_mode_ron_names() {
        let mode: ResolutionMode = ron::from_str("Quarter").unwrap();
        assert_eq!(mode, ResolutionMode::Quarter);
        assert_eq!(ron::to_string(&ResolutionMode::Half).unwrap(), "Half");
    }
}
