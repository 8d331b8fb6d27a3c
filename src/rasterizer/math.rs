//! Fixed-point vector math for 3D rendering

use std::ops::{Add, Sub, Mul};
use crate::fixed::Fix;

/// Distance from the eye to the projection plane
const DISTANCE: Fix = Fix::from_int(5);
/// Fraction of the half screen covered by the unit view volume
const SCALE: Fix = Fix::from_bits(3 << 30); // 0.75
/// Below this the perspective divide is skipped
const NEAR_EPSILON: Fix = Fix::from_bits(4_294_967); // ~0.001
/// Triangles with a smaller doubled area are degenerate
const AREA_EPSILON: Fix = Fix::from_bits(429_497); // ~0.0001

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vec3 {
    pub x: Fix,
    pub y: Fix,
    pub z: Fix,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: Fix::ZERO, y: Fix::ZERO, z: Fix::ZERO };

    pub fn new(x: Fix, y: Fix, z: Fix) -> Self {
        Self { x, y, z }
    }

    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self::new(Fix::from_f32(x), Fix::from_f32(y), Fix::from_f32(z))
    }

    pub fn dot(self, other: Vec3) -> Fix {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Float fallback (`f64` square root), for normalizing directions only
    pub fn len(self) -> Fix {
        Fix::from_f64(self.dot(self).to_f64().sqrt())
    }

    pub fn normalize(self) -> Vec3 {
        let l = self.len();
        if l == Fix::ZERO {
            return Vec3::ZERO;
        }
        Vec3 {
            x: self.x / l,
            y: self.y / l,
            z: self.z / l,
        }
    }

    pub fn scale(self, s: Fix) -> Vec3 {
        Vec3 {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Mul<Fix> for Vec3 {
    type Output = Vec3;
    fn mul(self, s: Fix) -> Vec3 {
        self.scale(s)
    }
}

/// 2D Vector (for texture coordinates)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vec2 {
    pub x: Fix,
    pub y: Fix,
}

impl Vec2 {
    pub fn new(x: Fix, y: Fix) -> Self {
        Self { x, y }
    }

    pub fn from_f32(x: f32, y: f32) -> Self {
        Self::new(Fix::from_f32(x), Fix::from_f32(y))
    }
}

/// Transform a vertex by camera basis vectors (rotation)
pub fn perspective_transform(v: Vec3, cam_x: Vec3, cam_y: Vec3, cam_z: Vec3) -> Vec3 {
    Vec3 {
        x: v.dot(cam_x),
        y: v.dot(cam_y),
        z: v.dot(cam_z),
    }
}

/// A vertex after projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projected {
    /// Screen x, y and depth
    pub pos: Vec3,
    /// `1 / depth`, for perspective-correct interpolation
    pub inv_depth: Fix,
}

/// Project a 3D point to 2D screen coordinates.
/// If `snap` is true, coordinates are floored to integers (PS1 jitter effect).
///
/// The perspective divide uses the reciprocal instead of a full division.
pub fn project(v: Vec3, snap: bool, width: usize, height: usize) -> Projected {
    let half_w = Fix::from_int(width as i32 / 2);
    let half_h = Fix::from_int(height as i32 / 2);
    let us = DISTANCE - Fix::ONE;
    let vs = Fix::from_int(width.min(height) as i32 / 2) * SCALE;

    let denom = v.z + DISTANCE;
    if denom.abs() < NEAR_EPSILON {
        return Projected {
            pos: Vec3::new(half_w, half_h, DISTANCE),
            inv_depth: DISTANCE.recip(),
        };
    }
    let inv_depth = denom.recip();
    let k = us * inv_depth;

    let mut pos = Vec3 {
        x: v.x * k * vs + half_w,
        y: v.y * k * vs + half_h,
        z: v.z * k + DISTANCE,
    };

    // PS1 vertex snapping
    if snap {
        pos.x = Fix::from_int(pos.x.to_int());
        pos.y = Fix::from_int(pos.y.to_int());
    }

    Projected { pos, inv_depth }
}

/// Per-triangle setup for barycentric coordinates.
///
/// One exact division per triangle; each pixel then costs multiplies only.
#[derive(Debug, Clone, Copy)]
pub struct Barycentric {
    v1: Vec3,
    v2: Vec3,
    v3: Vec3,
    inv_area: Fix,
}

impl Barycentric {
    /// `None` for degenerate (zero-area) triangles
    pub fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Option<Self> {
        let d = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
        if d.abs() < AREA_EPSILON {
            return None;
        }
        Some(Self { v1, v2, v3, inv_area: Fix::ONE / d })
    }

    /// Weights (u, v, w) of point p, summing to one; all non-negative inside
    pub fn at(&self, p: Vec3) -> Vec3 {
        let (v1, v2, v3) = (self.v1, self.v2, self.v3);
        let u = ((v2.y - v3.y) * (p.x - v3.x) + (v3.x - v2.x) * (p.y - v3.y)) * self.inv_area;
        let v = ((v3.y - v1.y) * (p.x - v3.x) + (v1.x - v3.x) * (p.y - v3.y)) * self.inv_area;
        Vec3::new(u, v, Fix::ONE - u - v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn barycentric(p: Vec3, v1: Vec3, v2: Vec3, v3: Vec3) -> Option<Vec3> {
        Barycentric::new(v1, v2, v3).map(|setup| setup.at(p))
    }

    fn close(a: Fix, b: f64) -> bool {
        (a.to_f64() - b).abs() < 1e-4
    }

    /// Within the reciprocal's error for screen-sized results
    fn near(a: Fix, b: f64) -> bool {
        (a.to_f64() - b).abs() < 0.01
    }

    #[test]
    fn test_vec3_dot() {
        let a = Vec3::from_f32(1.0, 2.0, 3.0);
        let b = Vec3::from_f32(4.0, 5.0, 6.0);
        assert_eq!(a.dot(b), Fix::from_int(32));
    }

    #[test]
    fn test_vec3_cross() {
        let a = Vec3::from_f32(1.0, 0.0, 0.0);
        let b = Vec3::from_f32(0.0, 1.0, 0.0);
        let c = a.cross(b);
        assert_eq!(c, Vec3::from_f32(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_len() {
        assert!(close(Vec3::from_f32(3.0, 0.0, 4.0).len(), 5.0));
        assert_eq!(Vec3::ZERO.len(), Fix::ZERO);
    }

    #[test]
    fn test_normalize() {
        let n = Vec3::from_f32(3.0, 0.0, 4.0).normalize();
        assert!(close(n.x, 0.6) && close(n.z, 0.8));
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_barycentric_inside() {
        let v1 = Vec3::from_f32(0.0, 0.0, 0.0);
        let v2 = Vec3::from_f32(10.0, 0.0, 0.0);
        let v3 = Vec3::from_f32(5.0, 10.0, 0.0);
        let p = Vec3::from_f32(5.0, 3.0, 0.0);
        let bc = barycentric(p, v1, v2, v3).unwrap();
        assert!(bc.x >= Fix::ZERO && bc.y >= Fix::ZERO && bc.z >= Fix::ZERO);
        assert!(close(bc.x + bc.y + bc.z, 1.0));
    }

    #[test]
    fn test_barycentric_at_vertex_and_outside() {
        let v1 = Vec3::from_f32(0.0, 0.0, 0.0);
        let v2 = Vec3::from_f32(8.0, 0.0, 0.0);
        let v3 = Vec3::from_f32(0.0, 8.0, 0.0);
        let bc = barycentric(v2, v1, v2, v3).unwrap();
        assert!(close(bc.y, 1.0) && close(bc.x, 0.0));
        let out = barycentric(Vec3::from_f32(9.0, 9.0, 0.0), v1, v2, v3).unwrap();
        assert!(out.x < Fix::ZERO);
    }

    #[test]
    fn test_barycentric_degenerate() {
        let a = Vec3::from_f32(1.0, 1.0, 0.0);
        let b = Vec3::from_f32(2.0, 2.0, 0.0);
        let c = Vec3::from_f32(3.0, 3.0, 0.0);
        assert!(barycentric(a, a, b, c).is_none());
    }

    #[test]
    fn test_project_center_and_depth() {
        let p = project(Vec3::ZERO, false, 320, 240);
        assert_eq!(p.pos.x, Fix::from_int(160));
        assert_eq!(p.pos.y, Fix::from_int(120));
        assert!(near(p.inv_depth, 0.2));
    }

    #[test]
    fn test_project_perspective_and_snap() {
        // x = 1 at view depth 5 + 3: 1 * 4/8 * 90 + 160 = 205
        let p = project(Vec3::from_f32(1.0, 0.0, 3.0), false, 320, 240);
        assert!(near(p.pos.x, 205.0));
        let near = project(Vec3::from_f32(1.0, 0.0, 0.0), false, 320, 240);
        assert!(near.pos.x > p.pos.x);

        let snapped = project(Vec3::from_f32(0.3, -0.3, 1.0), true, 320, 240);
        assert_eq!(snapped.pos.x.frac_part(), 0);
        assert_eq!(snapped.pos.y.frac_part(), 0);
    }
}
