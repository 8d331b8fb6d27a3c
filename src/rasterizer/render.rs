//! Core rendering functions
//! Triangle rasterization with PS1-style effects

use super::math::{perspective_transform, project, Barycentric, Projected, Vec2, Vec3};
use super::types::{Color, Face, RasterSettings, ShadingMode, Texture, Vertex};
use crate::fixed::Fix;

/// Tolerance on the inside test so shared edges leave no gaps
const EDGE_SLACK: Fix = Fix::from_bits(-429_497); // ~-0.0001
/// Camera-space depth below which a triangle is dropped
const NEAR_CLIP: Fix = Fix::from_bits(429_496_730); // ~0.1

/// Framebuffer for software rendering
pub struct Framebuffer {
    pub pixels: Vec<u32>, // packed 0xAABBGGRR
    pub zbuffer: Vec<Fix>,
    pub width: usize,
    pub height: usize,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            zbuffer: vec![Fix::MAX; width * height],
            width,
            height,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.resize(width * height, 0);
        self.zbuffer.resize(width * height, Fix::MAX);
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_packed());
        self.zbuffer.fill(Fix::MAX);
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(Color::from_packed(self.pixels[y * self.width + x]))
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color.to_packed();
        }
    }

    pub fn set_pixel_with_depth(&mut self, x: usize, y: usize, z: Fix, color: Color) -> bool {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            if z < self.zbuffer[idx] {
                self.zbuffer[idx] = z;
                self.pixels[idx] = color.to_packed();
                return true;
            }
        }
        false
    }
}

/// Camera state
pub struct Camera {
    pub position: Vec3,
    pub rotation_x: f32, // Pitch
    pub rotation_y: f32, // Yaw

    // Computed basis vectors
    pub basis_x: Vec3,
    pub basis_y: Vec3,
    pub basis_z: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        let mut cam = Self {
            position: Vec3::ZERO,
            rotation_x: 0.0,
            rotation_y: 0.0,
            basis_x: Vec3::new(Fix::ONE, Fix::ZERO, Fix::ZERO),
            basis_y: Vec3::new(Fix::ZERO, Fix::ONE, Fix::ZERO),
            basis_z: Vec3::new(Fix::ZERO, Fix::ZERO, Fix::ONE),
        };
        cam.update_basis();
        cam
    }

    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::new() }
    }

    /// Angles stay in f32; only the resulting basis is fixed point
    pub fn update_basis(&mut self) {
        let upward = Vec3::new(Fix::ZERO, -Fix::ONE, Fix::ZERO); // -Y is up on screen

        let (sx, cx) = self.rotation_x.sin_cos();
        let (sy, cy) = self.rotation_y.sin_cos();
        self.basis_z = Vec3::from_f32(cx * sy, -sx, cx * cy);
        self.basis_x = upward.cross(self.basis_z).normalize();
        self.basis_y = self.basis_z.cross(self.basis_x);
    }

    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.rotation_y += dy;
        self.rotation_x = (self.rotation_x + dx).clamp(
            -std::f32::consts::FRAC_PI_2 + 0.01,
            std::f32::consts::FRAC_PI_2 - 0.01,
        );
        self.update_basis();
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Projected surface (triangle ready for rasterization)
struct Surface {
    v1: Projected,
    v2: Projected,
    v3: Projected,
    vn1: Vec3, // vertex normals, camera space
    vn2: Vec3,
    vn3: Vec3,
    uv1: Vec2,
    uv2: Vec2,
    uv3: Vec2,
    normal: Vec3, // face normal, camera space
    face_idx: usize,
}

impl Surface {
    fn max_depth(&self) -> Fix {
        self.v1.pos.z.max(self.v2.pos.z).max(self.v3.pos.z)
    }
}

/// Calculate shading intensity for a normal
pub fn shade_intensity(normal: Vec3, light_dir: Vec3, ambient: Fix) -> Fix {
    let diffuse = normal.dot(light_dir).max(Fix::ZERO);
    (ambient + (Fix::ONE - ambient) * diffuse).clamp(Fix::ZERO, Fix::ONE)
}

/// Pixel range `[lo, hi)` covered by three screen coordinates, clipped to `[0, limit)`
fn span(a: Fix, b: Fix, c: Fix, limit: usize) -> (usize, usize) {
    let limit = Fix::from_int(limit as i32);
    let lo = a.min(b).min(c).clamp(Fix::ZERO, limit);
    let hi = (a.max(b).max(c) + Fix::ONE).clamp(Fix::ZERO, limit);
    (lo.to_int() as usize, hi.to_int() as usize)
}

/// Rasterize a single triangle
fn rasterize_triangle(
    fb: &mut Framebuffer,
    surface: &Surface,
    texture: Option<&Texture>,
    settings: &RasterSettings,
) {
    let (p1, p2, p3) = (surface.v1.pos, surface.v2.pos, surface.v3.pos);
    let Some(setup) = Barycentric::new(p1, p2, p3) else {
        return;
    };

    let (min_x, max_x) = span(p1.x, p2.x, p3.x, fb.width);
    let (min_y, max_y) = span(p1.y, p2.y, p3.y, fb.height);

    let flat_shade = shade_intensity(surface.normal, settings.light_dir, settings.ambient);
    let vertex_shades = [
        shade_intensity(surface.vn1, settings.light_dir, settings.ambient),
        shade_intensity(surface.vn2, settings.light_dir, settings.ambient),
        shade_intensity(surface.vn3, settings.light_dir, settings.ambient),
    ];

    for y in min_y..max_y {
        for x in min_x..max_x {
            let p = Vec3::new(Fix::from_int(x as i32), Fix::from_int(y as i32), Fix::ZERO);
            let bc = setup.at(p);
            if bc.x < EDGE_SLACK || bc.y < EDGE_SLACK || bc.z < EDGE_SLACK {
                continue;
            }

            let z = bc.x * p1.z + bc.y * p2.z + bc.z * p3.z;
            if settings.use_zbuffer && z >= fb.zbuffer[y * fb.width + x] {
                continue;
            }

            let weights = if settings.affine_textures {
                bc
            } else {
                // Weight by 1/z, then renormalize with one reciprocal per pixel
                let w = Vec3::new(
                    bc.x * surface.v1.inv_depth,
                    bc.y * surface.v2.inv_depth,
                    bc.z * surface.v3.inv_depth,
                );
                w.scale((w.x + w.y + w.z).recip())
            };
            let u = weights.x * surface.uv1.x + weights.y * surface.uv2.x + weights.z * surface.uv3.x;
            let v = weights.x * surface.uv1.y + weights.y * surface.uv2.y + weights.z * surface.uv3.y;

            let color = match texture {
                Some(tex) => tex.sample(u, Fix::ONE - v),
                None => Color::WHITE,
            };

            let shade = match settings.shading {
                ShadingMode::None => Fix::ONE,
                ShadingMode::Flat => flat_shade,
                ShadingMode::Gouraud => {
                    bc.x.mul_fast_low_precision(vertex_shades[0])
                        + bc.y.mul_fast_low_precision(vertex_shades[1])
                        + bc.z.mul_fast_low_precision(vertex_shades[2])
                }
            };

            if settings.use_zbuffer {
                fb.set_pixel_with_depth(x, y, z, color.shade(shade));
            } else {
                fb.set_pixel(x, y, color.shade(shade));
            }
        }
    }
}

/// Render a mesh to the framebuffer. Returns the number of triangles drawn.
pub fn render_mesh(
    fb: &mut Framebuffer,
    vertices: &[Vertex],
    faces: &[Face],
    textures: &[Texture],
    camera: &Camera,
    settings: &RasterSettings,
) -> usize {
    let mut projected = Vec::with_capacity(vertices.len());
    let mut cam_space_positions = Vec::with_capacity(vertices.len());
    let mut cam_space_normals = Vec::with_capacity(vertices.len());

    for v in vertices {
        let rel_pos = v.pos - camera.position;
        let cam_pos = perspective_transform(rel_pos, camera.basis_x, camera.basis_y, camera.basis_z);
        cam_space_positions.push(cam_pos);
        projected.push(project(cam_pos, settings.vertex_snap, fb.width, fb.height));

        let cam_normal = perspective_transform(v.normal, camera.basis_x, camera.basis_y, camera.basis_z);
        cam_space_normals.push(cam_normal.normalize());
    }

    let mut surfaces: Vec<Surface> = Vec::with_capacity(faces.len());

    for (face_idx, face) in faces.iter().enumerate() {
        let cv1 = cam_space_positions[face.v0];
        let cv2 = cam_space_positions[face.v1];
        let cv3 = cam_space_positions[face.v2];

        // +Z is forward; anything at or behind the near plane is skipped
        if cv1.z <= NEAR_CLIP || cv2.z <= NEAR_CLIP || cv3.z <= NEAR_CLIP {
            continue;
        }

        let normal = (cv2 - cv1).cross(cv3 - cv1).normalize();

        // Facing away from the camera
        if settings.backface_cull && normal.z > Fix::ZERO {
            continue;
        }

        surfaces.push(Surface {
            v1: projected[face.v0],
            v2: projected[face.v1],
            v3: projected[face.v2],
            vn1: cam_space_normals[face.v0],
            vn2: cam_space_normals[face.v1],
            vn3: cam_space_normals[face.v2],
            uv1: vertices[face.v0].uv,
            uv2: vertices[face.v1].uv,
            uv3: vertices[face.v2].uv,
            normal,
            face_idx,
        });
    }

    // Painter's algorithm: far to near
    if !settings.use_zbuffer {
        surfaces.sort_by_key(|s| std::cmp::Reverse(s.max_depth()));
    }

    for surface in &surfaces {
        let texture = faces[surface.face_idx]
            .texture_id
            .and_then(|id| textures.get(id));
        rasterize_triangle(fb, surface, texture, settings);
    }

    surfaces.len()
}

/// Create a simple test cube mesh
pub fn create_test_cube() -> (Vec<Vertex>, Vec<Face>) {
    let p = |x: i32, y: i32, z: i32| Vec3::new(Fix::from_int(x), Fix::from_int(y), Fix::from_int(z));

    let positions = [
        // Front
        p(-1, -1, 1), p(1, -1, 1), p(1, 1, 1), p(-1, 1, 1),
        // Back
        p(-1, -1, -1), p(-1, 1, -1), p(1, 1, -1), p(1, -1, -1),
        // Top
        p(-1, 1, -1), p(-1, 1, 1), p(1, 1, 1), p(1, 1, -1),
        // Bottom
        p(-1, -1, -1), p(1, -1, -1), p(1, -1, 1), p(-1, -1, 1),
        // Right
        p(1, -1, -1), p(1, 1, -1), p(1, 1, 1), p(1, -1, 1),
        // Left
        p(-1, -1, -1), p(-1, -1, 1), p(-1, 1, 1), p(-1, 1, -1),
    ];

    let normals = [
        p(0, 0, 1),
        p(0, 0, -1),
        p(0, 1, 0),
        p(0, -1, 0),
        p(1, 0, 0),
        p(-1, 0, 0),
    ];

    let uvs = [
        Vec2::new(Fix::ZERO, Fix::ZERO),
        Vec2::new(Fix::ONE, Fix::ZERO),
        Vec2::new(Fix::ONE, Fix::ONE),
        Vec2::new(Fix::ZERO, Fix::ONE),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut faces = Vec::with_capacity(12);

    for (face_idx, normal) in normals.iter().enumerate() {
        let base = face_idx * 4;
        for (i, uv) in uvs.iter().enumerate() {
            vertices.push(Vertex::new(positions[base + i], *uv, *normal));
        }

        // Two triangles per face
        faces.push(Face::with_texture(base, base + 1, base + 2, 0));
        faces.push(Face::with_texture(base, base + 2, base + 3, 0));
    }

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: usize = 320;
    const HEIGHT: usize = 240;

    fn cube_view(settings: &RasterSettings) -> (Framebuffer, usize) {
        let (vertices, faces) = create_test_cube();
        let camera = Camera::at(Vec3::new(Fix::ZERO, Fix::ZERO, Fix::from_int(-5)));
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);
        fb.clear(Color::BLACK);
        let drawn = render_mesh(&mut fb, &vertices, &faces, &[], &camera, settings);
        (fb, drawn)
    }

    #[test]
    fn test_framebuffer_depth_test() {
        let mut fb = Framebuffer::new(4, 4);
        fb.clear(Color::BLACK);
        assert!(fb.set_pixel_with_depth(1, 1, Fix::from_int(5), Color::RED));
        assert!(!fb.set_pixel_with_depth(1, 1, Fix::from_int(6), Color::GREEN));
        assert!(fb.set_pixel_with_depth(1, 1, Fix::from_int(4), Color::BLUE));
        assert_eq!(fb.get_pixel(1, 1), Some(Color::BLUE));
        assert!(!fb.set_pixel_with_depth(9, 9, Fix::ZERO, Color::BLUE));
        assert_eq!(fb.get_pixel(9, 9), None);
    }

    #[test]
    fn test_framebuffer_resize_and_bytes() {
        let mut fb = Framebuffer::new(2, 2);
        fb.clear(Color::with_alpha(1, 2, 3, 4));
        assert_eq!(fb.pixels[0].to_le_bytes(), [1, 2, 3, 4]);
        fb.resize(3, 1);
        assert_eq!(fb.pixels.len(), 3);
        assert_eq!(fb.zbuffer.len(), 3);
    }

    #[test]
    fn test_cube_draws_center() {
        let (fb, drawn) = cube_view(&RasterSettings::default());
        assert_eq!(drawn, 10);
        let center = fb.get_pixel(WIDTH / 2, HEIGHT / 2);
        assert!(matches!(center, Some(c) if c != Color::BLACK));
        assert_eq!(fb.get_pixel(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn test_backface_cull_toggle() {
        let settings = RasterSettings { backface_cull: false, ..RasterSettings::default() };
        let (_, drawn) = cube_view(&settings);
        assert_eq!(drawn, 12);
    }

    #[test]
    fn test_painters_algorithm_still_draws() {
        let settings = RasterSettings {
            use_zbuffer: false,
            shading: ShadingMode::Flat,
            ..RasterSettings::default()
        };
        let (fb, drawn) = cube_view(&settings);
        assert!(drawn > 0);
        assert_ne!(fb.get_pixel(WIDTH / 2, HEIGHT / 2), Some(Color::BLACK));
    }

    #[test]
    fn test_behind_camera_is_clipped() {
        let (vertices, faces) = create_test_cube();
        let camera = Camera::at(Vec3::new(Fix::ZERO, Fix::ZERO, Fix::from_int(5)));
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);
        let drawn = render_mesh(&mut fb, &vertices, &faces, &[], &camera, &RasterSettings::default());
        assert_eq!(drawn, 0);
    }

    #[test]
    fn test_shade_intensity_bounds() {
        let light = Vec3::new(Fix::ZERO, Fix::ZERO, -Fix::ONE);
        let ambient = Fix::from_f32(0.25);
        let facing = shade_intensity(Vec3::new(Fix::ZERO, Fix::ZERO, -Fix::ONE), light, ambient);
        let away = shade_intensity(Vec3::new(Fix::ZERO, Fix::ZERO, Fix::ONE), light, ambient);
        assert_eq!(facing, Fix::ONE);
        assert_eq!(away, ambient);
    }
}
