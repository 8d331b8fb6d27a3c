//! PS1-style software rasterizer on Q32.32 fixed point
//!
//! Features:
//! - Perspective divide through the fixed-point reciprocal
//! - Affine or perspective-correct texture mapping
//! - Vertex snapping (integer coords = PS1 jitter)
//! - Flat and Gouraud shading
//! - Z-buffer or painter's algorithm

mod math;
mod types;
mod render;

pub use math::*;
pub use types::*;
pub use render::*;
