//! fixpace: Q32.32 fixed-point arithmetic and adaptive frame pacing
//!
//! - `fixed`: the `Fix` number type (exact and fast multiply, divide, reciprocal)
//! - `pacing`: virtual frame clock with bounded frameskip and a diagnostic pause
//! - `rasterizer`: PS1-style software renderer on top of `Fix`
//! - `display`: where frames go (window or headless capture)
//! - `scene`, `app`: the spinning-cube demo that ties it together

pub mod app;
pub mod config;
pub mod display;
pub mod fixed;
pub mod logging;
pub mod pacing;
pub mod rasterizer;
pub mod scene;

pub use fixed::Fix;
