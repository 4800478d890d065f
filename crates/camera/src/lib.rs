//! First-person cameras and the floating origin.
//!
//! One `Camera<S>` serves both precisions: `Camera<f64>` tracks where the
//! viewer really is, `Camera<f32>` is what the renderer consumes. The
//! `CameraManager` owns both and is the only place world positions are
//! narrowed to render precision.
//!
//! # Invariants
//! - Pitch stays within ±89.9°.
//! - forward/right/up are orthonormal after every orientation update.
//! - Only the manager's rebase mutates the world origin.

mod camera;
mod manager;
mod real;

pub use camera::{Camera, PITCH_LIMIT_DEGREES};
pub use manager::CameraManager;
pub use real::Real;

pub fn crate_info() -> &'static str {
    "vantage-camera v0.1.0"
}
