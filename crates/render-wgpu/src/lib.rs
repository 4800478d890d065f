//! wgpu render backend.
//!
//! Implements `RenderBackend` over a window surface. Draws recorded between
//! `begin_frame` and `end_frame` are encoded into a single pass at
//! `end_frame`; each draw's MVP lives at its own dynamic offset in one
//! uniform buffer.
//!
//! # Invariants
//! - Every GPU buffer is owned by exactly one `MeshHandle` and freed on drop.
//! - A failed `init` leaves no context behind.

mod gpu;
mod shaders;

pub use gpu::{WgpuBackend, WgpuSettings, backends_for};

pub fn crate_info() -> &'static str {
    "vantage-render-wgpu v0.1.0"
}
