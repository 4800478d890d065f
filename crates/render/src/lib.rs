//! Render backend seam.
//!
//! # Invariants
//! - Backends own every GPU resource; callers hold opaque `MeshHandle`s.
//! - Frame calls follow `Uninitialized → Initialized → InFrame ⇄ Initialized → Shutdown`.
//!   Out-of-order calls fail with `RenderError::InvalidState` and change nothing.
//! - The view-projection product is recomputed lazily, at most once per change.
//!
//! `HeadlessBackend` implements the same contract without a GPU and records
//! what it would have drawn.

mod backend;
mod headless;
mod state;

pub use backend::{BackendState, MeshHandle, RenderBackend, RenderError};
pub use headless::{DrawRecord, FrameStats, HeadlessBackend};
pub use state::{BindCache, Lifecycle, MatrixCache};

pub fn crate_info() -> &'static str {
    "vantage-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
