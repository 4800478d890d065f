//! Input snapshot: which movement actions are held and how far the mouse
//! moved this frame.
//!
//! # Invariants
//! - Cameras read input, never raw window events.
//! - The snapshot is owned by the application loop; consumers borrow it.

pub mod action;

pub use action::{Action, InputState};

pub fn crate_info() -> &'static str {
    "vantage-input v0.1.0"
}
