//! Shared types for the vantage engine.
//!
//! Everything here is plain data: configuration sections, the vertex layout
//! every backend uploads, and the f64/f32 conversion boundary used by the
//! floating-origin camera.

pub mod config;
pub mod precision;
pub mod types;

pub use config::{
    BackendKind, CameraConfig, ConfigError, EngineConfig, FloatingOriginConfig, Precision,
    RenderConfig, WindowConfig,
};
pub use types::{MeshData, Vertex};

pub fn crate_info() -> &'static str {
    "vantage-common v0.1.0"
}
