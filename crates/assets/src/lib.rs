//! Static geometry pipeline: map JSON → primitive meshes → backend handles.
//!
//! Maps are declarative lists of entities. `static_geometry` entities become
//! one uploaded mesh each; `info_player_start` gives the spawn point.
//! Problems with a single entity are logged and the entity is skipped;
//! only an unreadable document fails the load.

pub mod map;
pub mod primitives;
pub mod scene;

pub use map::{
    GeometryDesc, MapDocument, PlayerStart, StaticGeometryEntity, load_map_file, parse_map,
};
pub use scene::{MapLoadReport, StaticMeshInstance, StaticScene};

use vantage_render::RenderError;

/// Errors from asset loading.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map has no `entities` array")]
    MissingEntities,
    #[error("mesh upload failed: {0}")]
    Render(#[from] RenderError),
}

pub fn crate_info() -> &'static str {
    "vantage-assets v0.1.0"
}
