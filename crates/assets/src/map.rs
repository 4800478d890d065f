use crate::AssetError;
use crate::primitives::{self, MAX_TESSELLATION};
use glam::DVec3;
use serde::Deserialize;
use std::path::Path;
use vantage_common::MeshData;

const STATIC_GEOMETRY: &str = "static_geometry";
const PLAYER_START: &str = "info_player_start";

/// Primitive description carried by a `static_geometry` entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeometryDesc {
    Cube {
        #[serde(default = "unit_size3")]
        size: [f32; 3],
    },
    Plane {
        /// [x, z] extents.
        #[serde(default = "unit_size2")]
        size: [f32; 2],
    },
    Sphere {
        #[serde(default = "unit_radius")]
        radius: f32,
        #[serde(default = "default_tessellation")]
        slices: u32,
        #[serde(default = "default_tessellation")]
        stacks: u32,
    },
}

fn unit_size3() -> [f32; 3] {
    [1.0; 3]
}

fn unit_size2() -> [f32; 2] {
    [1.0; 2]
}

fn unit_radius() -> f32 {
    1.0
}

fn default_tessellation() -> u32 {
    16
}

impl GeometryDesc {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Cube { .. } => "cube",
            Self::Plane { .. } => "plane",
            Self::Sphere { .. } => "sphere",
        }
    }

    /// Reject dimensions that would produce degenerate or inverted meshes.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match self {
            Self::Cube { size } if !size.iter().copied().all(positive) => {
                Err(format!("cube size must be positive, got {size:?}"))
            }
            Self::Plane { size } if !size.iter().copied().all(positive) => {
                Err(format!("plane size must be positive, got {size:?}"))
            }
            Self::Sphere { radius, .. } if !positive(*radius) => {
                Err(format!("sphere radius must be positive, got {radius}"))
            }
            Self::Sphere { slices, stacks, .. }
                if *slices > MAX_TESSELLATION || *stacks > MAX_TESSELLATION =>
            {
                Err(format!(
                    "sphere tessellation {slices}x{stacks} exceeds {MAX_TESSELLATION}"
                ))
            }
            _ => Ok(()),
        }
    }

    pub fn build(&self) -> MeshData {
        match *self {
            Self::Cube { size } => primitives::cube(size),
            Self::Plane { size } => primitives::plane(size),
            Self::Sphere {
                radius,
                slices,
                stacks,
            } => primitives::sphere(radius, slices, stacks),
        }
    }
}

/// A `static_geometry` entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StaticGeometryEntity {
    /// Absolute world position.
    #[serde(default)]
    pub origin: [f64; 3],
    pub geometry: GeometryDesc,
}

impl StaticGeometryEntity {
    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.origin)
    }
}

/// Spawn point from `info_player_start`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PlayerStart {
    #[serde(default)]
    pub origin: [f64; 3],
    /// Degrees; -90 looks down -Z.
    #[serde(default = "default_yaw")]
    pub yaw: f64,
}

fn default_yaw() -> f64 {
    -90.0
}

impl PlayerStart {
    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.origin)
    }
}

/// Parsed map, before any GPU upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapDocument {
    pub static_geometry: Vec<StaticGeometryEntity>,
    pub player_start: Option<PlayerStart>,
    /// Entities dropped because they could not be understood.
    pub skipped: usize,
}

/// Parse a map document. Only a malformed document is an error; bad
/// entities are logged and counted in `skipped`.
pub fn parse_map(json: &str) -> Result<MapDocument, AssetError> {
    let root: serde_json::Value = serde_json::from_str(json)?;
    let entities = root
        .get("entities")
        .and_then(|e| e.as_array())
        .ok_or(AssetError::MissingEntities)?;

    let mut doc = MapDocument::default();
    for (index, entity) in entities.iter().enumerate() {
        let Some(classname) = entity.get("classname").and_then(|c| c.as_str()) else {
            tracing::warn!(index, "entity has no classname; skipped");
            doc.skipped += 1;
            continue;
        };

        match classname {
            STATIC_GEOMETRY => match StaticGeometryEntity::deserialize(entity) {
                Ok(parsed) => {
                    if let Err(reason) = parsed.geometry.validate() {
                        tracing::warn!(index, "static_geometry: {reason}; skipped");
                        doc.skipped += 1;
                    } else {
                        doc.static_geometry.push(parsed);
                    }
                }
                Err(e) => {
                    tracing::warn!(index, "static_geometry: {e}; skipped");
                    doc.skipped += 1;
                }
            },
            PLAYER_START => match PlayerStart::deserialize(entity) {
                Ok(start) if doc.player_start.is_none() => doc.player_start = Some(start),
                Ok(_) => tracing::debug!(index, "additional info_player_start ignored"),
                Err(e) => {
                    tracing::warn!(index, "info_player_start: {e}; skipped");
                    doc.skipped += 1;
                }
            },
            other => tracing::debug!(index, classname = other, "entity class not handled"),
        }
    }

    Ok(doc)
}

/// Read and parse a map file.
pub fn load_map_file(path: impl AsRef<Path>) -> Result<MapDocument, AssetError> {
    let data = std::fs::read_to_string(path.as_ref())?;
    parse_map(&data)
}
