use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading engine configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Which camera is authoritative for movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

impl Precision {
    pub fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Double,
            Self::Double => Self::Single,
        }
    }
}

/// Graphics API the GPU backend should request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Auto,
    Gl,
    Vulkan,
    Metal,
    Dx12,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vantage".into(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Horizontal field of view; converted to vertical per aspect ratio.
    pub fov_horizontal_degrees: f64,
    pub near: f64,
    pub far: f64,
    /// Degrees of rotation per unit of mouse motion.
    pub sensitivity: f64,
    /// World units per second.
    pub move_speed: f64,
    pub sprint_multiplier: f64,
    pub precision: Precision,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_horizontal_degrees: 90.0,
            near: 0.1,
            far: 10_000.0,
            sensitivity: 0.1,
            move_speed: 10.0,
            sprint_multiplier: 3.0,
            precision: Precision::Double,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingOriginConfig {
    pub enabled: bool,
    /// Camera displacement (world units) that triggers a rebase.
    pub threshold: f64,
}

impl Default for FloatingOriginConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub backend: BackendKind,
    pub vsync: bool,
    pub clear_color: [f32; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            vsync: true,
            clear_color: [0.1, 0.1, 0.15, 1.0],
        }
    }
}

/// Top-level engine configuration. Every section falls back to its defaults,
/// so a partial YAML file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub floating_origin: FloatingOriginConfig,
    pub render: RenderConfig,
}

impl EngineConfig {
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&data)
    }

    /// Load from `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_yaml::to_writer(file, self)?;
        Ok(())
    }
}
