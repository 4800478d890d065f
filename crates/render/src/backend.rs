use glam::Mat4;
use std::fmt;
use vantage_common::MeshData;

/// Opaque handle to a mesh owned by a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u64);

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Where a backend is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendState {
    #[default]
    Uninitialized,
    Initialized,
    InFrame,
    Shutdown,
}

/// Errors from render backend operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{op} is not valid while the backend is {state:?}")]
    InvalidState {
        op: &'static str,
        state: BackendState,
    },
    #[error("graphics context creation failed: {0}")]
    ContextCreation(String),
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("device request failed: {0}")]
    Device(String),
    #[error("shader compilation failed: {0}")]
    Shader(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("unknown mesh handle: {0}")]
    UnknownMesh(MeshHandle),
    #[error("mesh has no geometry")]
    EmptyMesh,
}

/// Frame lifecycle and draw submission, independent of the graphics API.
///
/// `draw_mesh` multiplies the model matrix by the cached view-projection;
/// setting the view or projection only marks that cache dirty.
pub trait RenderBackend {
    /// What the backend presents into (a window surface, or nothing).
    type Target;

    /// Create the context and compile the baseline shader. On failure the
    /// backend stays uninitialized and can be dropped or re-initialized.
    fn init(&mut self, target: Self::Target, width: u32, height: u32) -> Result<(), RenderError>;

    fn begin_frame(&mut self) -> Result<(), RenderError>;

    fn end_frame(&mut self) -> Result<(), RenderError>;

    fn set_view_matrix(&mut self, view: Mat4);

    fn set_projection_matrix(&mut self, projection: Mat4);

    /// Upload geometry and return a handle that owns the GPU copy.
    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, RenderError>;

    /// Release a mesh. Returns false for unknown handles.
    fn destroy_mesh(&mut self, mesh: MeshHandle) -> bool;

    fn mesh_index_count(&self, mesh: MeshHandle) -> Option<u32>;

    fn draw_mesh(&mut self, mesh: MeshHandle, model: Mat4) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    /// Release every mesh and the context.
    fn shutdown(&mut self);

    fn state(&self) -> BackendState;
}
