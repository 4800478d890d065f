use crate::backend::{BackendState, MeshHandle, RenderBackend, RenderError};
use crate::state::{BindCache, Lifecycle, MatrixCache};
use glam::Mat4;
use std::collections::BTreeMap;
use vantage_common::MeshData;

/// One draw call as the headless backend saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub mesh: MeshHandle,
    pub mvp: Mat4,
    pub index_count: u32,
    /// Whether the mesh's buffers had to be bound for this draw.
    pub rebound: bool,
}

/// Summary of a presented frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draws: u32,
    pub binds: u32,
    pub triangles: u64,
}

#[derive(Debug, Clone, Copy)]
struct HeadlessMesh {
    index_count: u32,
}

/// GPU-free backend with the same lifecycle and caching rules as the real
/// one. Used by the CLI and by tests.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    lifecycle: Lifecycle,
    matrices: MatrixCache,
    bind_cache: BindCache,
    meshes: BTreeMap<MeshHandle, HeadlessMesh>,
    next_id: u64,
    size: (u32, u32),
    current: Vec<DrawRecord>,
    last_frame: Vec<DrawRecord>,
    frames_presented: u64,
    init_failure: Option<String>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `init` always fails with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            init_failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Draws recorded by the most recently presented frame.
    pub fn last_frame(&self) -> &[DrawRecord] {
        &self.last_frame
    }

    pub fn last_frame_stats(&self) -> FrameStats {
        FrameStats {
            draws: self.last_frame.len() as u32,
            binds: self.last_frame.iter().filter(|d| d.rebound).count() as u32,
            triangles: self
                .last_frame
                .iter()
                .map(|d| (d.index_count / 3) as u64)
                .sum(),
        }
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn view_projection_recomputes(&self) -> u64 {
        self.matrices.recompute_count()
    }
}

impl RenderBackend for HeadlessBackend {
    type Target = ();

    fn init(&mut self, _target: (), width: u32, height: u32) -> Result<(), RenderError> {
        self.lifecycle.check_init()?;
        if let Some(reason) = &self.init_failure {
            tracing::error!("headless backend init failed: {reason}");
            return Err(RenderError::ContextCreation(reason.clone()));
        }
        self.size = (width.max(1), height.max(1));
        self.lifecycle.mark_initialized();
        tracing::info!(width, height, "headless backend initialized");
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.check_begin_frame()?;
        self.matrices.view_projection();
        self.bind_cache.reset();
        self.current.clear();
        self.lifecycle.enter_frame();
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.check_in_frame("end_frame")?;
        self.last_frame = std::mem::take(&mut self.current);
        self.frames_presented += 1;
        self.lifecycle.leave_frame();
        Ok(())
    }

    fn set_view_matrix(&mut self, view: Mat4) {
        self.matrices.set_view(view);
    }

    fn set_projection_matrix(&mut self, projection: Mat4) {
        self.matrices.set_projection(projection);
    }

    fn create_mesh(&mut self, mesh: &MeshData) -> Result<MeshHandle, RenderError> {
        self.lifecycle.check_ready("create_mesh")?;
        if mesh.is_empty() {
            return Err(RenderError::EmptyMesh);
        }
        let handle = MeshHandle(self.next_id);
        self.next_id += 1;
        self.meshes.insert(
            handle,
            HeadlessMesh {
                index_count: mesh.index_count(),
            },
        );
        tracing::debug!(
            %handle,
            vertices = mesh.vertex_count(),
            indices = mesh.index_count(),
            "mesh created"
        );
        Ok(handle)
    }

    fn destroy_mesh(&mut self, mesh: MeshHandle) -> bool {
        self.bind_cache.invalidate(mesh);
        self.meshes.remove(&mesh).is_some()
    }

    fn mesh_index_count(&self, mesh: MeshHandle) -> Option<u32> {
        self.meshes.get(&mesh).map(|m| m.index_count)
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, model: Mat4) -> Result<(), RenderError> {
        self.lifecycle.check_in_frame("draw_mesh")?;
        let Some(index_count) = self.meshes.get(&mesh).map(|m| m.index_count) else {
            tracing::warn!("draw of unknown {mesh}");
            return Err(RenderError::UnknownMesh(mesh));
        };
        let mvp = self.matrices.view_projection() * model;
        let rebound = self.bind_cache.bind(mesh);
        self.current.push(DrawRecord {
            mesh,
            mvp,
            index_count,
            rebound,
        });
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
    }

    fn shutdown(&mut self) {
        if self.lifecycle.shutdown() {
            let released = self.meshes.len();
            self.meshes.clear();
            self.current.clear();
            self.bind_cache.reset();
            tracing::info!(released, "headless backend shut down");
        }
    }

    fn state(&self) -> BackendState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vantage_common::Vertex;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![
                Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
                Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ],
            vec![0, 1, 2],
        )
    }

    fn ready() -> HeadlessBackend {
        let mut backend = HeadlessBackend::new();
        backend.init((), 800, 600).unwrap();
        backend
    }

    #[test]
    fn identical_uploads_have_equal_index_counts() {
        let mut backend = ready();
        let a = backend.create_mesh(&triangle()).unwrap();
        let b = backend.create_mesh(&triangle()).unwrap();
        assert_ne!(a, b);
        assert_eq!(backend.mesh_index_count(a), backend.mesh_index_count(b));
        assert_eq!(backend.mesh_index_count(a), Some(3));
    }

    #[test]
    fn draw_requires_frame() {
        let mut backend = ready();
        let mesh = backend.create_mesh(&triangle()).unwrap();
        let err = backend.draw_mesh(mesh, Mat4::IDENTITY).unwrap_err();
        assert!(matches!(err, RenderError::InvalidState { op: "draw_mesh", .. }));
        assert!(backend.end_frame().is_err());
    }

    #[test]
    fn nothing_before_init() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.begin_frame().is_err());
        assert!(backend.create_mesh(&triangle()).is_err());
        assert_eq!(backend.state(), BackendState::Uninitialized);
    }

    #[test]
    fn failed_init_leaves_backend_uninitialized() {
        let mut backend = HeadlessBackend::failing("no display");
        let err = backend.init((), 640, 480).unwrap_err();
        assert!(matches!(err, RenderError::ContextCreation(_)));
        assert_eq!(backend.state(), BackendState::Uninitialized);
        backend.shutdown();
        assert_eq!(backend.state(), BackendState::Uninitialized);
    }

    #[test]
    fn mvp_is_view_projection_times_model() {
        let mut backend = ready();
        let mesh = backend.create_mesh(&triangle()).unwrap();
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        let proj = Mat4::from_scale(Vec3::new(0.5, 0.5, 1.0));
        let model = Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0));
        backend.set_view_matrix(view);
        backend.set_projection_matrix(proj);
        backend.begin_frame().unwrap();
        backend.draw_mesh(mesh, model).unwrap();
        backend.end_frame().unwrap();

        assert_eq!(backend.last_frame()[0].mvp, proj * view * model);
    }

    #[test]
    fn view_projection_computed_once_per_change() {
        let mut backend = ready();
        let mesh = backend.create_mesh(&triangle()).unwrap();
        backend.set_view_matrix(Mat4::from_translation(Vec3::Z));
        backend.set_projection_matrix(Mat4::IDENTITY);
        backend.set_view_matrix(Mat4::from_translation(Vec3::X));
        backend.begin_frame().unwrap();
        for _ in 0..10 {
            backend.draw_mesh(mesh, Mat4::IDENTITY).unwrap();
        }
        backend.end_frame().unwrap();
        assert_eq!(backend.view_projection_recomputes(), 1);

        backend.begin_frame().unwrap();
        backend.draw_mesh(mesh, Mat4::IDENTITY).unwrap();
        backend.end_frame().unwrap();
        assert_eq!(backend.view_projection_recomputes(), 1);
    }

    #[test]
    fn repeated_mesh_is_bound_once() {
        let mut backend = ready();
        let a = backend.create_mesh(&triangle()).unwrap();
        let b = backend.create_mesh(&triangle()).unwrap();
        backend.begin_frame().unwrap();
        for mesh in [a, a, a, b, b, a] {
            backend.draw_mesh(mesh, Mat4::IDENTITY).unwrap();
        }
        backend.end_frame().unwrap();

        let stats = backend.last_frame_stats();
        assert_eq!(stats.draws, 6);
        assert_eq!(stats.binds, 3);
        assert_eq!(stats.triangles, 6);
        assert_eq!(backend.frames_presented(), 1);
    }

    #[test]
    fn unknown_and_destroyed_meshes_rejected() {
        let mut backend = ready();
        let mesh = backend.create_mesh(&triangle()).unwrap();
        assert!(backend.destroy_mesh(mesh));
        assert!(!backend.destroy_mesh(mesh));
        backend.begin_frame().unwrap();
        let err = backend.draw_mesh(mesh, Mat4::IDENTITY).unwrap_err();
        assert!(matches!(err, RenderError::UnknownMesh(h) if h == mesh));
    }

    #[test]
    fn empty_mesh_rejected() {
        let mut backend = ready();
        let err = backend.create_mesh(&MeshData::default()).unwrap_err();
        assert!(matches!(err, RenderError::EmptyMesh));
    }

    #[test]
    fn shutdown_releases_and_allows_reinit() {
        let mut backend = ready();
        backend.create_mesh(&triangle()).unwrap();
        backend.shutdown();
        assert_eq!(backend.state(), BackendState::Shutdown);
        assert_eq!(backend.mesh_count(), 0);
        assert!(backend.begin_frame().is_err());
        backend.init((), 320, 240).unwrap();
        assert_eq!(backend.state(), BackendState::Initialized);
        assert_eq!(backend.size(), (320, 240));
    }
}
