use crate::backend::{BackendState, MeshHandle, RenderError};
use glam::Mat4;

/// Backend lifecycle state machine shared by every backend.
///
/// Checks and transitions are separate so a backend can validate, do fallible
/// work, and only then commit the new state.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: BackendState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BackendState {
        self.state
    }

    fn require(&self, op: &'static str, allowed: &[BackendState]) -> Result<(), RenderError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                op,
                state: self.state,
            })
        }
    }

    pub fn check_init(&self) -> Result<(), RenderError> {
        self.require(
            "init",
            &[BackendState::Uninitialized, BackendState::Shutdown],
        )
    }

    pub fn check_begin_frame(&self) -> Result<(), RenderError> {
        self.require("begin_frame", &[BackendState::Initialized])
    }

    pub fn check_in_frame(&self, op: &'static str) -> Result<(), RenderError> {
        self.require(op, &[BackendState::InFrame])
    }

    /// Initialized or mid-frame: resource creation is allowed.
    pub fn check_ready(&self, op: &'static str) -> Result<(), RenderError> {
        self.require(op, &[BackendState::Initialized, BackendState::InFrame])
    }

    pub fn mark_initialized(&mut self) {
        self.state = BackendState::Initialized;
    }

    pub fn enter_frame(&mut self) {
        debug_assert_eq!(self.state, BackendState::Initialized);
        self.state = BackendState::InFrame;
    }

    pub fn leave_frame(&mut self) {
        debug_assert_eq!(self.state, BackendState::InFrame);
        self.state = BackendState::Initialized;
    }

    /// Returns whether there was anything live to shut down.
    pub fn shutdown(&mut self) -> bool {
        let live = matches!(
            self.state,
            BackendState::Initialized | BackendState::InFrame
        );
        if live {
            self.state = BackendState::Shutdown;
        }
        live
    }
}

/// View and projection with a lazily recomputed product.
#[derive(Debug, Clone)]
pub struct MatrixCache {
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    dirty: bool,
    recomputes: u64,
}

impl Default for MatrixCache {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
            dirty: false,
            recomputes: 0,
        }
    }
}

impl MatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_view(&mut self, view: Mat4) {
        self.view = view;
        self.dirty = true;
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// `projection * view`, recomputed only if either changed.
    pub fn view_projection(&mut self) -> Mat4 {
        if self.dirty {
            self.view_projection = self.projection * self.view;
            self.dirty = false;
            self.recomputes += 1;
        }
        self.view_projection
    }

    /// How many times the product has actually been computed.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}

/// Remembers the last mesh whose buffers were bound.
#[derive(Debug, Clone, Default)]
pub struct BindCache {
    last: Option<MeshHandle>,
}

impl BindCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `mesh` differs from the last bound mesh and its
    /// buffers must be bound.
    pub fn bind(&mut self, mesh: MeshHandle) -> bool {
        if self.last == Some(mesh) {
            false
        } else {
            self.last = Some(mesh);
            true
        }
    }

    pub fn last(&self) -> Option<MeshHandle> {
        self.last
    }

    /// Forget the binding, e.g. at the start of a new pass.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Forget `mesh` if it is the bound one; a destroyed handle must not
    /// suppress a rebind.
    pub fn invalidate(&mut self, mesh: MeshHandle) {
        if self.last == Some(mesh) {
            self.last = None;
        }
    }
}
