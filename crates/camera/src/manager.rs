use crate::camera::Camera;
use glam::{DVec3, Mat4, Vec3};
use vantage_common::precision;
use vantage_common::{CameraConfig, FloatingOriginConfig, Precision};
use vantage_input::InputState;

/// Owns the double- and single-precision cameras and the floating origin.
///
/// The double camera's `position` is absolute world space. The float camera
/// holds the same view expressed relative to `world_origin`, so the renderer
/// only ever sees small coordinates. Yaw/pitch flow from the authoritative
/// camera to the other one, never back.
#[derive(Debug, Clone)]
pub struct CameraManager {
    camera_d: Camera<f64>,
    camera_f: Camera<f32>,
    precision: Precision,
    world_origin: DVec3,
    origin_enabled: bool,
    threshold_sq: f64,
}

impl Default for CameraManager {
    fn default() -> Self {
        Self::new(&CameraConfig::default(), &FloatingOriginConfig::default())
    }
}

impl CameraManager {
    pub fn new(camera: &CameraConfig, origin: &FloatingOriginConfig) -> Self {
        Self {
            camera_d: Camera::from_config(camera),
            camera_f: Camera::from_config(camera),
            precision: camera.precision,
            world_origin: DVec3::ZERO,
            origin_enabled: origin.enabled,
            threshold_sq: origin.threshold * origin.threshold,
        }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Switch the authoritative camera. The newly active camera adopts the
    /// other one's pose so the view does not jump.
    pub fn set_precision(&mut self, mode: Precision) {
        if mode == self.precision {
            return;
        }
        match mode {
            Precision::Double => {
                self.camera_d.position =
                    self.world_origin + precision::to_double(self.camera_f.position);
                self.camera_d
                    .set_angles(self.camera_f.yaw as f64, self.camera_f.pitch as f64);
            }
            Precision::Single => self.sync_float_from_double(),
        }
        tracing::info!("camera precision set to {mode:?}");
        self.precision = mode;
    }

    pub fn world_origin(&self) -> DVec3 {
        self.world_origin
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_sq.sqrt()
    }

    pub fn double_camera(&self) -> &Camera<f64> {
        &self.camera_d
    }

    pub fn float_camera(&self) -> &Camera<f32> {
        &self.camera_f
    }

    /// Absolute world-space camera position.
    pub fn camera_position(&self) -> DVec3 {
        match self.precision {
            Precision::Double => self.camera_d.position,
            Precision::Single => self.world_origin + precision::to_double(self.camera_f.position),
        }
    }

    /// Camera position relative to the world origin, in render precision.
    pub fn local_camera_position(&self) -> Vec3 {
        match self.precision {
            Precision::Double => precision::relative_to(self.camera_d.position, self.world_origin),
            Precision::Single => self.camera_f.position,
        }
    }

    /// Place the camera at an absolute world position. The origin rebases
    /// on the next `update_floating_origin` if the jump is large.
    pub fn teleport(&mut self, position: DVec3) {
        self.camera_d.position = position;
        self.camera_f.position = precision::relative_to(position, self.world_origin);
        tracing::debug!(?position, "camera teleported");
    }

    pub fn set_angles(&mut self, yaw: f64, pitch: f64) {
        self.camera_d.set_angles(yaw, pitch);
        self.camera_f.set_angles(yaw as f32, pitch as f32);
    }

    /// Full per-frame update of the authoritative camera.
    pub fn update(&mut self, dt: f32, input: &InputState, mouse_dx: f32, mouse_dy: f32) {
        match self.precision {
            Precision::Double => {
                self.camera_d
                    .update(dt as f64, input, mouse_dx as f64, mouse_dy as f64);
                self.sync_float_from_double();
            }
            Precision::Single => {
                self.camera_f.update(dt, input, mouse_dx, mouse_dy);
                self.camera_d
                    .set_angles(self.camera_f.yaw as f64, self.camera_f.pitch as f64);
                self.camera_d.position =
                    self.world_origin + precision::to_double(self.camera_f.position);
            }
        }
    }

    /// Mouse look on the double camera only; yaw/pitch are then copied into
    /// the float camera.
    pub fn update_rotation_only(&mut self, _dt: f32, mouse_dx: f32, mouse_dy: f32) {
        self.camera_d.rotate(mouse_dx as f64, mouse_dy as f64);
        self.camera_f
            .set_angles(self.camera_d.yaw as f32, self.camera_d.pitch as f32);
    }

    /// Rebase the origin onto `player_position` when it has drifted further
    /// than the threshold. Returns the applied shift.
    ///
    /// Anything else that stores origin-relative coordinates must be moved by
    /// `-delta` when this returns `Some`.
    pub fn update_floating_origin(&mut self, player_position: DVec3) -> Option<DVec3> {
        if !self.origin_enabled {
            return None;
        }
        let delta = player_position - self.world_origin;
        if delta.length_squared() > self.threshold_sq {
            self.apply_floating_origin_shift(delta);
            Some(delta)
        } else {
            None
        }
    }

    /// Move the origin by `delta`; origin-relative camera coordinates move by
    /// `-delta` while the absolute position is unchanged.
    ///
    /// The double camera's position is never offset by `delta`: it stays in
    /// absolute world space, and [`Self::local_view_matrix`] subtracts the
    /// origin exactly once when building the render-space view.
    pub fn apply_floating_origin_shift(&mut self, delta: DVec3) {
        let absolute = self.camera_position();
        self.world_origin += delta;
        self.camera_f.position = precision::relative_to(absolute, self.world_origin);
        tracing::info!(
            delta = ?delta,
            origin = ?self.world_origin,
            "floating origin shifted"
        );
    }

    /// View matrix for the renderer, relative to the world origin.
    pub fn local_view_matrix(&self) -> Mat4 {
        match self.precision {
            Precision::Double => {
                let mut local = self.camera_d.clone();
                local.position = self.camera_d.position - self.world_origin;
                local.update_orientation();
                precision::mat_to_float(local.view_matrix())
            }
            Precision::Single => self.camera_f.view_matrix(),
        }
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        self.camera_f.projection_matrix(aspect)
    }

    fn sync_float_from_double(&mut self) {
        self.camera_f
            .set_angles(self.camera_d.yaw as f32, self.camera_d.pitch as f32);
        self.camera_f.position = precision::relative_to(self.camera_d.position, self.world_origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;
    use vantage_input::Action;

    fn manager_with_threshold(threshold: f64) -> CameraManager {
        CameraManager::new(
            &CameraConfig::default(),
            &FloatingOriginConfig {
                enabled: true,
                threshold,
            },
        )
    }

    #[test]
    fn no_shift_within_threshold() {
        let mut mgr = CameraManager::default();
        assert_eq!(mgr.update_floating_origin(DVec3::new(999.0, 0.0, 0.0)), None);
        assert_eq!(mgr.world_origin(), DVec3::ZERO);
    }

    #[test]
    fn shift_beyond_threshold() {
        let mut mgr = CameraManager::default();
        let player = DVec3::new(1500.0, 20.0, -3.0);
        mgr.teleport(player);
        let delta = mgr.update_floating_origin(player);
        assert_eq!(delta, Some(player));
        assert_eq!(mgr.world_origin(), player);
        assert_eq!(mgr.camera_position(), player);
        assert_eq!(mgr.local_camera_position(), Vec3::ZERO);
    }

    #[test]
    fn displacement_bounded_after_every_shift() {
        let mut mgr = manager_with_threshold(100.0);
        let mut player = DVec3::ZERO;
        for i in 0..500 {
            player += DVec3::new(37.5, -3.25 * (i % 7) as f64, 91.0);
            if mgr.update_floating_origin(player).is_some() {
                assert!((player - mgr.world_origin()).length() <= mgr.threshold());
            }
            assert!((player - mgr.world_origin()).length_squared() <= 100.0 * 100.0);
        }
    }

    #[test]
    fn disabled_never_shifts() {
        let mut mgr = CameraManager::new(
            &CameraConfig::default(),
            &FloatingOriginConfig {
                enabled: false,
                threshold: 1.0,
            },
        );
        assert_eq!(mgr.update_floating_origin(DVec3::splat(1.0e6)), None);
        assert_eq!(mgr.world_origin(), DVec3::ZERO);
    }

    #[test]
    fn manual_shift_moves_local_coordinates() {
        let mut mgr = CameraManager::default();
        mgr.teleport(DVec3::new(10.0, 0.0, 0.0));
        mgr.apply_floating_origin_shift(DVec3::new(4.0, 0.0, 0.0));
        assert_eq!(mgr.world_origin(), DVec3::new(4.0, 0.0, 0.0));
        assert_eq!(mgr.camera_position(), DVec3::new(10.0, 0.0, 0.0));
        assert_eq!(mgr.local_camera_position(), Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(mgr.float_camera().position, Vec3::new(6.0, 0.0, 0.0));
        assert_eq!(mgr.double_camera().position, DVec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn rotation_only_copies_angles_to_float_camera() {
        let mut mgr = CameraManager::default();
        mgr.teleport(DVec3::new(5.0, 5.0, 5.0));
        mgr.update_rotation_only(0.016, 100.0, -50.0);
        let d = mgr.double_camera();
        let f = mgr.float_camera();
        assert_eq!(f.yaw, d.yaw as f32);
        assert_eq!(f.pitch, d.pitch as f32);
        assert_eq!(d.position, DVec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn rotation_only_clamps_pitch() {
        let mut mgr = CameraManager::default();
        for _ in 0..10 {
            mgr.update_rotation_only(0.016, 0.0, -1.0e5);
            assert!(mgr.double_camera().pitch <= 89.9);
            assert!(mgr.float_camera().pitch <= 89.9);
        }
    }

    #[test]
    fn local_view_maps_camera_to_origin_far_from_world_zero() {
        let mut mgr = CameraManager::default();
        let far = DVec3::new(3.0e9 + 0.5, 12.0, -7.0e8 + 0.25);
        mgr.teleport(far);
        mgr.set_angles(33.0, -12.0);
        mgr.update_floating_origin(far + DVec3::new(1.0e4, 0.0, 0.0));
        // Camera sits 1e4 units from the origin; the local view must still
        // put it exactly at eye space zero.
        let local = mgr.local_camera_position();
        let p = mgr.local_view_matrix() * Vec4::new(local.x, local.y, local.z, 1.0);
        assert!(p.truncate().length() < 1e-2, "{p:?}");
        assert!(mgr.local_view_matrix().is_finite());
    }

    #[test]
    fn double_update_moves_and_syncs() {
        let mut mgr = CameraManager::default();
        let mut input = InputState::new();
        input.press(Action::MoveForward);
        mgr.update(1.0, &input, 0.0, 0.0);
        let pos = mgr.camera_position();
        assert!((pos - DVec3::new(0.0, 0.0, -10.0)).length() < 1e-9);
        assert!((mgr.float_camera().position - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-5);
    }

    #[test]
    fn single_update_drives_double_camera() {
        let mut cfg = CameraConfig::default();
        cfg.precision = Precision::Single;
        let mut mgr = CameraManager::new(&cfg, &FloatingOriginConfig::default());
        let mut input = InputState::new();
        input.press(Action::MoveUp);
        mgr.update(2.0, &input, 40.0, 0.0);
        assert!((mgr.camera_position() - DVec3::new(0.0, 20.0, 0.0)).length() < 1e-4);
        assert_eq!(mgr.double_camera().yaw, mgr.float_camera().yaw as f64);
    }

    #[test]
    fn single_mode_shift_rebases_float_camera() {
        let mut cfg = CameraConfig::default();
        cfg.precision = Precision::Single;
        let mut mgr = CameraManager::new(&cfg, &FloatingOriginConfig::default());
        mgr.teleport(DVec3::new(1200.0, 0.0, 0.0));
        let delta = mgr.update_floating_origin(mgr.camera_position());
        assert_eq!(delta, Some(DVec3::new(1200.0, 0.0, 0.0)));
        assert_eq!(mgr.float_camera().position, Vec3::ZERO);
        assert_eq!(mgr.camera_position(), DVec3::new(1200.0, 0.0, 0.0));
    }

    #[test]
    fn precision_switch_preserves_pose() {
        let mut mgr = CameraManager::default();
        mgr.teleport(DVec3::new(3.0, 4.0, 5.0));
        mgr.set_angles(45.0, 10.0);
        mgr.set_precision(Precision::Single);
        assert_eq!(mgr.camera_position(), DVec3::new(3.0, 4.0, 5.0));
        mgr.set_precision(Precision::Double);
        assert_eq!(mgr.camera_position(), DVec3::new(3.0, 4.0, 5.0));
        assert_eq!(mgr.double_camera().yaw, 45.0);
    }

    #[test]
    fn projection_uses_configured_fov() {
        let mgr = CameraManager::default();
        let proj = mgr.projection_matrix(1.0);
        // 90° vertical at 1:1 gives a focal length of 1.
        assert!((proj.y_axis.y - 1.0).abs() < 1e-6);
    }
}
