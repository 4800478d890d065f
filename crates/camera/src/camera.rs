use crate::real::Real;
use vantage_common::CameraConfig;
use vantage_input::{Action, InputState};

/// Pitch is clamped to ±this many degrees so forward never aligns with world up.
pub const PITCH_LIMIT_DEGREES: f64 = 89.9;

/// First-person camera with yaw/pitch orientation, generic over precision.
///
/// Angles are stored in degrees. The forward/right/up basis is cached and
/// recomputed by every orientation change made through the methods here;
/// after writing `yaw`/`pitch`/`position` directly, call
/// [`Camera::update_orientation`] before asking for a view matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera<S: Real> {
    pub position: S::Vec3,
    pub yaw: S,
    pub pitch: S,
    pub fov_horizontal_degrees: S,
    pub near: S,
    pub far: S,
    pub sensitivity: S,
    pub move_speed: S,
    pub sprint_multiplier: S,
    forward: S::Vec3,
    right: S::Vec3,
    up: S::Vec3,
}

impl<S: Real> Default for Camera<S> {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl<S: Real> Camera<S> {
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: S::zero_vec(),
            yaw: S::lit(-90.0),
            pitch: S::zero(),
            fov_horizontal_degrees: S::lit(config.fov_horizontal_degrees),
            near: S::lit(config.near),
            far: S::lit(config.far),
            sensitivity: S::lit(config.sensitivity),
            move_speed: S::lit(config.move_speed),
            sprint_multiplier: S::lit(config.sprint_multiplier),
            forward: S::zero_vec(),
            right: S::zero_vec(),
            up: S::zero_vec(),
        };
        camera.update_orientation();
        camera
    }

    pub fn with_position(mut self, position: S::Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn forward(&self) -> S::Vec3 {
        self.forward
    }

    pub fn right(&self) -> S::Vec3 {
        self.right
    }

    pub fn up(&self) -> S::Vec3 {
        self.up
    }

    /// Per-frame update: mouse look, then movement from held actions.
    pub fn update(&mut self, dt: S, input: &InputState, mouse_dx: S, mouse_dy: S) {
        self.rotate(mouse_dx, mouse_dy);

        let mut speed = self.move_speed * dt;
        if input.is_held(Action::Sprint) {
            speed = speed * self.sprint_multiplier;
        }

        let forward = S::lit(input.axis(Action::MoveForward, Action::MoveBackward) as f64);
        let strafe = S::lit(input.axis(Action::MoveRight, Action::MoveLeft) as f64);
        let lift = S::lit(input.axis(Action::MoveUp, Action::MoveDown) as f64);

        self.position += self.forward * (forward * speed);
        self.position += self.right * (strafe * speed);
        self.position += S::world_up() * (lift * speed);
    }

    /// Mouse look only.
    pub fn rotate(&mut self, mouse_dx: S, mouse_dy: S) {
        self.yaw = self.yaw + mouse_dx * self.sensitivity;
        self.pitch = self.pitch - mouse_dy * self.sensitivity;
        self.update_orientation();
    }

    pub fn set_angles(&mut self, yaw: S, pitch: S) {
        self.yaw = yaw;
        self.pitch = pitch;
        self.update_orientation();
    }

    /// Clamp pitch and rebuild the forward/right/up basis from yaw/pitch.
    pub fn update_orientation(&mut self) {
        let limit = S::lit(PITCH_LIMIT_DEGREES);
        self.pitch = self.pitch.max(-limit).min(limit);

        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        self.forward = S::normalize(S::vec3(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        ));
        self.right = S::normalize(S::cross(self.forward, S::world_up()));
        self.up = S::normalize(S::cross(self.right, self.forward));
    }

    pub fn view_matrix(&self) -> S::Mat4 {
        S::look_at_rh(self.position, self.position + self.forward, S::world_up())
    }

    /// Vertical FOV in radians for the configured horizontal FOV at `aspect`.
    pub fn vertical_fov(&self, aspect: S) -> S {
        let half_h = self.fov_horizontal_degrees.to_radians() / S::lit(2.0);
        S::lit(2.0) * (half_h.tan() / aspect).atan()
    }

    pub fn projection_matrix(&self, aspect: S) -> S::Mat4 {
        S::perspective_rh(self.vertical_fov(aspect), aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec3, Vec3, Vec4};

    #[test]
    fn default_looks_down_negative_z() {
        let cam = Camera::<f32>::default();
        assert!((cam.forward() - Vec3::NEG_Z).length() < 1e-6);
        assert!((cam.right() - Vec3::X).length() < 1e-6);
        assert!((cam.up() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn pitch_is_clamped_for_any_mouse_motion() {
        let mut cam = Camera::<f64>::default();
        let input = InputState::new();
        for dy in [-1.0e6, 5000.0, -37.0, 1.0e9, 0.5, -2.0e4] {
            cam.update(0.016, &input, 13.0, dy);
            assert!(cam.pitch <= PITCH_LIMIT_DEGREES && cam.pitch >= -PITCH_LIMIT_DEGREES);
        }

        let mut cam = Camera::<f32>::default();
        cam.rotate(0.0, -1.0e7);
        assert!(cam.pitch <= PITCH_LIMIT_DEGREES as f32);
        assert!(cam.pitch > 89.0);
    }

    #[test]
    fn basis_is_orthonormal() {
        let mut cam = Camera::<f64>::default();
        for (yaw, pitch) in [(0.0, 0.0), (33.0, 45.0), (-170.0, -89.9), (720.5, 12.0)] {
            cam.set_angles(yaw, pitch);
            let (f, r, u) = (cam.forward(), cam.right(), cam.up());
            assert!((f.length() - 1.0).abs() < 1e-12);
            assert!((r.length() - 1.0).abs() < 1e-12);
            assert!((u.length() - 1.0).abs() < 1e-12);
            assert!(f.dot(r).abs() < 1e-9);
            assert!(f.dot(u).abs() < 1e-9);
            assert!(r.dot(u).abs() < 1e-9);
        }
    }

    #[test]
    fn forward_follows_yaw_pitch_formula() {
        let mut cam = Camera::<f64>::default();
        cam.set_angles(30.0, 20.0);
        let (y, p) = (30f64.to_radians(), 20f64.to_radians());
        let expected = DVec3::new(y.cos() * p.cos(), p.sin(), y.sin() * p.cos());
        assert!((cam.forward() - expected).length() < 1e-12);
    }

    #[test]
    fn view_maps_own_position_to_origin() {
        let mut cam = Camera::<f32>::default().with_position(Vec3::new(12.0, -3.5, 40.0));
        cam.set_angles(57.0, -21.0);
        let p = cam.view_matrix() * Vec4::new(12.0, -3.5, 40.0, 1.0);
        assert!(p.truncate().length() < 1e-4, "{p:?}");

        let mut cam = Camera::<f64>::default().with_position(DVec3::new(1.0e7, 2.0, -3.0e7));
        cam.set_angles(-120.0, 60.0);
        let p = cam.view_matrix().transform_point3(cam.position);
        assert!(p.length() < 1e-6, "{p:?}");
    }

    #[test]
    fn forward_maps_to_negative_z_in_view_space() {
        let mut cam = Camera::<f64>::default().with_position(DVec3::new(1.0, 2.0, 3.0));
        cam.set_angles(10.0, 5.0);
        let ahead = cam.position + cam.forward() * 5.0;
        let p = cam.view_matrix().transform_point3(ahead);
        assert!((p - DVec3::new(0.0, 0.0, -5.0)).length() < 1e-9);
    }

    #[test]
    fn horizontal_fov_converts_to_vertical() {
        let cam = Camera::<f64>::default();
        // 90° horizontal at 1:1 stays 90° vertical.
        assert!((cam.vertical_fov(1.0) - 90f64.to_radians()).abs() < 1e-12);
        // Wider aspect narrows the vertical FOV.
        let aspect = 16.0 / 9.0;
        let expected = 2.0 * ((45f64.to_radians()).tan() / aspect).atan();
        assert!((cam.vertical_fov(aspect) - expected).abs() < 1e-12);
        assert!(cam.vertical_fov(aspect) < 90f64.to_radians());
    }

    #[test]
    fn projection_is_finite() {
        let cam = Camera::<f32>::default();
        let m = cam.projection_matrix(16.0 / 9.0);
        assert!(m.is_finite());
    }

    #[test]
    fn movement_follows_held_actions() {
        let mut cam = Camera::<f64>::default();
        let mut input = InputState::new();
        input.press(Action::MoveForward);
        cam.update(1.0, &input, 0.0, 0.0);
        assert!((cam.position - DVec3::new(0.0, 0.0, -10.0)).length() < 1e-9);

        input.release(Action::MoveForward);
        input.press(Action::MoveUp);
        input.press(Action::Sprint);
        cam.update(0.5, &input, 0.0, 0.0);
        assert!((cam.position - DVec3::new(0.0, 15.0, -10.0)).length() < 1e-9);
    }

    #[test]
    fn strafe_uses_right_vector() {
        let mut cam = Camera::<f32>::default();
        let mut input = InputState::new();
        input.press(Action::MoveRight);
        cam.update(0.1, &input, 0.0, 0.0);
        assert!((cam.position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
