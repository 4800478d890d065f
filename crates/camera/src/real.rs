use glam::{DMat4, DVec3, Mat4, Vec3};
use num_traits::Float;
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Scalar a camera can be built over, paired with its glam vector and
/// matrix types.
pub trait Real: Float + Debug + Default + Send + Sync + 'static {
    type Vec3: Copy
        + Debug
        + PartialEq
        + Add<Output = Self::Vec3>
        + Sub<Output = Self::Vec3>
        + Mul<Self, Output = Self::Vec3>
        + Neg<Output = Self::Vec3>
        + AddAssign
        + SubAssign;
    type Mat4: Copy + Debug + PartialEq;

    fn lit(v: f64) -> Self;
    fn vec3(x: Self, y: Self, z: Self) -> Self::Vec3;
    fn cross(a: Self::Vec3, b: Self::Vec3) -> Self::Vec3;
    fn normalize(v: Self::Vec3) -> Self::Vec3;

    fn look_at_rh(eye: Self::Vec3, center: Self::Vec3, up: Self::Vec3) -> Self::Mat4;
    fn perspective_rh(fov_y_radians: Self, aspect: Self, near: Self, far: Self) -> Self::Mat4;

    fn world_up() -> Self::Vec3 {
        Self::vec3(Self::zero(), Self::one(), Self::zero())
    }

    fn zero_vec() -> Self::Vec3 {
        Self::vec3(Self::zero(), Self::zero(), Self::zero())
    }
}

impl Real for f32 {
    type Vec3 = Vec3;
    type Mat4 = Mat4;

    fn lit(v: f64) -> Self {
        v as f32
    }

    fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::new(x, y, z)
    }

    fn cross(a: Vec3, b: Vec3) -> Vec3 {
        a.cross(b)
    }

    fn normalize(v: Vec3) -> Vec3 {
        v.normalize()
    }

    fn look_at_rh(eye: Vec3, center: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(eye, center, up)
    }

    fn perspective_rh(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(fov_y_radians, aspect, near, far)
    }
}

impl Real for f64 {
    type Vec3 = DVec3;
    type Mat4 = DMat4;

    fn lit(v: f64) -> Self {
        v
    }

    fn vec3(x: f64, y: f64, z: f64) -> DVec3 {
        DVec3::new(x, y, z)
    }

    fn cross(a: DVec3, b: DVec3) -> DVec3 {
        a.cross(b)
    }

    fn normalize(v: DVec3) -> DVec3 {
        v.normalize()
    }

    fn look_at_rh(eye: DVec3, center: DVec3, up: DVec3) -> DMat4 {
        DMat4::look_at_rh(eye, center, up)
    }

    fn perspective_rh(fov_y_radians: f64, aspect: f64, near: f64, far: f64) -> DMat4 {
        DMat4::perspective_rh(fov_y_radians, aspect, near, far)
    }
}
