//! The f64 → f32 boundary.
//!
//! World positions are tracked in double precision; everything handed to the
//! GPU is single precision. Conversions only happen here and in the camera
//! manager, after subtracting the floating origin.

use glam::{DMat4, DVec3, Mat4, Vec3};

/// Narrow a world-space vector to render precision. Lossy.
pub fn to_float(v: DVec3) -> Vec3 {
    v.as_vec3()
}

/// Widen a render-space vector. Exact.
pub fn to_double(v: Vec3) -> DVec3 {
    v.as_dvec3()
}

pub fn mat_to_float(m: DMat4) -> Mat4 {
    m.as_mat4()
}

/// Largest absolute error expected from a `to_double(to_float(v))` round trip.
pub fn round_trip_tolerance(v: DVec3) -> f64 {
    v.abs().max_element().max(1.0) * f32::EPSILON as f64
}

/// Render-space vector relative to `origin`. The subtraction runs in f64 so
/// large absolute coordinates keep their low bits.
pub fn relative_to(position: DVec3, origin: DVec3) -> Vec3 {
    to_float(position - origin)
}
