//! Procedural primitive meshes, centered on the local origin.

use std::f32::consts::PI;
use vantage_common::{MeshData, Vertex};

/// Axis-aligned box with the given full extents: 24 vertices, 36 indices.
pub fn cube(size: [f32; 3]) -> MeshData {
    let [x, y, z] = size.map(|s| s * 0.5);
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex::new([-x, -y,  z], [0.0, 0.0, 1.0]),
        Vertex::new([ x, -y,  z], [0.0, 0.0, 1.0]),
        Vertex::new([ x,  y,  z], [0.0, 0.0, 1.0]),
        Vertex::new([-x,  y,  z], [0.0, 0.0, 1.0]),
        // -Z face
        Vertex::new([ x, -y, -z], [0.0, 0.0, -1.0]),
        Vertex::new([-x, -y, -z], [0.0, 0.0, -1.0]),
        Vertex::new([-x,  y, -z], [0.0, 0.0, -1.0]),
        Vertex::new([ x,  y, -z], [0.0, 0.0, -1.0]),
        // +X face
        Vertex::new([ x, -y,  z], [1.0, 0.0, 0.0]),
        Vertex::new([ x, -y, -z], [1.0, 0.0, 0.0]),
        Vertex::new([ x,  y, -z], [1.0, 0.0, 0.0]),
        Vertex::new([ x,  y,  z], [1.0, 0.0, 0.0]),
        // -X face
        Vertex::new([-x, -y, -z], [-1.0, 0.0, 0.0]),
        Vertex::new([-x, -y,  z], [-1.0, 0.0, 0.0]),
        Vertex::new([-x,  y,  z], [-1.0, 0.0, 0.0]),
        Vertex::new([-x,  y, -z], [-1.0, 0.0, 0.0]),
        // +Y face
        Vertex::new([-x,  y,  z], [0.0, 1.0, 0.0]),
        Vertex::new([ x,  y,  z], [0.0, 1.0, 0.0]),
        Vertex::new([ x,  y, -z], [0.0, 1.0, 0.0]),
        Vertex::new([-x,  y, -z], [0.0, 1.0, 0.0]),
        // -Y face
        Vertex::new([-x, -y, -z], [0.0, -1.0, 0.0]),
        Vertex::new([ x, -y, -z], [0.0, -1.0, 0.0]),
        Vertex::new([ x, -y,  z], [0.0, -1.0, 0.0]),
        Vertex::new([-x, -y,  z], [0.0, -1.0, 0.0]),
    ];
    let indices = (0..6u32)
        .flat_map(|face| {
            let b = face * 4;
            [b, b + 1, b + 2, b + 2, b + 3, b]
        })
        .collect();
    MeshData::new(vertices, indices)
}

/// Flat quad in the XZ plane facing +Y. `size` is [x, z].
pub fn plane(size: [f32; 2]) -> MeshData {
    let [x, z] = size.map(|s| s * 0.5);
    let up = [0.0, 1.0, 0.0];
    let vertices = vec![
        Vertex::new([-x, 0.0, z], up),
        Vertex::new([x, 0.0, z], up),
        Vertex::new([x, 0.0, -z], up),
        Vertex::new([-x, 0.0, -z], up),
    ];
    MeshData::new(vertices, vec![0, 1, 2, 2, 3, 0])
}

/// Upper bound on sphere slices and stacks.
pub const MAX_TESSELLATION: u32 = 1024;

/// UV sphere. Pole rows emit one triangle per slice instead of a degenerate
/// quad, so the index count is `6 * slices * (stacks - 1)`. Slices are
/// clamped to `3..=MAX_TESSELLATION`, stacks to `2..=MAX_TESSELLATION`.
pub fn sphere(radius: f32, slices: u32, stacks: u32) -> MeshData {
    let slices = slices.clamp(3, MAX_TESSELLATION);
    let stacks = stacks.clamp(2, MAX_TESSELLATION);

    let (s, t) = (slices as usize, stacks as usize);
    let mut vertices = Vec::with_capacity((t + 1) * (s + 1));
    for i in 0..=stacks {
        let phi = PI / 2.0 - i as f32 * PI / stacks as f32;
        let (ring_y, ring_r) = (phi.sin(), phi.cos());
        for j in 0..=slices {
            let theta = j as f32 * 2.0 * PI / slices as f32;
            let normal = [ring_r * theta.cos(), ring_y, ring_r * theta.sin()];
            vertices.push(Vertex::new(normal.map(|n| n * radius), normal));
        }
    }

    let mut indices = Vec::with_capacity(6 * s * (t - 1));
    for i in 0..stacks {
        let mut k1 = i * (slices + 1);
        let mut k2 = k1 + slices + 1;
        for _ in 0..slices {
            if i != 0 {
                indices.extend_from_slice(&[k1, k2, k1 + 1]);
            }
            if i != stacks - 1 {
                indices.extend_from_slice(&[k1 + 1, k2, k2 + 1]);
            }
            k1 += 1;
            k2 += 1;
        }
    }

    MeshData::new(vertices, indices)
}
