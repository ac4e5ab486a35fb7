//! Cube geometry and placement.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Position + texture coordinate, packed as 5 floats.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

pub const STRIDE: u64 = std::mem::size_of::<Vertex>() as u64;

pub const MODEL_ANGLE_DEGREES: f32 = 55.0;

const fn v(x: f32, y: f32, z: f32, u: f32, w: f32) -> Vertex {
    Vertex {
        pos: [x, y, z],
        uv: [u, w],
    }
}

/// Unit cube centered on the origin, two triangles per face.
#[rustfmt::skip]
pub const VERTICES: [Vertex; 36] = [
    // back
    v(-0.5, -0.5, -0.5, 0.0, 0.0), v( 0.5, -0.5, -0.5, 1.0, 0.0), v( 0.5,  0.5, -0.5, 1.0, 1.0),
    v( 0.5,  0.5, -0.5, 1.0, 1.0), v(-0.5,  0.5, -0.5, 0.0, 1.0), v(-0.5, -0.5, -0.5, 0.0, 0.0),
    // front
    v(-0.5, -0.5,  0.5, 0.0, 0.0), v( 0.5, -0.5,  0.5, 1.0, 0.0), v( 0.5,  0.5,  0.5, 1.0, 1.0),
    v( 0.5,  0.5,  0.5, 1.0, 1.0), v(-0.5,  0.5,  0.5, 0.0, 1.0), v(-0.5, -0.5,  0.5, 0.0, 0.0),
    // left
    v(-0.5,  0.5,  0.5, 1.0, 0.0), v(-0.5,  0.5, -0.5, 1.0, 1.0), v(-0.5, -0.5, -0.5, 0.0, 1.0),
    v(-0.5, -0.5, -0.5, 0.0, 1.0), v(-0.5, -0.5,  0.5, 0.0, 0.0), v(-0.5,  0.5,  0.5, 1.0, 0.0),
    // right
    v( 0.5,  0.5,  0.5, 1.0, 0.0), v( 0.5,  0.5, -0.5, 1.0, 1.0), v( 0.5, -0.5, -0.5, 0.0, 1.0),
    v( 0.5, -0.5, -0.5, 0.0, 1.0), v( 0.5, -0.5,  0.5, 0.0, 0.0), v( 0.5,  0.5,  0.5, 1.0, 0.0),
    // bottom
    v(-0.5, -0.5, -0.5, 0.0, 1.0), v( 0.5, -0.5, -0.5, 1.0, 1.0), v( 0.5, -0.5,  0.5, 1.0, 0.0),
    v( 0.5, -0.5,  0.5, 1.0, 0.0), v(-0.5, -0.5,  0.5, 0.0, 0.0), v(-0.5, -0.5, -0.5, 0.0, 1.0),
    // top
    v(-0.5,  0.5, -0.5, 0.0, 1.0), v( 0.5,  0.5, -0.5, 1.0, 1.0), v( 0.5,  0.5,  0.5, 1.0, 0.0),
    v( 0.5,  0.5,  0.5, 1.0, 0.0), v(-0.5,  0.5,  0.5, 0.0, 0.0), v(-0.5,  0.5, -0.5, 0.0, 1.0),
];

/// Two triangles over the first four vertices. Uploaded with the cube but
/// unused by the array draw.
pub const INDICES: [u32; 6] = [0, 1, 3, 1, 2, 3];

/// 55 degrees about the normalized (1, 1, 1) axis.
pub fn model_matrix() -> Mat4 {
    Mat4::from_axis_angle(Vec3::ONE.normalize(), MODEL_ANGLE_DEGREES.to_radians())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_five_floats() {
        assert_eq!(STRIDE, 20);
        assert_eq!(bytemuck::cast_slice::<Vertex, u8>(&VERTICES).len(), 36 * 20);
    }

    #[test]
    fn cube_spans_unit_box() {
        for vert in VERTICES {
            for c in vert.pos {
                assert_eq!(c.abs(), 0.5);
            }
            for t in vert.uv {
                assert!(t == 0.0 || t == 1.0);
            }
        }
    }

    #[test]
    fn indices_stay_inside_vertex_data() {
        assert_eq!(INDICES.len(), 6);
        assert!(INDICES.iter().all(|&i| (i as usize) < VERTICES.len()));
    }

    #[test]
    fn model_keeps_rotation_axis_fixed() {
        let axis = Vec3::ONE.normalize();
        let rotated = model_matrix().transform_vector3(axis);
        assert!(rotated.abs_diff_eq(axis, 1e-5));
    }

    #[test]
    fn model_is_pure_rotation() {
        let m = model_matrix();
        assert!((m.determinant() - 1.0).abs() < 1e-5);
        assert!(m.transform_point3(Vec3::ZERO).abs_diff_eq(Vec3::ZERO, 1e-6));
        let x = m.transform_vector3(Vec3::X);
        let cos = x.dot(Vec3::X);
        // Rotation about (1,1,1)/sqrt(3): x·R(x) = cos + (1 - cos)/3.
        let theta = MODEL_ANGLE_DEGREES.to_radians();
        assert!((cos - (theta.cos() + (1.0 - theta.cos()) / 3.0)).abs() < 1e-5);
    }
}
