//! Procedural builders for the models the viewer knows about.

use std::f32::consts::TAU;

use glam::Vec3;

use crate::error::RenderResult;
use crate::mesh::{GREEN, Mesh, PINK, PURPLE, Primitive, Rgb, Vertex};
use crate::model::{Model, ShapeKind, Surface};

const PLATFORM_SEGMENTS: u16 = 16;
const PLATFORM_RADIUS: f32 = 10.0;
const PLATFORM_EXTRUDE: f32 = 0.5;
const PLATFORM_TAPER: f32 = 3.0;

/// A flat disc on `y = 0`, extruded down into a short wall and then tapered to a
/// point below. The top fan is the pick surface.
pub fn platform() -> RenderResult<Model> {
    let n = PLATFORM_SEGMENTS;
    let ring = |y: f32| {
        (0..n).map(move |i| {
            let theta = f32::from(i) / f32::from(n) * TAU;
            Vertex::new(theta.cos() * PLATFORM_RADIUS, y, theta.sin() * PLATFORM_RADIUS)
        })
    };

    let mut vertices = Vec::with_capacity(2 * usize::from(n + 1));
    vertices.push(Vertex::new(0.0, 0.0, 0.0));
    vertices.extend(ring(0.0));
    vertices.push(Vertex::new(0.0, -PLATFORM_EXTRUDE - PLATFORM_TAPER, 0.0));
    vertices.extend(ring(-PLATFORM_EXTRUDE));

    let top_ring = 1;
    let bottom_center = n + 1;
    let bottom_ring = n + 2;
    let cap_len = u32::from(n) + 2;

    let mut indices = Vec::new();
    let mut primitives = Vec::new();

    indices.push(0);
    indices.extend(top_ring..top_ring + n);
    indices.push(top_ring);
    primitives.push(Primitive::fan(Some(GREEN), 0, cap_len));

    indices.push(bottom_center);
    indices.extend(bottom_ring..bottom_ring + n);
    indices.push(bottom_ring);
    primitives.push(Primitive::fan(Some(PURPLE), cap_len, cap_len));

    for i in 0..n {
        let next = (i + 1) % n;
        let start = indices.len() as u32;
        indices.extend_from_slice(&[
            top_ring + i,
            top_ring + next,
            bottom_ring + i,
            bottom_ring + next,
        ]);
        primitives.push(Primitive::strip(Some(PINK), start, 4));
    }

    let mesh = Mesh {
        vertices,
        indices,
        primitives,
    };
    Model::new(
        ShapeKind::Platform,
        "platform",
        mesh,
        Surface {
            prim: 0,
            normal: Vec3::Y,
            origin: Vec3::ZERO,
        },
        PLATFORM_TAPER + PLATFORM_EXTRUDE,
    )
}

/// A `width` × `length` slab whose top face sits on `y = 0` and extends
/// `height` downwards.
pub fn box_model(width: f32, length: f32, height: f32) -> RenderResult<Model> {
    let (hw, hl) = (width / 2.0, length / 2.0);
    let vertices = vec![
        Vertex::new(-hw, 0.0, -hl),
        Vertex::new(hw, 0.0, -hl),
        Vertex::new(-hw, 0.0, hl),
        Vertex::new(hw, 0.0, hl),
        Vertex::new(-hw, -height, -hl),
        Vertex::new(hw, -height, -hl),
        Vertex::new(-hw, -height, hl),
        Vertex::new(hw, -height, hl),
    ];
    #[rustfmt::skip]
    let indices = vec![
        0, 1, 2, 3, // top
        4, 5, 6, 7, // bottom
        0, 1, 4, 5,
        0, 2, 4, 6,
        1, 3, 5, 7,
        2, 3, 6, 7,
    ];
    let primitives = vec![
        Primitive::strip(Some(GREEN), 0, 4),
        Primitive::strip(Some(PURPLE), 4, 4),
        Primitive::strip(Some(PINK), 8, 4),
        Primitive::strip(Some(PINK), 12, 4),
        Primitive::strip(Some(PINK), 16, 4),
        Primitive::strip(Some(PINK), 20, 4),
    ];
    Model::new(
        ShapeKind::Box,
        "box",
        Mesh {
            vertices,
            indices,
            primitives,
        },
        Surface {
            prim: 0,
            normal: Vec3::Y,
            origin: Vec3::ZERO,
        },
        height * 2.0,
    )
}

/// A single quad on `y = 0` centred on the origin.
pub fn plane(width: f32, length: f32, color: Option<Rgb>) -> RenderResult<Model> {
    let (hw, hl) = (width / 2.0, length / 2.0);
    let mesh = Mesh {
        vertices: vec![
            Vertex::new(-hw, 0.0, -hl),
            Vertex::new(hw, 0.0, -hl),
            Vertex::new(-hw, 0.0, hl),
            Vertex::new(hw, 0.0, hl),
        ],
        indices: vec![0, 1, 2, 3],
        primitives: vec![Primitive::strip(color, 0, 4)],
    };
    Model::new(
        ShapeKind::Plane,
        "plane",
        mesh,
        Surface {
            prim: 0,
            normal: Vec3::Y,
            origin: Vec3::ZERO,
        },
        1.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &Mesh, tri: [u16; 3]) -> Vec3 {
        let [a, b, c] = tri.map(|i| mesh.position(i));
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn platform_layout() {
        let model = platform().unwrap();
        let n = PLATFORM_SEGMENTS as usize;
        assert_eq!(model.mesh().vertices.len(), 2 * (n + 1));
        assert_eq!(model.primitives().len(), 2 + n);
        assert_eq!(model.surface_primitive().count as usize, n + 2);
        assert_eq!(model.height(), 3.5);
    }

    #[test]
    fn platform_wall_wraps_to_first_vertex() {
        let model = platform().unwrap();
        let last = model.primitives().last().unwrap();
        let start = last.start as usize;
        let n = PLATFORM_SEGMENTS;
        assert_eq!(
            &model.mesh().indices[start..start + 4],
            &[n, 1, 2 * n + 1, n + 2]
        );
    }

    // The pick pass culls front faces, so every pick surface has to wind
    // clockwise seen from above.
    #[test]
    fn surfaces_face_down_in_ccw_terms() {
        for model in [
            platform().unwrap(),
            box_model(20.0, 6.0, 0.2).unwrap(),
            plane(1.0, 1.0, None).unwrap(),
        ] {
            let mesh = model.mesh();
            for tri in mesh.triangles(model.surface_primitive()) {
                let n = face_normal(mesh, tri);
                assert!(n.abs_diff_eq(-Vec3::Y, 1e-5), "{}: {n}", model.name);
            }
        }
    }

    #[test]
    fn surface_vertices_lie_on_surface_plane() {
        let model = box_model(4.0, 2.0, 1.0).unwrap();
        let surface = model.surface();
        for tri in model.mesh().triangles(model.surface_primitive()) {
            for i in tri {
                let p = model.mesh().position(i);
                assert_eq!((p - surface.origin).dot(surface.normal), 0.0);
            }
        }
    }
}
