//! CPU stand-ins for the GPU backend.

#![allow(dead_code)]

use glam::{Mat4, Vec2, Vec3, Vec4};
use vantage_3d::{FrameBackend, GeometrySource, Pass, Phase, RenderError, RenderResult, Target};

struct Triangle {
    verts: [Vec3; 3],
    color: Vec4,
}

/// Resolves pick-buffer pixels by casting a ray through the pixel centre
/// against the triangles of the last pick pass, front faces culled and the
/// nearest hit winning, the way the depth-tested GPU pass would.
pub struct SoftwareBackend {
    width: u32,
    height: u32,
    triangles: Vec<Triangle>,
    view: Mat4,
    projection: Mat4,
    pub executed: Vec<Phase>,
    pub readbacks: usize,
}

impl SoftwareBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            triangles: Vec::new(),
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            executed: Vec::new(),
            readbacks: 0,
        }
    }
}

fn ray_triangle(origin: Vec3, dir: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv;
    (t > 0.0).then_some(t)
}

impl FrameBackend for SoftwareBackend {
    fn execute(&mut self, pass: &Pass, geometry: &dyn GeometrySource) -> RenderResult<()> {
        self.executed.push(pass.phase);
        if pass.target != Target::PickBuffer {
            return Ok(());
        }
        if pass.clear.is_some() {
            self.triangles.clear();
        }
        self.view = Mat4::from_cols_array_2d(&pass.camera.view);
        self.projection = Mat4::from_cols_array_2d(&pass.camera.projection);
        for draw in &pass.draws {
            let mesh = geometry
                .mesh(draw.mesh)
                .ok_or_else(|| RenderError::MissingGeometry(format!("{:?}", draw.mesh)))?;
            let local = draw.local_matrix();
            for tri in mesh.triangles(&mesh.primitives[draw.prim]) {
                self.triangles.push(Triangle {
                    verts: tri.map(|i| local.transform_point3(mesh.position(i))),
                    color: draw.color(),
                });
            }
        }
        Ok(())
    }

    fn read_pick_pixel(&mut self, x: u32, y: u32) -> RenderResult<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return Err(RenderError::PixelOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        self.readbacks += 1;

        let ndc = Vec2::new(
            (x as f32 + 0.5) / self.width as f32 * 2.0 - 1.0,
            1.0 - (y as f32 + 0.5) / self.height as f32 * 2.0,
        );
        let inv_view = self.view.inverse();
        let origin = inv_view.transform_point3(Vec3::ZERO);
        let eye = self.projection.inverse() * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let dir = inv_view
            .transform_vector3(Vec3::new(eye.x, eye.y, -1.0))
            .normalize();

        let nearest = self
            .triangles
            .iter()
            .filter(|tri| {
                let [a, b, c] = tri.verts;
                (b - a).cross(c - a).dot(dir) > 0.0
            })
            .filter_map(|tri| ray_triangle(origin, dir, tri.verts).map(|t| (t, tri.color)))
            .min_by(|l, r| l.0.total_cmp(&r.0));

        Ok(match nearest {
            Some((_, color)) => color
                .to_array()
                .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8),
            None => [0; 4],
        })
    }
}

/// Returns the same pixel for every readback and keeps every pass it ran.
pub struct ScriptedBackend {
    pub pixel: [u8; 4],
    pub passes: Vec<Pass>,
}

impl ScriptedBackend {
    pub fn new(pixel: [u8; 4]) -> Self {
        Self {
            pixel,
            passes: Vec::new(),
        }
    }
}

impl FrameBackend for ScriptedBackend {
    fn execute(&mut self, pass: &Pass, _geometry: &dyn GeometrySource) -> RenderResult<()> {
        self.passes.push(pass.clone());
        Ok(())
    }

    fn read_pick_pixel(&mut self, _x: u32, _y: u32) -> RenderResult<[u8; 4]> {
        Ok(self.pixel)
    }
}
