use glam::{Mat4, Vec3, Vec4};

use crate::context::RenderContext;
use crate::error::{RenderError, RenderResult};
use crate::frame::{DrawCall, DrawUniforms, MeshRef, Pass};
use crate::mesh::{Mesh, Primitive, Rgb};

/// Color used for primitives built without one.
pub const UNLIT_GREY: Rgb = [0.8, 0.8, 0.8];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Platform,
    Box,
    Plane,
}

/// The pickable primitive of a model and the infinite plane it lies on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub prim: usize,
    pub normal: Vec3,
    pub origin: Vec3,
}

/// A world-space plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub origin: Vec3,
    pub normal: Vec3,
}

#[derive(Clone, Debug)]
pub struct Model {
    pub kind: ShapeKind,
    pub name: String,
    pub local_matrix: Mat4,
    pub picked: bool,
    pub contact_point: Option<Vec3>,
    mesh: Mesh,
    surface: Surface,
    height: f32,
}

impl Model {
    pub fn new(
        kind: ShapeKind,
        name: impl Into<String>,
        mesh: Mesh,
        surface: Surface,
        height: f32,
    ) -> RenderResult<Self> {
        mesh.validate()?;
        if surface.prim >= mesh.primitives.len() {
            return Err(RenderError::InvalidMesh(format!(
                "surface primitive {} of {}",
                surface.prim,
                mesh.primitives.len()
            )));
        }
        if !surface.normal.is_normalized() {
            return Err(RenderError::InvalidMesh(format!(
                "surface normal {} is not unit length",
                surface.normal
            )));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(RenderError::InvalidMesh(format!("model height {height}")));
        }
        Ok(Self {
            kind,
            name: name.into(),
            local_matrix: Mat4::IDENTITY,
            picked: false,
            contact_point: None,
            mesh,
            surface,
            height,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.mesh.primitives
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_primitive(&self) -> &Primitive {
        &self.mesh.primitives[self.surface.prim]
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn with_transform(mut self, local_matrix: Mat4) -> Self {
        self.local_matrix = local_matrix;
        self
    }

    pub fn reset_pick(&mut self) {
        self.picked = false;
        self.contact_point = None;
    }

    /// The surface plane in world space under the current local matrix.
    pub fn surface_plane(&self) -> Plane {
        let origin = self.local_matrix.transform_point3(self.surface.origin);
        let normal = self
            .local_matrix
            .inverse()
            .transpose()
            .transform_vector3(self.surface.normal)
            .normalize_or_zero();
        Plane { origin, normal }
    }

    /// Records every primitive into a color pass, swapping in `highlight` for
    /// the surface when this model is picked. `pass` must run the program
    /// bound on `ctx`.
    pub fn render(
        &self,
        ctx: &RenderContext,
        mesh: MeshRef,
        highlight: Rgb,
        pass: &mut Pass,
    ) -> RenderResult<()> {
        ctx.check_pass(pass)?;
        for (prim_index, prim) in self.mesh.primitives.iter().enumerate() {
            let rgb = if prim_index == self.surface.prim && self.picked {
                highlight
            } else {
                prim.color.unwrap_or(UNLIT_GREY)
            };
            pass.push(DrawCall {
                mesh,
                prim: prim_index,
                uniforms: DrawUniforms::new(
                    self.local_matrix,
                    Vec3::from_array(rgb).extend(1.0),
                    self.height,
                ),
            });
        }
        Ok(())
    }

    /// Records only the surface primitive, colored with the encoded pick id.
    pub fn pick(
        &self,
        ctx: &RenderContext,
        mesh: MeshRef,
        pick_color: Vec4,
        pass: &mut Pass,
    ) -> RenderResult<()> {
        ctx.check_pass(pass)?;
        pass.push(DrawCall {
            mesh,
            prim: self.surface.prim,
            uniforms: DrawUniforms::new(self.local_matrix, pick_color, self.height),
        });
        Ok(())
    }
}
