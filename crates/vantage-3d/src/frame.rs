//! Frame graph: the ordered pass descriptors a frame is made of.
//!
//! A frame is recorded as a short list of [`Pass`]es, each naming its target,
//! its clear values, the program it runs and the draws it issues. The
//! [`FrameGraph`] only accepts passes in [`Phase`] order, so the pick pass can
//! never land after the color pass of the same frame.

use glam::{Mat4, Vec4};

use crate::error::{RenderError, RenderResult};
use crate::mesh::Mesh;

/// Shader programs a pass can bind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Program {
    /// Flat color darkened with distance below the model origin.
    Shade,
    /// Flat pick-id color, no shading.
    Pick,
    /// Translucent ring used for contact markers.
    Contact,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Pick,
    Color,
    Contact,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    /// Offscreen `Rgba8Unorm` id buffer with its own depth.
    PickBuffer,
    /// The visible color target.
    Viewport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshRef {
    /// Geometry of the attached model at this index.
    Model(usize),
    /// The shared contact-marker plane.
    Marker,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

/// Per-draw uniforms; layout matches `Draw` in the WGSL sources.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniforms {
    pub local: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub height: f32,
    pub _padding: [f32; 3],
}

impl DrawUniforms {
    pub fn new(local: Mat4, color: Vec4, height: f32) -> Self {
        Self {
            local: local.to_cols_array_2d(),
            color: color.to_array(),
            height,
            _padding: [0.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshRef,
    /// Index into the mesh's primitive list.
    pub prim: usize,
    pub uniforms: DrawUniforms,
}

impl DrawCall {
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.uniforms.local)
    }

    pub fn color(&self) -> Vec4 {
        Vec4::from_array(self.uniforms.color)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pass {
    pub label: &'static str,
    pub phase: Phase,
    pub target: Target,
    /// Clear color; depth is always cleared alongside. `None` loads both.
    pub clear: Option<[f32; 4]>,
    pub program: Program,
    pub camera: CameraUniform,
    pub draws: Vec<DrawCall>,
}

impl Pass {
    pub fn push(&mut self, draw: DrawCall) {
        self.draws.push(draw);
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameGraph {
    passes: Vec<Pass>,
}

impl FrameGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pass: Pass) -> RenderResult<()> {
        if let Some(last) = self.passes.last() {
            if pass.phase <= last.phase {
                return Err(RenderError::PassOrder {
                    last: last.phase,
                    got: pass.phase,
                });
            }
        }
        self.passes.push(pass);
        Ok(())
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn pass(&self, phase: Phase) -> Option<&Pass> {
        self.passes.iter().find(|p| p.phase == phase)
    }

    pub fn last(&self) -> Option<&Pass> {
        self.passes.last()
    }
}

/// Where a backend looks up the CPU geometry behind a [`MeshRef`].
pub trait GeometrySource {
    fn mesh(&self, mesh: MeshRef) -> Option<&Mesh>;
}

/// Executes recorded passes and serves the pick-buffer readback.
pub trait FrameBackend {
    /// Runs one pass to completion on its target.
    fn execute(&mut self, pass: &Pass, geometry: &dyn GeometrySource) -> RenderResult<()>;

    /// Reads one RGBA8 pixel of the pick buffer; `(0, 0)` is the top-left corner.
    fn read_pick_pixel(&mut self, x: u32, y: u32) -> RenderResult<[u8; 4]>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(phase: Phase) -> Pass {
        Pass {
            label: "test",
            phase,
            target: Target::Viewport,
            clear: None,
            program: Program::Shade,
            camera: CameraUniform::new(Mat4::IDENTITY, Mat4::IDENTITY),
            draws: Vec::new(),
        }
    }

    #[test]
    fn passes_must_follow_phase_order() {
        let mut graph = FrameGraph::new();
        graph.push(pass(Phase::Pick)).unwrap();
        graph.push(pass(Phase::Color)).unwrap();
        let err = graph.push(pass(Phase::Pick)).unwrap_err();
        assert!(matches!(
            err,
            RenderError::PassOrder {
                last: Phase::Color,
                got: Phase::Pick
            }
        ));
        graph.push(pass(Phase::Contact)).unwrap();
        assert_eq!(graph.passes().len(), 3);
    }

    #[test]
    fn repeated_phase_is_rejected() {
        let mut graph = FrameGraph::new();
        graph.push(pass(Phase::Color)).unwrap();
        assert!(graph.push(pass(Phase::Color)).is_err());
    }

    #[test]
    fn draw_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 96);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 128);
    }

    #[test]
    fn draw_call_round_trips_matrix() {
        let local = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let draw = DrawCall {
            mesh: MeshRef::Marker,
            prim: 0,
            uniforms: DrawUniforms::new(local, Vec4::ONE, 1.0),
        };
        assert_eq!(draw.local_matrix(), local);
    }
}
