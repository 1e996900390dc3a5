use glam::Mat4;

use crate::error::{RenderError, RenderResult};
use crate::frame::{CameraUniform, Pass, Phase, Program, Target};

/// Active program plus the camera matrices shared by every draw of a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderContext {
    program: Option<Program>,
    pub projection: Mat4,
    pub model_view: Mat4,
}

impl RenderContext {
    pub fn new(projection: Mat4) -> Self {
        Self {
            program: None,
            projection,
            model_view: Mat4::IDENTITY,
        }
    }

    pub fn set_program(&mut self, program: Program) {
        self.program = Some(program);
    }

    pub fn program(&self) -> Option<Program> {
        self.program
    }

    /// Opens a pass that runs the active program with the current matrices.
    pub fn begin_pass(
        &self,
        label: &'static str,
        phase: Phase,
        target: Target,
        clear: Option<[f32; 4]>,
    ) -> RenderResult<Pass> {
        let program = self.program.ok_or(RenderError::NoProgram(label))?;
        Ok(Pass {
            label,
            phase,
            target,
            clear,
            program,
            camera: CameraUniform::new(self.model_view, self.projection),
            draws: Vec::new(),
        })
    }

    /// Fails unless `pass` runs the program bound right now.
    pub fn check_pass(&self, pass: &Pass) -> RenderResult<()> {
        if self.program == Some(pass.program) {
            return Ok(());
        }
        Err(RenderError::ProgramMismatch {
            label: pass.label,
            pass: pass.program,
            bound: self.program,
        })
    }
}
