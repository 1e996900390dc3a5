//! Rendering error types.

use thiserror::Error;

use crate::frame::{Phase, Program};

/// Errors raised while building models, recording passes or talking to the GPU.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Mesh data does not satisfy the model invariants.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// A pass was recorded without a bound program.
    #[error("no program bound for pass `{0}`")]
    NoProgram(&'static str),

    /// Draws were recorded into a pass that runs a different program than
    /// the one bound on the context.
    #[error("pass `{label}` runs {pass:?} but {bound:?} is bound")]
    ProgramMismatch {
        label: &'static str,
        pass: Program,
        bound: Option<Program>,
    },

    /// A pass was pushed out of frame order.
    #[error("pass {got:?} recorded after {last:?}")]
    PassOrder { last: Phase, got: Phase },

    /// A draw referenced geometry the backend could not find.
    #[error("missing geometry for {0}")]
    MissingGeometry(String),

    /// Pipeline creation failed validation.
    #[error("pipeline creation failed: {0}")]
    PipelineCreation(String),

    /// Pixel coordinates outside the pick buffer.
    #[error("pixel ({x}, {y}) outside {width}x{height} pick buffer")]
    PixelOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// Mapping the readback buffer failed.
    #[error("pick readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    /// The readback callback was dropped before it reported.
    #[error("pick readback channel closed")]
    ReadbackChannel,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;
