pub mod context;
pub mod depth;
pub mod error;
pub mod frame;
pub mod mesh;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod shapes;

pub use context::RenderContext;
pub use depth::create_depth;
pub use error::{RenderError, RenderResult};
pub use frame::{
    CameraUniform, DrawCall, DrawUniforms, FrameBackend, FrameGraph, GeometrySource, MeshRef,
    Pass, Phase, Program, Target,
};
pub use mesh::{DrawMode, Mesh, Primitive, Rgb, TriangleList, Vertex};
pub use model::{Model, Plane, ShapeKind, Surface};
pub use pipeline::{Layouts, create_bind_group_layouts, create_pipeline};
pub use render::Renderer3D;
