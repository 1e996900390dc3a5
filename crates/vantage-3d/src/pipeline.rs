use wgpu::*;

use crate::depth::DEPTH_FORMAT;
use crate::error::{RenderError, RenderResult};
use crate::frame::{DrawUniforms, Program};
use crate::mesh::Vertex;

pub const PICK_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

const SHADE_SRC: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/shade.wgsl")
);
const PICK_SRC: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/pick.wgsl")
);
const CONTACT_SRC: &str = concat!(
    include_str!("shaders/common.wgsl"),
    include_str!("shaders/contact.wgsl")
);

pub struct Layouts {
    pub camera_bgl: BindGroupLayout,
    pub draw_bgl: BindGroupLayout,
}

pub fn create_bind_group_layouts(device: &Device) -> Layouts {
    let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bgl"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    });

    let draw_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("draw_bgl"),
        entries: &[BindGroupLayoutEntry {
            binding: 0,
            visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
            ty: BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
            },
            count: None,
        }],
    });

    Layouts {
        camera_bgl,
        draw_bgl,
    }
}

struct ProgramState {
    label: &'static str,
    source: &'static str,
    cull_mode: Option<Face>,
    blend: Option<BlendState>,
    bias: DepthBiasState,
}

fn program_state(program: Program) -> ProgramState {
    match program {
        Program::Shade => ProgramState {
            label: "shade_pipeline",
            source: SHADE_SRC,
            cull_mode: None,
            blend: None,
            bias: DepthBiasState::default(),
        },
        // Pick surfaces wind clockwise seen from above; culling front faces
        // keeps their tops and drops anything seen from underneath.
        Program::Pick => ProgramState {
            label: "pick_pipeline",
            source: PICK_SRC,
            cull_mode: Some(Face::Front),
            blend: None,
            bias: DepthBiasState::default(),
        },
        Program::Contact => ProgramState {
            label: "contact_pipeline",
            source: CONTACT_SRC,
            cull_mode: None,
            blend: Some(BlendState::ALPHA_BLENDING),
            bias: DepthBiasState {
                constant: -1,
                slope_scale: -1.0,
                clamp: 0.0,
            },
        },
    }
}

/// Builds the pipeline for `program`. Validation failures are caught in an
/// error scope and returned instead of being deferred to the first draw.
pub fn create_pipeline(
    device: &Device,
    layouts: &Layouts,
    program: Program,
    color_format: TextureFormat,
) -> RenderResult<RenderPipeline> {
    let state = program_state(program);
    device.push_error_scope(ErrorFilter::Validation);

    let shader = device.create_shader_module(ShaderModuleDescriptor {
        label: Some(state.label),
        source: ShaderSource::Wgsl(state.source.into()),
    });

    let layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
        label: Some(state.label),
        bind_group_layouts: &[&layouts.camera_bgl, &layouts.draw_bgl],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(state.label),
        layout: Some(&layout),
        vertex: VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[Vertex::layout()],
            compilation_options: PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(ColorTargetState {
                format: color_format,
                blend: state.blend,
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: PipelineCompilationOptions::default(),
        }),
        primitive: PrimitiveState {
            topology: PrimitiveTopology::TriangleList,
            front_face: FrontFace::Ccw,
            cull_mode: state.cull_mode,
            ..Default::default()
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: state.bias,
        }),
        multisample: MultisampleState::default(),
        multiview: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        return Err(RenderError::PipelineCreation(format!("{}: {err}", state.label)));
    }
    log::debug!("created {} for {color_format:?}", state.label);
    Ok(pipeline)
}
