use std::collections::HashMap;
use std::ops::Range;
use std::sync::mpsc;

use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::*;

use crate::depth::{create_color, create_depth};
use crate::error::{RenderError, RenderResult};
use crate::frame::{
    CameraUniform, DrawUniforms, FrameBackend, GeometrySource, MeshRef, Pass, Program, Target,
};
use crate::pipeline::{Layouts, PICK_FORMAT, create_bind_group_layouts, create_pipeline};

/// Readback rows must be padded to this many bytes; one pixel fits easily.
const READBACK_ROW: u32 = COPY_BYTES_PER_ROW_ALIGNMENT;

struct GpuMesh {
    vbuf: Buffer,
    ibuf: Buffer,
    ranges: Vec<Range<u32>>,
}

struct RenderTarget {
    color_view: TextureView,
    color_tex: Texture,
    depth_view: TextureView,
    _depth_tex: Texture,
}

impl RenderTarget {
    fn new(
        device: &Device,
        label: &'static str,
        format: TextureFormat,
        usage: TextureUsages,
        width: u32,
        height: u32,
    ) -> Self {
        let (color_view, color_tex) = create_color(device, label, format, usage, width, height);
        let (depth_view, depth_tex) = create_depth(device, width, height);
        Self {
            color_view,
            color_tex,
            depth_view,
            _depth_tex: depth_tex,
        }
    }
}

/// wgpu implementation of [`FrameBackend`].
///
/// Owns the visible viewport texture, the offscreen pick target and a cache of
/// uploaded meshes. Geometry is uploaded the first time a pass references it
/// and is never rewritten afterwards.
pub struct Renderer3D {
    device: Device,
    queue: Queue,
    layouts: Layouts,
    pipelines: HashMap<Program, RenderPipeline>,
    viewport: RenderTarget,
    pick: RenderTarget,
    staging_buf: Buffer,
    camera_buf: Buffer,
    camera_bg: BindGroup,
    draw_buf: Buffer,
    draw_bg: BindGroup,
    draw_capacity: usize,
    draw_stride: u64,
    meshes: HashMap<MeshRef, GpuMesh>,
    width: u32,
    height: u32,
}

impl Renderer3D {
    pub fn new(
        device: &Device,
        queue: &Queue,
        format: TextureFormat,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let width = width.max(1);
        let height = height.max(1);
        let layouts = create_bind_group_layouts(device);

        let mut pipelines = HashMap::new();
        pipelines.insert(
            Program::Shade,
            create_pipeline(device, &layouts, Program::Shade, format)?,
        );
        pipelines.insert(
            Program::Contact,
            create_pipeline(device, &layouts, Program::Contact, format)?,
        );
        pipelines.insert(
            Program::Pick,
            create_pipeline(device, &layouts, Program::Pick, PICK_FORMAT)?,
        );

        let viewport = RenderTarget::new(
            device,
            "viewport_color",
            format,
            TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_SRC,
            width,
            height,
        );
        let pick = RenderTarget::new(
            device,
            "pick_color",
            PICK_FORMAT,
            TextureUsages::COPY_SRC,
            width,
            height,
        );

        let staging_buf = device.create_buffer(&BufferDescriptor {
            label: Some("pick_staging"),
            size: u64::from(READBACK_ROW),
            usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let camera_buf = device.create_buffer_init(&BufferInitDescriptor {
            label: Some("camera_ubo"),
            contents: bytemuck::bytes_of(&CameraUniform::new(
                glam::Mat4::IDENTITY,
                glam::Mat4::IDENTITY,
            )),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let camera_bg = device.create_bind_group(&BindGroupDescriptor {
            label: Some("camera_bg"),
            layout: &layouts.camera_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buf.as_entire_binding(),
            }],
        });

        let align = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let draw_stride = (std::mem::size_of::<DrawUniforms>() as u64).div_ceil(align) * align;
        let draw_capacity = 64;
        let (draw_buf, draw_bg) = create_draw_ubo(device, &layouts, draw_stride, draw_capacity);

        log::info!("renderer {width}x{height} {format:?}, draw stride {draw_stride}");

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            layouts,
            pipelines,
            viewport,
            pick,
            staging_buf,
            camera_buf,
            camera_bg,
            draw_buf,
            draw_bg,
            draw_capacity,
            draw_stride,
            meshes: HashMap::new(),
            width,
            height,
        })
    }

    pub fn viewport_view(&self) -> &TextureView {
        &self.viewport.color_view
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn ensure_mesh(
        &mut self,
        mesh_ref: MeshRef,
        geometry: &dyn GeometrySource,
    ) -> RenderResult<()> {
        if self.meshes.contains_key(&mesh_ref) {
            return Ok(());
        }
        let mesh = geometry
            .mesh(mesh_ref)
            .ok_or_else(|| RenderError::MissingGeometry(format!("{mesh_ref:?}")))?;
        let list = mesh.to_triangle_list();

        let vbuf = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh_vbuf"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: BufferUsages::VERTEX,
        });
        let ibuf = self.device.create_buffer_init(&BufferInitDescriptor {
            label: Some("mesh_ibuf"),
            contents: bytemuck::cast_slice(&list.indices),
            usage: BufferUsages::INDEX,
        });
        log::debug!(
            "uploaded {mesh_ref:?}: {} vertices, {} triangles",
            mesh.vertices.len(),
            list.indices.len() / 3
        );
        self.meshes.insert(
            mesh_ref,
            GpuMesh {
                vbuf,
                ibuf,
                ranges: list.ranges,
            },
        );
        Ok(())
    }

    fn ensure_draw_capacity(&mut self, draws: usize) {
        if draws <= self.draw_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let (buf, bg) = create_draw_ubo(&self.device, &self.layouts, self.draw_stride, capacity);
        self.draw_buf = buf;
        self.draw_bg = bg;
        self.draw_capacity = capacity;
    }

    fn write_uniforms(&self, pass: &Pass) {
        self.queue
            .write_buffer(&self.camera_buf, 0, bytemuck::bytes_of(&pass.camera));
        if pass.draws.is_empty() {
            return;
        }
        let stride = self.draw_stride as usize;
        let mut bytes = vec![0u8; stride * pass.draws.len()];
        for (chunk, draw) in bytes.chunks_exact_mut(stride).zip(&pass.draws) {
            let src = bytemuck::bytes_of(&draw.uniforms);
            chunk[..src.len()].copy_from_slice(src);
        }
        self.queue.write_buffer(&self.draw_buf, 0, &bytes);
    }
}

fn create_draw_ubo(
    device: &Device,
    layouts: &Layouts,
    stride: u64,
    capacity: usize,
) -> (Buffer, BindGroup) {
    let buf = device.create_buffer(&BufferDescriptor {
        label: Some("draw_ubo"),
        size: stride * capacity as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bg = device.create_bind_group(&BindGroupDescriptor {
        label: Some("draw_bg"),
        layout: &layouts.draw_bgl,
        entries: &[BindGroupEntry {
            binding: 0,
            resource: BindingResource::Buffer(BufferBinding {
                buffer: &buf,
                offset: 0,
                size: BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    });
    (buf, bg)
}

fn to_color(c: [f32; 4]) -> Color {
    Color {
        r: f64::from(c[0]),
        g: f64::from(c[1]),
        b: f64::from(c[2]),
        a: f64::from(c[3]),
    }
}

impl FrameBackend for Renderer3D {
    fn execute(&mut self, pass: &Pass, geometry: &dyn GeometrySource) -> RenderResult<()> {
        for draw in &pass.draws {
            self.ensure_mesh(draw.mesh, geometry)?;
            let prims = self.meshes[&draw.mesh].ranges.len();
            if draw.prim >= prims {
                return Err(RenderError::MissingGeometry(format!(
                    "{:?} primitive {} of {prims}",
                    draw.mesh, draw.prim
                )));
            }
        }
        self.ensure_draw_capacity(pass.draws.len());
        self.write_uniforms(pass);

        let pipeline = self
            .pipelines
            .get(&pass.program)
            .ok_or(RenderError::NoProgram(pass.label))?;
        let target = match pass.target {
            Target::PickBuffer => &self.pick,
            Target::Viewport => &self.viewport,
        };
        let (color_load, depth_load) = match pass.clear {
            Some(c) => (LoadOp::Clear(to_color(c)), LoadOp::Clear(1.0)),
            None => (LoadOp::Load, LoadOp::Load),
        };

        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some(pass.label),
        });
        {
            let mut r_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(pass.label),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &target.color_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: color_load,
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(Operations {
                        load: depth_load,
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            r_pass.set_pipeline(pipeline);
            r_pass.set_bind_group(0, &self.camera_bg, &[]);
            for (i, draw) in pass.draws.iter().enumerate() {
                let mesh = &self.meshes[&draw.mesh];
                let offset = (i as u64 * self.draw_stride) as u32;
                r_pass.set_bind_group(1, &self.draw_bg, &[offset]);
                r_pass.set_vertex_buffer(0, mesh.vbuf.slice(..));
                r_pass.set_index_buffer(mesh.ibuf.slice(..), IndexFormat::Uint16);
                r_pass.draw_indexed(mesh.ranges[draw.prim].clone(), 0, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
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

        let mut encoder = self.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("pick_readback"),
        });
        encoder.copy_texture_to_buffer(
            TexelCopyTextureInfo {
                texture: &self.pick.color_tex,
                mip_level: 0,
                origin: Origin3d { x, y, z: 0 },
                aspect: TextureAspect::All,
            },
            TexelCopyBufferInfo {
                buffer: &self.staging_buf,
                layout: TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(READBACK_ROW),
                    rows_per_image: Some(1),
                },
            },
            Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = self.staging_buf.slice(..4);
        let (tx, rx) = mpsc::channel();
        slice.map_async(MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(PollType::wait_indefinitely());
        rx.recv().map_err(|_| RenderError::ReadbackChannel)??;

        let pixel = {
            let data = slice.get_mapped_range();
            [data[0], data[1], data[2], data[3]]
        };
        self.staging_buf.unmap();
        Ok(pixel)
    }
}
