//! CPU-side geometry: positions, indices and the primitive list that slices them.

use std::ops::Range;

use crate::error::{RenderError, RenderResult};

pub type Rgb = [f32; 3];

pub const GREEN: Rgb = [0.6, 0.8, 0.2];
pub const PURPLE: Rgb = [0.4, 0.2, 0.8];
pub const PINK: Rgb = [1.0, 0.2, 0.8];

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// How a primitive's index range is assembled into triangles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMode {
    TriangleFan,
    TriangleStrip,
}

/// A drawable slice of the index buffer with one flat color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Primitive {
    pub color: Option<Rgb>,
    pub start: u32,
    pub count: u32,
    pub mode: DrawMode,
}

impl Primitive {
    pub fn fan(color: Option<Rgb>, start: u32, count: u32) -> Self {
        Self {
            color,
            start,
            count,
            mode: DrawMode::TriangleFan,
        }
    }

    pub fn strip(color: Option<Rgb>, start: u32, count: u32) -> Self {
        Self {
            color,
            start,
            count,
            mode: DrawMode::TriangleStrip,
        }
    }

    /// Index range of this primitive, `None` when the end does not fit in `u32`.
    fn index_range(&self) -> Option<Range<usize>> {
        let end = self.start.checked_add(self.count)?;
        Some(self.start as usize..end as usize)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
    pub primitives: Vec<Primitive>,
}

/// Index data expanded to a triangle list, one range per source primitive.
///
/// wgpu has no fan topology, so every primitive is lowered to a list before
/// upload. Winding follows the usual fan/strip conventions so face culling
/// behaves the same as drawing the fan or strip directly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleList {
    pub indices: Vec<u16>,
    pub ranges: Vec<Range<u32>>,
}

impl Mesh {
    pub fn validate(&self) -> RenderResult<()> {
        if self.vertices.len() > u16::MAX as usize {
            return Err(RenderError::InvalidMesh(format!(
                "{} vertices exceed 16-bit indexing",
                self.vertices.len()
            )));
        }
        for (i, prim) in self.primitives.iter().enumerate() {
            if prim.count < 3 {
                return Err(RenderError::InvalidMesh(format!(
                    "primitive {i} has {} indices, need at least 3",
                    prim.count
                )));
            }
            let Some(slice) = prim.index_range().and_then(|r| self.indices.get(r)) else {
                return Err(RenderError::InvalidMesh(format!(
                    "primitive {i} range {}+{} past {} indices",
                    prim.start,
                    prim.count,
                    self.indices.len()
                )));
            };
            if let Some(&bad) = slice.iter().find(|&&ix| ix as usize >= self.vertices.len()) {
                return Err(RenderError::InvalidMesh(format!(
                    "primitive {i} references vertex {bad} of {}",
                    self.vertices.len()
                )));
            }
        }
        Ok(())
    }

    /// Triangles of one primitive as vertex index triples. A primitive that
    /// does not fit the index buffer yields none.
    pub fn triangles(&self, prim: &Primitive) -> Vec<[u16; 3]> {
        let Some(idx) = prim.index_range().and_then(|r| self.indices.get(r)) else {
            return Vec::new();
        };
        match prim.mode {
            DrawMode::TriangleFan => idx
                .windows(2)
                .skip(1)
                .map(|w| [idx[0], w[0], w[1]])
                .collect(),
            DrawMode::TriangleStrip => idx
                .windows(3)
                .enumerate()
                .map(|(k, w)| {
                    if k % 2 == 0 {
                        [w[0], w[1], w[2]]
                    } else {
                        [w[1], w[0], w[2]]
                    }
                })
                .collect(),
        }
    }

    pub fn to_triangle_list(&self) -> TriangleList {
        let mut out = TriangleList::default();
        for prim in &self.primitives {
            let start = out.indices.len() as u32;
            for tri in self.triangles(prim) {
                out.indices.extend_from_slice(&tri);
            }
            out.ranges.push(start..out.indices.len() as u32);
        }
        out
    }

    pub fn position(&self, index: u16) -> glam::Vec3 {
        glam::Vec3::from_array(self.vertices[index as usize].position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh {
            vertices: vec![
                Vertex::new(0.0, 0.0, 0.0),
                Vertex::new(1.0, 0.0, 0.0),
                Vertex::new(0.0, 0.0, 1.0),
                Vertex::new(1.0, 0.0, 1.0),
            ],
            indices: vec![0, 1, 2, 3, 0, 1, 3, 2],
            primitives: vec![
                Primitive::strip(Some(GREEN), 0, 4),
                Primitive::fan(None, 4, 4),
            ],
        }
    }

    #[test]
    fn strip_alternates_winding() {
        let mesh = quad();
        assert_eq!(
            mesh.triangles(&mesh.primitives[0]),
            vec![[0, 1, 2], [2, 1, 3]]
        );
    }

    #[test]
    fn fan_pivots_on_first_index() {
        let mesh = quad();
        assert_eq!(
            mesh.triangles(&mesh.primitives[1]),
            vec![[0, 1, 3], [0, 3, 2]]
        );
    }

    #[test]
    fn triangle_list_ranges_follow_primitive_order() {
        let list = quad().to_triangle_list();
        assert_eq!(list.ranges, vec![0..6, 6..12]);
        assert_eq!(list.indices.len(), 12);
    }

    #[test]
    fn validate_rejects_range_past_indices() {
        let mut mesh = quad();
        mesh.primitives.push(Primitive::strip(None, 6, 4));
        assert!(matches!(mesh.validate(), Err(RenderError::InvalidMesh(_))));
    }

    #[test]
    fn validate_rejects_range_overflowing_u32() {
        let mut mesh = quad();
        mesh.primitives = vec![Primitive::strip(None, u32::MAX, 4)];
        assert!(matches!(mesh.validate(), Err(RenderError::InvalidMesh(_))));
        assert!(mesh.triangles(&mesh.primitives[0]).is_empty());
    }

    #[test]
    fn validate_rejects_dangling_vertex() {
        let mut mesh = quad();
        mesh.indices[2] = 9;
        assert!(mesh.validate().is_err());
        assert!(quad().validate().is_ok());
    }
}
